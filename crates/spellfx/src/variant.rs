//! # Effect Variant Contract
//!
//! A variant is the leaf emitter behind a registry name: smoke, sound,
//! particles. The dispatch layer works out *where* and *when*; the variant
//! only decides *what* to emit at the point it is handed.

use spellfx_shared::Location;

use crate::command::EffectSender;
use crate::config::ConfigSection;
use crate::error::EffectResult;
use crate::geometry::Offsets;
use crate::host::Entity;

/// Hook surface a concrete effect implements.
pub trait EffectVariant {
    /// Parses the variant's shorthand single-string form.
    ///
    /// # Errors
    ///
    /// Returns [`crate::EffectError::InvalidConfig`] for strings outside the variant's grammar.
    fn load_from_string(&mut self, raw: &str) -> EffectResult<()>;

    /// Picks up variant-specific keys. Runs after the common options loaded.
    ///
    /// # Errors
    ///
    /// Returns [`crate::EffectError::InvalidConfig`] for unusable values.
    fn load_from_config(&mut self, section: &ConfigSection) -> EffectResult<()>;

    /// Emits at a single point. `None` when the caller had no location;
    /// location-agnostic variants still play, the rest skip.
    fn emit_at(&self, location: Option<&Location>, out: &EffectSender);

    /// Emits for an entity. The default resolves the entity's location,
    /// applies `offsets` and defers to [`emit_at`](Self::emit_at).
    fn emit_at_entity(&self, entity: Option<&dyn Entity>, offsets: Offsets, out: &EffectSender) {
        let location = entity.map(|e| offsets.apply(&e.location()));
        self.emit_at(location.as_ref(), out);
    }

    /// Custom behavior for tracking lines between two points. No-op by default.
    fn play_tracking_line_patterns(
        &self,
        _origin: &Location,
        _target: &Location,
        _origin_entity: Option<&dyn Entity>,
        _target_entity: Option<&dyn Entity>,
        _out: &EffectSender,
    ) {
    }
}
