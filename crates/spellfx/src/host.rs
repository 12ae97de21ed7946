//! # Host Collaborators
//!
//! The engine does not model the world. Entities, activity checks and cast
//! modifiers are host objects reached through these traits.

use std::fmt;
use std::rc::Rc;

use spellfx_shared::Location;

use crate::error::{EffectError, EffectResult};

/// Host identifier of an entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entity#{}", self.0)
    }
}

/// An actor in the host world.
pub trait Entity {
    /// Stable host id.
    fn id(&self) -> EntityId;

    /// Current location. Returns a fresh value on every call.
    fn location(&self) -> Location;

    /// False once the entity has despawned, died or unloaded.
    fn is_valid(&self) -> bool;
}

/// Shared handle to a host entity, as captured by scheduled tasks.
pub type EntityRef = Rc<dyn Entity>;

/// Decides whether a recurring effect should keep playing on an entity.
pub trait ActiveChecker {
    /// True while the effect should continue.
    fn is_active(&self, entity: &dyn Entity) -> bool;
}

impl<F> ActiveChecker for F
where
    F: Fn(&dyn Entity) -> bool,
{
    fn is_active(&self, entity: &dyn Entity) -> bool {
        self(entity)
    }
}

/// What a modifier set gets to look at before an emission.
#[derive(Clone, Copy)]
pub struct CastContext<'a> {
    /// Entity the effect is playing on, if any.
    pub entity: Option<&'a dyn Entity>,
    /// Where the emission would land, if known.
    pub location: Option<&'a Location>,
}

impl fmt::Debug for CastContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CastContext")
            .field("entity", &self.entity.map(|e| e.id()))
            .field("location", &self.location)
            .finish()
    }
}

/// Host rule set that can veto a single emission.
pub trait ModifierSet {
    /// False suppresses the emission.
    fn accepts(&self, context: &CastContext<'_>) -> bool;
}

/// Builds a [`ModifierSet`] from the `modifiers` string list of a config section.
pub trait ModifierParser {
    /// Compiles the rules.
    ///
    /// # Errors
    ///
    /// Returns [`EffectError::InvalidConfig`] for rules the host cannot parse.
    fn parse(&self, rules: &[String]) -> EffectResult<Rc<dyn ModifierSet>>;
}

/// Parser for hosts without cast modifiers.
///
/// Accepts an empty rule list and rejects anything else, so a config that
/// relies on modifiers fails loudly instead of playing unconditionally.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoModifiers;

impl ModifierSet for NoModifiers {
    fn accepts(&self, _context: &CastContext<'_>) -> bool {
        true
    }
}

impl ModifierParser for NoModifiers {
    fn parse(&self, rules: &[String]) -> EffectResult<Rc<dyn ModifierSet>> {
        if rules.is_empty() {
            Ok(Rc::new(Self))
        } else {
            Err(EffectError::InvalidConfig(format!(
                "{} modifier rule(s) configured but the host has no modifier parser",
                rules.len()
            )))
        }
    }
}
