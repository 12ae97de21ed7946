//! # Spell Effect Instances
//!
//! A [`SpellEffect`] is one configured emitter: a variant plus the common
//! options every variant shares. It is created by the registry when a spell
//! loads, configured once, then shared read-only (behind an `Rc`) across
//! every cast that plays it.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use spellfx_shared::Location;

use crate::config::ConfigSection;
use crate::error::EffectResult;
use crate::geometry::Offsets;
use crate::host::{CastContext, Entity, ModifierParser, ModifierSet};
use crate::options::EffectOptions;
use crate::scheduler::TaskId;
use crate::variant::EffectVariant;

/// A configured effect.
pub struct SpellEffect {
    /// Registry name (lowercase).
    name: String,
    /// Common options.
    options: EffectOptions,
    /// Compiled cast modifiers, if any were configured.
    modifiers: Option<Rc<dyn ModifierSet>>,
    /// The leaf emitter.
    variant: Box<dyn EffectVariant>,
    /// Last active-on-entity task started from this effect.
    active_task: Cell<Option<TaskId>>,
}

impl SpellEffect {
    /// Wraps a variant with default options.
    #[must_use]
    pub fn new(name: impl Into<String>, variant: Box<dyn EffectVariant>) -> Self {
        Self {
            name: name.into(),
            options: EffectOptions::default(),
            modifiers: None,
            variant,
            active_task: Cell::new(None),
        }
    }

    /// Replaces the options wholesale.
    #[must_use]
    pub fn with_options(mut self, options: EffectOptions) -> Self {
        self.options = options;
        self
    }

    /// Installs a compiled modifier set.
    #[must_use]
    pub fn with_modifiers(mut self, modifiers: Rc<dyn ModifierSet>) -> Self {
        self.modifiers = Some(modifiers);
        self
    }

    /// Loads the common options, compiles modifiers, then hands the
    /// section to the variant for its own keys.
    ///
    /// # Errors
    ///
    /// Propagates option, modifier and variant load failures. On error the
    /// effect keeps whatever options it had before.
    pub fn load_from_config(
        &mut self,
        section: &ConfigSection,
        parser: &dyn ModifierParser,
    ) -> EffectResult<()> {
        let options = EffectOptions::from_section(section)?;
        let modifiers = if options.modifier_rules.is_empty() {
            None
        } else {
            Some(parser.parse(&options.modifier_rules)?)
        };
        self.variant.load_from_config(section)?;

        self.options = options;
        self.modifiers = modifiers;
        Ok(())
    }

    /// Forwards a shorthand string to the variant.
    ///
    /// # Errors
    ///
    /// Returns the variant's parse error.
    pub fn load_from_string(&mut self, raw: &str) -> EffectResult<()> {
        self.variant.load_from_string(raw)
    }

    /// Registry name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Common options.
    #[must_use]
    pub fn options(&self) -> &EffectOptions {
        &self.options
    }

    /// Scalar dispatch offsets.
    #[must_use]
    pub fn offsets(&self) -> Offsets {
        self.options.offsets()
    }

    /// Are cast modifiers configured?
    #[must_use]
    pub fn has_modifiers(&self) -> bool {
        self.modifiers.is_some()
    }

    /// Id of the last active-on-entity task started from this effect.
    ///
    /// Only one session is tracked; starting a second overwrites the id.
    #[must_use]
    pub fn active_task(&self) -> Option<TaskId> {
        self.active_task.get()
    }

    pub(crate) fn replace_active_task(&self, task: Option<TaskId>) -> Option<TaskId> {
        self.active_task.replace(task)
    }

    pub(crate) fn variant(&self) -> &dyn EffectVariant {
        self.variant.as_ref()
    }

    /// Consults the modifiers. No modifiers means every cast passes.
    pub(crate) fn permits(&self, entity: Option<&dyn Entity>, location: Option<&Location>) -> bool {
        match &self.modifiers {
            Some(modifiers) => modifiers.accepts(&CastContext { entity, location }),
            None => true,
        }
    }
}

impl fmt::Debug for SpellEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpellEffect")
            .field("name", &self.name)
            .field("options", &self.options)
            .field("modifiers", &self.modifiers.is_some())
            .field("active_task", &self.active_task.get())
            .finish_non_exhaustive()
    }
}
