//! # Effect Variant Registry
//!
//! Maps lowercase names to variant factories. The registry is the only
//! process-wide mutable state in the engine: it is filled at startup
//! ([`EffectRegistry::with_builtins`]) and extended on cold paths by
//! plugins calling [`EffectRegistry::register`]. Hosts that want a global
//! keep one in their own static; tests build a fresh one each time.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::config::ConfigSection;
use crate::effect::SpellEffect;
use crate::error::{EffectError, EffectResult};
use crate::host::ModifierParser;
use crate::variant::EffectVariant;
use crate::variants;

/// Builds a fresh, unconfigured variant.
pub type VariantFactory = Arc<dyn Fn() -> EffectResult<Box<dyn EffectVariant>> + Send + Sync>;

/// Config key naming the variant in a whole-effect section.
pub const EFFECT_NAME_KEY: &str = "effect";

/// Name -> factory table.
pub struct EffectRegistry {
    factories: RwLock<HashMap<String, VariantFactory>>,
}

impl EffectRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            factories: RwLock::new(HashMap::new()),
        }
    }

    /// Creates a registry holding every built-in variant.
    #[must_use]
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        variants::install_builtins(&registry);
        registry
    }

    /// Registers `factory` under `name` (case-insensitive). An existing
    /// entry under the same name is replaced.
    pub fn register<F>(&self, name: &str, factory: F)
    where
        F: Fn() -> EffectResult<Box<dyn EffectVariant>> + Send + Sync + 'static,
    {
        let key = name.to_lowercase();
        let replaced = self
            .factories
            .write()
            .insert(key.clone(), Arc::new(factory))
            .is_some();
        if replaced {
            tracing::debug!(name = %key, "effect variant replaced");
        } else {
            tracing::debug!(name = %key, "effect variant registered");
        }
    }

    /// Builds an unconfigured effect by name.
    ///
    /// Unknown names and failing factories yield `None`; the failure is
    /// logged, never raised.
    #[must_use]
    pub fn create(&self, name: &str) -> Option<SpellEffect> {
        match self.try_create(name) {
            Ok(effect) => Some(effect),
            Err(EffectError::UnknownVariant(_)) => None,
            Err(err) => {
                tracing::warn!(%err, "effect variant construction failed");
                None
            }
        }
    }

    /// Like [`create`](Self::create) but reports why nothing was built.
    ///
    /// # Errors
    ///
    /// [`EffectError::UnknownVariant`] for unregistered names,
    /// [`EffectError::Construction`] when the factory fails.
    pub fn try_create(&self, name: &str) -> EffectResult<SpellEffect> {
        let key = name.to_lowercase();
        // clone the factory out so it runs without the lock held
        let factory = self
            .factories
            .read()
            .get(&key)
            .cloned()
            .ok_or_else(|| EffectError::UnknownVariant(key.clone()))?;

        let variant = factory().map_err(|e| EffectError::Construction {
            name: key.clone(),
            reason: e.to_string(),
        })?;
        Ok(SpellEffect::new(key, variant))
    }

    /// Creates the variant named by the section's `effect` key and loads
    /// the whole section into it.
    ///
    /// # Errors
    ///
    /// [`EffectError::InvalidConfig`] if the key is missing, otherwise the
    /// errors of [`try_create`](Self::try_create) and
    /// [`SpellEffect::load_from_config`].
    pub fn load_effect(
        &self,
        section: &ConfigSection,
        parser: &dyn ModifierParser,
    ) -> EffectResult<SpellEffect> {
        let name = section.get_str(EFFECT_NAME_KEY).ok_or_else(|| {
            EffectError::InvalidConfig(format!("effect section has no '{EFFECT_NAME_KEY}' key"))
        })?;
        let mut effect = self.try_create(name)?;
        effect.load_from_config(section, parser)?;
        Ok(effect)
    }

    /// Is a variant registered under this name?
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.factories.read().contains_key(&name.to_lowercase())
    }

    /// Registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.read().keys().cloned().collect();
        names.sort_unstable();
        names
    }

    /// Number of registered variants.
    #[must_use]
    pub fn len(&self) -> usize {
        self.factories.read().len()
    }

    /// No variants registered?
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.factories.read().is_empty()
    }
}

impl Default for EffectRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}
