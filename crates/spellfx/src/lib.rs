//! # SPELLFX Effect Engine
//!
//! Plays configured spell effects at a point, along a line, or in an orbit
//! around a moving entity.
//!
//! ## Design Principles
//!
//! 1. **Host owns time** - every deferred emission goes through a [`Scheduler`]
//! 2. **Host owns the world** - entities, activity checks and cast modifiers are traits
//! 3. **Host renders** - variants emit [`EffectCommand`]s down an [`EffectBus`]
//! 4. **Load once, play often** - an effect is configured once and shared behind an `Rc`
//!
//! ## Thread Safety
//!
//! Single-threaded. Everything except the [`EffectRegistry`] lives on the
//! host tick thread; there are no locks on the dispatch path.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::rc::Rc;
//! use spellfx::{ConfigSection, EffectBus, EffectPlayer, EffectRegistry, NoModifiers, TickScheduler};
//!
//! let registry = EffectRegistry::with_builtins();
//! let section = ConfigSection::from_toml_str(r#"
//!     effect = "particles"
//!     particle-name = "flame"
//!     distance-between = 0.5
//! "#)?;
//! let effect = Rc::new(registry.load_effect(&section, &NoModifiers)?);
//!
//! let scheduler = Rc::new(TickScheduler::new());
//! let bus = EffectBus::default();
//! let player = EffectPlayer::new(scheduler.clone(), bus.sender());
//!
//! player.play_line(&effect, &caster, &target)?;
//! for command in bus.receiver().drain() {
//!     host.render(command);
//! }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod command;
pub mod config;
pub mod dispatch;
pub mod effect;
pub mod error;
pub mod expression;
pub mod geometry;
pub mod host;
pub mod options;
pub mod orbit;
pub mod registry;
pub mod scheduler;
pub mod variant;
pub mod variants;

#[cfg(test)]
pub(crate) mod testing;

pub use command::{Audience, EffectBus, EffectCommand, EffectReceiver, EffectSender, TextStyle};
pub use config::ConfigSection;
pub use dispatch::{EffectPlayer, PlayerHandle};
pub use effect::SpellEffect;
pub use error::{EffectError, EffectResult};
pub use expression::Expression;
pub use geometry::Offsets;
pub use host::{
    ActiveChecker, CastContext, Entity, EntityId, EntityRef, ModifierParser, ModifierSet,
    NoModifiers,
};
pub use options::{EffectOptions, OrbitOptions, RawEffectOptions};
pub use orbit::{OrbitParams, OrbitPhase, OrbitTracker};
pub use registry::{EffectRegistry, VariantFactory, EFFECT_NAME_KEY};
pub use scheduler::{DelayedTask, RepeatingTask, Scheduler, TaskId, TickScheduler};
pub use variant::EffectVariant;

pub use spellfx_shared::{Location, Vec3};
