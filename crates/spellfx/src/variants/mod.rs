//! # Built-in Variants
//!
//! Leaf emitters installed by [`EffectRegistry::with_builtins`]. Each one
//! turns a location (or entity) into [`crate::EffectCommand`]s for the host.
//!
//! | Module        | Names                                                  |
//! |---------------|--------------------------------------------------------|
//! | [`particles`] | `particles`, `particleline` + presets, `smoke`, `bigsmoke`, `smokeswirl`, `smoketrail` |
//! | [`sound`]     | `sound`, `soundpersonal`                               |
//! | [`text`]      | `actionbartext`, `broadcast`, `title`                  |
//! | [`blast`]     | `explosion`, `lightning`                               |

pub mod blast;
pub mod particles;
pub mod sound;
pub mod text;

use std::str::FromStr;

use crate::error::{EffectError, EffectResult};
use crate::registry::EffectRegistry;

pub use blast::{ExplosionVariant, LightningVariant};
pub use particles::{ParticlesVariant, SmokeStyle, SmokeVariant, PARTICLE_PRESETS};
pub use sound::SoundVariant;
pub use text::{TextKind, TextVariant};

/// Registers every built-in variant.
pub fn install_builtins(registry: &EffectRegistry) {
    registry.register("particles", || Ok(Box::new(ParticlesVariant::default())));
    registry.register("particleline", || Ok(Box::new(ParticlesVariant::default())));
    for &(name, particle) in PARTICLE_PRESETS {
        registry.register(name, move || Ok(Box::new(ParticlesVariant::preset(particle))));
    }

    for style in SmokeStyle::ALL {
        registry.register(style.name(), move || Ok(Box::new(SmokeVariant::new(style))));
    }

    registry.register("sound", || Ok(Box::new(SoundVariant::default())));
    registry.register("soundpersonal", || Ok(Box::new(SoundVariant::personal())));

    for kind in TextKind::ALL {
        registry.register(kind.name(), move || Ok(Box::new(TextVariant::new(kind))));
    }

    registry.register("explosion", || Ok(Box::new(ExplosionVariant::default())));
    registry.register("lightning", || Ok(Box::new(LightningVariant)));

    tracing::debug!(count = registry.len(), "built-in effect variants installed");
}

/// Parses one shorthand token.
pub(crate) fn parse_token<T: FromStr>(token: &str, what: &str) -> EffectResult<T> {
    token
        .parse()
        .map_err(|_| EffectError::InvalidConfig(format!("bad {what} '{token}'")))
}

/// Rejects shorthand strings with more tokens than the grammar allows.
pub(crate) fn no_more_tokens<'a>(mut rest: impl Iterator<Item = &'a str>, grammar: &str) -> EffectResult<()> {
    match rest.next() {
        None => Ok(()),
        Some(extra) => Err(EffectError::InvalidConfig(format!(
            "unexpected '{extra}', expected '{grammar}'"
        ))),
    }
}
