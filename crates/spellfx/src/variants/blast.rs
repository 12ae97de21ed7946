//! Explosion and lightning visuals. Neither damages anything.

use spellfx_shared::Location;

use crate::command::{EffectCommand, EffectSender};
use crate::config::ConfigSection;
use crate::error::{EffectError, EffectResult};
use crate::variant::EffectVariant;

use super::{no_more_tokens, parse_token};

/// Explosion visual. Shorthand: `[power]`.
#[derive(Clone, Debug, PartialEq)]
pub struct ExplosionVariant {
    power: f32,
}

impl Default for ExplosionVariant {
    fn default() -> Self {
        Self { power: 4.0 }
    }
}

impl ExplosionVariant {
    /// Visual size.
    #[must_use]
    pub fn power(&self) -> f32 {
        self.power
    }

    fn set_power(&mut self, power: f32) -> EffectResult<()> {
        if !(power.is_finite() && power >= 0.0) {
            return Err(EffectError::InvalidConfig(format!("bad explosion power {power}")));
        }
        self.power = power;
        Ok(())
    }
}

impl EffectVariant for ExplosionVariant {
    fn load_from_string(&mut self, raw: &str) -> EffectResult<()> {
        let mut tokens = raw.split_whitespace();
        if let Some(power) = tokens.next() {
            self.set_power(parse_token(power, "power")?)?;
        }
        no_more_tokens(tokens, "[power]")
    }

    fn load_from_config(&mut self, section: &ConfigSection) -> EffectResult<()> {
        self.set_power(section.get_f64("power", f64::from(self.power)) as f32)
    }

    fn emit_at(&self, location: Option<&Location>, out: &EffectSender) {
        if let Some(location) = location {
            out.emit(EffectCommand::Explosion {
                location: location.clone(),
                power: self.power,
            });
        }
    }
}

/// Lightning visual. Takes no arguments.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LightningVariant;

impl EffectVariant for LightningVariant {
    fn load_from_string(&mut self, _raw: &str) -> EffectResult<()> {
        Ok(())
    }

    fn load_from_config(&mut self, _section: &ConfigSection) -> EffectResult<()> {
        Ok(())
    }

    fn emit_at(&self, location: Option<&Location>, out: &EffectSender) {
        if let Some(location) = location {
            out.emit(EffectCommand::Lightning {
                location: location.clone(),
            });
        }
    }
}
