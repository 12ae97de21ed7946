//! World and personal sounds.

use spellfx_shared::Location;

use crate::command::{EffectCommand, EffectSender};
use crate::config::ConfigSection;
use crate::error::{EffectError, EffectResult};
use crate::geometry::Offsets;
use crate::host::Entity;
use crate::variant::EffectVariant;

use super::{no_more_tokens, parse_token};

/// Plays a host sound.
///
/// Shorthand: `name [volume [pitch]]`. The personal flavor is only heard
/// by the entity it plays on and does nothing at a bare location.
#[derive(Clone, Debug, PartialEq)]
pub struct SoundVariant {
    sound: String,
    volume: f32,
    pitch: f32,
    personal: bool,
}

impl Default for SoundVariant {
    fn default() -> Self {
        Self {
            sound: "entity.llama.spit".to_owned(),
            volume: 1.0,
            pitch: 1.0,
            personal: false,
        }
    }
}

impl SoundVariant {
    /// Sound heard only by the target entity.
    #[must_use]
    pub fn personal() -> Self {
        Self {
            personal: true,
            ..Self::default()
        }
    }

    /// Host sound name.
    #[must_use]
    pub fn sound(&self) -> &str {
        &self.sound
    }

    fn validate(&self) -> EffectResult<()> {
        if self.sound.is_empty() {
            return Err(EffectError::InvalidConfig("sound name is empty".into()));
        }
        if !(self.volume.is_finite() && self.volume >= 0.0) {
            return Err(EffectError::InvalidConfig(format!("bad volume {}", self.volume)));
        }
        Ok(())
    }
}

impl EffectVariant for SoundVariant {
    fn load_from_string(&mut self, raw: &str) -> EffectResult<()> {
        let mut tokens = raw.split_whitespace();
        let name = tokens
            .next()
            .ok_or_else(|| EffectError::InvalidConfig("sound name missing".into()))?;
        self.sound = name.to_owned();
        if let Some(volume) = tokens.next() {
            self.volume = parse_token(volume, "volume")?;
        }
        if let Some(pitch) = tokens.next() {
            self.pitch = parse_token(pitch, "pitch")?;
        }
        no_more_tokens(tokens, "name [volume [pitch]]")?;
        self.validate()
    }

    fn load_from_config(&mut self, section: &ConfigSection) -> EffectResult<()> {
        self.sound = section.get_string("sound", &self.sound);
        // the host API takes f32
        self.volume = section.get_f64("volume", f64::from(self.volume)) as f32;
        self.pitch = section.get_f64("pitch", f64::from(self.pitch)) as f32;
        self.validate()
    }

    fn emit_at(&self, location: Option<&Location>, out: &EffectSender) {
        if self.personal {
            tracing::trace!(sound = %self.sound, "personal sound without an entity");
            return;
        }
        let Some(location) = location else { return };
        out.emit(EffectCommand::Sound {
            location: Some(location.clone()),
            listener: None,
            sound: self.sound.clone(),
            volume: self.volume,
            pitch: self.pitch,
        });
    }

    fn emit_at_entity(&self, entity: Option<&dyn Entity>, offsets: Offsets, out: &EffectSender) {
        if !self.personal {
            let location = entity.map(|e| offsets.apply(&e.location()));
            self.emit_at(location.as_ref(), out);
            return;
        }
        let Some(entity) = entity else { return };
        out.emit(EffectCommand::Sound {
            location: Some(offsets.apply(&entity.location())),
            listener: Some(entity.id()),
            sound: self.sound.clone(),
            volume: self.volume,
            pitch: self.pitch,
        });
    }
}
