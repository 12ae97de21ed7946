//! Text effects: action bar, broadcast and title.

use spellfx_shared::Location;

use crate::command::{Audience, EffectCommand, EffectSender, TextStyle};
use crate::config::ConfigSection;
use crate::error::{EffectError, EffectResult};
use crate::geometry::Offsets;
use crate::host::Entity;
use crate::variant::EffectVariant;

/// Text flavors sharing [`TextVariant`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextKind {
    /// Action bar of the target entity.
    ActionBar,
    /// Chat line to everyone, or everyone within `range`.
    Broadcast,
    /// Screen title of the target entity.
    Title,
}

impl TextKind {
    /// Every kind, in registration order.
    pub const ALL: [Self; 3] = [Self::ActionBar, Self::Broadcast, Self::Title];

    /// Registry name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::ActionBar => "actionbartext",
            Self::Broadcast => "broadcast",
            Self::Title => "title",
        }
    }
}

/// Shows a message. Shorthand: the whole string is the message.
#[derive(Clone, Debug, PartialEq)]
pub struct TextVariant {
    kind: TextKind,
    message: String,
    subtitle: String,
    /// Broadcast radius; 0 or less reaches everyone.
    range: f64,
    fade_in: u32,
    stay: u32,
    fade_out: u32,
}

impl TextVariant {
    /// Empty message of the given kind.
    #[must_use]
    pub fn new(kind: TextKind) -> Self {
        Self {
            kind,
            message: String::new(),
            subtitle: String::new(),
            range: 0.0,
            fade_in: 10,
            stay: 40,
            fade_out: 10,
        }
    }

    /// The configured message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    fn style(&self) -> TextStyle {
        match self.kind {
            TextKind::ActionBar => TextStyle::ActionBar,
            TextKind::Broadcast => TextStyle::Chat,
            TextKind::Title => TextStyle::Title {
                subtitle: self.subtitle.clone(),
                fade_in: self.fade_in,
                stay: self.stay,
                fade_out: self.fade_out,
            },
        }
    }

    fn send(&self, audience: Audience, out: &EffectSender) {
        out.emit(EffectCommand::Text {
            audience,
            style: self.style(),
            message: self.message.clone(),
        });
    }
}

impl EffectVariant for TextVariant {
    fn load_from_string(&mut self, raw: &str) -> EffectResult<()> {
        let message = raw.trim();
        if message.is_empty() {
            return Err(EffectError::InvalidConfig("text message is empty".into()));
        }
        self.message = message.to_owned();
        Ok(())
    }

    fn load_from_config(&mut self, section: &ConfigSection) -> EffectResult<()> {
        self.message = section.get_string("message", &self.message);
        self.subtitle = section.get_string("subtitle", &self.subtitle);
        self.range = section.get_f64("range", self.range);
        self.fade_in = section.get_u32("fade-in", self.fade_in);
        self.stay = section.get_u32("stay", self.stay);
        self.fade_out = section.get_u32("fade-out", self.fade_out);
        if self.message.is_empty() && self.subtitle.is_empty() {
            return Err(EffectError::InvalidConfig("text effect has no message".into()));
        }
        Ok(())
    }

    fn emit_at(&self, location: Option<&Location>, out: &EffectSender) {
        if self.kind != TextKind::Broadcast {
            tracing::trace!(kind = self.kind.name(), "text effect needs an entity");
            return;
        }
        let audience = match location {
            Some(location) if self.range > 0.0 => Audience::Nearby {
                location: location.clone(),
                range: self.range,
            },
            _ => Audience::Everyone,
        };
        self.send(audience, out);
    }

    fn emit_at_entity(&self, entity: Option<&dyn Entity>, offsets: Offsets, out: &EffectSender) {
        match (self.kind, entity) {
            (TextKind::Broadcast, _) => {
                let location = entity.map(|e| offsets.apply(&e.location()));
                self.emit_at(location.as_ref(), out);
            }
            (_, Some(entity)) => self.send(Audience::Entity(entity.id()), out),
            (_, None) => {}
        }
    }
}
