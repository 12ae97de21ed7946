//! # Effect Commands
//!
//! The engine never draws a particle or plays a sound. Built-in variants
//! describe what the host should render as an [`EffectCommand`] and push it
//! down a bounded channel; the host drains it once per tick.
//!
//! ```text
//! ┌─────────────┐      ┌─────────────┐      ┌─────────────┐
//! │  Variants   │─────>│  EffectBus  │─────>│    Host     │
//! │ (emit_at)   │      │  (bounded)  │      │  renderer   │
//! └─────────────┘      └─────────────┘      └─────────────┘
//! ```
//!
//! A full channel drops the command: a missing puff of smoke is better
//! than a stalled tick.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use spellfx_shared::Location;

use crate::error::{EffectError, EffectResult};
use crate::host::EntityId;

/// Default channel capacity.
pub const DEFAULT_BUS_CAPACITY: usize = 4096;

/// Who a text or personal sound is for.
#[derive(Clone, Debug, PartialEq)]
pub enum Audience {
    /// One entity.
    Entity(EntityId),
    /// Everyone within `range` of `location`.
    Nearby {
        /// Center of the audience.
        location: Location,
        /// Radius in blocks.
        range: f64,
    },
    /// The whole server.
    Everyone,
}

/// How text is shown.
#[derive(Clone, Debug, PartialEq)]
pub enum TextStyle {
    /// Chat line.
    Chat,
    /// Action bar above the hotbar.
    ActionBar,
    /// Screen title.
    Title {
        /// Second line.
        subtitle: String,
        /// Fade-in ticks.
        fade_in: u32,
        /// Hold ticks.
        stay: u32,
        /// Fade-out ticks.
        fade_out: u32,
    },
}

/// A rendering request for the host.
#[derive(Clone, Debug, PartialEq)]
pub enum EffectCommand {
    // =========================================================================
    // Particles
    // =========================================================================
    /// Particle burst.
    Particles {
        /// Where.
        location: Location,
        /// Host particle name.
        particle: String,
        /// Number of particles.
        count: u32,
        /// Random spread on X and Z.
        horizontal_spread: f64,
        /// Random spread on Y.
        vertical_spread: f64,
        /// Particle speed.
        speed: f64,
    },

    /// Directional smoke puff.
    Smoke {
        /// Where.
        location: Location,
        /// Host smoke direction code (0-8, 4 = up).
        direction: u8,
        /// Number of puffs.
        count: u32,
    },

    // =========================================================================
    // Sound
    // =========================================================================
    /// Sound at a location, or heard by a single entity.
    Sound {
        /// Where the sound plays. `None` for personal sounds without a location.
        location: Option<Location>,
        /// Only this entity hears it, if set.
        listener: Option<EntityId>,
        /// Host sound name.
        sound: String,
        /// Volume.
        volume: f32,
        /// Pitch.
        pitch: f32,
    },

    // =========================================================================
    // Text
    // =========================================================================
    /// Text shown to an audience.
    Text {
        /// Who sees it.
        audience: Audience,
        /// How it is shown.
        style: TextStyle,
        /// The message.
        message: String,
    },

    // =========================================================================
    // World visuals
    // =========================================================================
    /// Explosion visual and sound, no block damage.
    Explosion {
        /// Where.
        location: Location,
        /// Visual size.
        power: f32,
    },

    /// Lightning visual, no damage or fire.
    Lightning {
        /// Where.
        location: Location,
    },
}

impl EffectCommand {
    /// The location the command renders at, when it has one.
    #[must_use]
    pub fn location(&self) -> Option<&Location> {
        match self {
            Self::Particles { location, .. }
            | Self::Smoke { location, .. }
            | Self::Explosion { location, .. }
            | Self::Lightning { location } => Some(location),
            Self::Sound { location, .. } => location.as_ref(),
            Self::Text {
                audience: Audience::Nearby { location, .. },
                ..
            } => Some(location),
            Self::Text { .. } => None,
        }
    }
}

/// Channel from variants to the host.
pub struct EffectBus {
    sender: Sender<EffectCommand>,
    receiver: Receiver<EffectCommand>,
}

impl EffectBus {
    /// Creates a bus holding at most `capacity` undrained commands.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self { sender, receiver }
    }

    /// Producer handle (clone freely).
    #[must_use]
    pub fn sender(&self) -> EffectSender {
        EffectSender {
            sender: self.sender.clone(),
        }
    }

    /// Consumer handle.
    #[must_use]
    pub fn receiver(&self) -> EffectReceiver {
        EffectReceiver {
            receiver: self.receiver.clone(),
        }
    }
}

impl Default for EffectBus {
    fn default() -> Self {
        Self::new(DEFAULT_BUS_CAPACITY)
    }
}

/// Producer side of the [`EffectBus`].
#[derive(Clone, Debug)]
pub struct EffectSender {
    sender: Sender<EffectCommand>,
}

impl EffectSender {
    /// Queues a command without blocking.
    ///
    /// # Errors
    ///
    /// Returns [`EffectError::OutputClosed`] if the host dropped every receiver.
    /// A full channel is not an error: the command is dropped and logged.
    pub fn send(&self, command: EffectCommand) -> EffectResult<()> {
        match self.sender.try_send(command) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(dropped)) => {
                tracing::warn!(?dropped, "effect channel full, dropping command");
                Ok(())
            }
            Err(TrySendError::Disconnected(_)) => Err(EffectError::OutputClosed),
        }
    }

    /// Queues a command, logging instead of failing. For emit hooks.
    pub fn emit(&self, command: EffectCommand) {
        if let Err(err) = self.send(command) {
            tracing::debug!(%err, "effect command discarded");
        }
    }
}

/// Consumer side of the [`EffectBus`].
#[derive(Clone, Debug)]
pub struct EffectReceiver {
    receiver: Receiver<EffectCommand>,
}

impl EffectReceiver {
    /// Next queued command, if any.
    #[must_use]
    pub fn try_recv(&self) -> Option<EffectCommand> {
        self.receiver.try_recv().ok()
    }

    /// Everything queued right now.
    #[must_use]
    pub fn drain(&self) -> Vec<EffectCommand> {
        self.receiver.try_iter().collect()
    }

    /// Queued command count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    /// Nothing queued?
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}
