//! Test doubles shared by the unit tests.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use spellfx_shared::Location;

use crate::command::{EffectBus, EffectSender};
use crate::config::ConfigSection;
use crate::dispatch::EffectPlayer;
use crate::effect::SpellEffect;
use crate::error::EffectResult;
use crate::host::{Entity, EntityId, ModifierSet};
use crate::options::EffectOptions;
use crate::scheduler::TickScheduler;
use crate::variant::EffectVariant;

/// Every location handed to [`RecordingVariant::emit_at`], in order.
pub(crate) type Seen = Rc<RefCell<Vec<Option<Location>>>>;

/// Variant that records where it was asked to emit.
#[derive(Clone, Debug, Default)]
pub(crate) struct RecordingVariant {
    pub(crate) seen: Seen,
}

impl EffectVariant for RecordingVariant {
    fn load_from_string(&mut self, _raw: &str) -> EffectResult<()> {
        Ok(())
    }

    fn load_from_config(&mut self, _section: &ConfigSection) -> EffectResult<()> {
        Ok(())
    }

    fn emit_at(&self, location: Option<&Location>, _out: &EffectSender) {
        self.seen.borrow_mut().push(location.cloned());
    }
}

/// Entity whose location and validity the test controls.
pub(crate) struct TestEntity {
    id: EntityId,
    location: RefCell<Location>,
    valid: Cell<bool>,
}

impl TestEntity {
    pub(crate) fn new(id: u64, location: Location) -> Rc<Self> {
        Rc::new(Self {
            id: EntityId(id),
            location: RefCell::new(location),
            valid: Cell::new(true),
        })
    }

    pub(crate) fn move_to(&self, location: Location) {
        *self.location.borrow_mut() = location;
    }

    pub(crate) fn set_valid(&self, valid: bool) {
        self.valid.set(valid);
    }
}

impl Entity for TestEntity {
    fn id(&self) -> EntityId {
        self.id
    }

    fn location(&self) -> Location {
        self.location.borrow().clone()
    }

    fn is_valid(&self) -> bool {
        self.valid.get()
    }
}

/// Player over a fresh [`TickScheduler`]. Keep the bus alive for the test.
pub(crate) fn test_player() -> (EffectPlayer, Rc<TickScheduler>, EffectBus) {
    let scheduler = Rc::new(TickScheduler::new());
    let bus = EffectBus::new(256);
    let player = EffectPlayer::new(scheduler.clone(), bus.sender());
    (player, scheduler, bus)
}

pub(crate) fn recording_effect(options: EffectOptions) -> (Rc<SpellEffect>, Seen) {
    recording_effect_with(options, None)
}

pub(crate) fn recording_effect_with(
    options: EffectOptions,
    modifiers: Option<Rc<dyn ModifierSet>>,
) -> (Rc<SpellEffect>, Seen) {
    let variant = RecordingVariant::default();
    let seen = Rc::clone(&variant.seen);
    let mut effect = SpellEffect::new("recording", Box::new(variant)).with_options(options);
    if let Some(modifiers) = modifiers {
        effect = effect.with_modifiers(modifiers);
    }
    (Rc::new(effect), seen)
}
