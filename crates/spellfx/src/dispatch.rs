//! # Effect Dispatch
//!
//! Entry points a spell calls to play an effect:
//!
//! - [`EffectPlayer::play_on_entity`] / [`EffectPlayer::play_at`]: one point, optionally delayed
//! - [`EffectPlayer::play_line`]: samples between two points, fired in order
//! - [`EffectPlayer::play_while_active_on_entity`]: repeat until the caller cancels
//! - [`EffectPlayer::play_while_active_orbit`]: circle an entity until it stops being active
//!
//! Every emission passes the effect's cast modifiers first. A veto skips
//! that one emission and nothing else.
//!
//! Scheduled tasks hold a [`PlayerHandle`] (weak scheduler reference) so a
//! host dropping its scheduler does not leak through task closures.

use std::rc::{Rc, Weak};

use spellfx_shared::Location;

use crate::command::EffectSender;
use crate::effect::SpellEffect;
use crate::error::EffectResult;
use crate::geometry;
use crate::host::{ActiveChecker, Entity, EntityRef};
use crate::orbit::OrbitTracker;
use crate::scheduler::{Scheduler, TaskId};

/// Whether scalar offsets still need applying to a dispatch location.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Placement {
    /// Caller-supplied point: apply height and forward offsets.
    ApplyOffsets,
    /// Already placed (line samples): emit as-is.
    AsIs,
}

/// Plays configured effects against a host scheduler and output channel.
#[derive(Clone)]
pub struct EffectPlayer {
    scheduler: Rc<dyn Scheduler>,
    output: EffectSender,
}

impl EffectPlayer {
    /// Creates a player.
    #[must_use]
    pub fn new(scheduler: Rc<dyn Scheduler>, output: EffectSender) -> Self {
        Self { scheduler, output }
    }

    /// The scheduler gateway.
    #[must_use]
    pub fn scheduler(&self) -> &Rc<dyn Scheduler> {
        &self.scheduler
    }

    /// The output channel.
    #[must_use]
    pub fn output(&self) -> &EffectSender {
        &self.output
    }

    /// Weak handle for task closures.
    #[must_use]
    pub fn handle(&self) -> PlayerHandle {
        PlayerHandle {
            scheduler: Rc::downgrade(&self.scheduler),
            output: self.output.clone(),
        }
    }

    /// Plays on an entity's current location, now or after the effect's delay.
    ///
    /// With a delay the entity is re-read when the task fires, so the
    /// effect lands where the entity is by then. `None` is forwarded to
    /// the variant as "no location".
    ///
    /// # Errors
    ///
    /// Scheduler failures, unchanged.
    pub fn play_on_entity(&self, effect: &Rc<SpellEffect>, entity: Option<EntityRef>) -> EffectResult<()> {
        let delay = effect.options().delay;
        if delay == 0 {
            emit_on_entity(effect, entity.as_deref(), &self.output);
            return Ok(());
        }

        let effect = Rc::clone(effect);
        let output = self.output.clone();
        self.scheduler.schedule_delayed(
            Box::new(move || emit_on_entity(&effect, entity.as_deref(), &output)),
            delay,
        )?;
        Ok(())
    }

    /// Plays at a location, now or after the effect's delay.
    ///
    /// The location is captured on entry; a delayed emission uses that
    /// snapshot.
    ///
    /// # Errors
    ///
    /// Scheduler failures, unchanged.
    pub fn play_at(&self, effect: &Rc<SpellEffect>, location: Option<&Location>) -> EffectResult<()> {
        self.deliver(effect, location.cloned(), None, Placement::ApplyOffsets)
    }

    /// [`play_at`](Self::play_at) for a point derived from `entity`, which
    /// modifiers see as the caster.
    pub(crate) fn play_at_around(
        &self,
        effect: &Rc<SpellEffect>,
        location: &Location,
        entity: &EntityRef,
    ) -> EffectResult<()> {
        self.deliver(effect, Some(location.clone()), Some(Rc::clone(entity)), Placement::ApplyOffsets)
    }

    /// Plays along the line `from -> to`.
    ///
    /// Samples are `distance-between` apart, raised by `height-offset`,
    /// exclusive of `from`, and dispatched synchronously in order. Each
    /// sample still honors the effect's delay. Returns the sample count.
    ///
    /// # Errors
    ///
    /// Scheduler failures, unchanged. Samples before the failure were
    /// already dispatched.
    pub fn play_line(&self, effect: &Rc<SpellEffect>, from: &Location, to: &Location) -> EffectResult<usize> {
        let options = effect.options();
        let mut count = 0;
        for sample in geometry::line_samples(from, to, options.distance_between, options.height_offset) {
            self.deliver(effect, Some(sample), None, Placement::AsIs)?;
            count += 1;
        }
        Ok(count)
    }

    /// Plays on `entity` every `effect-interval` ticks while `checker`
    /// says so; inactive ticks are skipped, not fatal.
    ///
    /// The caller owns the task and must cancel it (see
    /// [`cancel`](Self::cancel) / [`stop_active`](Self::stop_active)).
    /// The id is also recorded on the effect; one session per effect.
    ///
    /// # Errors
    ///
    /// Scheduler failures, unchanged.
    pub fn play_while_active_on_entity(
        &self,
        effect: &Rc<SpellEffect>,
        entity: EntityRef,
        checker: Rc<dyn ActiveChecker>,
    ) -> EffectResult<TaskId> {
        let handle = self.handle();
        let task_effect = Rc::clone(effect);
        let task = self.scheduler.schedule_repeating(
            Box::new(move || {
                if !checker.is_active(&*entity) {
                    return;
                }
                let Some(player) = handle.attach() else { return };
                if let Err(err) = player.play_on_entity(&task_effect, Some(Rc::clone(&entity))) {
                    tracing::warn!(%err, effect = task_effect.name(), "active effect tick failed");
                }
            }),
            0,
            effect.options().effect_interval,
        )?;

        if let Some(previous) = effect.replace_active_task(Some(task)) {
            tracing::debug!(
                effect = effect.name(),
                %previous,
                "active effect started while another session was tracked"
            );
        }
        Ok(task)
    }

    /// Starts an orbit around `entity`. See [`OrbitTracker`].
    ///
    /// # Errors
    ///
    /// Scheduler failures, unchanged.
    pub fn play_while_active_orbit(
        &self,
        effect: &Rc<SpellEffect>,
        entity: EntityRef,
        checker: Rc<dyn ActiveChecker>,
    ) -> EffectResult<OrbitTracker> {
        OrbitTracker::start(self, effect, entity, checker)
    }

    /// Hands a tracking line to the variant. Most variants ignore it.
    pub fn play_tracking_line_patterns(
        &self,
        effect: &SpellEffect,
        origin: &Location,
        target: &Location,
        origin_entity: Option<&dyn Entity>,
        target_entity: Option<&dyn Entity>,
    ) {
        effect
            .variant()
            .play_tracking_line_patterns(origin, target, origin_entity, target_entity, &self.output);
    }

    /// Cancels a task returned by this player.
    pub fn cancel(&self, task: TaskId) {
        self.scheduler.cancel(task);
    }

    /// Cancels the active-on-entity session recorded on `effect`, if any.
    pub fn stop_active(&self, effect: &SpellEffect) {
        if let Some(task) = effect.replace_active_task(None) {
            self.scheduler.cancel(task);
        }
    }

    fn deliver(
        &self,
        effect: &Rc<SpellEffect>,
        location: Option<Location>,
        entity: Option<EntityRef>,
        placement: Placement,
    ) -> EffectResult<()> {
        let delay = effect.options().delay;
        if delay == 0 {
            emit_at_location(effect, location.as_ref(), entity.as_deref(), placement, &self.output);
            return Ok(());
        }

        let effect = Rc::clone(effect);
        let output = self.output.clone();
        self.scheduler.schedule_delayed(
            Box::new(move || emit_at_location(&effect, location.as_ref(), entity.as_deref(), placement, &output)),
            delay,
        )?;
        Ok(())
    }
}

/// [`EffectPlayer`] without a strong scheduler reference.
#[derive(Clone)]
pub struct PlayerHandle {
    scheduler: Weak<dyn Scheduler>,
    output: EffectSender,
}

impl PlayerHandle {
    /// The player, if the scheduler is still alive.
    #[must_use]
    pub fn attach(&self) -> Option<EffectPlayer> {
        self.scheduler.upgrade().map(|scheduler| EffectPlayer {
            scheduler,
            output: self.output.clone(),
        })
    }
}

fn emit_on_entity(effect: &SpellEffect, entity: Option<&dyn Entity>, out: &EffectSender) {
    let location = entity.map(|e| e.location());
    if !effect.permits(entity, location.as_ref()) {
        tracing::trace!(effect = effect.name(), "emission vetoed by modifiers");
        return;
    }
    effect.variant().emit_at_entity(entity, effect.offsets(), out);
}

fn emit_at_location(
    effect: &SpellEffect,
    location: Option<&Location>,
    entity: Option<&dyn Entity>,
    placement: Placement,
    out: &EffectSender,
) {
    let placed = match (location, placement) {
        (Some(l), Placement::ApplyOffsets) => Some(effect.offsets().apply(l)),
        (Some(l), Placement::AsIs) => Some(l.clone()),
        (None, _) => None,
    };
    if !effect.permits(entity, placed.as_ref()) {
        tracing::trace!(effect = effect.name(), "emission vetoed by modifiers");
        return;
    }
    effect.variant().emit_at(placed.as_ref(), out);
}
