//! # Orbit Tracker
//!
//! Circles an effect around a moving entity until the entity goes away or
//! the caller's checker says stop.
//!
//! ```text
//!              start()
//!                 │
//!                 ▼
//!  ┌──────────────────────────────┐  entity invalid /       ┌──────────┐
//!  │           Running            │  checker rejects on     │          │
//!  │  every tick_interval ticks:  │──revolution boundary───>│ Stopped  │
//!  │  step unit vector, emit      │                         │          │
//!  └──────────────────────────────┘──────── stop() ────────>└──────────┘
//! ```
//!
//! The checker is consulted once per revolution (tick 0, then every
//! `ticks_per_revolution` ticks). The unit vector advances by one Euler
//! step and is renormalized, so the emission radius never drifts.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use spellfx_shared::Vec3;

use crate::dispatch::{EffectPlayer, PlayerHandle};
use crate::effect::SpellEffect;
use crate::error::EffectResult;
use crate::geometry;
use crate::host::{ActiveChecker, EntityRef};
use crate::options::OrbitOptions;
use crate::scheduler::{Scheduler, TaskId};

/// Tracker lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OrbitPhase {
    /// Ticking.
    Running,
    /// Cancelled. Terminal.
    Stopped,
}

/// Orbit cadence and shape, copied out of the effect options at start.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrbitParams {
    /// Circle radius.
    pub radius: f64,
    /// Radians per tick.
    pub distance_per_tick: f64,
    /// Ticks between active checks. Never 0.
    pub ticks_per_revolution: u64,
    /// Direction of travel.
    pub counter_clockwise: bool,
    /// Vertical shift of the orbit plane.
    pub y_offset: f64,
    /// Scheduler period.
    pub tick_interval: u32,
}

impl From<&OrbitOptions> for OrbitParams {
    fn from(options: &OrbitOptions) -> Self {
        Self {
            radius: options.radius,
            distance_per_tick: options.distance_per_tick,
            ticks_per_revolution: u64::from(options.ticks_per_revolution.max(1)),
            counter_clockwise: options.counter_clockwise,
            y_offset: options.y_offset,
            tick_interval: options.tick_interval,
        }
    }
}

struct OrbitState {
    phase: OrbitPhase,
    entity: Option<EntityRef>,
    position: Option<Vec3>,
    counter: u64,
}

struct OrbitInner {
    params: OrbitParams,
    state: RefCell<OrbitState>,
    task: Cell<Option<TaskId>>,
    scheduler: Weak<dyn Scheduler>,
}

/// Handle to a running (or finished) orbit.
///
/// Clones share the same orbit.
#[derive(Clone)]
pub struct OrbitTracker {
    inner: Rc<OrbitInner>,
}

impl OrbitTracker {
    /// Captures the entity's horizontal facing and schedules the orbit
    /// every `tick_interval` ticks, starting next tick.
    pub(crate) fn start(
        player: &EffectPlayer,
        effect: &Rc<SpellEffect>,
        entity: EntityRef,
        checker: Rc<dyn ActiveChecker>,
    ) -> EffectResult<Self> {
        let params = OrbitParams::from(&effect.options().orbit);
        let position = entity.location().direction().with_y(0.0);

        let inner = Rc::new(OrbitInner {
            params,
            state: RefCell::new(OrbitState {
                phase: OrbitPhase::Running,
                entity: Some(entity),
                position: Some(position),
                counter: 0,
            }),
            task: Cell::new(None),
            scheduler: Rc::downgrade(player.scheduler()),
        });

        let tracker = Self { inner };
        let ticking = tracker.clone();
        let handle = player.handle();
        let task_effect = Rc::clone(effect);
        let task = player.scheduler().schedule_repeating(
            Box::new(move || ticking.tick(&handle, &task_effect, checker.as_ref())),
            0,
            params.tick_interval,
        )?;
        tracker.inner.task.set(Some(task));

        tracing::debug!(
            %task,
            effect = effect.name(),
            radius = params.radius,
            ticks_per_revolution = params.ticks_per_revolution,
            "orbit started"
        );
        Ok(tracker)
    }

    fn tick(&self, handle: &PlayerHandle, effect: &Rc<SpellEffect>, checker: &dyn ActiveChecker) {
        let Some(player) = handle.attach() else {
            self.stop();
            return;
        };

        let Some(entity) = self.inner.state.borrow().entity.clone() else {
            return;
        };
        if !entity.is_valid() {
            tracing::debug!(entity = %entity.id(), "orbit entity no longer valid");
            self.stop();
            return;
        }

        let counter = {
            let mut state = self.inner.state.borrow_mut();
            let counter = state.counter;
            state.counter += 1;
            counter
        };
        if counter % self.inner.params.ticks_per_revolution == 0 && !checker.is_active(&*entity) {
            self.stop();
            return;
        }

        let params = self.inner.params;
        let next = {
            let mut state = self.inner.state.borrow_mut();
            // stopped from inside the checker
            let Some(current) = state.position else { return };
            let next = geometry::orbit_step(current, params.counter_clockwise, params.distance_per_tick);
            state.position = Some(next);
            next
        };

        let point = geometry::orbit_point(&entity.location(), next, params.radius, params.y_offset);
        if let Err(err) = player.play_at_around(effect, &point, &entity) {
            tracing::warn!(%err, effect = effect.name(), "orbit emission failed");
        }
    }

    /// Cancels the orbit. Safe to call repeatedly and from inside a tick.
    pub fn stop(&self) {
        {
            let mut state = self.inner.state.borrow_mut();
            if state.phase == OrbitPhase::Stopped {
                return;
            }
            state.phase = OrbitPhase::Stopped;
            state.entity = None;
            state.position = None;
        }

        if let Some(task) = self.inner.task.take() {
            if let Some(scheduler) = self.inner.scheduler.upgrade() {
                scheduler.cancel(task);
            }
            tracing::debug!(%task, "orbit stopped");
        }
    }

    /// Still ticking?
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.phase() == OrbitPhase::Running
    }

    /// Lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> OrbitPhase {
        self.inner.state.borrow().phase
    }

    /// Ticks that passed the validity check so far.
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.inner.state.borrow().counter
    }

    /// Scheduler task driving the orbit, until stopped.
    #[must_use]
    pub fn task_id(&self) -> Option<TaskId> {
        self.inner.task.get()
    }

    /// Current unit vector. `None` once stopped.
    #[must_use]
    pub fn position(&self) -> Option<Vec3> {
        self.inner.state.borrow().position
    }

    /// Cadence in use.
    #[must_use]
    pub fn params(&self) -> OrbitParams {
        self.inner.params
    }
}

impl fmt::Debug for OrbitTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.borrow();
        f.debug_struct("OrbitTracker")
            .field("phase", &state.phase)
            .field("counter", &state.counter)
            .field("position", &state.position)
            .field("task", &self.inner.task.get())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use spellfx_shared::Location;

    use crate::command::EffectBus;
    use crate::host::{CastContext, Entity, EntityId, ModifierSet};
    use crate::options::EffectOptions;
    use crate::scheduler::{DelayedTask, RepeatingTask, TickScheduler};
    use crate::testing::{recording_effect, recording_effect_with, test_player, TestEntity};

    /// Delegates to a [`TickScheduler`] and counts cancels.
    #[derive(Default)]
    struct CountingScheduler {
        inner: TickScheduler,
        cancels: Cell<u32>,
    }

    impl Scheduler for CountingScheduler {
        fn schedule_delayed(&self, task: DelayedTask, delay_ticks: u32) -> EffectResult<TaskId> {
            self.inner.schedule_delayed(task, delay_ticks)
        }

        fn schedule_repeating(&self, task: RepeatingTask, initial: u32, period: u32) -> EffectResult<TaskId> {
            self.inner.schedule_repeating(task, initial, period)
        }

        fn cancel(&self, id: TaskId) {
            self.cancels.set(self.cancels.get() + 1);
            self.inner.cancel(id);
        }
    }

    fn orbit_options(radius: f64, seconds: f64, ccw: bool, interval: u32, y: f64) -> EffectOptions {
        EffectOptions::default().with_orbit(OrbitOptions::new(radius, seconds, ccw, interval, y))
    }

    fn always() -> Rc<dyn ActiveChecker> {
        Rc::new(|_: &dyn Entity| true)
    }

    fn facing_south(x: f64, y: f64, z: f64) -> Location {
        Location::new("world", x, y, z).with_rotation(0.0, 0.0)
    }

    #[test]
    fn test_radius_stays_bounded() {
        let (player, sched, _bus) = test_player();
        let (effect, seen) = recording_effect(orbit_options(2.0, 3.0, false, 2, 0.5));
        let entity = TestEntity::new(7, facing_south(10.0, 64.0, 10.0));

        let tracker = player.play_while_active_orbit(&effect, entity, always()).unwrap();
        sched.advance(400);

        assert!(tracker.is_running());
        assert_eq!(seen.borrow().len(), 200);
        for point in seen.borrow().iter().flatten() {
            let horizontal = (point.position - Vec3::new(10.0, 64.0, 10.0)).horizontal_length();
            assert!((horizontal - 2.0).abs() < 1e-9, "radius drifted to {horizontal}");
            assert!((point.y() - 64.5).abs() < 1e-12);
        }
    }

    #[test]
    fn test_one_revolution_sweep() {
        let (player, sched, _bus) = test_player();
        let (effect, seen) = recording_effect(orbit_options(1.0, 1.0, false, 1, 0.0));
        let entity = TestEntity::new(1, facing_south(0.0, 64.0, 0.0));

        let tracker = player.play_while_active_orbit(&effect, entity, always()).unwrap();
        assert_eq!(tracker.params().ticks_per_revolution, 20);
        sched.advance(20);

        let units: Vec<Vec3> = seen
            .borrow()
            .iter()
            .flatten()
            .map(|l| l.position - Vec3::new(0.0, 64.0, 0.0))
            .collect();
        assert_eq!(units.len(), 20);

        let mut previous = Vec3::Z;
        let mut swept = 0.0;
        for unit in &units {
            swept += previous.dot(*unit).clamp(-1.0, 1.0).acos();
            assert!(previous.cross(*unit).y < 0.0);
            previous = *unit;
        }
        // Euler steps undershoot 6.28 slightly
        assert!((swept - std::f64::consts::TAU).abs() < 0.3, "swept {swept}");
    }

    #[test]
    fn test_counter_clockwise_direction() {
        let (player, sched, _bus) = test_player();
        let (effect, seen) = recording_effect(orbit_options(1.0, 3.0, true, 2, 0.0));
        let entity = TestEntity::new(1, facing_south(0.0, 64.0, 0.0));

        let _tracker = player.play_while_active_orbit(&effect, entity, always()).unwrap();
        sched.advance(10);

        let points: Vec<Vec3> = seen.borrow().iter().flatten().map(|l| l.position.with_y(0.0)).collect();
        assert!(points.len() >= 2);
        for pair in points.windows(2) {
            assert!(pair[0].cross(pair[1]).y > 0.0);
        }
    }

    #[test]
    fn test_checker_rejection_cancels_once() {
        let sched = Rc::new(CountingScheduler::default());
        let bus = EffectBus::new(64);
        let player = EffectPlayer::new(sched.clone(), bus.sender());
        let (effect, seen) = recording_effect(orbit_options(1.0, 1.0, false, 1, 0.0));
        let entity = TestEntity::new(1, facing_south(0.0, 64.0, 0.0));

        let calls = Rc::new(Cell::new(0u32));
        let c = Rc::clone(&calls);
        let checker: Rc<dyn ActiveChecker> = Rc::new(move |_: &dyn Entity| {
            c.set(c.get() + 1);
            c.get() == 1
        });

        let tracker = player.play_while_active_orbit(&effect, entity, checker).unwrap();
        sched.inner.advance(21);

        assert_eq!(calls.get(), 2);
        assert_eq!(seen.borrow().len(), 20);
        assert_eq!(tracker.phase(), OrbitPhase::Stopped);
        assert_eq!(sched.cancels.get(), 1);
        assert_eq!(sched.inner.pending(), 0);

        tracker.stop();
        sched.inner.advance(40);
        assert_eq!(sched.cancels.get(), 1);
        assert_eq!(seen.borrow().len(), 20);
    }

    #[test]
    fn test_invalid_entity_stops_without_emitting() {
        let (player, sched, _bus) = test_player();
        let (effect, seen) = recording_effect(orbit_options(1.0, 3.0, false, 2, 0.0));
        let entity = TestEntity::new(3, facing_south(0.0, 64.0, 0.0));

        let tracker = player.play_while_active_orbit(&effect, entity.clone(), always()).unwrap();
        sched.advance(4);
        assert_eq!(seen.borrow().len(), 2);

        entity.set_valid(false);
        sched.advance(4);
        assert!(!tracker.is_running());
        assert_eq!(seen.borrow().len(), 2);
        assert_eq!(tracker.ticks(), 2);
        assert!(tracker.position().is_none());
        assert_eq!(sched.pending(), 0);
    }

    #[test]
    fn test_follows_moving_entity() {
        let (player, sched, _bus) = test_player();
        let (effect, seen) = recording_effect(orbit_options(1.0, 3.0, false, 1, 0.0));
        let entity = TestEntity::new(3, facing_south(0.0, 64.0, 0.0));

        let _tracker = player.play_while_active_orbit(&effect, entity.clone(), always()).unwrap();
        sched.tick();
        entity.move_to(facing_south(100.0, 70.0, 0.0));
        sched.tick();

        let last = seen.borrow().last().cloned().flatten().unwrap();
        assert!(((last.position - Vec3::new(100.0, 70.0, 0.0)).horizontal_length() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_explicit_stop_is_idempotent() {
        let sched = Rc::new(CountingScheduler::default());
        let bus = EffectBus::new(64);
        let player = EffectPlayer::new(sched.clone(), bus.sender());
        let (effect, seen) = recording_effect(orbit_options(1.0, 3.0, false, 2, 0.0));
        let entity = TestEntity::new(3, facing_south(0.0, 64.0, 0.0));

        let tracker = player.play_while_active_orbit(&effect, entity, always()).unwrap();
        let task = tracker.task_id().unwrap();
        sched.inner.advance(2);

        tracker.stop();
        tracker.clone().stop();
        assert_eq!(sched.cancels.get(), 1);
        assert!(!sched.inner.is_scheduled(task));
        assert!(tracker.task_id().is_none());

        sched.inner.advance(10);
        assert_eq!(seen.borrow().len(), 1);
    }

    #[test]
    fn test_vertical_facing_still_orbits() {
        let (player, sched, _bus) = test_player();
        let (effect, seen) = recording_effect(orbit_options(1.0, 3.0, false, 1, 0.0));
        let up = Location::new("world", 0.0, 64.0, 0.0).with_rotation(0.0, -90.0);
        let entity = TestEntity::new(3, up);

        let _tracker = player.play_while_active_orbit(&effect, entity, always()).unwrap();
        sched.advance(3);

        for point in seen.borrow().iter().flatten() {
            assert!(point.position.is_finite());
            let horizontal = (point.position - Vec3::new(0.0, 64.0, 0.0)).horizontal_length();
            assert!((horizontal - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_short_revolution_never_zero() {
        let params = OrbitParams::from(&OrbitOptions::new(1.0, 0.01, false, 2, 0.0));
        assert_eq!(params.ticks_per_revolution, 1);
    }

    struct CasterOnly(EntityId);

    impl ModifierSet for CasterOnly {
        fn accepts(&self, context: &CastContext<'_>) -> bool {
            context.entity.map(|e| e.id()) == Some(self.0)
        }
    }

    #[test]
    fn test_modifiers_see_orbit_entity() {
        let (player, sched, _bus) = test_player();
        let (effect, seen) = recording_effect_with(
            orbit_options(1.0, 3.0, false, 2, 0.0),
            Some(Rc::new(CasterOnly(EntityId(9)))),
        );
        let entity = TestEntity::new(9, facing_south(0.0, 64.0, 0.0));

        let _tracker = player.play_while_active_orbit(&effect, entity, always()).unwrap();
        sched.advance(10);

        assert_eq!(seen.borrow().len(), 5);
    }
}
