//! # Effect Scenario Tests
//!
//! Drives configured effects end to end: TOML section in, registry, player
//! and tick scheduler in the middle, effect commands out.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use spellfx::{
    Audience, CastContext, ConfigSection, EffectBus, EffectCommand, EffectError, EffectPlayer,
    EffectRegistry, EffectResult, Entity, EntityId, Location, ModifierParser, ModifierSet,
    NoModifiers, SpellEffect, TickScheduler, Vec3,
};

struct Mob {
    id: EntityId,
    location: RefCell<Location>,
    alive: Cell<bool>,
}

impl Mob {
    fn spawn(id: u64, x: f64, y: f64, z: f64) -> Rc<Self> {
        Rc::new(Self {
            id: EntityId(id),
            location: RefCell::new(Location::new("world", x, y, z)),
            alive: Cell::new(true),
        })
    }
}

impl Entity for Mob {
    fn id(&self) -> EntityId {
        self.id
    }

    fn location(&self) -> Location {
        self.location.borrow().clone()
    }

    fn is_valid(&self) -> bool {
        self.alive.get()
    }
}

/// Accepts `min-y <n>` rules: the emission must land at or above `n`.
struct MinHeightParser;

struct MinHeight(f64);

impl ModifierSet for MinHeight {
    fn accepts(&self, context: &CastContext<'_>) -> bool {
        context.location.map_or(false, |l| l.y() >= self.0)
    }
}

impl ModifierParser for MinHeightParser {
    fn parse(&self, rules: &[String]) -> EffectResult<Rc<dyn ModifierSet>> {
        let mut floor = f64::NEG_INFINITY;
        for rule in rules {
            let value = rule
                .strip_prefix("min-y ")
                .and_then(|v| v.trim().parse::<f64>().ok())
                .ok_or_else(|| EffectError::InvalidConfig(format!("unknown modifier '{rule}'")))?;
            floor = floor.max(value);
        }
        Ok(Rc::new(MinHeight(floor)))
    }
}

struct Harness {
    registry: EffectRegistry,
    scheduler: Rc<TickScheduler>,
    bus: EffectBus,
    player: EffectPlayer,
}

impl Harness {
    fn new() -> Self {
        let scheduler = Rc::new(TickScheduler::new());
        let bus = EffectBus::new(1024);
        let player = EffectPlayer::new(scheduler.clone(), bus.sender());
        Self {
            registry: EffectRegistry::with_builtins(),
            scheduler,
            bus,
            player,
        }
    }

    fn load(&self, toml: &str) -> Rc<SpellEffect> {
        let section = ConfigSection::from_toml_str(toml).unwrap();
        Rc::new(self.registry.load_effect(&section, &MinHeightParser).unwrap())
    }

    fn drain(&self) -> Vec<EffectCommand> {
        self.bus.receiver().drain()
    }
}

/// Test: a particle line lands every `distance-between` blocks, start excluded.
#[test]
fn test_particle_line_spacing() {
    let h = Harness::new();
    let effect = h.load(
        r#"
        effect = "particles"
        particle-name = "flame"
        distance-between = 2
        "#,
    );

    let from = Location::new("world", 0.0, 64.0, 0.0);
    let to = Location::new("world", 0.0, 64.0, 10.0);
    assert_eq!(h.player.play_line(&effect, &from, &to).unwrap(), 4);

    let zs: Vec<f64> = h.drain().iter().filter_map(EffectCommand::location).map(Location::z).collect();
    assert_eq!(zs.len(), 4);
    for (z, want) in zs.iter().zip([2.0, 4.0, 6.0, 8.0]) {
        assert!((z - want).abs() < 1e-9, "sample at z={z}, expected {want}");
    }
}

/// Test: a delayed sound fires on exactly the configured tick.
#[test]
fn test_delayed_sound() {
    let h = Harness::new();
    let effect = h.load(
        r#"
        effect = "sound"
        sound = "entity.blaze.shoot"
        delay = 5
        "#,
    );

    h.player.play_at(&effect, Some(&Location::new("world", 1.0, 64.0, 1.0))).unwrap();
    assert!(h.drain().is_empty());

    h.scheduler.advance(4);
    assert!(h.drain().is_empty());

    h.scheduler.tick();
    let commands = h.drain();
    assert_eq!(commands.len(), 1);
    assert!(matches!(&commands[0], EffectCommand::Sound { sound, .. } if sound == "entity.blaze.shoot"));
}

/// Test: offsets move the emission; the caller's location is untouched.
#[test]
fn test_offsets_from_config() {
    let h = Harness::new();
    let effect = h.load(
        r#"
        effect = "lightning"
        height-offset = 2
        forward-offset = 3
        "#,
    );

    let caster = Location::new("world", 0.0, 64.0, 0.0).with_direction(Vec3::X);
    h.player.play_at(&effect, Some(&caster)).unwrap();

    let hit = h.drain()[0].location().cloned().unwrap();
    assert!(hit.position.distance(Vec3::new(3.0, 66.0, 0.0)) < 1e-9);
    assert_eq!(caster.position, Vec3::new(0.0, 64.0, 0.0));
}

/// Test: modifiers veto single emissions by where they land.
#[test]
fn test_modifier_gate() {
    let h = Harness::new();
    let effect = h.load(
        r#"
        effect = "explosion"
        modifiers = ["min-y 70"]
        "#,
    );
    assert!(effect.has_modifiers());

    h.player.play_at(&effect, Some(&Location::new("world", 0.0, 64.0, 0.0))).unwrap();
    h.player.play_at(&effect, Some(&Location::new("world", 0.0, 80.0, 0.0))).unwrap();

    let ys: Vec<f64> = h.drain().iter().filter_map(EffectCommand::location).map(Location::y).collect();
    assert_eq!(ys, vec![80.0]);
}

/// Test: a rule the host cannot parse fails the load.
#[test]
fn test_unparsable_modifier_fails_load() {
    let h = Harness::new();
    let section = ConfigSection::from_toml_str(
        r#"
        effect = "smoke"
        modifiers = "always"
        "#,
    )
    .unwrap();
    assert!(matches!(
        h.registry.load_effect(&section, &MinHeightParser),
        Err(EffectError::InvalidConfig(_))
    ));
    assert!(h.registry.load_effect(&section, &NoModifiers).is_err());
}

/// Test: mistyped option values fall back to their defaults.
#[test]
fn test_mistyped_option() {
    let h = Harness::new();
    let section = ConfigSection::from_toml_str(
        r#"
        effect = "smoke"
        delay = "soon"
        "#,
    )
    .unwrap();
    let effect = Rc::new(h.registry.load_effect(&section, &NoModifiers).unwrap());
    assert_eq!(effect.options().delay, 0);

    h.player.play_at(&effect, Some(&Location::new("world", 0.0, 64.0, 0.0))).unwrap();
    assert_eq!(h.drain().len(), 1);
}

/// Test: a single rule string is read as a one-rule list.
#[test]
fn test_single_modifier_string() {
    let h = Harness::new();
    let effect = h.load(
        r#"
        effect = "explosion"
        modifiers = "min-y 70"
        "#,
    );
    assert_eq!(effect.options().modifier_rules, vec!["min-y 70"]);

    h.player.play_at(&effect, Some(&Location::new("world", 0.0, 64.0, 0.0))).unwrap();
    assert!(h.drain().is_empty());
}

/// Test: offset expressions load and resolve but the scalar offset is what plays.
#[test]
fn test_offset_expression_loaded() {
    let h = Harness::new();
    let effect = h.load(
        r#"
        effect = "lightning"
        height-offset-expression = "1 + 2 * 3"
        "#,
    );
    assert_eq!(effect.options().height_offset_expression.resolve(), 7.0);
    assert_eq!(effect.options().height_offset, 0.0);
    assert_eq!(effect.options().forward_offset_expression.source(), "0 + 0");
}

/// Test: personal sound on a repeating session reaches only its entity.
#[test]
fn test_active_personal_sound() {
    let h = Harness::new();
    let effect = h.load(
        r#"
        effect = "soundpersonal"
        sound = "block.beacon.ambient"
        effect-interval = 10
        "#,
    );
    let mob = Mob::spawn(5, 0.0, 64.0, 0.0);

    let task = h
        .player
        .play_while_active_on_entity(&effect, mob, Rc::new(|_: &dyn Entity| true))
        .unwrap();
    h.scheduler.advance(30);

    let commands = h.drain();
    assert_eq!(commands.len(), 3);
    for command in &commands {
        assert!(matches!(command, EffectCommand::Sound { listener: Some(EntityId(5)), .. }));
    }

    h.player.cancel(task);
    h.scheduler.advance(30);
    assert!(h.drain().is_empty());
}

/// Test: an orbit runs one full revolution, then stops when the checker says so.
#[test]
fn test_orbit_one_revolution_then_stop() {
    let h = Harness::new();
    let effect = h.load(
        r#"
        effect = "hearts"
        orbit-radius = 1.5
        orbit-y-offset = 1
        "#,
    );
    let mob = Mob::spawn(8, 10.0, 64.0, 10.0);

    let checks = Rc::new(Cell::new(0u32));
    let c = Rc::clone(&checks);
    let tracker = h
        .player
        .play_while_active_orbit(
            &effect,
            mob,
            Rc::new(move |_: &dyn Entity| {
                c.set(c.get() + 1);
                c.get() == 1
            }),
        )
        .unwrap();

    // 3 s per revolution at every 2nd tick: 30 samples, then the check fails
    h.scheduler.advance(100);
    assert!(!tracker.is_running());
    assert_eq!(checks.get(), 2);

    let commands = h.drain();
    assert_eq!(commands.len(), 30);
    for command in &commands {
        let l = command.location().unwrap();
        let horizontal = (l.position - Vec3::new(10.0, 64.0, 10.0)).horizontal_length();
        assert!((horizontal - 1.5).abs() < 1e-9);
        assert!((l.y() - 65.0).abs() < 1e-12);
    }
    assert_eq!(h.scheduler.pending(), 0);
}

/// Test: the orbit ends the tick its entity despawns.
#[test]
fn test_orbit_entity_despawn() {
    let h = Harness::new();
    let effect = h.load(r#"effect = "smoke""#);
    let mob = Mob::spawn(2, 0.0, 64.0, 0.0);

    let tracker = h
        .player
        .play_while_active_orbit(&effect, mob.clone(), Rc::new(|_: &dyn Entity| true))
        .unwrap();
    h.scheduler.advance(10);
    let before = h.drain().len();
    assert_eq!(before, 5);

    mob.alive.set(false);
    h.scheduler.advance(10);
    assert!(h.drain().is_empty());
    assert!(!tracker.is_running());
}

/// Test: broadcast without a location still reaches everyone.
#[test]
fn test_broadcast_without_location() {
    let h = Harness::new();
    let effect = h.load(
        r#"
        effect = "broadcast"
        message = "The storm gathers"
        range = 32
        "#,
    );
    h.player.play_at(&effect, None).unwrap();
    assert!(matches!(
        h.drain().as_slice(),
        [EffectCommand::Text { audience: Audience::Everyone, .. }]
    ));
}

/// Test: shorthand strings configure variants built by name.
#[test]
fn test_shorthand_load() {
    let h = Harness::new();
    let mut effect = h.registry.create("PARTICLES").unwrap();
    effect.load_from_string("crit 8 0.1 0").unwrap();
    let effect = Rc::new(effect);

    h.player.play_at(&effect, Some(&Location::new("world", 0.0, 64.0, 0.0))).unwrap();
    assert!(matches!(
        h.drain().as_slice(),
        [EffectCommand::Particles { particle, count: 8, .. }] if particle == "crit"
    ));
}
