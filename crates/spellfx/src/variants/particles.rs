//! Particle bursts and smoke.

use spellfx_shared::{Location, Vec3};

use crate::command::{EffectCommand, EffectSender};
use crate::config::ConfigSection;
use crate::error::{EffectError, EffectResult};
use crate::geometry;
use crate::host::Entity;
use crate::variant::EffectVariant;

use super::{no_more_tokens, parse_token};

/// Registry name -> fixed host particle.
pub const PARTICLE_PRESETS: &[(&str, &str)] = &[
    ("particlecloud", "entity_effect"),
    ("angry", "angry_villager"),
    ("hearts", "heart"),
    ("cloud", "cloud"),
    ("bluesparkle", "witch"),
    ("greensparkle", "happy_villager"),
    ("ender", "portal"),
    ("dragondeath", "dragon_breath"),
];

/// Configurable particle burst.
///
/// Shorthand: `name [count [spread [speed]]]`, or `[count [spread [speed]]]`
/// for presets whose particle is fixed. `spread` sets both axes.
#[derive(Clone, Debug, PartialEq)]
pub struct ParticlesVariant {
    particle: String,
    fixed: bool,
    count: u32,
    horizontal_spread: f64,
    vertical_spread: f64,
    speed: f64,
    line_spacing: f64,
}

impl Default for ParticlesVariant {
    fn default() -> Self {
        Self {
            particle: "explosion".to_owned(),
            fixed: false,
            count: 5,
            horizontal_spread: 0.2,
            vertical_spread: 0.2,
            speed: 0.2,
            line_spacing: 1.0,
        }
    }
}

impl ParticlesVariant {
    /// A burst whose particle name cannot be changed by config.
    #[must_use]
    pub fn preset(particle: &str) -> Self {
        Self {
            particle: particle.to_owned(),
            fixed: true,
            ..Self::default()
        }
    }

    /// Host particle name.
    #[must_use]
    pub fn particle(&self) -> &str {
        &self.particle
    }

    /// Particles per burst.
    #[must_use]
    pub fn count(&self) -> u32 {
        self.count
    }

    fn command(&self, location: &Location) -> EffectCommand {
        EffectCommand::Particles {
            location: location.clone(),
            particle: self.particle.clone(),
            count: self.count,
            horizontal_spread: self.horizontal_spread,
            vertical_spread: self.vertical_spread,
            speed: self.speed,
        }
    }
}

impl EffectVariant for ParticlesVariant {
    fn load_from_string(&mut self, raw: &str) -> EffectResult<()> {
        let mut tokens = raw.split_whitespace();
        if !self.fixed {
            let name = tokens
                .next()
                .ok_or_else(|| EffectError::InvalidConfig("particle name missing".into()))?;
            self.particle = name.to_owned();
        }
        if let Some(count) = tokens.next() {
            self.count = parse_token(count, "count")?;
        }
        if let Some(spread) = tokens.next() {
            let spread = parse_token(spread, "spread")?;
            self.horizontal_spread = spread;
            self.vertical_spread = spread;
        }
        if let Some(speed) = tokens.next() {
            self.speed = parse_token(speed, "speed")?;
        }
        no_more_tokens(tokens, "name [count [spread [speed]]]")
    }

    fn load_from_config(&mut self, section: &ConfigSection) -> EffectResult<()> {
        if !self.fixed {
            self.particle = section.get_string("particle-name", &self.particle);
        }
        self.count = section.get_u32("count", self.count);
        self.horizontal_spread = section.get_f64("horiz-spread", self.horizontal_spread);
        self.vertical_spread = section.get_f64("vert-spread", self.vertical_spread);
        self.speed = section.get_f64("speed", self.speed);
        self.line_spacing = section.get_f64("line-spacing", self.line_spacing);
        if self.particle.is_empty() {
            return Err(EffectError::InvalidConfig("particle-name is empty".into()));
        }
        Ok(())
    }

    fn emit_at(&self, location: Option<&Location>, out: &EffectSender) {
        if let Some(location) = location {
            out.emit(self.command(location));
        }
    }

    fn play_tracking_line_patterns(
        &self,
        origin: &Location,
        target: &Location,
        _origin_entity: Option<&dyn Entity>,
        _target_entity: Option<&dyn Entity>,
        out: &EffectSender,
    ) {
        for point in geometry::line_samples(origin, target, self.line_spacing, 0.0) {
            out.emit(self.command(&point));
        }
    }
}

/// Smoke flavors sharing [`SmokeVariant`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SmokeStyle {
    /// One directional puff.
    Puff,
    /// Large smoke particles.
    Big,
    /// Ring of puffs around the point.
    Swirl,
    /// Puff at a point, trail along tracking lines.
    Trail,
}

impl SmokeStyle {
    /// Every style, in registration order.
    pub const ALL: [Self; 4] = [Self::Puff, Self::Big, Self::Swirl, Self::Trail];

    /// Registry name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Puff => "smoke",
            Self::Big => "bigsmoke",
            Self::Swirl => "smokeswirl",
            Self::Trail => "smoketrail",
        }
    }
}

/// Host smoke direction pointing straight up.
pub const SMOKE_UP: u8 = 4;

const SWIRL_POINTS: u32 = 8;

/// Smoke. Shorthand: `[direction]` (0-8).
#[derive(Clone, Debug, PartialEq)]
pub struct SmokeVariant {
    style: SmokeStyle,
    direction: u8,
    count: u32,
}

impl SmokeVariant {
    /// Smoke of the given style with defaults.
    #[must_use]
    pub fn new(style: SmokeStyle) -> Self {
        Self {
            style,
            direction: SMOKE_UP,
            count: 1,
        }
    }

    /// Host direction code.
    #[must_use]
    pub fn direction(&self) -> u8 {
        self.direction
    }

    fn set_direction(&mut self, direction: i64) -> EffectResult<()> {
        match u8::try_from(direction) {
            Ok(d) if d <= 8 => {
                self.direction = d;
                Ok(())
            }
            _ => Err(EffectError::InvalidConfig(format!(
                "smoke direction {direction} outside 0-8"
            ))),
        }
    }

    fn puff(&self, location: &Location) -> EffectCommand {
        EffectCommand::Smoke {
            location: location.clone(),
            direction: self.direction,
            count: self.count,
        }
    }
}

impl EffectVariant for SmokeVariant {
    fn load_from_string(&mut self, raw: &str) -> EffectResult<()> {
        let mut tokens = raw.split_whitespace();
        if let Some(direction) = tokens.next() {
            self.set_direction(parse_token(direction, "direction")?)?;
        }
        no_more_tokens(tokens, "[direction]")
    }

    fn load_from_config(&mut self, section: &ConfigSection) -> EffectResult<()> {
        self.set_direction(section.get_i64("direction", i64::from(self.direction)))?;
        self.count = section.get_u32("count", self.count);
        Ok(())
    }

    fn emit_at(&self, location: Option<&Location>, out: &EffectSender) {
        let Some(location) = location else { return };
        match self.style {
            SmokeStyle::Puff | SmokeStyle::Trail => out.emit(self.puff(location)),
            SmokeStyle::Big => out.emit(EffectCommand::Particles {
                location: location.clone(),
                particle: "large_smoke".to_owned(),
                count: self.count.max(1).saturating_mul(4),
                horizontal_spread: 0.3,
                vertical_spread: 0.3,
                speed: 0.05,
            }),
            SmokeStyle::Swirl => {
                for i in 0..SWIRL_POINTS {
                    let angle = std::f64::consts::TAU * f64::from(i) / f64::from(SWIRL_POINTS);
                    let point = location.translated(Vec3::new(angle.cos(), 0.0, angle.sin()));
                    out.emit(self.puff(&point));
                }
            }
        }
    }

    fn play_tracking_line_patterns(
        &self,
        origin: &Location,
        target: &Location,
        _origin_entity: Option<&dyn Entity>,
        _target_entity: Option<&dyn Entity>,
        out: &EffectSender,
    ) {
        if self.style != SmokeStyle::Trail {
            return;
        }
        for point in geometry::line_samples(origin, target, 1.0, 0.0) {
            out.emit(self.puff(&point));
        }
    }
}
