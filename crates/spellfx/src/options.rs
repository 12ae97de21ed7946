//! # Effect Options
//!
//! The typed options bag every effect carries, loaded from its config
//! section:
//!
//! | key | default |
//! |---|---|
//! | `height-offset` / `height-offset-expression` | 0 / `0 + height-offset` |
//! | `forward-offset` / `forward-offset-expression` | 0 / `0 + forward-offset` |
//! | `delay` | 0 ticks |
//! | `distance-between` | 1 |
//! | `effect-interval` | 20 ticks |
//! | `orbit-radius` | 1 |
//! | `orbit-seconds-per-revolution` | 3 |
//! | `orbit-counter-clockwise` | false |
//! | `orbit-tick-interval` | 2 ticks |
//! | `orbit-y-offset` | 0 |
//! | `modifiers` | none |
//!
//! Keys are read leniently: an absent or mistyped value falls back to its
//! default, a lone string counts as a one-rule `modifiers` list, and
//! negative intervals clamp to zero. Values are not otherwise range-checked;
//! the scheduler clamps periods so nothing spins.

use serde::{Deserialize, Serialize};
use spellfx_shared::constants::{ORBIT_FULL_TURN, TICKS_PER_SECOND, TICKS_PER_SECOND_F64};

use crate::config::ConfigSection;
use crate::error::EffectResult;
use crate::expression::Expression;
use crate::geometry::Offsets;

/// Section contents as written, before derived values are computed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct RawEffectOptions {
    /// Vertical shift of dispatch locations.
    pub height_offset: f64,
    /// Formula form of the height offset.
    pub height_offset_expression: Option<String>,
    /// Horizontal shift along the facing.
    pub forward_offset: f64,
    /// Formula form of the forward offset.
    pub forward_offset_expression: Option<String>,
    /// Ticks to defer emission. Zero or less plays immediately.
    pub delay: i64,
    /// Spacing of samples along a line.
    pub distance_between: f64,
    /// Period of active-on-entity emission, in ticks.
    pub effect_interval: u32,
    /// Orbit circle radius.
    pub orbit_radius: f64,
    /// Seconds per full orbit.
    pub orbit_seconds_per_revolution: f64,
    /// Orbit direction.
    pub orbit_counter_clockwise: bool,
    /// Ticks between orbit samples.
    pub orbit_tick_interval: u32,
    /// Vertical shift of the orbit plane.
    pub orbit_y_offset: f64,
    /// Cast modifier rules.
    pub modifiers: Vec<String>,
}

impl RawEffectOptions {
    /// Reads the common keys of a section, defaulting anything absent or mistyped.
    #[must_use]
    pub fn from_section(section: &ConfigSection) -> Self {
        let d = Self::default();
        Self {
            height_offset: section.get_f64("height-offset", d.height_offset),
            height_offset_expression: section.get_str("height-offset-expression").map(str::to_owned),
            forward_offset: section.get_f64("forward-offset", d.forward_offset),
            forward_offset_expression: section.get_str("forward-offset-expression").map(str::to_owned),
            delay: section.get_i64("delay", d.delay),
            distance_between: section.get_f64("distance-between", d.distance_between),
            effect_interval: section.get_u32("effect-interval", d.effect_interval),
            orbit_radius: section.get_f64("orbit-radius", d.orbit_radius),
            orbit_seconds_per_revolution: section
                .get_f64("orbit-seconds-per-revolution", d.orbit_seconds_per_revolution),
            orbit_counter_clockwise: section.get_bool("orbit-counter-clockwise", d.orbit_counter_clockwise),
            orbit_tick_interval: section.get_u32("orbit-tick-interval", d.orbit_tick_interval),
            orbit_y_offset: section.get_f64("orbit-y-offset", d.orbit_y_offset),
            modifiers: section.get_string_list("modifiers"),
        }
    }
}

impl Default for RawEffectOptions {
    fn default() -> Self {
        Self {
            height_offset: 0.0,
            height_offset_expression: None,
            forward_offset: 0.0,
            forward_offset_expression: None,
            delay: 0,
            distance_between: 1.0,
            effect_interval: TICKS_PER_SECOND,
            orbit_radius: 1.0,
            orbit_seconds_per_revolution: 3.0,
            orbit_counter_clockwise: false,
            orbit_tick_interval: 2,
            orbit_y_offset: 0.0,
            modifiers: Vec::new(),
        }
    }
}

/// Orbit settings with the cadence values derived once at load.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrbitOptions {
    /// Circle radius.
    pub radius: f64,
    /// Seconds per full revolution.
    pub seconds_per_revolution: f64,
    /// Direction of travel.
    pub counter_clockwise: bool,
    /// Ticks between samples.
    pub tick_interval: u32,
    /// Vertical shift of the orbit plane.
    pub y_offset: f64,
    /// Samples per second: `20 / tick_interval`.
    pub ticks_per_second: f64,
    /// Radians advanced per sample.
    pub distance_per_tick: f64,
    /// Samples per revolution, rounded.
    pub ticks_per_revolution: u32,
}

impl OrbitOptions {
    /// Builds orbit options and derives the cadence.
    #[must_use]
    pub fn new(
        radius: f64,
        seconds_per_revolution: f64,
        counter_clockwise: bool,
        tick_interval: u32,
        y_offset: f64,
    ) -> Self {
        let ticks_per_second = TICKS_PER_SECOND_F64 / f64::from(tick_interval);
        let samples = ticks_per_second * seconds_per_revolution;
        Self {
            radius,
            seconds_per_revolution,
            counter_clockwise,
            tick_interval,
            y_offset,
            ticks_per_second,
            distance_per_tick: ORBIT_FULL_TURN / samples,
            // float -> int `as` saturates, which is what a silly config deserves
            ticks_per_revolution: samples.round() as u32,
        }
    }
}

impl Default for OrbitOptions {
    fn default() -> Self {
        let raw = RawEffectOptions::default();
        Self::new(
            raw.orbit_radius,
            raw.orbit_seconds_per_revolution,
            raw.orbit_counter_clockwise,
            raw.orbit_tick_interval,
            raw.orbit_y_offset,
        )
    }
}

/// Loaded options of one effect. Read-only after load.
#[derive(Clone, Debug, PartialEq)]
pub struct EffectOptions {
    /// Vertical shift of dispatch locations.
    pub height_offset: f64,
    /// Loaded but not applied by dispatch; kept for variants that want it.
    pub height_offset_expression: Expression,
    /// Horizontal shift along the facing.
    pub forward_offset: f64,
    /// Loaded but not applied by dispatch; kept for variants that want it.
    pub forward_offset_expression: Expression,
    /// Ticks to defer emission.
    pub delay: u32,
    /// Spacing of line samples.
    pub distance_between: f64,
    /// Active-on-entity period in ticks.
    pub effect_interval: u32,
    /// Orbit settings.
    pub orbit: OrbitOptions,
    /// Cast modifier rules as written.
    pub modifier_rules: Vec<String>,
}

impl EffectOptions {
    /// Loads options from a section, defaulting every absent or mistyped key.
    ///
    /// # Errors
    ///
    /// Returns [`crate::EffectError::Expression`] for unparsable offset expressions.
    pub fn from_section(section: &ConfigSection) -> EffectResult<Self> {
        Self::from_raw(RawEffectOptions::from_section(section))
    }

    /// Finalizes raw options.
    ///
    /// # Errors
    ///
    /// Returns [`crate::EffectError::Expression`] for unparsable offset expressions.
    pub fn from_raw(raw: RawEffectOptions) -> EffectResult<Self> {
        let height = match raw.height_offset_expression.as_deref() {
            Some(text) => Expression::parse(text)?,
            None => Expression::constant(raw.height_offset),
        };
        let forward = match raw.forward_offset_expression.as_deref() {
            Some(text) => Expression::parse(text)?,
            None => Expression::constant(raw.forward_offset),
        };
        Ok(Self::assemble(raw, height, forward))
    }

    fn assemble(raw: RawEffectOptions, height: Expression, forward: Expression) -> Self {
        Self {
            height_offset: raw.height_offset,
            height_offset_expression: height,
            forward_offset: raw.forward_offset,
            forward_offset_expression: forward,
            delay: u32::try_from(raw.delay.max(0)).unwrap_or(u32::MAX),
            distance_between: raw.distance_between,
            effect_interval: raw.effect_interval,
            orbit: OrbitOptions::new(
                raw.orbit_radius,
                raw.orbit_seconds_per_revolution,
                raw.orbit_counter_clockwise,
                raw.orbit_tick_interval,
                raw.orbit_y_offset,
            ),
            modifier_rules: raw.modifiers,
        }
    }

    /// The scalar offsets applied at dispatch.
    #[must_use]
    pub const fn offsets(&self) -> Offsets {
        Offsets {
            height: self.height_offset,
            forward: self.forward_offset,
        }
    }

    /// Sets the scalar offsets (expressions follow).
    #[must_use]
    pub fn with_offsets(mut self, height: f64, forward: f64) -> Self {
        self.height_offset = height;
        self.forward_offset = forward;
        self.height_offset_expression = Expression::constant(height);
        self.forward_offset_expression = Expression::constant(forward);
        self
    }

    /// Sets the emission delay.
    #[must_use]
    pub fn with_delay(mut self, ticks: u32) -> Self {
        self.delay = ticks;
        self
    }

    /// Sets the line sample spacing.
    #[must_use]
    pub fn with_distance_between(mut self, distance: f64) -> Self {
        self.distance_between = distance;
        self
    }

    /// Sets the active-on-entity period.
    #[must_use]
    pub fn with_effect_interval(mut self, ticks: u32) -> Self {
        self.effect_interval = ticks;
        self
    }

    /// Replaces the orbit settings.
    #[must_use]
    pub fn with_orbit(mut self, orbit: OrbitOptions) -> Self {
        self.orbit = orbit;
        self
    }
}

impl Default for EffectOptions {
    fn default() -> Self {
        let raw = RawEffectOptions::default();
        let height = Expression::constant(raw.height_offset);
        let forward = Expression::constant(raw.forward_offset);
        Self::assemble(raw, height, forward)
    }
}
