//! # Timing Constants
//!
//! The host runs a fixed tick loop. Every interval the engine accepts is
//! expressed in these ticks.

// =============================================================================
// TICK LOOP
// =============================================================================

/// Host tick rate (ticks per second).
pub const TICKS_PER_SECOND: u32 = 20;

/// Same rate as a float, for orbit cadence math.
pub const TICKS_PER_SECOND_F64: f64 = 20.0;

// =============================================================================
// ORBIT
// =============================================================================

/// Radians in one orbit revolution.
///
/// Kept at the two-digit approximation of 2π so configured orbit speeds
/// match what existing effect configs were tuned against.
pub const ORBIT_FULL_TURN: f64 = 6.28;
