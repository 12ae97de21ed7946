//! # SPELLFX Shared
//!
//! Value types shared by the host server and the effect engine.
//!
//! ## CRITICAL RULE
//!
//! Everything in here is a plain value. The engine clones a [`Location`]
//! before it moves it anywhere, so nothing in this crate hands out
//! interior mutability or shared ownership.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod constants;
pub mod math;

pub use constants::{ORBIT_FULL_TURN, TICKS_PER_SECOND};
pub use math::{Location, Vec3};
