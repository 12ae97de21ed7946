//! Mathematical types shared between the host and the effect engine.
//!
//! Positions are `f64` because the host world is large enough that `f32`
//! drifts visibly far from spawn.

use serde::{Deserialize, Serialize};

/// 3D Vector - position, offset, direction
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    /// X component
    pub x: f64,
    /// Y component (up)
    pub y: f64,
    /// Z component
    pub z: f64,
}

impl Vec3 {
    /// Creates a new Vec3
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Zero vector
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    /// Unit X vector
    pub const X: Self = Self::new(1.0, 0.0, 0.0);

    /// Unit Y vector
    pub const Y: Self = Self::new(0.0, 1.0, 0.0);

    /// Unit Z vector
    pub const Z: Self = Self::new(0.0, 0.0, 1.0);

    /// Dot product
    #[must_use]
    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Cross product
    #[must_use]
    pub fn cross(self, other: Self) -> Self {
        Self::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    /// Length squared (avoids sqrt)
    #[must_use]
    pub fn length_squared(self) -> f64 {
        self.dot(self)
    }

    /// Length
    #[must_use]
    pub fn length(self) -> f64 {
        self.length_squared().sqrt()
    }

    /// Distance to another point
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        (self - other).length()
    }

    /// Unit vector in the same direction.
    ///
    /// The zero vector normalizes to itself.
    #[must_use]
    pub fn normalize(self) -> Self {
        let len = self.length();
        if len == 0.0 {
            Self::ZERO
        } else {
            self * (1.0 / len)
        }
    }

    /// Copy with the Y component replaced.
    #[must_use]
    pub const fn with_y(self, y: f64) -> Self {
        Self::new(self.x, y, self.z)
    }

    /// Length of the horizontal (XZ) projection.
    #[must_use]
    pub fn horizontal_length(self) -> f64 {
        self.x.hypot(self.z)
    }

    /// All components finite (no NaN, no infinity).
    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl std::ops::Add for Vec3 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl std::ops::AddAssign for Vec3 {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl std::ops::Sub for Vec3 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl std::ops::Mul<f64> for Vec3 {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl std::ops::Neg for Vec3 {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

/// A point in a named world with a facing.
///
/// Facing follows the host convention: `yaw` in degrees, 0 facing +Z and
/// increasing clockwise seen from above (90 faces -X); `pitch` in degrees,
/// positive looking down.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// World the point lives in.
    pub world: String,
    /// Position in that world.
    pub position: Vec3,
    /// Horizontal rotation in degrees.
    pub yaw: f32,
    /// Vertical rotation in degrees.
    pub pitch: f32,
}

impl Location {
    /// Creates a location with zero rotation.
    #[must_use]
    pub fn new(world: impl Into<String>, x: f64, y: f64, z: f64) -> Self {
        Self::at(world, Vec3::new(x, y, z))
    }

    /// Creates a location at a position with zero rotation.
    #[must_use]
    pub fn at(world: impl Into<String>, position: Vec3) -> Self {
        Self {
            world: world.into(),
            position,
            yaw: 0.0,
            pitch: 0.0,
        }
    }

    /// Sets yaw and pitch.
    #[must_use]
    pub fn with_rotation(mut self, yaw: f32, pitch: f32) -> Self {
        self.yaw = yaw;
        self.pitch = pitch;
        self
    }

    /// Points the facing along `direction`.
    #[must_use]
    pub fn with_direction(mut self, direction: Vec3) -> Self {
        self.set_direction(direction);
        self
    }

    /// X coordinate
    #[must_use]
    pub fn x(&self) -> f64 {
        self.position.x
    }

    /// Y coordinate
    #[must_use]
    pub fn y(&self) -> f64 {
        self.position.y
    }

    /// Z coordinate
    #[must_use]
    pub fn z(&self) -> f64 {
        self.position.z
    }

    /// Unit vector of the facing.
    #[must_use]
    pub fn direction(&self) -> Vec3 {
        let yaw = f64::from(self.yaw).to_radians();
        let pitch = f64::from(self.pitch).to_radians();
        let xz = pitch.cos();
        Vec3::new(-xz * yaw.sin(), -pitch.sin(), xz * yaw.cos())
    }

    /// Rotates the facing to look along `direction`.
    ///
    /// A purely vertical direction keeps the current yaw.
    pub fn set_direction(&mut self, direction: Vec3) {
        let Vec3 { x, y, z } = direction;
        if x == 0.0 && z == 0.0 {
            self.pitch = if y > 0.0 { -90.0 } else { 90.0 };
            return;
        }

        let theta = (-x).atan2(z);
        let full = std::f64::consts::TAU;
        self.yaw = ((theta + full) % full).to_degrees() as f32;

        let xz = x.hypot(z);
        self.pitch = (-y / xz).atan().to_degrees() as f32;
    }

    /// Moves this location in place.
    pub fn add(&mut self, offset: Vec3) {
        self.position += offset;
    }

    /// Copy moved by `offset`.
    #[must_use]
    pub fn translated(&self, offset: Vec3) -> Self {
        let mut moved = self.clone();
        moved.add(offset);
        moved
    }

    /// Euclidean distance between the two positions.
    ///
    /// Worlds are not compared.
    #[must_use]
    pub fn distance(&self, other: &Self) -> f64 {
        self.position.distance(other.position)
    }

    /// Position as a vector.
    #[must_use]
    pub const fn to_vector(&self) -> Vec3 {
        self.position
    }
}
