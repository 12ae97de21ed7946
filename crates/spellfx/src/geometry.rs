//! # Effect Geometry
//!
//! Where emissions land. Every function here takes locations by reference
//! and returns new ones; a caller's [`Location`] is never modified.

use spellfx_shared::{Location, Vec3};

/// Scalar dispatch offsets.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Offsets {
    /// Added to Y.
    pub height: f64,
    /// Distance moved along the horizontal facing.
    pub forward: f64,
}

impl Offsets {
    /// Both offsets zero?
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.height == 0.0 && self.forward == 0.0
    }

    /// Copy of `location` shifted up by `height`, then along its facing
    /// (flattened to the horizontal plane) by `forward`.
    #[must_use]
    pub fn apply(&self, location: &Location) -> Location {
        let mut shifted = location.clone();
        if self.height != 0.0 {
            shifted.position.y += self.height;
        }
        if self.forward != 0.0 {
            let facing = location.direction().with_y(0.0).normalize();
            shifted.add(facing * self.forward);
        }
        shifted
    }
}

/// Number of samples strictly between `from` and `to` at `spacing`:
/// `ceil(distance / spacing) - 1`, never negative.
///
/// A non-positive or NaN spacing yields no samples.
#[must_use]
pub fn line_sample_count(from: &Location, to: &Location, spacing: f64) -> usize {
    if spacing.is_nan() || spacing <= 0.0 {
        return 0;
    }
    let segments = (from.distance(to) / spacing).ceil();
    if segments.is_finite() && segments > 1.0 {
        // finite and > 1 after ceil, so the cast is exact
        segments as usize - 1
    } else {
        0
    }
}

/// Samples along `from -> to`, `spacing` apart, raised by `height_offset`.
///
/// The start point itself is not yielded; the first sample is one
/// `spacing` in from `from`.
#[must_use]
pub fn line_samples(from: &Location, to: &Location, spacing: f64, height_offset: f64) -> LineSamples {
    let remaining = line_sample_count(from, to, spacing);
    let step = if remaining == 0 {
        Vec3::ZERO
    } else {
        (to.to_vector() - from.to_vector()).normalize() * spacing
    };
    let mut cursor = from.clone();
    if height_offset != 0.0 {
        cursor.position.y += height_offset;
    }
    LineSamples {
        cursor,
        step,
        remaining,
    }
}

/// Iterator returned by [`line_samples`]. Yields in order from the start.
#[derive(Clone, Debug)]
pub struct LineSamples {
    cursor: Location,
    step: Vec3,
    remaining: usize,
}

impl Iterator for LineSamples {
    type Item = Location;

    fn next(&mut self) -> Option<Location> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        self.cursor.add(self.step);
        Some(self.cursor.clone())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for LineSamples {}

/// One Euler step of circular motion in the horizontal plane.
///
/// Adds the perpendicular of `current` scaled by `step` radians, then
/// renormalizes so drift cannot grow the radius.
#[must_use]
pub fn orbit_step(current: Vec3, counter_clockwise: bool, step: f64) -> Vec3 {
    let perpendicular = if counter_clockwise {
        Vec3::new(current.z, 0.0, -current.x)
    } else {
        Vec3::new(-current.z, 0.0, current.x)
    };
    (current + perpendicular * step).normalize()
}

/// Point on the orbit: `center + (0, y_offset, 0) + unit * radius`.
#[must_use]
pub fn orbit_point(center: &Location, unit: Vec3, radius: f64, y_offset: f64) -> Location {
    center.translated(Vec3::new(0.0, y_offset, 0.0) + unit * radius)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn loc(x: f64, y: f64, z: f64) -> Location {
        Location::new("world", x, y, z)
    }

    #[test]
    fn test_zero_offsets_clone() {
        let origin = loc(1.0, 64.0, -3.0).with_rotation(33.0, 10.0);
        assert_eq!(Offsets::default().apply(&origin), origin);
    }

    #[test]
    fn test_height_and_forward_offset() {
        let origin = loc(0.0, 64.0, 0.0).with_direction(Vec3::X);
        let offsets = Offsets {
            height: 2.0,
            forward: 3.0,
        };
        let shifted = offsets.apply(&origin);
        assert!(shifted.position.distance(Vec3::new(3.0, 66.0, 0.0)) < 1e-6);
        assert_eq!(origin.position, Vec3::new(0.0, 64.0, 0.0));
    }

    #[test]
    fn test_forward_offset_ignores_pitch() {
        let origin = loc(0.0, 64.0, 0.0).with_rotation(0.0, -60.0);
        let shifted = Offsets {
            height: 0.0,
            forward: 2.0,
        }
        .apply(&origin);
        assert!(shifted.position.distance(Vec3::new(0.0, 64.0, 2.0)) < 1e-6);
    }

    #[test]
    fn test_line_count_law() {
        let a = loc(0.0, 64.0, 0.0);
        assert_eq!(line_sample_count(&a, &loc(0.0, 64.0, 10.0), 2.0), 4);
        assert_eq!(line_sample_count(&a, &loc(0.0, 64.0, 9.0), 2.0), 4);
        assert_eq!(line_sample_count(&a, &loc(0.0, 64.0, 0.5), 2.0), 0);
        assert_eq!(line_sample_count(&a, &a, 1.0), 0);
        assert_eq!(line_sample_count(&a, &loc(3.0, 64.0, 4.0), 1.0), 4);
        assert_eq!(line_sample_count(&a, &loc(0.0, 64.0, 10.0), 0.0), 0);
        assert_eq!(line_sample_count(&a, &loc(0.0, 64.0, 10.0), f64::NAN), 0);
    }

    #[test]
    fn test_line_samples_spacing_and_height() {
        let a = loc(0.0, 64.0, 0.0);
        let b = loc(0.0, 64.0, 10.0);
        let points: Vec<_> = line_samples(&a, &b, 2.0, 1.5).collect();

        assert_eq!(points.len(), 4);
        for (i, p) in points.iter().enumerate() {
            let expected = Vec3::new(0.0, 65.5, 2.0 * (i as f64 + 1.0));
            assert!(p.position.distance(expected) < EPS, "{p:?}");
        }
        for pair in points.windows(2) {
            assert!((pair[0].distance(&pair[1]) - 2.0).abs() < EPS);
        }
        assert_eq!(a.position, Vec3::new(0.0, 64.0, 0.0));
    }

    #[test]
    fn test_orbit_step_stays_on_unit_circle() {
        let mut p = Vec3::X;
        for _ in 0..1000 {
            p = orbit_step(p, false, 0.314);
            assert!((p.length() - 1.0).abs() < EPS);
            assert_eq!(p.y, 0.0);
        }
    }

    #[test]
    fn test_orbit_direction() {
        let p = Vec3::X;
        let cw = orbit_step(p, false, 0.2);
        assert!(p.cross(cw).y < 0.0);

        let ccw = orbit_step(p, true, 0.2);
        assert!(p.cross(ccw).y > 0.0);
    }

    #[test]
    fn test_orbit_point() {
        let center = loc(10.0, 64.0, 10.0);
        let p = orbit_point(&center, Vec3::Z, 2.0, 1.0);
        assert_eq!(p.position, Vec3::new(10.0, 65.0, 12.0));
    }
}
