use crate::math::{Point3, Vector3};

/// A single ray of light.
///
/// Position is in metres, wavelength in Angstroms. The direction is kept at
/// unit length: constructors normalize it and every transfer operator
/// renormalizes its output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// Current position.
    pub position: Point3,
    /// Unit propagation direction.
    pub direction: Vector3,
    /// Wavelength in Angstroms.
    pub wavelength: f64,
    /// Set once the ray stops participating in later stages.
    pub lost: bool,
}

impl Ray {
    /// Creates a live ray. The direction is normalized.
    #[must_use]
    pub fn new(position: Point3, direction: Vector3, wavelength: f64) -> Self {
        Self {
            position,
            direction: direction.normalize(),
            wavelength,
            lost: false,
        }
    }

    /// Point reached after travelling `t` along the direction.
    #[inline]
    #[must_use]
    pub fn at(&self, t: f64) -> Point3 {
        self.position + self.direction * t
    }

    /// Moves the ray `t` along its direction.
    #[inline]
    pub fn advance(&mut self, t: f64) {
        self.position += self.direction * t;
    }

    /// Whether the ray is still being traced.
    #[inline]
    #[must_use]
    pub fn is_alive(&self) -> bool {
        !self.lost
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn new_normalizes_direction() {
        let ray = Ray::new(Point3::origin(), Vector3::new(3.0, 0.0, -4.0), 1500.0);
        assert_relative_eq!(ray.direction.norm(), 1.0, epsilon = 1e-15);
        assert_relative_eq!(ray.direction.x, 0.6, epsilon = 1e-15);
        assert!(ray.is_alive());
    }

    #[test]
    fn advance_matches_at() {
        let mut ray = Ray::new(
            Point3::new(0.1, -0.2, 0.0),
            Vector3::new(0.01, 0.02, -1.0),
            1200.0,
        );
        let expected = ray.at(3.7);
        ray.advance(3.7);
        assert_eq!(ray.position, expected);
    }
}
