use crate::error::{ConfigError, Result, TransferError};
use crate::math::{Point3, Vector3, TOLERANCE};

use super::OpticalSurface;

/// A hyperboloidal Cassegrain secondary sharing the primary's focus.
///
/// `z = sqrt((x^2 + y^2) / (e^2 - 1) + (f + b)^2 / (4 e^2)) - (v - f/2 + b/2)`
///
/// where `e` is the eccentricity, `f` the primary focal length, `b` the
/// distance of the final focus behind the primary vertex and `v` the primary
/// vertex depth. The normal returned points towards +z; reflection does not
/// depend on its sign.
#[derive(Debug, Clone, PartialEq)]
pub struct Hyperboloid {
    eccentricity: f64,
    focal_length: f64,
    back_distance: f64,
    vertex_distance: f64,
}

impl Hyperboloid {
    /// Creates the secondary.
    ///
    /// # Errors
    ///
    /// Returns an error if `e <= 1` (not a hyperbola) or `f` is not positive.
    pub fn new(
        eccentricity: f64,
        focal_length: f64,
        back_distance: f64,
        vertex_distance: f64,
    ) -> Result<Self> {
        if !(eccentricity > 1.0 + TOLERANCE) {
            return Err(ConfigError::invalid(
                "eccentricity",
                eccentricity,
                "must exceed 1 for a hyperboloid",
            )
            .into());
        }
        if !(focal_length > TOLERANCE) {
            return Err(ConfigError::invalid(
                "focal_length",
                focal_length,
                "must be positive",
            )
            .into());
        }
        Ok(Self {
            eccentricity,
            focal_length,
            back_distance,
            vertex_distance,
        })
    }

    /// Returns the eccentricity.
    #[must_use]
    pub fn eccentricity(&self) -> f64 {
        self.eccentricity
    }

    fn e2m1(&self) -> f64 {
        self.eccentricity * self.eccentricity - 1.0
    }

    /// `(x^2 + y^2) / (e^2 - 1) + (f + b)^2 / (4 e^2)`
    fn radicand(&self, r2: f64) -> f64 {
        let fb = self.focal_length + self.back_distance;
        r2 / self.e2m1() + fb * fb / (4.0 * self.eccentricity * self.eccentricity)
    }
}

impl OpticalSurface for Hyperboloid {
    fn height(&self, x: f64, y: f64) -> f64 {
        let offset =
            self.vertex_distance - self.focal_length / 2.0 + self.back_distance / 2.0;
        self.radicand(x * x + y * y).sqrt() - offset
    }

    fn normal(&self, point: &Point3) -> std::result::Result<Vector3, TransferError> {
        let (x, y) = (point.x, point.y);
        let r2 = x * x + y * y;
        let e2m1 = self.e2m1();
        let q = self.radicand(r2);
        let sq = q.sqrt();
        let norm = (e2m1 * e2m1 + r2 / q).sqrt();
        Ok(Vector3::new(-x / sq / norm, -y / sq / norm, e2m1 / norm))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn secondary() -> Hyperboloid {
        Hyperboloid::new(23.0 / 17.0, 3.0, 0.1, 4.0).unwrap()
    }

    #[test]
    fn vertex_height() {
        let e = 23.0 / 17.0;
        let expected = 3.1 / (2.0 * e) - (4.0 - 1.5 + 0.05);
        assert_relative_eq!(secondary().height(0.0, 0.0), expected, epsilon = 1e-15);
    }

    #[test]
    fn sits_between_primary_vertex_and_focus() {
        let z = secondary().height(0.0, 0.0);
        assert!(z > -4.0 && z < -1.0);
    }

    #[test]
    fn normal_matches_gradient() {
        let s = secondary();
        let (x, y) = (0.05, 0.08);
        let h = 1e-6;
        let dzdx = (s.height(x + h, y) - s.height(x - h, y)) / (2.0 * h);
        let dzdy = (s.height(x, y + h) - s.height(x, y - h)) / (2.0 * h);
        let expected = Vector3::new(-dzdx, -dzdy, 1.0).normalize();
        let n = s.normal(&Point3::new(x, y, s.height(x, y))).unwrap();
        assert_relative_eq!(n, expected, epsilon = 1e-8);
    }

    #[test]
    fn rejects_ellipse() {
        assert!(Hyperboloid::new(0.8, 3.0, 0.1, 4.0).is_err());
        assert!(Hyperboloid::new(1.0, 3.0, 0.1, 4.0).is_err());
    }
}
