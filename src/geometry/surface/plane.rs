use crate::error::{ConfigError, Result, TransferError};
use crate::math::{Point3, Vector3, TOLERANCE};

use super::OpticalSurface;

/// A flat mirror or obstruction through `center` with a fixed normal.
///
/// Written as a height field, so the normal must have a non-zero z
/// component: `z = c_z - (n_x (x - c_x) + n_y (y - c_y)) / n_z`.
#[derive(Debug, Clone, PartialEq)]
pub struct Plane {
    center: Point3,
    normal: Vector3,
}

impl Plane {
    /// Creates a plane through `center` with the given normal.
    ///
    /// The normal is normalized.
    ///
    /// # Errors
    ///
    /// Returns an error if the normal is zero-length or lies in the x-y plane.
    pub fn new(center: Point3, normal: Vector3) -> Result<Self> {
        let len = normal.norm();
        if !(len > TOLERANCE) {
            return Err(ConfigError::invalid("normal", len, "must be non-zero").into());
        }
        let normal = normal / len;
        if normal.z.abs() < TOLERANCE {
            return Err(ConfigError::invalid(
                "normal.z",
                normal.z,
                "plane must not contain the z axis",
            )
            .into());
        }
        Ok(Self { center, normal })
    }

    /// Returns the point the plane passes through.
    #[must_use]
    pub fn center(&self) -> &Point3 {
        &self.center
    }

    /// Returns the unit normal.
    #[must_use]
    pub fn plane_normal(&self) -> &Vector3 {
        &self.normal
    }
}

impl OpticalSurface for Plane {
    fn height(&self, x: f64, y: f64) -> f64 {
        let n = &self.normal;
        let c = &self.center;
        c.z - (n.x * (x - c.x) + n.y * (y - c.y)) / n.z
    }

    fn normal(&self, _point: &Point3) -> std::result::Result<Vector3, TransferError> {
        Ok(self.normal)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_1_SQRT_2;

    fn diagonal() -> Plane {
        Plane::new(
            Point3::new(0.0, 0.0, 0.2),
            Vector3::new(FRAC_1_SQRT_2, 0.0, -FRAC_1_SQRT_2),
        )
        .unwrap()
    }

    #[test]
    fn passes_through_center() {
        assert_relative_eq!(diagonal().height(0.0, 0.0), 0.2);
    }

    #[test]
    fn forty_five_degree_slope() {
        let p = diagonal();
        assert_relative_eq!(p.height(0.1, 0.0), 0.3, epsilon = 1e-15);
        assert_relative_eq!(p.height(0.1, 5.0), 0.3, epsilon = 1e-15);
    }

    #[test]
    fn points_satisfy_plane_equation() {
        let p = diagonal();
        let q = Point3::new(-0.04, 0.07, p.height(-0.04, 0.07));
        assert_relative_eq!((q - p.center()).dot(p.plane_normal()), 0.0, epsilon = 1e-15);
    }

    #[test]
    fn rejects_vertical_plane() {
        assert!(Plane::new(Point3::origin(), Vector3::x()).is_err());
        assert!(Plane::new(Point3::origin(), Vector3::zeros()).is_err());
    }
}
