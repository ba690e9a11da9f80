use crate::error::{ConfigError, Result, TransferError};
use crate::math::{Point3, Vector3, TOLERANCE};

use super::OpticalSurface;

/// A paraboloidal primary mirror opening towards +z.
///
/// `z = (x^2 + y^2) / (4f) - v`, so the vertex sits at `z = -v` and the
/// focus at `z = f - v`.
#[derive(Debug, Clone, PartialEq)]
pub struct Paraboloid {
    focal_length: f64,
    vertex_distance: f64,
}

impl Paraboloid {
    /// Creates a paraboloid with focal length `f` and vertex `v` below the origin.
    ///
    /// # Errors
    ///
    /// Returns an error if the focal length is not positive.
    pub fn new(focal_length: f64, vertex_distance: f64) -> Result<Self> {
        if !(focal_length > TOLERANCE) {
            return Err(ConfigError::invalid(
                "focal_length",
                focal_length,
                "must be positive",
            )
            .into());
        }
        Ok(Self {
            focal_length,
            vertex_distance,
        })
    }

    /// Returns the focal length.
    #[must_use]
    pub fn focal_length(&self) -> f64 {
        self.focal_length
    }

    /// Returns the vertex depth below the origin.
    #[must_use]
    pub fn vertex_distance(&self) -> f64 {
        self.vertex_distance
    }
}

impl OpticalSurface for Paraboloid {
    fn height(&self, x: f64, y: f64) -> f64 {
        (x * x + y * y) / (4.0 * self.focal_length) - self.vertex_distance
    }

    fn normal(&self, point: &Point3) -> std::result::Result<Vector3, TransferError> {
        let (x, y) = (point.x, point.y);
        let f2 = 2.0 * self.focal_length;
        let norm = (x * x + y * y + f2 * f2).sqrt();
        Ok(Vector3::new(-x / norm, -y / norm, f2 / norm))
    }
}
