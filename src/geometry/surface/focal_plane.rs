use crate::error::TransferError;
use crate::math::{Point3, Vector3};

use super::OpticalSurface;

/// The flat Cassegrain focal plane at `z = -(v + b)`.
#[derive(Debug, Clone, PartialEq)]
pub struct FocalPlane {
    depth: f64,
}

impl FocalPlane {
    /// Creates the focal plane `b` behind a primary vertex at depth `v`.
    #[must_use]
    pub fn new(vertex_distance: f64, back_distance: f64) -> Self {
        Self {
            depth: vertex_distance + back_distance,
        }
    }

    /// Depth of the plane below the origin.
    #[must_use]
    pub fn depth(&self) -> f64 {
        self.depth
    }
}

impl OpticalSurface for FocalPlane {
    fn height(&self, _x: f64, _y: f64) -> f64 {
        -self.depth
    }

    fn normal(&self, _point: &Point3) -> Result<Vector3, TransferError> {
        Ok(Vector3::z())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn flat_at_depth() {
        let fp = FocalPlane::new(4.0, 0.1);
        assert_eq!(fp.height(0.0, 0.0), -4.1);
        assert_eq!(fp.height(1.0, -3.0), -4.1);
        assert_eq!(fp.normal(&Point3::origin()).unwrap(), Vector3::z());
    }
}
