use std::f64::consts::FRAC_PI_2;

use crate::error::{ConfigError, Result, TransferError};
use crate::math::{Bracket, Point3, Vector3, TOLERANCE};

use super::{unit_or_degenerate, OpticalSurface};

/// A half-cylinder detector bent to the Rowland circle.
///
/// The cylinder axis runs along y through `(x0, 0, z0)` with
/// `x0 = -(R/2) sin(alpha)` and `z0 = -(v + b) - (R/2) cos(alpha)`, so the
/// circle of diameter `R` passes through both the Cassegrain focus and the
/// grating pole. The active surface is the upper half:
/// `z = z0 + sqrt((R/2)^2 - (x - x0)^2)`.
#[derive(Debug, Clone, PartialEq)]
pub struct CylindricalDetector {
    radius: f64,
    tilt: f64,
    axis: Point3,
}

/// Position of a point in the detector's own unrolled frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectorPoint {
    /// Arc length along the curved face, measured from the grating-pole side.
    pub along: f64,
    /// Distance along the cylinder axis.
    pub across: f64,
    /// Height above the detector face, positive towards the axis.
    pub height: f64,
}

impl CylindricalDetector {
    /// Creates the detector for a grating of radius `R` tilted by `alpha`.
    ///
    /// # Errors
    ///
    /// Returns an error if the grating radius is not positive.
    pub fn new(
        grating_radius: f64,
        tilt: f64,
        vertex_distance: f64,
        back_distance: f64,
    ) -> Result<Self> {
        if !(grating_radius > TOLERANCE) {
            return Err(
                ConfigError::invalid("rowland_diameter", grating_radius, "must be positive")
                    .into(),
            );
        }
        let radius = grating_radius / 2.0;
        let axis = Point3::new(
            -radius * tilt.sin(),
            0.0,
            -(vertex_distance + back_distance) - radius * tilt.cos(),
        );
        Ok(Self { radius, tilt, axis })
    }

    /// Returns the cylinder radius `R/2`.
    #[must_use]
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Returns the point where the cylinder axis crosses `y = 0`.
    #[must_use]
    pub fn axis(&self) -> &Point3 {
        &self.axis
    }

    /// Maps a point in instrument coordinates onto the unrolled detector.
    #[must_use]
    pub fn unroll(&self, point: &Point3) -> DetectorPoint {
        let dx = point.x - self.axis.x;
        let dz = point.z - self.axis.z;
        let height = self.radius - dx.hypot(dz);
        let along = (self.radius - height) * (FRAC_PI_2 + self.tilt - dz.atan2(dx));
        DetectorPoint {
            along,
            across: point.y,
            height,
        }
    }
}

impl OpticalSurface for CylindricalDetector {
    fn height(&self, x: f64, _y: f64) -> f64 {
        let dx = x - self.axis.x;
        self.axis.z + (self.radius * self.radius - dx * dx).sqrt()
    }

    /// Points from the face towards the cylinder axis.
    fn normal(&self, point: &Point3) -> std::result::Result<Vector3, TransferError> {
        unit_or_degenerate(Vector3::new(
            self.axis.x - point.x,
            0.0,
            self.axis.z - point.z,
        ))
    }

    fn default_bracket(&self) -> Bracket {
        Bracket::ROWLAND
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn alpha() -> f64 {
        0.576_f64.asin()
    }

    fn detector() -> CylindricalDetector {
        CylindricalDetector::new(2.0, alpha(), 4.0, 0.1).unwrap()
    }

    #[test]
    fn passes_through_cassegrain_focus() {
        assert_relative_eq!(detector().height(0.0, 0.3), -4.1, epsilon = 1e-14);
    }

    #[test]
    fn focus_unrolls_to_r_alpha() {
        let d = detector();
        let p = d.unroll(&Point3::new(0.0, 0.25, -4.1));
        assert_relative_eq!(p.height, 0.0, epsilon = 1e-14);
        assert_relative_eq!(p.along, 2.0 * alpha(), epsilon = 1e-14);
        assert_eq!(p.across, 0.25);
    }

    #[test]
    fn top_of_cylinder_unrolls_to_half_r_alpha() {
        let d = detector();
        let top = Point3::new(d.axis().x, 0.0, d.height(d.axis().x, 0.0));
        let p = d.unroll(&top);
        assert_relative_eq!(p.along, alpha(), epsilon = 1e-14);
    }

    #[test]
    fn normal_points_down_to_axis() {
        let d = detector();
        let p = Point3::new(-0.1, 0.4, d.height(-0.1, 0.4));
        let n = d.normal(&p).unwrap();
        assert_relative_eq!(n.norm(), 1.0, epsilon = 1e-15);
        assert_eq!(n.y, 0.0);
        assert!(n.z < 0.0);
        assert_relative_eq!(p + n * d.radius(), Point3::new(d.axis().x, 0.4, d.axis().z), epsilon = 1e-14);
    }

    #[test]
    fn narrow_bracket() {
        assert_eq!(detector().default_bracket(), Bracket::ROWLAND);
    }
}
