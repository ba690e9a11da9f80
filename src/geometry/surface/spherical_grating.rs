use crate::error::{ConfigError, Result, TransferError};
use crate::math::{Point3, Vector3, TOLERANCE};

use super::{unit_or_degenerate, OpticalSurface};

/// A concave spherical grating on a Rowland circle.
///
/// The centre of curvature sits on the Cassegrain focal plane at
/// `(-R sin(alpha), 0, -(v + b))`, so the grating pole lies at the origin's
/// x coordinate and the beam arrives at incidence angle `alpha`. The surface
/// is the lower cap of the sphere:
/// `z = z0 - sqrt(R^2 - (x - x0)^2 - (y - y0)^2)`.
#[derive(Debug, Clone, PartialEq)]
pub struct SphericalGrating {
    radius: f64,
    tilt: f64,
    center: Point3,
}

impl SphericalGrating {
    /// Creates the grating from its radius of curvature `R`, tilt `alpha`
    /// (radians) and the telescope's `v` and `b`.
    ///
    /// # Errors
    ///
    /// Returns an error if the radius is not positive.
    pub fn new(radius: f64, tilt: f64, vertex_distance: f64, back_distance: f64) -> Result<Self> {
        if !(radius > TOLERANCE) {
            return Err(ConfigError::invalid("radius", radius, "must be positive").into());
        }
        let center = Point3::new(
            -radius * tilt.sin(),
            0.0,
            -(vertex_distance + back_distance),
        );
        Ok(Self {
            radius,
            tilt,
            center,
        })
    }

    /// Returns the radius of curvature.
    #[must_use]
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Returns the tilt angle in radians.
    #[must_use]
    pub fn tilt(&self) -> f64 {
        self.tilt
    }

    /// Returns the centre of curvature.
    #[must_use]
    pub fn center(&self) -> &Point3 {
        &self.center
    }
}

impl OpticalSurface for SphericalGrating {
    fn height(&self, x: f64, y: f64) -> f64 {
        let dx = x - self.center.x;
        let dy = y - self.center.y;
        self.center.z - (self.radius * self.radius - dx * dx - dy * dy).sqrt()
    }

    /// Points from the surface towards the centre of curvature.
    fn normal(&self, point: &Point3) -> std::result::Result<Vector3, TransferError> {
        unit_or_degenerate(self.center - point)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn grating() -> SphericalGrating {
        SphericalGrating::new(2.0, 0.576_f64.asin(), 4.0, 0.1).unwrap()
    }

    #[test]
    fn pole_is_on_axis() {
        let g = grating();
        let alpha = 0.576_f64.asin();
        assert_relative_eq!(g.height(0.0, 0.0), -4.1 - 2.0 * alpha.cos(), epsilon = 1e-14);
    }

    #[test]
    fn points_lie_on_sphere() {
        let g = grating();
        let p = Point3::new(0.03, -0.02, g.height(0.03, -0.02));
        assert_relative_eq!((p - g.center()).norm(), 2.0, epsilon = 1e-14);
    }

    #[test]
    fn normal_points_to_center() {
        let g = grating();
        let p = Point3::new(0.0, 0.0, g.height(0.0, 0.0));
        let n = g.normal(&p).unwrap();
        assert_relative_eq!(p + n * 2.0, *g.center(), epsilon = 1e-14);
        assert!(n.z > 0.0);
    }

    #[test]
    fn outside_footprint_is_nan() {
        assert!(grating().height(5.0, 0.0).is_nan());
    }

    #[test]
    fn center_is_degenerate() {
        let g = grating();
        assert_eq!(g.normal(g.center()), Err(TransferError::DegenerateNormal));
    }
}
