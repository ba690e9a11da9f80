use crate::error::{ConfigError, Result, TransferError};
use crate::math::{Point3, Vector3, TOLERANCE};

use super::{unit_or_degenerate, OpticalSurface};

/// A toroidal grating that corrects the Rowland mount's astigmatism.
///
/// The torus axis runs along y through the spherical grating's centre of
/// curvature `(x0, 0, z0)`. With design angle `beta`:
///
/// - major radius `Rt = R (1 - cos(alpha) cos(beta))`
/// - tube radius `rt = R cos(alpha) cos(beta)`
///
/// so the meridional radius at `y = 0` is still `R`, while the sagittal
/// curvature is chosen to bring the diffracted beam to a focus at `beta`.
/// The surface is `z = z0 - sqrt(rho(y)^2 - (x - x0)^2)` with
/// `rho(y) = Rt + sqrt(rt^2 - y^2)`.
#[derive(Debug, Clone, PartialEq)]
pub struct ToroidalGrating {
    radius: f64,
    tilt: f64,
    design_angle: f64,
    center: Point3,
    major_radius: f64,
    tube_radius: f64,
}

impl ToroidalGrating {
    /// `sin(beta)` of the design angle, balancing focus between 1300 and 1900 Angstroms.
    pub const DESIGN_SINE: f64 = 0.108;

    /// Creates the grating with the default design angle.
    ///
    /// # Errors
    ///
    /// Returns an error if the radius is not positive.
    pub fn new(radius: f64, tilt: f64, vertex_distance: f64, back_distance: f64) -> Result<Self> {
        Self::with_design_angle(
            radius,
            tilt,
            Self::DESIGN_SINE.asin(),
            vertex_distance,
            back_distance,
        )
    }

    /// Creates the grating for an explicit design angle `beta` (radians).
    ///
    /// # Errors
    ///
    /// Returns an error if the radius is not positive or the tube radius
    /// vanishes.
    pub fn with_design_angle(
        radius: f64,
        tilt: f64,
        design_angle: f64,
        vertex_distance: f64,
        back_distance: f64,
    ) -> Result<Self> {
        if !(radius > TOLERANCE) {
            return Err(ConfigError::invalid("radius", radius, "must be positive").into());
        }
        let cc = tilt.cos() * design_angle.cos();
        let tube_radius = radius * cc;
        if !(tube_radius > TOLERANCE) {
            return Err(ConfigError::invalid(
                "tilt",
                tilt,
                "leaves the torus without a tube radius",
            )
            .into());
        }
        let center = Point3::new(
            -radius * tilt.sin(),
            0.0,
            -(vertex_distance + back_distance),
        );
        Ok(Self {
            radius,
            tilt,
            design_angle,
            center,
            major_radius: radius * (1.0 - cc),
            tube_radius,
        })
    }

    /// Returns the meridional radius of curvature `R`.
    #[must_use]
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Returns the tilt angle in radians.
    #[must_use]
    pub fn tilt(&self) -> f64 {
        self.tilt
    }

    /// Returns the design angle in radians.
    #[must_use]
    pub fn design_angle(&self) -> f64 {
        self.design_angle
    }

    /// Returns the point on the torus axis level with the grating pole.
    #[must_use]
    pub fn center(&self) -> &Point3 {
        &self.center
    }

    /// Returns `Rt`.
    #[must_use]
    pub fn major_radius(&self) -> f64 {
        self.major_radius
    }

    /// Returns `rt`.
    #[must_use]
    pub fn tube_radius(&self) -> f64 {
        self.tube_radius
    }
}

impl OpticalSurface for ToroidalGrating {
    fn height(&self, x: f64, y: f64) -> f64 {
        let dy = y - self.center.y;
        let rho = self.major_radius + (self.tube_radius * self.tube_radius - dy * dy).sqrt();
        let dx = x - self.center.x;
        self.center.z - (rho * rho - dx * dx).sqrt()
    }

    /// Points away from the tube centre, towards the incoming beam.
    fn normal(&self, point: &Point3) -> std::result::Result<Vector3, TransferError> {
        let c = &self.center;
        let dx = point.x - c.x;
        let dz = point.z - c.z;
        let xz_rad = dx.hypot(dz);
        if xz_rad < TOLERANCE {
            return Err(TransferError::DegenerateNormal);
        }
        let scale = (self.major_radius - xz_rad) / xz_rad;
        unit_or_degenerate(Vector3::new(dx * scale, c.y - point.y, dz * scale))
    }
}
