use crate::error::{ConfigError, Result};
use crate::math::TOLERANCE;

use super::surface::{
    CylindricalDetector, FocalPlane, Hyperboloid, Paraboloid, SphericalGrating, Surface,
    SurfaceKind, ToroidalGrating,
};

/// Design record of a Cassegrain telescope feeding a Rowland-circle
/// spectrograph.
///
/// Lengths are in metres; `line_spacing` is in Angstroms per groove.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InstrumentGeometry {
    /// Primary focal length `f`.
    pub focal_length: f64,
    /// Distance `b` of the Cassegrain focus behind the primary vertex.
    pub back_distance: f64,
    /// Depth `v` of the primary vertex below the origin.
    pub vertex_distance: f64,
    /// Secondary eccentricity `e`.
    pub eccentricity: f64,
    /// Primary diameter `Dp`.
    pub primary_diameter: f64,
    /// Rowland circle diameter, equal to the grating radius of curvature `R`.
    pub rowland_diameter: f64,
    /// Grating tilt `alpha` in radians.
    pub tilt: f64,
    /// Grating groove spacing `d`.
    pub line_spacing: f64,
}

impl InstrumentGeometry {
    /// The 1 m f/3 Cassegrain with a 3600 l/mm grating centred on 1600 A.
    #[must_use]
    pub fn cassegrain_rowland() -> Self {
        Self {
            focal_length: 3.0,
            back_distance: 0.1,
            vertex_distance: 4.0,
            eccentricity: 23.0 / 17.0,
            primary_diameter: 1.0,
            rowland_diameter: 2.0,
            tilt: 0.576_f64.asin(),
            line_spacing: 10_000.0 / 3.6,
        }
    }

    /// Validates the parameters shared by every surface.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidParameter`] for a non-positive focal
    /// length, primary diameter or line spacing.
    pub fn validate(&self) -> Result<()> {
        if !(self.focal_length > TOLERANCE) {
            return Err(
                ConfigError::invalid("focal_length", self.focal_length, "must be positive").into(),
            );
        }
        if !(self.primary_diameter > TOLERANCE) {
            return Err(ConfigError::invalid(
                "primary_diameter",
                self.primary_diameter,
                "must be positive",
            )
            .into());
        }
        if !(self.line_spacing > 0.0) {
            return Err(
                ConfigError::invalid("line_spacing", self.line_spacing, "must be positive").into(),
            );
        }
        Ok(())
    }

    /// On-axis secondary diameter `Ds = (f + b)(e - 1) / (6e)`.
    #[must_use]
    pub fn secondary_diameter(&self) -> f64 {
        let e = self.eccentricity;
        (self.focal_length + self.back_distance) * (e - 1.0) / (6.0 * e)
    }

    /// Focal ratio of the primary alone.
    #[must_use]
    pub fn primary_ratio(&self) -> f64 {
        self.focal_length / self.primary_diameter
    }

    /// The paraboloidal primary.
    ///
    /// # Errors
    ///
    /// Returns an error if the focal length is not positive.
    pub fn primary(&self) -> Result<Paraboloid> {
        Paraboloid::new(self.focal_length, self.vertex_distance)
    }

    /// The hyperboloidal secondary.
    ///
    /// # Errors
    ///
    /// Returns an error if the eccentricity does not describe a hyperbola.
    pub fn secondary(&self) -> Result<Hyperboloid> {
        Hyperboloid::new(
            self.eccentricity,
            self.focal_length,
            self.back_distance,
            self.vertex_distance,
        )
    }

    /// The Cassegrain focal plane.
    #[must_use]
    pub fn focal_plane(&self) -> FocalPlane {
        FocalPlane::new(self.vertex_distance, self.back_distance)
    }

    /// The spherical grating.
    ///
    /// # Errors
    ///
    /// Returns an error if the Rowland diameter is not positive.
    pub fn spherical_grating(&self) -> Result<SphericalGrating> {
        SphericalGrating::new(
            self.rowland_diameter,
            self.tilt,
            self.vertex_distance,
            self.back_distance,
        )
    }

    /// The toroidal grating.
    ///
    /// # Errors
    ///
    /// Returns an error if the Rowland diameter is not positive.
    pub fn toroidal_grating(&self) -> Result<ToroidalGrating> {
        ToroidalGrating::new(
            self.rowland_diameter,
            self.tilt,
            self.vertex_distance,
            self.back_distance,
        )
    }

    /// The cylindrical detector on the Rowland circle.
    ///
    /// # Errors
    ///
    /// Returns an error if the Rowland diameter is not positive.
    pub fn detector(&self) -> Result<CylindricalDetector> {
        CylindricalDetector::new(
            self.rowland_diameter,
            self.tilt,
            self.vertex_distance,
            self.back_distance,
        )
    }

    /// Builds the surface named by `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingParameter`] for [`SurfaceKind::Plane`],
    /// which is not derived from the design record, and any error from the
    /// surface constructor.
    pub fn surface(&self, kind: SurfaceKind) -> Result<Surface> {
        let surface = match kind {
            SurfaceKind::Primary => self.primary()?.into(),
            SurfaceKind::Secondary => self.secondary()?.into(),
            SurfaceKind::FocalPlane => self.focal_plane().into(),
            SurfaceKind::SphericalGrating => self.spherical_grating()?.into(),
            SurfaceKind::ToroidalGrating => self.toroidal_grating()?.into(),
            SurfaceKind::CylindricalDetector => self.detector()?.into(),
            SurfaceKind::Plane => return Err(ConfigError::MissingParameter("center").into()),
        };
        Ok(surface)
    }
}

impl Default for InstrumentGeometry {
    fn default() -> Self {
        Self::cassegrain_rowland()
    }
}

/// Secondary eccentricity giving a `final_ratio` system from a
/// `primary_ratio` primary: `e = (final + primary) / (final - primary)`.
///
/// # Errors
///
/// Returns an error unless `final_ratio > primary_ratio > 0`.
pub fn eccentricity_from_focal_ratios(final_ratio: f64, primary_ratio: f64) -> Result<f64> {
    if !(primary_ratio > 0.0) {
        return Err(
            ConfigError::invalid("primary_ratio", primary_ratio, "must be positive").into(),
        );
    }
    if !(final_ratio > primary_ratio) {
        return Err(ConfigError::invalid(
            "final_ratio",
            final_ratio,
            "must be slower than the primary",
        )
        .into());
    }
    Ok((final_ratio + primary_ratio) / (final_ratio - primary_ratio))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::geometry::surface::OpticalSurface;
    use approx::assert_relative_eq;

    #[test]
    fn preset_secondary_diameter() {
        let g = InstrumentGeometry::cassegrain_rowland();
        let e = 23.0 / 17.0;
        assert_relative_eq!(g.secondary_diameter(), 3.1 * (e - 1.0) / (6.0 * e));
        assert!(g.secondary_diameter() > 0.13 && g.secondary_diameter() < 0.14);
    }

    #[test]
    fn eccentricity_from_f3_to_f20() {
        let e = eccentricity_from_focal_ratios(20.0, 3.0).unwrap();
        assert_relative_eq!(e, 23.0 / 17.0, epsilon = 1e-15);
        assert!(eccentricity_from_focal_ratios(3.0, 20.0).is_err());
        assert!(eccentricity_from_focal_ratios(20.0, 0.0).is_err());
    }

    #[test]
    fn secondary_focus_meets_focal_plane() {
        // The vertex splits the focal separation in the ratio (e+1)/(e-1).
        let g = InstrumentGeometry::cassegrain_rowland();
        let sec = g.secondary().unwrap();
        let vertex = sec.height(0.0, 0.0);
        let primary_focus = g.focal_length - g.vertex_distance;
        let cass_focus = g.focal_plane().height(0.0, 0.0);
        let p = primary_focus - vertex;
        let q = vertex - cass_focus;
        assert_relative_eq!(q / p, (g.eccentricity + 1.0) / (g.eccentricity - 1.0), epsilon = 1e-12);
    }

    #[test]
    fn builds_every_derived_surface() {
        let g = InstrumentGeometry::default();
        for kind in [
            SurfaceKind::Primary,
            SurfaceKind::Secondary,
            SurfaceKind::FocalPlane,
            SurfaceKind::SphericalGrating,
            SurfaceKind::ToroidalGrating,
            SurfaceKind::CylindricalDetector,
        ] {
            assert_eq!(g.surface(kind).unwrap().kind(), kind);
        }
        assert!(g.surface(SurfaceKind::Plane).is_err());
    }

    #[test]
    fn validate_rejects_zero_spacing() {
        let mut g = InstrumentGeometry::default();
        assert!(g.validate().is_ok());
        g.line_spacing = 0.0;
        assert!(g.validate().is_err());
    }
}
