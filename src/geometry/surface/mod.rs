mod cylindrical_detector;
mod focal_plane;
mod hyperboloid;
mod paraboloid;
mod plane;
mod spherical_grating;
mod toroidal_grating;

pub use cylindrical_detector::{CylindricalDetector, DetectorPoint};
pub use focal_plane::FocalPlane;
pub use hyperboloid::Hyperboloid;
pub use paraboloid::Paraboloid;
pub use plane::Plane;
pub use spherical_grating::SphericalGrating;
pub use toroidal_grating::ToroidalGrating;

use serde::{Deserialize, Serialize};

use crate::error::TransferError;
use crate::math::{Bracket, Point3, Vector3};

/// An optical surface described as a height field `z = f(x, y)`.
pub trait OpticalSurface {
    /// Height of the surface above `(x, y)`.
    ///
    /// Returns NaN where the surface is not defined (outside a sphere or
    /// cylinder's footprint).
    fn height(&self, x: f64, y: f64) -> f64;

    /// Unit normal at a point lying on the surface.
    ///
    /// The point must come from an intersection with this surface; the
    /// result for an arbitrary point is meaningless.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::DegenerateNormal`] if the normal has zero length.
    fn normal(&self, point: &Point3) -> Result<Vector3, TransferError>;

    /// Search interval used when intersecting a ray with this surface.
    fn default_bracket(&self) -> Bracket {
        Bracket::DEFAULT
    }
}

/// Tag naming each supported surface shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceKind {
    Primary,
    Secondary,
    FocalPlane,
    SphericalGrating,
    ToroidalGrating,
    CylindricalDetector,
    Plane,
}

/// Any optical surface the pipeline can trace through.
#[derive(Debug, Clone, PartialEq)]
pub enum Surface {
    /// Paraboloidal primary mirror.
    Primary(Paraboloid),
    /// Hyperboloidal secondary mirror.
    Secondary(Hyperboloid),
    /// Flat Cassegrain focal plane.
    FocalPlane(FocalPlane),
    /// Spherical Rowland-circle grating.
    SphericalGrating(SphericalGrating),
    /// Astigmatism-corrected toroidal grating.
    ToroidalGrating(ToroidalGrating),
    /// Half-cylinder detector on the Rowland circle.
    CylindricalDetector(CylindricalDetector),
    /// Arbitrarily oriented flat.
    Plane(Plane),
}

impl Surface {
    /// Returns the tag of this surface.
    #[must_use]
    pub fn kind(&self) -> SurfaceKind {
        match self {
            Surface::Primary(_) => SurfaceKind::Primary,
            Surface::Secondary(_) => SurfaceKind::Secondary,
            Surface::FocalPlane(_) => SurfaceKind::FocalPlane,
            Surface::SphericalGrating(_) => SurfaceKind::SphericalGrating,
            Surface::ToroidalGrating(_) => SurfaceKind::ToroidalGrating,
            Surface::CylindricalDetector(_) => SurfaceKind::CylindricalDetector,
            Surface::Plane(_) => SurfaceKind::Plane,
        }
    }

    /// Tilt of the ruling tangent for grating surfaces, `None` otherwise.
    #[must_use]
    pub fn grating_tilt(&self) -> Option<f64> {
        match self {
            Surface::SphericalGrating(g) => Some(g.tilt()),
            Surface::ToroidalGrating(g) => Some(g.tilt()),
            _ => None,
        }
    }

    fn inner(&self) -> &dyn OpticalSurface {
        match self {
            Surface::Primary(s) => s,
            Surface::Secondary(s) => s,
            Surface::FocalPlane(s) => s,
            Surface::SphericalGrating(s) => s,
            Surface::ToroidalGrating(s) => s,
            Surface::CylindricalDetector(s) => s,
            Surface::Plane(s) => s,
        }
    }
}

impl OpticalSurface for Surface {
    fn height(&self, x: f64, y: f64) -> f64 {
        self.inner().height(x, y)
    }

    fn normal(&self, point: &Point3) -> Result<Vector3, TransferError> {
        self.inner().normal(point)
    }

    fn default_bracket(&self) -> Bracket {
        self.inner().default_bracket()
    }
}

macro_rules! impl_from_surface {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        $(
            impl From<$ty> for Surface {
                fn from(surface: $ty) -> Self {
                    Surface::$variant(surface)
                }
            }
        )*
    };
}

impl_from_surface!(
    Primary(Paraboloid),
    Secondary(Hyperboloid),
    FocalPlane(FocalPlane),
    SphericalGrating(SphericalGrating),
    ToroidalGrating(ToroidalGrating),
    CylindricalDetector(CylindricalDetector),
    Plane(Plane),
);

/// Normalizes `v`, failing when it is too short to carry a direction.
pub(crate) fn unit_or_degenerate(v: Vector3) -> Result<Vector3, TransferError> {
    let len = v.norm();
    if len < crate::math::TOLERANCE || !len.is_finite() {
        return Err(TransferError::DegenerateNormal);
    }
    Ok(v / len)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn kind_matches_variant() {
        let s: Surface = Paraboloid::new(3.0, 4.0).unwrap().into();
        assert_eq!(s.kind(), SurfaceKind::Primary);
        let s: Surface = FocalPlane::new(4.0, 0.1).into();
        assert_eq!(s.kind(), SurfaceKind::FocalPlane);
    }

    #[test]
    fn dispatch_forwards_to_variant() {
        let para = Paraboloid::new(3.0, 4.0).unwrap();
        let s = Surface::from(para.clone());
        assert_eq!(s.height(0.3, -0.2), para.height(0.3, -0.2));
        assert_eq!(s.default_bracket(), Bracket::DEFAULT);
    }

    #[test]
    fn detector_uses_rowland_bracket() {
        let det = CylindricalDetector::new(2.0, 0.3, 4.0, 0.1).unwrap();
        assert_eq!(Surface::from(det).default_bracket(), Bracket::ROWLAND);
    }

    #[test]
    fn only_gratings_have_tilt() {
        let g = SphericalGrating::new(2.0, 0.6, 4.0, 0.1).unwrap();
        assert_eq!(Surface::from(g).grating_tilt(), Some(0.6));
        let t = ToroidalGrating::new(2.0, 0.6, 4.0, 0.1).unwrap();
        assert_eq!(Surface::from(t).grating_tilt(), Some(0.6));
        assert_eq!(Surface::from(FocalPlane::new(4.0, 0.1)).grating_tilt(), None);
    }

    #[test]
    fn kind_names_are_snake_case() {
        #[derive(Deserialize)]
        struct Wrapper {
            kind: SurfaceKind,
        }
        let w: Wrapper = toml::from_str("kind = \"toroidal_grating\"").unwrap();
        assert_eq!(w.kind, SurfaceKind::ToroidalGrating);
    }

    #[test]
    fn zero_vector_is_degenerate() {
        assert_eq!(
            unit_or_degenerate(Vector3::zeros()),
            Err(TransferError::DegenerateNormal)
        );
    }
}
