use crate::error::SolverError;
use crate::geometry::surface::OpticalSurface;
use crate::geometry::Ray;
use crate::math::{Bracket, BrentSolver};

/// Finds the free-flight distance from a ray to a height-field surface.
///
/// Solves `z + t vz - h(x + t vx, y + t vy) = 0` for `t` inside the bracket
/// with Brent's method. The ray itself is not modified.
pub struct FreeDistance<'a, S: OpticalSurface + ?Sized> {
    surface: &'a S,
    solver: BrentSolver,
}

impl<'a, S: OpticalSurface + ?Sized> FreeDistance<'a, S> {
    /// Creates a query against `surface` using its default bracket.
    #[must_use]
    pub fn new(surface: &'a S) -> Self {
        Self {
            surface,
            solver: BrentSolver::new(surface.default_bracket()),
        }
    }

    /// Overrides the search interval.
    #[must_use]
    pub fn with_bracket(mut self, bracket: Bracket) -> Self {
        self.solver = self.solver.with_bracket(bracket);
        self
    }

    /// Signed vertical distance from the ray point at `t` to the surface.
    #[must_use]
    pub fn residual(&self, ray: &Ray, t: f64) -> f64 {
        let p = ray.at(t);
        p.z - self.surface.height(p.x, p.y)
    }

    /// Distance along the ray to the surface.
    ///
    /// # Errors
    ///
    /// Returns a [`SolverError`] if the residual does not change sign over
    /// the bracket, the surface is undefined at a probed point, or Brent's
    /// method runs out of iterations.
    pub fn execute(&self, ray: &Ray) -> Result<f64, SolverError> {
        self.solver.solve(|t| self.residual(ray, t))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::geometry::surface::{CylindricalDetector, Paraboloid, Surface};
    use crate::geometry::InstrumentGeometry;
    use crate::math::{Point3, Vector3};
    use approx::assert_relative_eq;

    fn down(x: f64, y: f64, z: f64) -> Ray {
        Ray::new(Point3::new(x, y, z), Vector3::new(0.0, 0.0, -1.0), 1500.0)
    }

    #[test]
    fn primary_residual_is_tiny() {
        let primary = Paraboloid::new(3.0, 4.0).unwrap();
        let query = FreeDistance::new(&primary);
        for (x, y) in [(0.0, 0.0), (0.3, -0.2), (-0.45, 0.1), (0.0, 0.5)] {
            let ray = down(x, y, 0.0);
            let t = query.execute(&ray).unwrap();
            assert!(query.residual(&ray, t).abs() < 1e-12);
            let p = ray.at(t);
            assert_relative_eq!(p.z, primary.height(x, y), epsilon = 1e-12);
        }
    }

    #[test]
    fn vertex_distance_on_axis() {
        let primary = Paraboloid::new(3.0, 4.0).unwrap();
        let t = FreeDistance::new(&primary).execute(&down(0.0, 0.0, 0.0)).unwrap();
        assert_relative_eq!(t, 4.0, epsilon = 1e-12);
    }

    #[test]
    fn bracket_too_short_is_not_bracketed() {
        let primary = Paraboloid::new(3.0, 4.0).unwrap();
        let err = FreeDistance::new(&primary)
            .execute(&down(0.0, 0.0, 10.0))
            .unwrap_err();
        assert!(matches!(err, SolverError::RootNotBracketed { .. }));

        let t = FreeDistance::new(&primary)
            .with_bracket(Bracket::new(0.0, 20.0))
            .execute(&down(0.0, 0.0, 10.0))
            .unwrap();
        assert_relative_eq!(t, 14.0, epsilon = 1e-12);
    }

    #[test]
    fn works_through_enum_dispatch() {
        let surface: Surface = Paraboloid::new(3.0, 4.0).unwrap().into();
        let t = FreeDistance::new(&surface).execute(&down(0.2, 0.0, 0.0)).unwrap();
        assert_relative_eq!(t, 4.0 - 0.04 / 12.0, epsilon = 1e-12);
    }

    #[test]
    fn undefined_surface_reports_non_finite() {
        let geom = InstrumentGeometry::cassegrain_rowland();
        let det = CylindricalDetector::new(geom.rowland_diameter, geom.tilt, 4.0, 0.1).unwrap();
        // Starts far outside the cylinder's footprint in x.
        let ray = down(3.0, 0.0, 0.0);
        let err = FreeDistance::new(&det).execute(&ray).unwrap_err();
        assert!(matches!(err, SolverError::NonFiniteResidual { .. }));
    }
}
