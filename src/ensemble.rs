//! Initial ray ensembles.

use std::f64::consts::PI;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::geometry::Ray;
use crate::math::{Point3, Vector3, ARCSEC_PER_RADIAN};

/// Ray count used when the available memory is unknown.
pub const DEFAULT_RAY_COUNT: usize = 10_000_000;

/// Upper bound on ray storage, in megabytes.
const MAX_RAY_MEMORY_MB: u64 = 4096;

/// Number of rays in the focal-ratio test ring.
pub const RING_RAYS: usize = 12;

/// How starting positions are laid out across the entrance aperture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pattern {
    /// Uniform over a disk, by rejection sampling.
    #[default]
    Disk,
    /// A regular square grid.
    Grid,
    /// Twelve rays on a circle, for focal-ratio checks.
    Ring,
    /// One ray on the optical axis.
    Single,
    /// Uniform over a square.
    Square,
}

/// Description of an initial ensemble.
///
/// All rays share one direction, tilted off axis in the x-z plane by
/// `off_axis_arcsec`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RaySource {
    /// Position layout.
    pub pattern: Pattern,
    /// Requested number of rays. Ignored by `ring` and `single`; `grid` uses
    /// the largest square not exceeding it.
    pub count: usize,
    /// Disk or ring radius, or half-width of the grid and square.
    pub radius: f64,
    /// Grid pitch.
    pub grid_spacing: f64,
    /// Starting height `z`.
    pub height: f64,
    /// Field angle in arcseconds.
    pub off_axis_arcsec: f64,
    /// Wavelength in Angstroms.
    pub wavelength: f64,
    /// Random seed for `disk` and `square`.
    pub seed: u64,
}

impl Default for RaySource {
    fn default() -> Self {
        Self {
            pattern: Pattern::Disk,
            count: 10_000,
            radius: 0.6,
            grid_spacing: 0.01,
            height: 0.0,
            off_axis_arcsec: 0.0,
            wavelength: 1500.0,
            seed: 42,
        }
    }
}

/// Rays drawn from a [`RaySource`] plus sampling statistics.
#[derive(Debug, Clone)]
pub struct Ensemble {
    /// The rays.
    pub rays: Vec<Ray>,
    /// Draws per accepted ray for rejection sampling, `1.0` otherwise.
    pub overshoot: f64,
}

impl RaySource {
    /// Common propagation direction `(sin(theta), 0, -cos(theta))`.
    #[must_use]
    pub fn direction(&self) -> Vector3 {
        let theta = self.off_axis_arcsec / ARCSEC_PER_RADIAN;
        Vector3::new(theta.sin(), 0.0, -theta.cos())
    }

    /// Generates the ensemble.
    #[must_use]
    pub fn generate(&self) -> Ensemble {
        let direction = self.direction();
        let ray = |x: f64, y: f64| Ray::new(Point3::new(x, y, self.height), direction, self.wavelength);
        let mut overshoot = 1.0;

        let rays: Vec<Ray> = match self.pattern {
            Pattern::Disk => {
                let mut rng = StdRng::seed_from_u64(self.seed);
                let mut rays = Vec::with_capacity(self.count);
                let mut draws = 0usize;
                while rays.len() < self.count {
                    draws += 1;
                    let x: f64 = rng.gen_range(-1.0..1.0);
                    let y: f64 = rng.gen_range(-1.0..1.0);
                    if x * x + y * y > 1.0 {
                        continue;
                    }
                    rays.push(ray(x * self.radius, y * self.radius));
                }
                if !rays.is_empty() {
                    overshoot = ratio(draws, rays.len());
                }
                rays
            }
            Pattern::Grid => {
                let side = self.count.isqrt();
                let mut rays = Vec::with_capacity(side * side);
                for i in 0..side {
                    for j in 0..side {
                        #[allow(clippy::cast_precision_loss)]
                        let (fi, fj) = (i as f64, j as f64);
                        rays.push(ray(
                            fi * self.grid_spacing - self.radius,
                            fj * self.grid_spacing - self.radius,
                        ));
                    }
                }
                rays
            }
            Pattern::Ring => (0..RING_RAYS)
                .map(|i| {
                    #[allow(clippy::cast_precision_loss)]
                    let phi = i as f64 * PI / 6.0;
                    ray(self.radius * phi.cos(), self.radius * phi.sin())
                })
                .collect(),
            Pattern::Single => vec![ray(0.0, 0.0)],
            Pattern::Square => {
                let mut rng = StdRng::seed_from_u64(self.seed);
                (0..self.count)
                    .map(|_| {
                        let x = rng.gen_range(-self.radius..=self.radius);
                        let y = rng.gen_range(-self.radius..=self.radius);
                        ray(x, y)
                    })
                    .collect()
            }
        };

        debug!(
            pattern = ?self.pattern,
            rays = rays.len(),
            overshoot,
            "ensemble generated"
        );
        Ensemble { rays, overshoot }
    }
}

#[allow(clippy::cast_precision_loss)]
fn ratio(numerator: usize, denominator: usize) -> f64 {
    numerator as f64 / denominator as f64
}

/// Ray count that fits in the memory budget.
///
/// Uses a quarter of `available_mb`, capped at 4 GB, divided by the size of
/// one [`Ray`]. `0` means the amount is unknown and yields
/// [`DEFAULT_RAY_COUNT`].
#[must_use]
pub fn suggested_ray_count(available_mb: u64) -> usize {
    if available_mb == 0 {
        return DEFAULT_RAY_COUNT;
    }
    let budget_mb = (available_mb / 4).min(MAX_RAY_MEMORY_MB);
    let bytes = budget_mb * 1024 * 1024;
    usize::try_from(bytes).unwrap_or(usize::MAX) / std::mem::size_of::<Ray>()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn disk_stays_inside_radius() {
        let source = RaySource {
            count: 2000,
            radius: 0.5,
            ..RaySource::default()
        };
        let ensemble = source.generate();
        assert_eq!(ensemble.rays.len(), 2000);
        for ray in &ensemble.rays {
            assert!(ray.position.x.hypot(ray.position.y) <= 0.5 + 1e-12);
            assert_eq!(ray.position.z, 0.0);
        }
    }

    #[test]
    fn disk_overshoot_approaches_four_over_pi() {
        let source = RaySource {
            count: 50_000,
            ..RaySource::default()
        };
        let ensemble = source.generate();
        assert!((ensemble.overshoot - 4.0 / PI).abs() < 0.03);
    }

    #[test]
    fn same_seed_same_rays() {
        let source = RaySource::default();
        assert_eq!(source.generate().rays, source.generate().rays);
        let other = RaySource {
            seed: 7,
            ..RaySource::default()
        };
        assert_ne!(source.generate().rays, other.generate().rays);
    }

    #[test]
    fn grid_uses_largest_square() {
        let source = RaySource {
            pattern: Pattern::Grid,
            count: 130,
            ..RaySource::default()
        };
        let rays = source.generate().rays;
        assert_eq!(rays.len(), 121);
        assert_relative_eq!(rays[0].position.x, -0.6);
        assert_relative_eq!(rays[0].position.y, -0.6);
        assert_relative_eq!(rays[12].position.x, -0.59, epsilon = 1e-12);
        assert_relative_eq!(rays[12].position.y, -0.59, epsilon = 1e-12);
    }

    #[test]
    fn ring_has_twelve_rays() {
        let source = RaySource {
            pattern: Pattern::Ring,
            radius: 0.5,
            ..RaySource::default()
        };
        let rays = source.generate().rays;
        assert_eq!(rays.len(), RING_RAYS);
        for ray in &rays {
            assert_relative_eq!(ray.position.x.hypot(ray.position.y), 0.5, epsilon = 1e-15);
        }
        assert_relative_eq!(rays[3].position.y, 0.5, epsilon = 1e-15);
    }

    #[test]
    fn single_is_on_axis() {
        let source = RaySource {
            pattern: Pattern::Single,
            height: 10.0,
            ..RaySource::default()
        };
        let rays = source.generate().rays;
        assert_eq!(rays.len(), 1);
        assert_eq!(rays[0].position, Point3::new(0.0, 0.0, 10.0));
        assert_eq!(rays[0].direction, -Vector3::z());
    }

    #[test]
    fn off_axis_tilts_in_xz_plane() {
        let source = RaySource {
            off_axis_arcsec: 206_265.0 * 0.01,
            ..RaySource::default()
        };
        let d = source.direction();
        assert_relative_eq!(d.x, 0.01_f64.sin(), epsilon = 1e-15);
        assert_eq!(d.y, 0.0);
        assert_relative_eq!(d.norm(), 1.0, epsilon = 1e-15);
    }

    #[test]
    fn square_fills_half_width() {
        let source = RaySource {
            pattern: Pattern::Square,
            count: 500,
            ..RaySource::default()
        };
        let rays = source.generate().rays;
        assert_eq!(rays.len(), 500);
        assert!(rays.iter().all(|r| r.position.x.abs() <= 0.6 && r.position.y.abs() <= 0.6));
        assert!(rays.iter().any(|r| r.position.x.hypot(r.position.y) > 0.6));
    }

    #[test]
    fn ray_count_heuristic() {
        assert_eq!(suggested_ray_count(0), DEFAULT_RAY_COUNT);
        let per_ray = std::mem::size_of::<Ray>();
        assert_eq!(suggested_ray_count(4000), 1000 * 1024 * 1024 / per_ray);
        assert_eq!(
            suggested_ray_count(64_000),
            suggested_ray_count(1_000_000)
        );
        assert_eq!(suggested_ray_count(3), 0);
    }
}
