//! Post-propagation measurements.

use crate::geometry::surface::{CylindricalDetector, DetectorPoint};
use crate::geometry::Ray;
use crate::math::{Point3, Vector3};
use crate::pipeline::StageSamples;

/// Unrolls every surviving ray onto the detector face.
#[must_use]
pub fn map_detector(detector: &CylindricalDetector, rays: &[Ray]) -> Vec<DetectorPoint> {
    rays.iter()
        .filter(|ray| ray.is_alive())
        .map(|ray| detector.unroll(&ray.position))
        .collect()
}

/// Focal ratio of a converging ray, `0.5 / tan(acos |vz|)`.
///
/// An on-axis direction yields `f64::INFINITY`.
#[must_use]
pub fn focal_ratio(direction: &Vector3) -> f64 {
    let n = direction.norm();
    let cos = (direction.z.abs() / n).min(1.0);
    0.5 / cos.acos().tan()
}

/// Position statistics of the rays recorded at one stage.
#[derive(Debug, Clone, PartialEq)]
pub struct StageSummary {
    pub stage: usize,
    pub alive: usize,
    /// Mean position, `None` when nothing was recorded.
    pub centroid: Option<Point3>,
    /// RMS distance from the centroid in the plane transverse to z.
    pub rms_radius: f64,
}

impl StageSummary {
    /// Summarises one stage of collected samples.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_samples(samples: &StageSamples, stage: usize) -> Self {
        let records = samples.stage(stage);
        if records.is_empty() {
            return Self {
                stage,
                alive: 0,
                centroid: None,
                rms_radius: 0.0,
            };
        }

        let n = records.len() as f64;
        let sum = records
            .iter()
            .fold(Vector3::zeros(), |acc, (_, s)| acc + Vector3::new(s.x, s.y, s.z));
        let centroid = Point3::from(sum / n);
        let spread = records
            .iter()
            .map(|(_, s)| {
                let dx = s.x - centroid.x;
                let dy = s.y - centroid.y;
                dx * dx + dy * dy
            })
            .sum::<f64>();

        Self {
            stage,
            alive: records.len(),
            centroid: Some(centroid),
            rms_radius: (spread / n).sqrt(),
        }
    }

    /// Summaries for every recorded stage.
    #[must_use]
    pub fn all(samples: &StageSamples) -> Vec<Self> {
        (0..samples.stage_count())
            .map(|stage| Self::from_samples(samples, stage))
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::pipeline::SampleSink;
    use approx::assert_relative_eq;

    #[test]
    fn detector_mapping_skips_lost_rays() {
        let detector = CylindricalDetector::new(2.0, 0.576_f64.asin(), 4.0, 0.1).unwrap();
        let focus = Ray::new(Point3::new(0.0, 0.0, -4.1), -Vector3::z(), 1500.0);
        let mut lost = focus;
        lost.lost = true;

        let points = map_detector(&detector, &[focus, lost]);
        assert_eq!(points.len(), 1);
        assert_relative_eq!(points[0].height, 0.0, epsilon = 1e-12);
        assert_relative_eq!(points[0].along, 2.0 * 0.576_f64.asin(), epsilon = 1e-12);
    }

    #[test]
    fn focal_ratio_of_known_cone() {
        // Marginal ray of an f/2 beam: tan(theta) = 1/4.
        let d = Vector3::new(1.0, 0.0, -4.0);
        assert_relative_eq!(focal_ratio(&d), 2.0, epsilon = 1e-12);
        assert_relative_eq!(focal_ratio(&(d * 3.0)), 2.0, epsilon = 1e-12);
        assert!(focal_ratio(&Vector3::z()).is_infinite());
    }

    #[test]
    fn summary_centroid_and_spread() {
        let mut samples = StageSamples::new();
        for (i, (x, y)) in [(1.0, 0.0), (-1.0, 0.0), (0.0, 1.0), (0.0, -1.0)]
            .into_iter()
            .enumerate()
        {
            let ray = Ray::new(Point3::new(x, y, 2.0), Vector3::z(), 1500.0);
            samples.record(1, i, &ray);
        }

        let summary = StageSummary::from_samples(&samples, 1);
        assert_eq!(summary.alive, 4);
        let c = summary.centroid.unwrap();
        assert_relative_eq!(c.x, 0.0);
        assert_relative_eq!(c.z, 2.0);
        assert_relative_eq!(summary.rms_radius, 1.0, epsilon = 1e-15);

        let all = StageSummary::all(&samples);
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].centroid, None);
        assert_eq!(all[0].alive, 0);
    }
}
