use crate::geometry::Ray;

/// Flattened ray record `(x, y, z, vx, vy, vz, lambda, lost)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaySample {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub vx: f64,
    pub vy: f64,
    pub vz: f64,
    pub wavelength: f64,
    pub lost: bool,
}

impl RaySample {
    /// Returns the record as plain numbers, with `lost` as `0.0` or `1.0`.
    #[must_use]
    pub fn to_array(&self) -> [f64; 8] {
        [
            self.x,
            self.y,
            self.z,
            self.vx,
            self.vy,
            self.vz,
            self.wavelength,
            if self.lost { 1.0 } else { 0.0 },
        ]
    }
}

impl From<&Ray> for RaySample {
    fn from(ray: &Ray) -> Self {
        Self {
            x: ray.position.x,
            y: ray.position.y,
            z: ray.position.z,
            vx: ray.direction.x,
            vy: ray.direction.y,
            vz: ray.direction.z,
            wavelength: ray.wavelength,
            lost: ray.lost,
        }
    }
}

/// Receives the state of every ray still alive after each stage.
pub trait SampleSink {
    /// Called once per surviving ray per stage, in ensemble order.
    fn record(&mut self, stage: usize, index: usize, ray: &Ray);
}

/// A sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl SampleSink for NullSink {
    fn record(&mut self, _stage: usize, _index: usize, _ray: &Ray) {}
}

/// Collects samples grouped by stage.
#[derive(Debug, Clone, Default)]
pub struct StageSamples {
    stages: Vec<Vec<(usize, RaySample)>>,
}

impl StageSamples {
    /// Creates an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// One past the highest stage that recorded a sample.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Samples recorded at `stage`, each tagged with its ensemble index.
    #[must_use]
    pub fn stage(&self, stage: usize) -> &[(usize, RaySample)] {
        self.stages.get(stage).map_or(&[], Vec::as_slice)
    }

    /// Whether ray `index` was recorded at `stage`.
    #[must_use]
    pub fn contains(&self, stage: usize, index: usize) -> bool {
        self.stage(stage).iter().any(|(i, _)| *i == index)
    }
}

impl SampleSink for StageSamples {
    fn record(&mut self, stage: usize, index: usize, ray: &Ray) {
        if self.stages.len() <= stage {
            self.stages.resize_with(stage + 1, Vec::new);
        }
        self.stages[stage].push((index, RaySample::from(ray)));
    }
}

impl<S: SampleSink + ?Sized> SampleSink for &mut S {
    fn record(&mut self, stage: usize, index: usize, ray: &Ray) {
        (**self).record(stage, index, ray);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::{Point3, Vector3};

    #[test]
    fn sample_flattens_ray() {
        let mut ray = Ray::new(Point3::new(1.0, 2.0, 3.0), Vector3::z(), 1500.0);
        ray.lost = true;
        assert_eq!(
            RaySample::from(&ray).to_array(),
            [1.0, 2.0, 3.0, 0.0, 0.0, 1.0, 1500.0, 1.0]
        );
    }

    #[test]
    fn collector_groups_by_stage() {
        let ray = Ray::new(Point3::origin(), Vector3::z(), 1500.0);
        let mut samples = StageSamples::new();
        samples.record(0, 3, &ray);
        samples.record(2, 1, &ray);
        assert_eq!(samples.stage_count(), 3);
        assert!(samples.contains(0, 3));
        assert!(samples.stage(1).is_empty());
        assert!(samples.contains(2, 1));
        assert!(samples.stage(7).is_empty());
    }
}
