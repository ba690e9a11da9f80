//! Ordered propagation of a ray ensemble through optical elements.
//!
//! Every ray runs the same state machine: ALIVE until an element reports a
//! [`LossReason`], then LOST for the rest of the pass. Stages are applied in
//! order with no backtracking. Numeric failures never abort a pass; they
//! only remove the affected ray.

mod element;
mod report;
mod sample;

pub use element::{Element, InteractionKind};
pub use report::{LossReason, PropagationReport, RayStatus};
pub use sample::{NullSink, RaySample, SampleSink, StageSamples};

use rayon::prelude::*;
use tracing::{debug, info, trace, warn};

use crate::error::{ConfigError, Result};
use crate::geometry::Ray;

/// An ordered list of elements.
#[derive(Debug, Clone, PartialEq)]
pub struct Pipeline {
    elements: Vec<Element>,
}

impl Pipeline {
    /// Creates a pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyPipeline`] if `elements` is empty.
    pub fn new(elements: Vec<Element>) -> Result<Self> {
        if elements.is_empty() {
            return Err(ConfigError::EmptyPipeline.into());
        }
        Ok(Self { elements })
    }

    /// Returns the elements in order.
    #[must_use]
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Number of stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.elements.len()
    }

    /// Runs a single ray through every stage.
    ///
    /// `on_stage` is called with the stage index after each stage the ray
    /// survives.
    pub fn trace_ray<F>(&self, ray: &mut Ray, mut on_stage: F) -> RayStatus
    where
        F: FnMut(usize, &Ray),
    {
        if ray.lost {
            return RayStatus::Lost {
                stage: 0,
                reason: LossReason::Inherited,
            };
        }
        for (stage, element) in self.elements.iter().enumerate() {
            if let Err(reason) = element.interact(ray) {
                ray.lost = true;
                return RayStatus::Lost { stage, reason };
            }
            on_stage(stage, ray);
        }
        RayStatus::Alive
    }

    /// Propagates the ensemble stage by stage.
    ///
    /// Rays are mutated in place. The sink sees every ray still alive after
    /// each stage, stage-major and in ensemble order.
    pub fn propagate<S>(&self, rays: &mut [Ray], sink: &mut S) -> PropagationReport
    where
        S: SampleSink + ?Sized,
    {
        let mut statuses: Vec<RayStatus> = rays
            .iter()
            .map(|ray| {
                if ray.lost {
                    RayStatus::Lost {
                        stage: 0,
                        reason: LossReason::Inherited,
                    }
                } else {
                    RayStatus::Alive
                }
            })
            .collect();

        for (stage, element) in self.elements.iter().enumerate() {
            let mut alive = 0usize;
            for (index, ray) in rays.iter_mut().enumerate() {
                if ray.lost {
                    continue;
                }
                match element.interact(ray) {
                    Ok(()) => {
                        alive += 1;
                        sink.record(stage, index, ray);
                    }
                    Err(reason) => {
                        trace!(stage, index, %reason, "ray lost");
                        ray.lost = true;
                        statuses[index] = RayStatus::Lost { stage, reason };
                    }
                }
            }
            debug!(stage, element = element.name(), alive, "stage complete");
        }

        self.finish(statuses)
    }

    /// Propagates the ensemble with rays distributed across threads.
    ///
    /// Produces the same rays, statuses and sink calls as [`propagate`](Self::propagate).
    pub fn propagate_par<S>(&self, rays: &mut [Ray], sink: &mut S) -> PropagationReport
    where
        S: SampleSink + ?Sized,
    {
        let traced: Vec<(RayStatus, Vec<Ray>)> = rays
            .par_iter_mut()
            .map(|ray| {
                let mut snapshots = Vec::with_capacity(self.elements.len());
                let status = self.trace_ray(ray, |_, r| snapshots.push(*r));
                (status, snapshots)
            })
            .collect();

        for stage in 0..self.elements.len() {
            let mut alive = 0usize;
            for (index, (_, snapshots)) in traced.iter().enumerate() {
                if let Some(ray) = snapshots.get(stage) {
                    alive += 1;
                    sink.record(stage, index, ray);
                }
            }
            debug!(stage, element = self.elements[stage].name(), alive, "stage complete");
        }

        let statuses = traced.into_iter().map(|(status, _)| status).collect();
        self.finish(statuses)
    }

    fn finish(&self, statuses: Vec<RayStatus>) -> PropagationReport {
        let report = PropagationReport::new(statuses, self.elements.len());
        if report.total() > 0 && report.alive() == 0 {
            warn!(total = report.total(), "every ray was lost");
        }
        info!(
            total = report.total(),
            alive = report.alive(),
            fraction = report.fraction_surviving(),
            "propagation complete"
        );
        report
    }
}
