use std::fmt;

use crate::error::{SolverError, TransferError};

/// Why a ray left the ensemble.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LossReason {
    /// No intersection could be found.
    Solver(SolverError),
    /// The ray struck the surface outside its clear aperture.
    OutsideAperture,
    /// The ray struck an obstruction.
    Blocked,
    /// The outgoing direction could not be computed.
    Transfer(TransferError),
    /// The ray was already flagged lost when the pass started.
    Inherited,
}

impl LossReason {
    /// Short label used when tallying losses.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            LossReason::Solver(_) => "missed surface",
            LossReason::OutsideAperture => "outside aperture",
            LossReason::Blocked => "blocked",
            LossReason::Transfer(TransferError::UnphysicalDiffractionOrder { .. }) => {
                "evanescent order"
            }
            LossReason::Transfer(_) => "degenerate geometry",
            LossReason::Inherited => "lost on entry",
        }
    }
}

impl fmt::Display for LossReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LossReason::Solver(e) => write!(f, "{e}"),
            LossReason::Transfer(e) => write!(f, "{e}"),
            _ => f.write_str(self.label()),
        }
    }
}

impl From<SolverError> for LossReason {
    fn from(e: SolverError) -> Self {
        LossReason::Solver(e)
    }
}

impl From<TransferError> for LossReason {
    fn from(e: TransferError) -> Self {
        LossReason::Transfer(e)
    }
}

/// Final state of one ray after a pass.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum RayStatus {
    /// Survived every stage.
    #[default]
    Alive,
    /// Dropped at `stage` (zero-based element index).
    Lost { stage: usize, reason: LossReason },
}

impl RayStatus {
    /// Whether the ray survived.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        matches!(self, RayStatus::Alive)
    }
}

/// Outcome of propagating an ensemble through a pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct PropagationReport {
    statuses: Vec<RayStatus>,
    survivors: Vec<usize>,
}

impl PropagationReport {
    pub(crate) fn new(statuses: Vec<RayStatus>, stages: usize) -> Self {
        let survivors = (0..stages)
            .map(|stage| {
                statuses
                    .iter()
                    .filter(|s| match s {
                        RayStatus::Alive => true,
                        RayStatus::Lost { stage: lost_at, .. } => *lost_at > stage,
                    })
                    .count()
            })
            .collect();
        Self {
            statuses,
            survivors,
        }
    }

    /// Per-ray final status, in ensemble order.
    #[must_use]
    pub fn statuses(&self) -> &[RayStatus] {
        &self.statuses
    }

    /// Number of rays still alive after each stage.
    #[must_use]
    pub fn survivors(&self) -> &[usize] {
        &self.survivors
    }

    /// Number of rays traced.
    #[must_use]
    pub fn total(&self) -> usize {
        self.statuses.len()
    }

    /// Number of rays that survived every stage.
    #[must_use]
    pub fn alive(&self) -> usize {
        self.statuses.iter().filter(|s| s.is_alive()).count()
    }

    /// Fraction of the ensemble that survived every stage, `0.0` for an
    /// empty ensemble.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn fraction_surviving(&self) -> f64 {
        if self.statuses.is_empty() {
            return 0.0;
        }
        self.alive() as f64 / self.statuses.len() as f64
    }

    /// Loss tally for one stage, keyed by [`LossReason::label`] in first-seen order.
    #[must_use]
    pub fn losses_at(&self, stage: usize) -> Vec<(&'static str, usize)> {
        let mut tally: Vec<(&'static str, usize)> = Vec::new();
        for status in &self.statuses {
            if let RayStatus::Lost {
                stage: lost_at,
                reason,
            } = status
            {
                if *lost_at != stage {
                    continue;
                }
                let label = reason.label();
                match tally.iter_mut().find(|(l, _)| *l == label) {
                    Some((_, n)) => *n += 1,
                    None => tally.push((label, 1)),
                }
            }
        }
        tally
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn report() -> PropagationReport {
        PropagationReport::new(
            vec![
                RayStatus::Alive,
                RayStatus::Lost {
                    stage: 0,
                    reason: LossReason::OutsideAperture,
                },
                RayStatus::Lost {
                    stage: 1,
                    reason: LossReason::Blocked,
                },
                RayStatus::Alive,
                RayStatus::Lost {
                    stage: 0,
                    reason: LossReason::OutsideAperture,
                },
            ],
            3,
        )
    }

    #[test]
    fn survivors_per_stage() {
        assert_eq!(report().survivors(), &[3, 2, 2]);
    }

    #[test]
    fn fraction() {
        let r = report();
        assert_eq!(r.alive(), 2);
        assert_eq!(r.total(), 5);
        assert!((r.fraction_surviving() - 0.4).abs() < 1e-15);
        assert_eq!(PropagationReport::new(vec![], 2).fraction_surviving(), 0.0);
    }

    #[test]
    fn tally_groups_by_label() {
        let r = report();
        assert_eq!(r.losses_at(0), vec![("outside aperture", 2)]);
        assert_eq!(r.losses_at(1), vec![("blocked", 1)]);
        assert!(r.losses_at(2).is_empty());
    }

    #[test]
    fn reason_converts_from_errors() {
        let r: LossReason = TransferError::DegenerateNormal.into();
        assert_eq!(r.label(), "degenerate geometry");
        let r: LossReason = SolverError::NonFiniteResidual { t: 1.0 }.into();
        assert!(r.to_string().contains("not finite"));
    }
}
