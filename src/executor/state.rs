//! Per-unit lifecycle and the run-level accumulator.

use crate::cost::{CostReport, CostTotals};
use crate::error::UnitFailure;
use crate::provider::TokenUsage;
use crate::unit::UnitId;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

/// Lifecycle of one unit within a run.
///
/// `Pending → Skipped`, or `Pending → Generating → Generated → Persisted`, with
/// `Failed` reachable from `Generating` and `Generated`. Terminal states are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitState {
    Pending,
    Skipped,
    Generating,
    Generated,
    Persisted,
    Failed,
}

impl UnitState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            UnitState::Skipped | UnitState::Persisted | UnitState::Failed
        )
    }

    pub fn can_transition_to(&self, next: UnitState) -> bool {
        use UnitState::*;
        matches!(
            (self, next),
            (Pending, Skipped)
                | (Pending, Generating)
                | (Generating, Generated)
                | (Generating, Failed)
                | (Generated, Persisted)
                | (Generated, Failed)
        )
    }

    /// Move to `next`. Illegal transitions are a programming error.
    pub(crate) fn advance(&mut self, next: UnitState) {
        debug_assert!(
            self.can_transition_to(next),
            "illegal unit transition {:?} -> {:?}",
            self,
            next
        );
        *self = next;
    }
}

/// A successful generator call for one unit, before persistence.
#[derive(Debug, Clone)]
pub struct GenerationResult {
    pub unit: UnitId,
    pub text: String,
    pub model: String,
    pub word_count: usize,
    pub within_word_range: bool,
    pub elapsed: Duration,
    pub attempts: u32,
    pub usage: TokenUsage,
    pub cost: CostReport,
}

/// What a unit reports back to the run aggregator.
#[derive(Debug)]
pub enum UnitOutcome {
    Skipped {
        unit: UnitId,
        destination: PathBuf,
    },
    Persisted {
        unit: UnitId,
        destination: PathBuf,
        word_count: usize,
        within_word_range: bool,
        cost: CostReport,
    },
    Failed {
        unit: UnitId,
        destination: PathBuf,
        failure: UnitFailure,
        cost: Option<CostReport>,
    },
}

impl UnitOutcome {
    /// Terminal state the unit reached.
    pub fn state(&self) -> UnitState {
        match self {
            UnitOutcome::Skipped { .. } => UnitState::Skipped,
            UnitOutcome::Persisted { .. } => UnitState::Persisted,
            UnitOutcome::Failed { .. } => UnitState::Failed,
        }
    }

    pub fn unit(&self) -> UnitId {
        match self {
            UnitOutcome::Skipped { unit, .. }
            | UnitOutcome::Persisted { unit, .. }
            | UnitOutcome::Failed { unit, .. } => *unit,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FailedUnit {
    pub unit: String,
    pub destination: PathBuf,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "detail")]
pub enum BackCoverStatus {
    #[default]
    NotAttempted,
    Written,
    AlreadyPresent,
    NoDescription,
    Failed(String),
}

/// Run accumulator. Owned by the single aggregator; never persisted.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunState {
    pub total: usize,
    pub skipped: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub not_dispatched: usize,
    pub out_of_range: usize,
    pub cancelled: bool,
    pub cost: CostTotals,
    pub elapsed: Duration,
    pub failures: Vec<FailedUnit>,
    pub back_cover: BackCoverStatus,
}

impl RunState {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    pub fn record(&mut self, outcome: UnitOutcome) {
        match outcome {
            UnitOutcome::Skipped { .. } => {
                self.skipped += 1;
            }
            UnitOutcome::Persisted {
                within_word_range,
                cost,
                ..
            } => {
                self.succeeded += 1;
                if !within_word_range {
                    self.out_of_range += 1;
                }
                self.cost.add(&cost);
            }
            UnitOutcome::Failed {
                unit,
                destination,
                failure,
                cost,
            } => {
                self.failed += 1;
                if let Some(cost) = cost {
                    self.cost.add(&cost);
                }
                self.failures.push(FailedUnit {
                    unit: unit.to_string(),
                    destination,
                    error: failure.to_string(),
                });
            }
        }
    }

    /// Units finished this run, whether persisted or failed.
    pub fn processed(&self) -> usize {
        self.succeeded + self.failed
    }

    /// True when every unit is materialized and the back cover did not fail.
    pub fn is_complete(&self) -> bool {
        self.failed == 0
            && self.not_dispatched == 0
            && !matches!(self.back_cover, BackCoverStatus::Failed(_))
    }

    pub fn summary(&self) -> String {
        let mut out = format!(
            "Units: {} total, {} skipped, {} generated, {} failed, {} not dispatched\n",
            self.total, self.skipped, self.succeeded, self.failed, self.not_dispatched
        );
        out.push_str(&format!(
            "Tokens: {} prompt, {} output | Cost: ${:.6} | Elapsed: {:.1}s",
            self.cost.prompt_tokens,
            self.cost.output_tokens,
            self.cost.total_cost,
            self.elapsed.as_secs_f64()
        ));
        if self.out_of_range > 0 {
            out.push_str(&format!(
                "\n{} unit(s) outside their target word range",
                self.out_of_range
            ));
        }
        match &self.back_cover {
            BackCoverStatus::Failed(e) => out.push_str(&format!("\nBack cover failed: {}", e)),
            BackCoverStatus::Written => out.push_str("\nBack cover written"),
            _ => {}
        }
        if self.cancelled {
            out.push_str("\nRun was cancelled; re-run to resume.");
        }
        for failure in &self.failures {
            out.push_str(&format!(
                "\n  FAILED {} ({}): {}",
                failure.unit,
                failure.destination.display(),
                failure.error
            ));
        }
        out
    }
}
