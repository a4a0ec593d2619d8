//! Unit executor: turns a book plan into files, one generator call per missing unit.
//!
//! A run validates the plan, enumerates units in document order, skips every unit whose
//! destination is already complete, and dispatches the rest in enumeration order through
//! a bounded pool. Completions may arrive out of order; a single aggregator folds them
//! into the [`RunState`]. Because "done" is simply "the destination is complete",
//! re-running after an interruption resumes where the previous run stopped.

use crate::cost::PricingConfig;
use crate::error::{GenerationError, PlanError, StorageError, UnitFailure};
use crate::generator::ContentGenerator;
use crate::plan::BookPlan;
use crate::store::OutputStore;
use crate::unit::{self, Unit, BACK_COVER_FILE};
use futures::future;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

pub mod prompt;
pub mod retry;
pub mod state;

pub use retry::RetryConfig;
pub use state::{
    BackCoverStatus, FailedUnit, GenerationResult, RunState, UnitOutcome, UnitState,
};

/// What to do after the first unit failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Record the failure and keep dispatching.
    #[default]
    Continue,
    /// Stop dispatching new units; in-flight units still finish.
    FailFast,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutorConfig {
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default)]
    pub failure_policy: FailurePolicy,
    #[serde(default = "default_min_complete_bytes")]
    pub min_complete_bytes: u64,
    /// Upper bound for a single generator call.
    #[serde(default = "default_generation_timeout_secs")]
    pub generation_timeout_secs: u64,
    /// How much of the preceding unit's ending is passed along as context.
    #[serde(default = "default_context_excerpt_chars")]
    pub context_excerpt_chars: usize,
    #[serde(default)]
    pub retry: RetryConfig,
}

fn default_concurrency() -> usize {
    3
}

fn default_min_complete_bytes() -> u64 {
    crate::store::DEFAULT_MIN_COMPLETE_BYTES
}

fn default_generation_timeout_secs() -> u64 {
    600
}

fn default_context_excerpt_chars() -> usize {
    1_500
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            failure_policy: FailurePolicy::default(),
            min_complete_bytes: default_min_complete_bytes(),
            generation_timeout_secs: default_generation_timeout_secs(),
            context_excerpt_chars: default_context_excerpt_chars(),
            retry: RetryConfig::default(),
        }
    }
}

impl ExecutorConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.concurrency == 0 {
            return Err("executor.concurrency must be at least 1".to_string());
        }
        if self.min_complete_bytes == 0 {
            return Err("executor.min_complete_bytes must be at least 1".to_string());
        }
        if self.generation_timeout_secs == 0 {
            return Err("executor.generation_timeout_secs must be at least 1".to_string());
        }
        self.retry.validate()
    }
}

pub struct UnitExecutor {
    config: ExecutorConfig,
    pricing: PricingConfig,
}

impl UnitExecutor {
    pub fn new(config: ExecutorConfig, pricing: PricingConfig) -> Self {
        Self { config, pricing }
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Units of `plan` in document order. Fails if two units would share a destination.
    pub fn enumerate(&self, plan: &BookPlan) -> Result<Vec<Unit>, PlanError> {
        let units = unit::enumerate(plan);
        let mut seen = HashSet::with_capacity(units.len());
        for unit in &units {
            if !seen.insert(unit.destination.as_path()) {
                return Err(PlanError::DuplicateDestination(unit.destination.clone()));
            }
        }
        Ok(units)
    }

    pub fn is_complete<S: OutputStore + ?Sized>(&self, unit: &Unit, store: &S) -> bool {
        store.is_complete(&unit.destination)
    }

    /// Closing excerpt of the preceding unit when it is already materialized.
    pub fn preceding_context<S: OutputStore + ?Sized>(&self, unit: &Unit, store: &S) -> String {
        let Some(previous) = unit.preceding.as_deref() else {
            return String::new();
        };
        if !store.is_complete(previous) {
            return String::new();
        }
        match store.read(previous) {
            Ok(Some(text)) => prompt::closing_excerpt(&text, self.config.context_excerpt_chars),
            Ok(None) => String::new(),
            Err(e) => {
                warn!(unit = %unit.id, error = %e, "Could not read preceding unit for context");
                String::new()
            }
        }
    }

    /// Generate text for one unit, retrying transient failures.
    pub async fn process<G: ContentGenerator + ?Sized>(
        &self,
        unit: &Unit,
        context: String,
        generator: &G,
        cancel: &CancellationToken,
    ) -> Result<GenerationResult, GenerationError> {
        let request = prompt::build_request(unit, context);
        let request_ref = &request;
        let timeout = Duration::from_secs(self.config.generation_timeout_secs);
        let started = Instant::now();

        let (result, attempts) =
            retry::retry_with_backoff(&self.config.retry, cancel, &request.label, move || async move {
                match tokio::time::timeout(timeout, generator.generate(request_ref)).await {
                    Ok(result) => result,
                    Err(_) => Err(GenerationError::Timeout(format!(
                        "no response within {}s",
                        timeout.as_secs()
                    ))),
                }
            })
            .await;
        let generated = result?;

        let text = generated.text.trim().to_string();
        if text.is_empty() {
            return Err(GenerationError::EmptyOutput);
        }

        let word_count = text.split_whitespace().count();
        let within_word_range = unit.word_range.contains(word_count);
        if !within_word_range {
            warn!(
                unit = %unit.id,
                word_count,
                target = %unit.word_range,
                "Generated text is outside the target word range"
            );
        }

        Ok(GenerationResult {
            unit: unit.id,
            text,
            model: generated.model,
            word_count,
            within_word_range,
            elapsed: started.elapsed(),
            attempts,
            cost: self.pricing.cost(&generated.usage),
            usage: generated.usage,
        })
    }

    /// Render and atomically write a unit's document.
    pub fn persist<S: OutputStore + ?Sized>(
        &self,
        unit: &Unit,
        result: &GenerationResult,
        store: &S,
    ) -> Result<PathBuf, StorageError> {
        store.persist(&unit.destination, &unit.render(&result.text))
    }

    /// Write the back cover verbatim from the plan unless it is already there.
    pub fn write_back_cover<S: OutputStore + ?Sized>(
        &self,
        plan: &BookPlan,
        store: &S,
    ) -> BackCoverStatus {
        let description = plan.back_cover_description.trim();
        if description.is_empty() {
            return BackCoverStatus::NoDescription;
        }
        let destination = Path::new(BACK_COVER_FILE);
        if store.is_complete(destination) {
            return BackCoverStatus::AlreadyPresent;
        }
        match store.persist(destination, &format!("{}\n", description)) {
            Ok(_) => BackCoverStatus::Written,
            Err(e) => {
                error!(error = %e, "Failed to write back cover");
                BackCoverStatus::Failed(e.to_string())
            }
        }
    }

    /// Materialize every missing unit of `plan` into `store`.
    ///
    /// Only plan problems are returned as errors; unit failures are recorded in the
    /// returned [`RunState`]. Cancelling `cancel` stops dispatch and interrupts backoff
    /// waits; units already generating are allowed to finish and persist.
    pub async fn run<G, S>(
        &self,
        plan: &BookPlan,
        generator: &G,
        store: &S,
        cancel: &CancellationToken,
    ) -> Result<RunState, PlanError>
    where
        G: ContentGenerator + ?Sized,
        S: OutputStore + ?Sized,
    {
        let started = Instant::now();
        plan.validate()?;
        let units = self.enumerate(plan)?;
        let mut state = RunState::new(units.len());
        state.back_cover = self.write_back_cover(plan, store);

        let mut pending: Vec<&Unit> = Vec::with_capacity(units.len());
        for unit in &units {
            if self.is_complete(unit, store) {
                let mut unit_state = UnitState::Pending;
                unit_state.advance(UnitState::Skipped);
                debug!(unit = %unit.id, path = %unit.destination.display(), "Already complete, skipping");
                state.record(UnitOutcome::Skipped {
                    unit: unit.id,
                    destination: unit.destination.clone(),
                });
            } else {
                pending.push(unit);
            }
        }

        let concurrency = self.config.concurrency.max(1);
        info!(
            book = %plan.slug,
            total = state.total,
            skipped = state.skipped,
            pending = pending.len(),
            concurrency,
            "Starting generation run"
        );

        let pending_count = pending.len();
        let dispatch = cancel.child_token();
        let mut outcomes = stream::iter(pending)
            .take_while(|_| future::ready(!dispatch.is_cancelled()))
            .map(|unit| self.execute_unit(unit, generator, store, cancel))
            .buffer_unordered(concurrency);

        while let Some(outcome) = outcomes.next().await {
            let failed = outcome.state() == UnitState::Failed;
            debug!(unit = %outcome.unit(), state = ?outcome.state(), "Unit finished");
            state.record(outcome);
            info!(
                processed = state.processed(),
                pending = pending_count,
                failed = state.failed,
                total_cost = format!("{:.6}", state.cost.total_cost),
                "Run progress"
            );
            if failed
                && self.config.failure_policy == FailurePolicy::FailFast
                && !dispatch.is_cancelled()
            {
                warn!("Unit failed with fail-fast policy; no further units will be dispatched");
                dispatch.cancel();
            }
        }
        drop(outcomes);

        state.not_dispatched = pending_count.saturating_sub(state.processed());
        state.cancelled = cancel.is_cancelled();
        state.elapsed = started.elapsed();
        info!(
            succeeded = state.succeeded,
            failed = state.failed,
            skipped = state.skipped,
            not_dispatched = state.not_dispatched,
            total_cost = format!("{:.6}", state.cost.total_cost),
            elapsed_ms = state.elapsed.as_millis() as u64,
            "Generation run finished"
        );
        Ok(state)
    }

    async fn execute_unit<G, S>(
        &self,
        unit: &Unit,
        generator: &G,
        store: &S,
        cancel: &CancellationToken,
    ) -> UnitOutcome
    where
        G: ContentGenerator + ?Sized,
        S: OutputStore + ?Sized,
    {
        let mut state = UnitState::Pending;
        state.advance(UnitState::Generating);
        info!(unit = %unit.id, title = unit.title(), "Generating unit");

        let context = self.preceding_context(unit, store);
        let result = match self.process(unit, context, generator, cancel).await {
            Ok(result) => result,
            Err(e) => {
                state.advance(UnitState::Failed);
                warn!(unit = %unit.id, error = %e, "Unit generation failed");
                return UnitOutcome::Failed {
                    unit: unit.id,
                    destination: unit.destination.clone(),
                    failure: UnitFailure::Generation(e),
                    cost: None,
                };
            }
        };
        state.advance(UnitState::Generated);

        match self.persist(unit, &result, store) {
            Ok(path) => {
                state.advance(UnitState::Persisted);
                info!(
                    unit = %unit.id,
                    path = %path.display(),
                    words = result.word_count,
                    attempts = result.attempts,
                    model = %result.model,
                    cost = format!("{:.6}", result.cost.total_cost),
                    elapsed_ms = result.elapsed.as_millis() as u64,
                    "Unit persisted"
                );
                UnitOutcome::Persisted {
                    unit: unit.id,
                    destination: unit.destination.clone(),
                    word_count: result.word_count,
                    within_word_range: result.within_word_range,
                    cost: result.cost,
                }
            }
            Err(e) => {
                state.advance(UnitState::Failed);
                error!(unit = %unit.id, error = %e, "Failed to persist unit");
                UnitOutcome::Failed {
                    unit: unit.id,
                    destination: unit.destination.clone(),
                    failure: UnitFailure::Persistence(e),
                    cost: Some(result.cost),
                }
            }
        }
    }
}
