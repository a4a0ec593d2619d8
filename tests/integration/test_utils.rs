//! Shared fixtures: plans, a scripted generator and executor builders.

use async_trait::async_trait;
use bookwright::cost::PricingConfig;
use bookwright::error::GenerationError;
use bookwright::executor::{ExecutorConfig, FailurePolicy, RetryConfig, UnitExecutor};
use bookwright::generator::{ContentGenerator, GeneratedText, GenerationRequest};
use bookwright::provider::TokenUsage;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// One part, two chapters, two sections each.
pub const SCENARIO_PLAN: &str = r#"
book_language: en
name: "The Living Cell"
target_reader: "Curious adults"
back_cover_description: "A guided tour through the machinery of life."
parts:
  - name: "Foundations"
    introduction: "What cells are made of."
    chapters:
      - name: "Membranes"
        sections:
          - name: "Lipids"
            bullet_points: ["bilayers", "fluidity"]
          - name: "Proteins"
            bullet_points: ["channels", "pumps"]
      - name: "Energy"
        sections:
          - name: "ATP"
            bullet_points: ["phosphate bonds"]
          - name: "Mitochondria"
            bullet_points: ["respiration"]
"#;

pub const SCENARIO_PATHS: [&str; 5] = [
    "part_01/_part_01_intro.md",
    "part_01/01_01_01_section.md",
    "part_01/01_01_02_section.md",
    "part_01/01_02_01_section.md",
    "part_01/01_02_02_section.md",
];

/// Generator whose behaviour is scripted per unit label.
#[derive(Default)]
pub struct ScriptedGenerator {
    calls: Mutex<Vec<String>>,
    transient: Mutex<HashMap<String, VecDeque<GenerationError>>>,
    permanent: HashSet<String>,
    delay: Option<Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail `label` with each error in turn before succeeding.
    pub fn with_transient(self, label: &str, errors: Vec<GenerationError>) -> Self {
        self.transient
            .lock()
            .insert(label.to_string(), errors.into_iter().collect());
        self
    }

    /// Always reject `label` as an invalid request.
    pub fn with_permanent_failure(mut self, label: &str) -> Self {
        self.permanent.insert(label.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn calls_for(&self, label: &str) -> usize {
        self.calls.lock().iter().filter(|c| c.as_str() == label).count()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentGenerator for ScriptedGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedText, GenerationError> {
        self.calls.lock().push(request.label.clone());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.permanent.contains(&request.label) {
            return Err(GenerationError::InvalidRequest(format!(
                "rejected {}",
                request.label
            )));
        }
        let scripted = self
            .transient
            .lock()
            .get_mut(&request.label)
            .and_then(|queue| queue.pop_front());
        if let Some(err) = scripted {
            return Err(err);
        }
        Ok(GeneratedText {
            text: format!("Written text for {} covering the outline.", request.label),
            usage: TokenUsage {
                prompt_tokens: 1_000,
                completion_tokens: 500,
                reasoning_tokens: 100,
                total_tokens: 1_600,
            },
            model: "scripted".to_string(),
        })
    }
}

pub fn fast_retry() -> RetryConfig {
    RetryConfig {
        max_attempts: 4,
        initial_delay_ms: 1,
        max_delay_ms: 4,
        multiplier: 2.0,
    }
}

pub fn executor(concurrency: usize, failure_policy: FailurePolicy) -> UnitExecutor {
    UnitExecutor::new(
        ExecutorConfig {
            concurrency,
            failure_policy,
            retry: fast_retry(),
            ..ExecutorConfig::default()
        },
        PricingConfig::default(),
    )
}
