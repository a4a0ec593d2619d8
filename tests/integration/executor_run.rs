//! End-to-end runs of the unit executor against a real file tree.

use super::test_utils::{executor, ScriptedGenerator, SCENARIO_PATHS, SCENARIO_PLAN};
use bookwright::error::GenerationError;
use bookwright::executor::{BackCoverStatus, FailurePolicy};
use bookwright::plan::BookPlan;
use bookwright::store::{FileSystemStore, OutputStore};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

fn setup() -> (TempDir, FileSystemStore, BookPlan) {
    let temp = TempDir::new().unwrap();
    let store = FileSystemStore::new(temp.path().join("living-cell")).unwrap();
    let plan = BookPlan::from_yaml_str(SCENARIO_PLAN).unwrap();
    (temp, store, plan)
}

fn snapshot(store: &FileSystemStore) -> Vec<(String, Vec<u8>)> {
    SCENARIO_PATHS
        .iter()
        .map(|p| (p.to_string(), fs::read(store.root().join(p)).unwrap()))
        .collect()
}

#[tokio::test]
async fn test_scenario_writes_expected_paths() {
    let (_temp, store, plan) = setup();
    let generator = ScriptedGenerator::new();

    let state = executor(3, FailurePolicy::Continue)
        .run(&plan, &generator, &store, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(state.total, 5);
    assert_eq!(state.succeeded, 5);
    assert_eq!(state.failed, 0);
    assert_eq!(state.skipped, 0);
    assert!(state.is_complete());
    assert_eq!(state.back_cover, BackCoverStatus::Written);
    assert_eq!(state.cost.prompt_tokens, 5_000);
    assert_eq!(state.cost.output_tokens, 3_000);
    // Scripted text is far shorter than any target range.
    assert_eq!(state.out_of_range, 5);

    for path in SCENARIO_PATHS {
        assert!(store.is_complete(Path::new(path)), "{} should be complete", path);
    }
    assert_eq!(
        fs::read_to_string(store.root().join("part_01/01_02_01_section.md")).unwrap(),
        "## ATP\n\nWritten text for section 1.2.1 covering the outline.\n"
    );
    assert!(fs::read_to_string(store.root().join("part_01/_part_01_intro.md"))
        .unwrap()
        .starts_with("# Part 1: Foundations\n\n"));
    assert_eq!(
        fs::read_to_string(store.root().join("back_cover.md")).unwrap(),
        "A guided tour through the machinery of life.\n"
    );
}

#[tokio::test]
async fn test_second_run_is_a_no_op() {
    let (_temp, store, plan) = setup();
    let first = ScriptedGenerator::new();
    executor(2, FailurePolicy::Continue)
        .run(&plan, &first, &store, &CancellationToken::new())
        .await
        .unwrap();
    let before = snapshot(&store);

    let second = ScriptedGenerator::new();
    let state = executor(2, FailurePolicy::Continue)
        .run(&plan, &second, &store, &CancellationToken::new())
        .await
        .unwrap();

    assert!(second.calls().is_empty());
    assert_eq!(state.skipped, 5);
    assert_eq!(state.succeeded, 0);
    assert_eq!(state.back_cover, BackCoverStatus::AlreadyPresent);
    assert_eq!(snapshot(&store), before);
}

#[tokio::test]
async fn test_resume_generates_only_missing_units() {
    let (_temp, store, plan) = setup();
    store
        .persist(Path::new("part_01/_part_01_intro.md"), "# Part 1: Foundations\n\nHand written.\n")
        .unwrap();
    store
        .persist(Path::new("part_01/01_01_01_section.md"), "## Lipids\n\nHand written lipids.\n")
        .unwrap();
    // A truncated leftover does not count as done.
    fs::write(store.root().join("part_01/01_01_02_section.md"), "## P").unwrap();

    let generator = ScriptedGenerator::new();
    let state = executor(1, FailurePolicy::Continue)
        .run(&plan, &generator, &store, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(state.skipped, 2);
    assert_eq!(state.succeeded, 3);
    assert_eq!(
        generator.calls(),
        vec!["section 1.1.2", "section 1.2.1", "section 1.2.2"]
    );
    assert_eq!(
        fs::read_to_string(store.root().join("part_01/01_01_01_section.md")).unwrap(),
        "## Lipids\n\nHand written lipids.\n"
    );
    assert!(store.is_complete(Path::new("part_01/01_01_02_section.md")));
}

#[tokio::test]
async fn test_failed_unit_does_not_stop_others() {
    let (_temp, store, plan) = setup();
    let generator = ScriptedGenerator::new().with_permanent_failure("section 1.1.2");

    let state = executor(2, FailurePolicy::Continue)
        .run(&plan, &generator, &store, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(state.succeeded, 4);
    assert_eq!(state.failed, 1);
    assert!(!state.is_complete());
    assert_eq!(state.failures[0].unit, "section 1.1.2");
    assert!(state.failures[0].error.contains("rejected section 1.1.2"));
    assert_eq!(generator.calls_for("section 1.1.2"), 1);
    assert!(!store.root().join("part_01/01_01_02_section.md").exists());

    let retry = ScriptedGenerator::new();
    let state = executor(2, FailurePolicy::Continue)
        .run(&plan, &retry, &store, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(retry.calls(), vec!["section 1.1.2"]);
    assert!(state.is_complete());
}

#[tokio::test]
async fn test_rate_limited_twice_then_persisted() {
    let (_temp, store, plan) = setup();
    let generator = ScriptedGenerator::new().with_transient(
        "section 1.1.1",
        vec![
            GenerationError::RateLimited("429".into()),
            GenerationError::RateLimited("429".into()),
        ],
    );

    let state = executor(1, FailurePolicy::Continue)
        .run(&plan, &generator, &store, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(generator.calls_for("section 1.1.1"), 3);
    assert_eq!(state.succeeded, 5);
    assert!(store.is_complete(Path::new("part_01/01_01_01_section.md")));
}

#[tokio::test]
async fn test_fail_fast_stops_dispatch() {
    let (_temp, store, plan) = setup();
    let generator = ScriptedGenerator::new().with_permanent_failure("part-intro 1");

    let state = executor(1, FailurePolicy::FailFast)
        .run(&plan, &generator, &store, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(state.failed, 1);
    assert_eq!(state.succeeded, 0);
    assert_eq!(state.not_dispatched, 4);
    assert_eq!(generator.calls(), vec!["part-intro 1"]);
    assert!(!state.is_complete());
    assert!(!state.cancelled);
}

#[tokio::test]
async fn test_cancelled_before_start_dispatches_nothing() {
    let (_temp, store, plan) = setup();
    let generator = ScriptedGenerator::new();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let state = executor(3, FailurePolicy::Continue)
        .run(&plan, &generator, &store, &cancel)
        .await
        .unwrap();

    assert!(generator.calls().is_empty());
    assert_eq!(state.not_dispatched, 5);
    assert!(state.cancelled);
    assert!(!state.is_complete());
}

#[tokio::test]
async fn test_cancellation_interrupts_backoff() {
    let (_temp, store, plan) = setup();
    let generator = ScriptedGenerator::new().with_transient(
        "part-intro 1",
        vec![GenerationError::RateLimited("busy".into()); 3],
    );
    let executor = bookwright::executor::UnitExecutor::new(
        bookwright::executor::ExecutorConfig {
            concurrency: 1,
            retry: bookwright::executor::RetryConfig {
                max_attempts: 4,
                initial_delay_ms: 60_000,
                max_delay_ms: 60_000,
                multiplier: 1.0,
            },
            ..Default::default()
        },
        Default::default(),
    );
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let started = std::time::Instant::now();
    let state = executor.run(&plan, &generator, &store, &cancel).await.unwrap();

    assert!(started.elapsed() < Duration::from_secs(30));
    assert!(state.cancelled);
    assert_eq!(state.failed, 1);
    assert!(state.failures[0].error.contains("cancelled"));
    assert_eq!(state.not_dispatched, 4);
}

#[tokio::test]
async fn test_concurrency_is_bounded() {
    let (_temp, store, plan) = setup();
    let generator = ScriptedGenerator::new().with_delay(Duration::from_millis(20));

    let state = executor(2, FailurePolicy::Continue)
        .run(&plan, &generator, &store, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(state.succeeded, 5);
    assert_eq!(generator.max_in_flight(), 2);
}

#[tokio::test]
async fn test_invalid_plan_fails_before_generation() {
    let temp = TempDir::new().unwrap();
    let store = FileSystemStore::new(temp.path()).unwrap();
    let mut plan = BookPlan::from_yaml_str(SCENARIO_PLAN).unwrap();
    plan.parts[0].chapters.clear();
    let generator = ScriptedGenerator::new();

    let result = executor(1, FailurePolicy::Continue)
        .run(&plan, &generator, &store, &CancellationToken::new())
        .await;

    assert!(result.is_err());
    assert!(generator.calls().is_empty());
    assert!(!temp.path().join("back_cover.md").exists());
}
