//! Integration tests for multiverse execution

mod common;

use multiverse_core::{Column, Outcome};
use multiverse_exec::{
    CancellationToken, CountingHandler, Multiverse, Pipeline, RunConfig, SequentialEngine, Step,
    UniverseStatus,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn estimates(run: &multiverse_exec::MultiverseRun) -> Vec<(usize, f64)> {
    run.universes
        .iter()
        .map(|r| (r.universe_id, r.results[0].estimate))
        .collect()
}

#[test]
fn test_results_per_universe() {
    let multiverse = Multiverse::new(common::registry(), common::pipeline()).unwrap();
    let run = multiverse
        .execute_with(common::dataset(), &SequentialEngine, &CancellationToken::new())
        .unwrap();

    // y = [-2, 1, 3, 4, -1, 6]; positive rows = [1, 3, 4, 6]
    assert_eq!(
        estimates(&run),
        vec![(1, 11.0 / 6.0), (2, 2.0), (3, 3.5), (4, 3.5)]
    );
}

#[test]
fn test_input_dataset_is_not_modified() {
    let data = common::dataset();
    let multiverse = Multiverse::new(common::registry(), common::pipeline()).unwrap();
    multiverse
        .execute_with(Arc::clone(&data), &SequentialEngine, &CancellationToken::new())
        .unwrap();
    assert_eq!(data.n_rows(), 6);
}

#[test]
fn test_mutating_step_gets_private_copy() {
    let data = common::dataset();
    let pipeline = common::pipeline().step(Step::fixed("negate", "y <- -y", |state| {
        let negated: Vec<f64> = state.data().numeric("y")?.iter().map(|v| -v).collect();
        state.data_mut().set_column(Column::float("y", negated))?;
        Ok(())
    }));
    let multiverse = Multiverse::new(common::registry(), pipeline).unwrap();
    let run = multiverse
        .execute_with(Arc::clone(&data), &SequentialEngine, &CancellationToken::new())
        .unwrap();
    assert!(run.summary().all_succeeded());
    assert_eq!(data.numeric("y").unwrap(), vec![-2.0, 1.0, 3.0, 4.0, -1.0, 6.0]);
}

#[test]
fn test_failure_is_isolated() {
    let pipeline = common::pipeline().step(Step::branch("check", "filter", |state, option| {
        if option.name() == "all" {
            anyhow::bail!("negative values present");
        }
        state.set("checked", true);
        Ok(())
    }));
    let handler = CountingHandler::new();
    let multiverse = Multiverse::new(common::registry(), pipeline)
        .unwrap()
        .with_handler(handler.clone())
        .unwrap();
    let run = multiverse
        .execute_with(common::dataset(), &SequentialEngine, &CancellationToken::new())
        .unwrap();

    let summary = run.summary();
    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.failed, 2);
    assert_eq!(summary.failures.len(), 1);
    assert_eq!(summary.failures[0].step, "check");
    assert_eq!(summary.failures[0].universes, vec![1, 2]);

    let third = run.get(3).unwrap();
    assert!(third.is_success());
    assert_eq!(third.results[0].estimate, 3.5);
    assert!(run.get(1).unwrap().results.is_empty());

    let counts = handler.snapshot().unwrap();
    assert_eq!(counts.failed, 2);
    assert_eq!(counts.failures_by_step.get("check"), Some(&2));
}

#[test]
fn test_panic_is_isolated() {
    let pipeline = common::pipeline().step(Step::branch("fragile", "model", |_, option| {
        if option.name() == "median" {
            panic!("index out of range");
        }
        Ok(())
    }));
    let multiverse = Multiverse::new(common::registry(), pipeline).unwrap();
    let run = multiverse
        .execute_with(common::dataset(), &SequentialEngine, &CancellationToken::new())
        .unwrap();

    let statuses: Vec<bool> = run.universes.iter().map(|r| r.is_success()).collect();
    assert_eq!(statuses, vec![true, false, true, false]);
    let failure = run.get(2).unwrap().failure().unwrap();
    assert_eq!(failure.step, "fragile");
    assert!(failure.cause.contains("index out of range"));
}

#[test]
fn test_timeout_is_isolated() {
    let pipeline = common::pipeline().step(Step::branch("slow", "model", |_, option| {
        if option.name() == "median" {
            std::thread::sleep(Duration::from_millis(400));
        }
        Ok(())
    }));
    let multiverse = Multiverse::new(common::registry(), pipeline)
        .unwrap()
        .with_config(RunConfig::new().with_universe_timeout(Duration::from_millis(50)))
        .unwrap();
    let run = multiverse
        .execute_with(common::dataset(), &SequentialEngine, &CancellationToken::new())
        .unwrap();

    let summary = run.summary();
    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.timed_out, 2);
    assert!(matches!(
        run.get(2).unwrap().status,
        UniverseStatus::TimedOut(_)
    ));
    assert!(run.get(1).unwrap().is_success());
}

#[test]
fn test_cancellation_keeps_completed_results() {
    let token = CancellationToken::new();
    let trigger = token.clone();
    let pipeline = common::pipeline().step(Step::fixed("maybe-cancel", "", move |state| {
        if state.universe_id() == 2 {
            trigger.cancel();
        }
        Ok(())
    }));
    let multiverse = Multiverse::new(common::registry(), pipeline).unwrap();
    let run = multiverse
        .execute_with(common::dataset(), &SequentialEngine, &token)
        .unwrap();

    assert!(run.get(1).unwrap().is_success());
    assert!(run.get(2).unwrap().is_success());
    assert_eq!(run.get(3).unwrap().status, UniverseStatus::Cancelled);
    assert_eq!(run.get(4).unwrap().status, UniverseStatus::Cancelled);
    assert_eq!(run.summary().cancelled, 2);
}

#[test]
fn test_prefix_reuse_is_equivalent() {
    let loads = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&loads);
    let pipeline = Pipeline::new()
        .step(Step::fixed("load", "d <- load()", move |state| {
            counter.fetch_add(1, Ordering::SeqCst);
            state.set("loaded", true);
            Ok(())
        }))
        .step(common::pipeline().steps()[0].clone())
        .step(common::pipeline().steps()[1].clone());

    let fresh = Multiverse::new(common::registry(), pipeline.clone()).unwrap();
    let reused = Multiverse::new(common::registry(), pipeline)
        .unwrap()
        .with_config(RunConfig::new().with_prefix_reuse(true))
        .unwrap();

    let a = fresh
        .execute_with(common::dataset(), &SequentialEngine, &CancellationToken::new())
        .unwrap();
    let fresh_loads = loads.swap(0, Ordering::SeqCst);
    let b = reused
        .execute_with(common::dataset(), &SequentialEngine, &CancellationToken::new())
        .unwrap();
    let reused_loads = loads.load(Ordering::SeqCst);

    assert_eq!(fresh_loads, 4);
    assert_eq!(reused_loads, 1);
    assert_eq!(estimates(&a), estimates(&b));
    for (x, y) in a.universes.iter().zip(&b.universes) {
        assert_eq!(x.results, y.results);
    }
}

#[test]
fn test_outcomes_keep_recording_order() {
    let pipeline = Pipeline::new().step(Step::fixed("fit", "", |state| {
        state.record(Outcome::normal("(Intercept)", 1.0, 0.1));
        state.record(Outcome::normal("slope", 0.5, 0.2).with_p_value(0.03));
        state.record(Outcome::normal("age", -0.1, 0.05));
        Ok(())
    }));
    let multiverse = Multiverse::new(common::registry(), pipeline).unwrap();
    let result = multiverse.execute_universe(1, common::dataset()).unwrap();
    let terms: Vec<&str> = result.results.iter().map(|r| r.term.as_str()).collect();
    assert_eq!(terms, vec!["(Intercept)", "slope", "age"]);
    assert_eq!(result.results[1].p_value(), Some(0.03));
}

#[cfg(feature = "parallel")]
#[test]
fn test_parallel_matches_sequential() {
    use multiverse_exec::{ExecutionEngine, ParallelEngine};

    let pipeline = common::pipeline().step(Step::fixed("jitter", "", |state| {
        // Later universes finish first
        let delay = 5 * (5 - state.universe_id() as u64);
        std::thread::sleep(Duration::from_millis(delay));
        Ok(())
    }));
    let multiverse = Multiverse::new(common::registry(), pipeline).unwrap();

    let sequential = multiverse
        .execute_with(common::dataset(), &SequentialEngine, &CancellationToken::new())
        .unwrap();
    let engine = ParallelEngine::with_num_threads(4).unwrap();
    assert!(engine.is_parallel());
    let parallel = multiverse
        .execute_with(common::dataset(), &engine, &CancellationToken::new())
        .unwrap();

    assert_eq!(estimates(&sequential), estimates(&parallel));
}
