//! The multiverse: declarations, pipeline and expanded universes together

use crate::config::RunConfig;
use crate::context::RunContext;
use crate::engine::{auto_engine, ExecutionEngine};
use crate::events::{EventBus, EventHandler, RunEvent};
use crate::pipeline::Pipeline;
use crate::runner::{CancellationToken, UniverseResult, UniverseRunner};
use crate::summary::ExecutionSummary;
use multiverse_core::{expand, BranchRegistry, Dataset, Error, Result, UniverseSet};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// A validated multiverse ready to execute.
///
/// Construction validates the pipeline against the registry and expands the
/// universe set once; both are immutable afterwards, so universe ids stay
/// stable across runs.
#[derive(Debug, Clone)]
pub struct Multiverse {
    registry: Arc<BranchRegistry>,
    pipeline: Arc<Pipeline>,
    universes: UniverseSet,
    config: RunConfig,
    events: EventBus,
    expansion_time: Duration,
}

impl Multiverse {
    /// Validate `pipeline` against `registry` and expand the universes
    #[instrument(skip_all, fields(parameters = registry.len(), steps = pipeline.len()))]
    pub fn new(registry: BranchRegistry, pipeline: Pipeline) -> Result<Self> {
        pipeline.validate(&registry)?;

        let start = Instant::now();
        let universes = expand(&registry)?;
        let expansion_time = start.elapsed();
        debug!(universes = universes.len(), ?expansion_time, "multiverse ready");

        Ok(Self {
            registry: Arc::new(registry),
            pipeline: Arc::new(pipeline),
            universes,
            config: RunConfig::default(),
            events: EventBus::new(),
            expansion_time,
        })
    }

    /// Replace the run configuration
    pub fn with_config(mut self, config: RunConfig) -> Result<Self> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    /// Register an observer for run events
    pub fn with_handler<H>(self, handler: H) -> Result<Self>
    where
        H: EventHandler + 'static,
    {
        self.events.register(handler)?;
        Ok(self)
    }

    pub fn registry(&self) -> &BranchRegistry {
        &self.registry
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn universes(&self) -> &UniverseSet {
        &self.universes
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Universe ids with their `(parameter, option)` choices
    pub fn universe_table(&self) -> Vec<(usize, Vec<(&str, &str)>)> {
        self.universes
            .iter()
            .map(|u| (u.id(), u.choices().collect()))
            .collect()
    }

    /// Execute a single universe, leaving the others untouched
    pub fn execute_universe(&self, id: usize, data: impl Into<Arc<Dataset>>) -> Result<UniverseResult> {
        let universe = self.universes.get(id).ok_or(Error::UnknownUniverse(id))?;
        let data = data.into();
        let context = RunContext::new();
        Ok(self.runner().run_observed(universe, &data, &self.events, &context))
    }

    /// Execute every universe with an engine sized by the configuration
    pub fn execute(&self, data: impl Into<Arc<Dataset>>) -> Result<MultiverseRun> {
        let engine = auto_engine(self.config.max_concurrency)?;
        self.execute_with(data, &engine, &CancellationToken::new())
    }

    /// Execute every universe on `engine`, stopping scheduling once `cancel`
    /// is triggered. Results are in universe-id order regardless of the
    /// order universes completed in.
    #[instrument(skip_all, fields(universes = self.universes.len(), threads = engine.num_threads()))]
    pub fn execute_with<E: ExecutionEngine>(
        &self,
        data: impl Into<Arc<Dataset>>,
        engine: &E,
        cancel: &CancellationToken,
    ) -> Result<MultiverseRun> {
        let data = data.into();
        let mut context = RunContext::new();
        context.record_stage_timing("expand", self.expansion_time);
        let trace_id = context.trace_id;

        self.events.publish(
            &RunEvent::RunStarted {
                trace_id,
                universes: self.universes.len(),
            },
            &context,
        );

        let runner = self.runner();
        let universes = self.universes.as_slice();
        let results = context.time_stage("execute", |context| {
            engine.execute_batch(universes.len(), |i| {
                let universe = &universes[i];
                if cancel.is_cancelled() {
                    self.events.publish(
                        &RunEvent::UniverseCancelled {
                            trace_id,
                            universe: universe.id(),
                        },
                        context,
                    );
                    return UniverseResult::cancelled(universe.id());
                }
                runner.run_observed(universe, &data, &self.events, context)
            })
        });

        let run = MultiverseRun {
            trace_id,
            universes: results,
            elapsed: context.elapsed(),
            stage_timings: context.stage_timings().clone(),
        };

        let summary = run.summary();
        self.events.publish(
            &RunEvent::RunCompleted {
                trace_id,
                succeeded: summary.succeeded,
                failed: summary.failed,
                timed_out: summary.timed_out,
                cancelled: summary.cancelled,
                elapsed: run.elapsed,
            },
            &context,
        );
        info!(%trace_id, "{summary}");

        Ok(run)
    }

    fn runner(&self) -> UniverseRunner {
        UniverseRunner::new(
            Arc::clone(&self.pipeline),
            Arc::clone(&self.registry),
            self.config.grid.clone(),
            self.config.universe_timeout,
            self.config.reuse_prefixes,
        )
    }
}

/// Results of executing a universe set
#[derive(Debug, Clone)]
pub struct MultiverseRun {
    pub trace_id: Uuid,
    /// One result per universe, in universe-id order
    pub universes: Vec<UniverseResult>,
    pub elapsed: Duration,
    pub stage_timings: HashMap<String, Duration>,
}

impl MultiverseRun {
    pub fn summary(&self) -> ExecutionSummary {
        ExecutionSummary::from_results(&self.universes)
    }

    /// Result for a universe id
    pub fn get(&self, id: usize) -> Option<&UniverseResult> {
        self.universes.iter().find(|r| r.universe_id == id)
    }

    /// Universes that produced results
    pub fn successful(&self) -> impl Iterator<Item = &UniverseResult> {
        self.universes.iter().filter(|r| r.is_success())
    }

    pub fn len(&self) -> usize {
        self.universes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.universes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::SequentialEngine;
    use crate::events::CountingHandler;
    use crate::runner::UniverseStatus;
    use crate::step::Step;
    use multiverse_core::{BranchOption, Column, Outcome};
    use std::sync::Mutex;

    /// Keeps the counts reported by the last `RunCompleted`
    #[derive(Clone, Default)]
    struct CompletionRecorder {
        last: Arc<Mutex<Option<(Uuid, [usize; 4])>>>,
    }

    impl EventHandler for CompletionRecorder {
        fn handle_event(&self, event: &RunEvent, _context: &RunContext) {
            if let RunEvent::RunCompleted {
                trace_id,
                succeeded,
                failed,
                timed_out,
                cancelled,
                ..
            } = event
            {
                *self.last.lock().unwrap() =
                    Some((*trace_id, [*succeeded, *failed, *timed_out, *cancelled]));
            }
        }
    }

    fn multiverse() -> Multiverse {
        let mut registry = BranchRegistry::new();
        registry
            .declare("offset", [BranchOption::new("low").value(0.0), BranchOption::new("high").value(5.0)])
            .unwrap();
        let pipeline = Pipeline::new().step(Step::branch("estimate", "offset", |state, option| {
            let mean = state.data().numeric("x")?.iter().sum::<f64>() / state.data().n_rows() as f64;
            let offset = option.payload().as_float().unwrap_or_default();
            state.record(Outcome::normal("mean", mean + offset, 0.5));
            Ok(())
        }));
        Multiverse::new(registry, pipeline).unwrap()
    }

    fn data() -> Dataset {
        Dataset::new(vec![Column::float("x", [1.0, 2.0, 3.0])]).unwrap()
    }

    #[test]
    fn test_new_rejects_invalid_pipeline() {
        let registry = BranchRegistry::new();
        let pipeline = Pipeline::new().step(Step::branch("s", "missing", |_, _| Ok(())));
        assert!(matches!(
            Multiverse::new(registry, pipeline),
            Err(Error::UnknownParameter(_))
        ));
    }

    #[test]
    fn test_universe_table() {
        let mv = multiverse();
        let table = mv.universe_table();
        assert_eq!(table.len(), 2);
        assert_eq!(table[0], (1, vec![("offset", "low")]));
        assert_eq!(table[1], (2, vec![("offset", "high")]));
    }

    #[test]
    fn test_execute_all() {
        let handler = CountingHandler::new();
        let mv = multiverse().with_handler(handler.clone()).unwrap();
        let run = mv.execute_with(data(), &SequentialEngine, &CancellationToken::new()).unwrap();

        assert_eq!(run.len(), 2);
        assert_eq!(run.get(1).unwrap().results[0].estimate, 2.0);
        assert_eq!(run.get(2).unwrap().results[0].estimate, 7.0);
        assert!(run.summary().all_succeeded());
        assert!(run.stage_timings.contains_key("execute"));

        let counts = handler.snapshot().unwrap();
        assert_eq!(counts.runs, 1);
        assert_eq!(counts.succeeded, 2);
    }

    #[test]
    fn test_execute_single_universe() {
        let mv = multiverse();
        let result = mv.execute_universe(2, data()).unwrap();
        assert_eq!(result.universe_id, 2);
        assert_eq!(result.results[0].estimate, 7.0);
        assert!(matches!(mv.execute_universe(3, data()), Err(Error::UnknownUniverse(3))));
    }

    #[test]
    fn test_cancelled_before_start() {
        let mv = multiverse();
        let token = CancellationToken::new();
        token.cancel();
        let run = mv.execute_with(data(), &SequentialEngine, &token).unwrap();
        assert!(run
            .universes
            .iter()
            .all(|r| r.status == UniverseStatus::Cancelled));
        assert_eq!(run.summary().cancelled, 2);
    }

    #[test]
    fn test_run_completed_matches_summary() {
        let recorder = CompletionRecorder::default();
        let mv = multiverse().with_handler(recorder.clone()).unwrap();
        let token = CancellationToken::new();
        token.cancel();
        let run = mv.execute_with(data(), &SequentialEngine, &token).unwrap();

        let summary = run.summary();
        let (trace_id, counts) = recorder.last.lock().unwrap().unwrap();
        assert_eq!(trace_id, run.trace_id);
        assert_eq!(counts, [0, 0, 0, 2]);
        assert_eq!(
            counts,
            [summary.succeeded, summary.failed, summary.timed_out, summary.cancelled]
        );
    }

    #[test]
    fn test_with_config_validates() {
        assert!(multiverse()
            .with_config(RunConfig::new().with_max_concurrency(0))
            .is_err());
        let mv = multiverse()
            .with_config(RunConfig::new().with_max_concurrency(1))
            .unwrap();
        assert_eq!(mv.config().max_concurrency, 1);
        assert!(mv.execute(data()).unwrap().summary().all_succeeded());
    }
}
