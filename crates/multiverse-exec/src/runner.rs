//! Per-universe execution with failure isolation
//!
//! Each universe runs its steps strictly in order over a private
//! [`UniverseState`]. An error or panic in any step halts that universe
//! only; the failure is captured in its [`UniverseResult`] and every other
//! universe is unaffected.

use crate::context::RunContext;
use crate::events::{EventBus, RunEvent};
use crate::pipeline::{Pipeline, PrefixKey};
use crate::state::UniverseState;
use crossbeam_channel::RecvTimeoutError;
use multiverse_core::{BranchRegistry, Dataset, Universe};
use multiverse_summary::{summarize, CdfGrid, TermResult};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Step name reported when summarizing recorded outcomes fails
pub const SUMMARIZE_STEP: &str = "summarize";

/// Where and why a universe stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniverseFailure {
    /// Name of the failing step
    pub step: String,
    /// Rendered error or panic message
    pub cause: String,
}

impl fmt::Display for UniverseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "step '{}': {}", self.step, self.cause)
    }
}

/// Terminal state of one universe
#[derive(Debug, Clone, PartialEq)]
pub enum UniverseStatus {
    Succeeded,
    Failed(UniverseFailure),
    /// Exceeded the configured limit; the worker was abandoned
    TimedOut(Duration),
    /// Never scheduled because the run was cancelled
    Cancelled,
}

/// Outcome of executing one universe
#[derive(Debug, Clone)]
pub struct UniverseResult {
    pub universe_id: usize,
    pub status: UniverseStatus,
    /// Summarized terms in recording order; empty unless succeeded
    pub results: Vec<TermResult>,
    pub elapsed: Duration,
}

impl UniverseResult {
    pub fn is_success(&self) -> bool {
        self.status == UniverseStatus::Succeeded
    }

    pub fn failure(&self) -> Option<&UniverseFailure> {
        match &self.status {
            UniverseStatus::Failed(failure) => Some(failure),
            _ => None,
        }
    }

    /// Result for a universe never scheduled
    pub fn cancelled(universe_id: usize) -> Self {
        Self::halted(universe_id, UniverseStatus::Cancelled, Duration::ZERO)
    }

    fn halted(universe_id: usize, status: UniverseStatus, elapsed: Duration) -> Self {
        Self {
            universe_id,
            status,
            results: Vec::new(),
            elapsed,
        }
    }

    fn failed(universe_id: usize, step: &str, cause: String, elapsed: Duration) -> Self {
        Self::halted(
            universe_id,
            UniverseStatus::Failed(UniverseFailure {
                step: step.to_string(),
                cause,
            }),
            elapsed,
        )
    }
}

/// Cooperative cancellation flag shared between a run and its caller
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop scheduling new universes; running ones finish normally
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// States reached after shared step prefixes
#[derive(Debug, Default)]
pub(crate) struct PrefixCache {
    states: Mutex<HashMap<PrefixKey, UniverseState>>,
}

impl PrefixCache {
    fn lookup(&self, key: &PrefixKey) -> Option<UniverseState> {
        self.states.lock().ok()?.get(key).cloned()
    }

    fn store(&self, key: PrefixKey, state: &UniverseState) {
        if let Ok(mut states) = self.states.lock() {
            states.entry(key).or_insert_with(|| state.clone());
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.states.lock().map(|s| s.len()).unwrap_or(0)
    }
}

struct Attempt {
    result: UniverseResult,
    reused_steps: usize,
}

/// Everything needed to run any universe of one multiverse.
///
/// Cheap to clone; a clone is moved onto a watchdog-supervised thread when
/// a universe timeout is configured.
#[derive(Clone)]
pub(crate) struct UniverseRunner {
    pipeline: Arc<Pipeline>,
    registry: Arc<BranchRegistry>,
    grid: CdfGrid,
    timeout: Option<Duration>,
    prefixes: Option<(Arc<PrefixCache>, Arc<Vec<Vec<String>>>)>,
}

impl UniverseRunner {
    pub(crate) fn new(
        pipeline: Arc<Pipeline>,
        registry: Arc<BranchRegistry>,
        grid: CdfGrid,
        timeout: Option<Duration>,
        reuse_prefixes: bool,
    ) -> Self {
        let prefixes = reuse_prefixes.then(|| {
            (
                Arc::new(PrefixCache::default()),
                Arc::new(pipeline.prefix_parameters()),
            )
        });
        Self {
            pipeline,
            registry,
            grid,
            timeout,
            prefixes,
        }
    }

    #[cfg(test)]
    pub(crate) fn cached_prefixes(&self) -> usize {
        self.prefixes.as_ref().map(|(c, _)| c.len()).unwrap_or(0)
    }

    /// Run a universe and publish its lifecycle events
    pub(crate) fn run_observed(
        &self,
        universe: &Universe,
        data: &Arc<Dataset>,
        events: &EventBus,
        context: &RunContext,
    ) -> UniverseResult {
        let trace_id = context.trace_id;
        let id = universe.id();
        events.publish(&RunEvent::UniverseStarted { trace_id, universe: id }, context);

        let attempt = self.run(universe, data);
        if attempt.reused_steps > 0 {
            events.publish(
                &RunEvent::PrefixReused {
                    trace_id,
                    universe: id,
                    steps: attempt.reused_steps,
                },
                context,
            );
        }

        let result = attempt.result;
        let event = match &result.status {
            UniverseStatus::Succeeded => RunEvent::UniverseSucceeded {
                trace_id,
                universe: id,
                terms: result.results.len(),
                elapsed: result.elapsed,
            },
            UniverseStatus::Failed(failure) => RunEvent::UniverseFailed {
                trace_id,
                universe: id,
                step: failure.step.clone(),
                cause: failure.cause.clone(),
            },
            UniverseStatus::TimedOut(limit) => RunEvent::UniverseTimedOut {
                trace_id,
                universe: id,
                limit: *limit,
            },
            UniverseStatus::Cancelled => RunEvent::UniverseCancelled {
                trace_id,
                universe: id,
            },
        };
        events.publish(&event, context);
        result
    }

    fn run(&self, universe: &Universe, data: &Arc<Dataset>) -> Attempt {
        let Some(limit) = self.timeout else {
            return self.run_inline(universe, data);
        };

        let start = Instant::now();
        let (tx, rx) = crossbeam_channel::bounded(1);
        let runner = self.clone();
        let owned = universe.clone();
        let data = Arc::clone(data);
        let spawned = std::thread::Builder::new()
            .name(format!("universe-{}", universe.id()))
            .spawn(move || {
                let _ = tx.send(runner.run_inline(&owned, &data));
            });

        if let Err(e) = spawned {
            return Attempt {
                result: UniverseResult::failed(
                    universe.id(),
                    "<scheduler>",
                    format!("failed to spawn universe worker: {e}"),
                    start.elapsed(),
                ),
                reused_steps: 0,
            };
        }

        match rx.recv_timeout(limit) {
            Ok(attempt) => attempt,
            Err(RecvTimeoutError::Timeout) => {
                warn!(universe = universe.id(), ?limit, "universe timed out");
                Attempt {
                    result: UniverseResult::halted(
                        universe.id(),
                        UniverseStatus::TimedOut(limit),
                        start.elapsed(),
                    ),
                    reused_steps: 0,
                }
            }
            Err(RecvTimeoutError::Disconnected) => Attempt {
                result: UniverseResult::failed(
                    universe.id(),
                    "<scheduler>",
                    "universe worker exited without a result".to_string(),
                    start.elapsed(),
                ),
                reused_steps: 0,
            },
        }
    }

    fn run_inline(&self, universe: &Universe, data: &Arc<Dataset>) -> Attempt {
        let start = Instant::now();
        let id = universe.id();
        let steps = self.pipeline.steps();

        let (mut state, first, reused_steps) = self.resume(universe, data);
        debug!(universe = id, resumed_at = first, "universe started");

        for (index, step) in steps.iter().enumerate().skip(first) {
            let outcome = catch_unwind(AssertUnwindSafe(|| {
                step.run(&mut state, universe, &self.registry)
            }));
            let cause = match outcome {
                Ok(Ok(())) => None,
                Ok(Err(e)) => Some(format!("{e:#}")),
                Err(payload) => Some(format!("panicked: {}", panic_message(payload.as_ref()))),
            };
            if let Some(cause) = cause {
                warn!(universe = id, step = step.name(), "step failed: {cause}");
                return Attempt {
                    result: UniverseResult::failed(id, step.name(), cause, start.elapsed()),
                    reused_steps,
                };
            }

            if let Some((cache, parameters)) = &self.prefixes {
                if index + 1 < steps.len() {
                    cache.store(
                        Pipeline::prefix_key(index, &parameters[index], universe),
                        &state,
                    );
                }
            }
        }

        let results: Result<Vec<TermResult>, _> = state
            .outcomes()
            .iter()
            .map(|outcome| summarize(outcome, &self.grid))
            .collect();

        let result = match results {
            Ok(results) => {
                debug!(universe = id, terms = results.len(), "universe succeeded");
                UniverseResult {
                    universe_id: id,
                    status: UniverseStatus::Succeeded,
                    results,
                    elapsed: start.elapsed(),
                }
            }
            Err(e) => {
                warn!(universe = id, "summarizing outcomes failed: {e}");
                UniverseResult::failed(id, SUMMARIZE_STEP, e.to_string(), start.elapsed())
            }
        };
        Attempt {
            result,
            reused_steps,
        }
    }

    /// Latest cached state this universe shares, or a fresh one
    fn resume(&self, universe: &Universe, data: &Arc<Dataset>) -> (UniverseState, usize, usize) {
        if let Some((cache, parameters)) = &self.prefixes {
            let last = self.pipeline.len().saturating_sub(1);
            for index in (0..last).rev() {
                let key = Pipeline::prefix_key(index, &parameters[index], universe);
                if let Some(state) = cache.lookup(&key) {
                    debug!(universe = universe.id(), steps = index + 1, "resuming from cached prefix");
                    return (state.rebind(universe.id()), index + 1, index + 1);
                }
            }
        }
        (UniverseState::new(universe.id(), Arc::clone(data)), 0, 0)
    }
}

/// Execute one universe's pipeline over a shared dataset.
///
/// Never fails: step errors and panics are captured in the returned
/// result's status.
pub fn execute_universe(
    pipeline: &Pipeline,
    universe: &Universe,
    registry: &BranchRegistry,
    data: Arc<Dataset>,
    grid: &CdfGrid,
) -> UniverseResult {
    let runner = UniverseRunner::new(
        Arc::new(pipeline.clone()),
        Arc::new(registry.clone()),
        grid.clone(),
        None,
        false,
    );
    runner.run_inline(universe, &data).result
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
