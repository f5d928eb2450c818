//! Run context
//!
//! The RunContext flows through one multiverse run, carrying its trace id
//! and the timing of each stage (expansion, execution).

use std::collections::HashMap;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Context that flows through a multiverse run
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Unique trace ID for this run
    pub trace_id: Uuid,
    /// When the run started
    pub start_time: Instant,
    stage_timings: HashMap<String, Duration>,
}

impl RunContext {
    pub fn new() -> Self {
        Self::with_trace_id(Uuid::new_v4())
    }

    /// Create a context with a specific trace ID
    pub fn with_trace_id(trace_id: Uuid) -> Self {
        Self {
            trace_id,
            start_time: Instant::now(),
            stage_timings: HashMap::new(),
        }
    }

    /// Record timing for a stage measured elsewhere
    pub fn record_stage_timing(&mut self, stage: impl Into<String>, duration: Duration) {
        self.stage_timings.insert(stage.into(), duration);
    }

    /// Time a stage. The stage body sees the context read-only, so it can
    /// hand it on to event handlers while it runs.
    pub fn time_stage<F, R>(&mut self, stage: impl Into<String>, f: F) -> R
    where
        F: FnOnce(&Self) -> R,
    {
        let stage_name = stage.into();
        let start = Instant::now();
        let result = f(self);
        self.record_stage_timing(stage_name, start.elapsed());
        result
    }

    /// Total elapsed time since the run started
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn stage_timings(&self) -> &HashMap<String, Duration> {
        &self.stage_timings
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}
