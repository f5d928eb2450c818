//! Event-based run notification system
//!
//! Runs publish [`RunEvent`]s on an [`EventBus`] so that several consumers
//! (logging, progress counters, custom reporters) can observe execution
//! without coupling to the runner.

use crate::context::RunContext;
use multiverse_core::{Error, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

/// Event emitted during a multiverse run
#[derive(Debug, Clone, PartialEq)]
pub enum RunEvent {
    /// Execution of a universe set started
    RunStarted { trace_id: Uuid, universes: usize },

    /// A universe was scheduled and began executing
    UniverseStarted { trace_id: Uuid, universe: usize },

    /// A universe resumed from a cached prefix state
    PrefixReused {
        trace_id: Uuid,
        universe: usize,
        steps: usize,
    },

    /// A universe finished and produced its results
    UniverseSucceeded {
        trace_id: Uuid,
        universe: usize,
        terms: usize,
        elapsed: Duration,
    },

    /// A step failed; the universe halted
    UniverseFailed {
        trace_id: Uuid,
        universe: usize,
        step: String,
        cause: String,
    },

    /// A universe exceeded its time limit
    UniverseTimedOut {
        trace_id: Uuid,
        universe: usize,
        limit: Duration,
    },

    /// A universe was never scheduled because the run was cancelled
    UniverseCancelled { trace_id: Uuid, universe: usize },

    /// Execution of the universe set finished
    RunCompleted {
        trace_id: Uuid,
        succeeded: usize,
        failed: usize,
        timed_out: usize,
        cancelled: usize,
        elapsed: Duration,
    },
}

/// Trait for handling run events
pub trait EventHandler: Send + Sync {
    /// Handle a run event
    fn handle_event(&self, event: &RunEvent, context: &RunContext);

    /// Check if this handler is interested in a particular event type
    fn is_interested(&self, event: &RunEvent) -> bool {
        let _ = event;
        true
    }

    /// Get the name of this handler for debugging
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Event bus for distributing events to multiple handlers
pub struct EventBus {
    handlers: Arc<Mutex<Vec<Box<dyn EventHandler>>>>,
    enabled: Arc<AtomicBool>,
}

impl EventBus {
    /// Create a new event bus
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(Mutex::new(Vec::new())),
            enabled: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Register an event handler
    pub fn register<H>(&self, handler: H) -> Result<()>
    where
        H: EventHandler + 'static,
    {
        let mut handlers = self
            .handlers
            .lock()
            .map_err(|e| Error::Execution(format!("Failed to lock handlers: {e}")))?;
        handlers.push(Box::new(handler));
        Ok(())
    }

    /// Emit an event to all registered handlers
    pub fn emit(&self, event: &RunEvent, context: &RunContext) -> Result<()> {
        if !self.enabled.load(Ordering::Relaxed) {
            return Ok(());
        }

        let handlers = self
            .handlers
            .lock()
            .map_err(|e| Error::Execution(format!("Failed to lock handlers: {e}")))?;

        for handler in handlers.iter() {
            if handler.is_interested(event) {
                handler.handle_event(event, context);
            }
        }

        Ok(())
    }

    /// Emit, logging instead of returning a poisoned-lock error
    pub fn publish(&self, event: &RunEvent, context: &RunContext) {
        if let Err(e) = self.emit(event, context) {
            tracing::error!("event dispatch failed: {e}");
        }
    }

    /// Enable or disable event emission
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    /// Check if the event bus is enabled
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Get the number of registered handlers
    pub fn handler_count(&self) -> Result<usize> {
        let handlers = self
            .handlers
            .lock()
            .map_err(|e| Error::Execution(format!("Failed to lock handlers: {e}")))?;
        Ok(handlers.len())
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for EventBus {
    fn clone(&self) -> Self {
        Self {
            handlers: Arc::clone(&self.handlers),
            enabled: Arc::clone(&self.enabled),
        }
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("handlers", &self.handler_count().unwrap_or(0))
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

/// Forwards events to `tracing`
#[derive(Default, Clone)]
pub struct TracingHandler;

impl EventHandler for TracingHandler {
    fn handle_event(&self, event: &RunEvent, _context: &RunContext) {
        match event {
            RunEvent::RunStarted { trace_id, universes } => {
                tracing::info!(%trace_id, universes, "multiverse run started");
            }
            RunEvent::RunCompleted {
                trace_id,
                succeeded,
                failed,
                timed_out,
                cancelled,
                elapsed,
            } => {
                tracing::info!(
                    %trace_id,
                    succeeded,
                    failed,
                    timed_out,
                    cancelled,
                    ?elapsed,
                    "multiverse run completed"
                );
            }
            RunEvent::UniverseFailed {
                trace_id,
                universe,
                step,
                cause,
            } => {
                tracing::warn!(%trace_id, universe, step = %step, "universe failed: {cause}");
            }
            RunEvent::UniverseTimedOut {
                trace_id,
                universe,
                limit,
            } => {
                tracing::warn!(%trace_id, universe, ?limit, "universe timed out");
            }
            _ => {
                tracing::trace!("run event: {event:?}");
            }
        }
    }
}

/// Counts of events seen by a [`CountingHandler`]
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RunCounts {
    pub runs: usize,
    pub started: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub timed_out: usize,
    pub cancelled: usize,
    pub prefix_reuses: usize,
    pub failures_by_step: HashMap<String, usize>,
}

/// Accumulates event counts
#[derive(Default, Clone)]
pub struct CountingHandler {
    counts: Arc<Mutex<RunCounts>>,
}

impl CountingHandler {
    /// Create a new counting handler
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a snapshot of current counts
    pub fn snapshot(&self) -> Result<RunCounts> {
        let counts = self
            .counts
            .lock()
            .map_err(|e| Error::Execution(format!("Failed to lock counts: {e}")))?;
        Ok(counts.clone())
    }
}

impl EventHandler for CountingHandler {
    fn handle_event(&self, event: &RunEvent, _context: &RunContext) {
        let Ok(mut counts) = self.counts.lock() else {
            tracing::error!("Failed to lock counts");
            return;
        };

        match event {
            RunEvent::RunStarted { .. } => counts.runs += 1,
            RunEvent::UniverseStarted { .. } => counts.started += 1,
            RunEvent::PrefixReused { .. } => counts.prefix_reuses += 1,
            RunEvent::UniverseSucceeded { .. } => counts.succeeded += 1,
            RunEvent::UniverseFailed { step, .. } => {
                counts.failed += 1;
                *counts.failures_by_step.entry(step.clone()).or_insert(0) += 1;
            }
            RunEvent::UniverseTimedOut { .. } => counts.timed_out += 1,
            RunEvent::UniverseCancelled { .. } => counts.cancelled += 1,
            RunEvent::RunCompleted { .. } => {}
        }
    }
}

/// Null event handler that does nothing
#[derive(Default, Clone)]
pub struct NullEventHandler;

impl EventHandler for NullEventHandler {
    fn handle_event(&self, _event: &RunEvent, _context: &RunContext) {}

    fn is_interested(&self, _event: &RunEvent) -> bool {
        false
    }
}
