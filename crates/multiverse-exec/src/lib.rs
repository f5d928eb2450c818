//! Pipeline execution for multiverse analysis
//!
//! A [`Pipeline`] is an ordered list of [`Step`]s. A [`Multiverse`] pairs it
//! with the declared parameters, expands the universe set, and runs the
//! pipeline once per universe on an [`ExecutionEngine`]:
//!
//! - every universe gets a private [`UniverseState`] over a shared,
//!   copy-on-write dataset
//! - a failing or panicking step halts only its universe
//! - results come back in universe-id order whatever the scheduling
//!
//! # Example
//!
//! ```rust
//! use multiverse_core::{BranchOption, BranchRegistry, Column, Dataset, Outcome};
//! use multiverse_exec::{Multiverse, Pipeline, RunConfig, Step};
//!
//! let mut registry = BranchRegistry::new();
//! registry.declare("trim", [BranchOption::new("none").value(0i64), BranchOption::new("one").value(1i64)])?;
//!
//! let pipeline = Pipeline::new().step(Step::branch("mean", "trim", |state, option| {
//!     let mut x = state.data().numeric("x")?;
//!     x.sort_by(f64::total_cmp);
//!     let k = option.payload().as_integer().unwrap_or(0) as usize;
//!     let kept = &x[k..x.len() - k];
//!     let mean = kept.iter().sum::<f64>() / kept.len() as f64;
//!     state.record(Outcome::normal("mean", mean, 1.0));
//!     Ok(())
//! }));
//!
//! let data = Dataset::new(vec![Column::float("x", [1.0, 2.0, 3.0, 100.0])])?;
//! let multiverse = Multiverse::new(registry, pipeline)?
//!     .with_config(RunConfig::new().with_max_concurrency(1))?;
//! let run = multiverse.execute(data)?;
//!
//! assert_eq!(run.get(1).unwrap().results[0].estimate, 26.5);
//! assert_eq!(run.get(2).unwrap().results[0].estimate, 2.5);
//! # Ok::<(), multiverse_core::Error>(())
//! ```

pub mod config;
pub mod context;
pub mod engine;
pub mod events;
pub mod multiverse;
pub mod pipeline;
pub mod runner;
pub mod state;
pub mod step;
pub mod summary;

pub use config::{RunConfig, DEFAULT_FRAGMENT_LINES};
pub use context::RunContext;
#[cfg(feature = "parallel")]
pub use engine::ParallelEngine;
pub use engine::{auto_engine, AutoEngine, ExecutionEngine, ExecutionStrategy, SequentialEngine};
pub use events::{
    CountingHandler, EventBus, EventHandler, NullEventHandler, RunCounts, RunEvent, TracingHandler,
};
pub use multiverse::{Multiverse, MultiverseRun};
pub use pipeline::Pipeline;
pub use runner::{
    execute_universe, CancellationToken, UniverseFailure, UniverseResult, UniverseStatus,
    SUMMARIZE_STEP,
};
pub use state::UniverseState;
pub use step::{Step, StepKind, StepResult, Variant, VariantStep};
pub use summary::{ExecutionSummary, FailureGroup};
