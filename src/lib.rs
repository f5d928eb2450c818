//! # Multiverse
//!
//! Multiverse analysis: declare every defensible choice in an analysis,
//! expand the choices into all valid combinations ("universes"), run the
//! analysis once per universe, and export the results for visualization.
//!
//! ## Crates
//!
//! - [`multiverse_core`]: parameters, options, conditions, universe
//!   expansion, datasets and the outcome contract
//! - [`multiverse_summary`]: CDF summaries of outcomes over a probability grid
//! - [`multiverse_exec`]: pipelines, per-universe execution and run
//!   configuration
//! - [`multiverse_export`]: the `results.json`, `code.json` and `data.json`
//!   artifacts
//!
//! ## Quick Start
//!
//! ```rust
//! use multiverse::prelude::*;
//!
//! let mut registry = BranchRegistry::new();
//! registry.declare("outliers", [BranchOption::new("keep"), BranchOption::new("drop")])?;
//!
//! let pipeline = Pipeline::new().step(Step::branch("mean", "outliers", |state, option| {
//!     let mut y = state.data().numeric("y")?;
//!     if option.name() == "drop" {
//!         y.retain(|v| v.abs() < 10.0);
//!     }
//!     let mean = y.iter().sum::<f64>() / y.len() as f64;
//!     state.record(Outcome::normal("mean", mean, 0.5));
//!     Ok(())
//! }));
//!
//! let data = Dataset::new(vec![Column::float("y", [1.0, 2.0, 3.0, 50.0])])?;
//! let multiverse = Multiverse::new(registry, pipeline)?;
//! let run = multiverse.execute(data)?;
//! assert!(run.summary().all_succeeded());
//!
//! let results = export(&ResultsExporter::new(&run), None)?.unwrap();
//! assert_eq!(results.universes.len(), 2);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub use multiverse_core;
pub use multiverse_exec;
pub use multiverse_export;
pub use multiverse_summary;

/// Commonly used types
pub mod prelude {
    pub use multiverse_core::{
        expand, Assignment, BranchOption, BranchRegistry, Column, ColumnData, Condition, Dataset,
        Outcome, OutcomeDistribution, Universe, UniverseSet, Value,
    };
    pub use multiverse_exec::{
        CancellationToken, ExecutionSummary, Multiverse, MultiverseRun, Pipeline, RunConfig, Step,
        StepResult, UniverseResult, UniverseState, UniverseStatus,
    };
    pub use multiverse_export::{
        export, read_data_json, write_artifacts, CodeExporter, DataExporter, Document, Exporter,
        ResultsExporter,
    };
    pub use multiverse_summary::{CdfGrid, EmpiricalDistribution, Parametric, TermResult};
}
