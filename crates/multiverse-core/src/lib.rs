//! Core types for multiverse analysis
//!
//! This crate holds the declaration side of a multiverse: parameters
//! (decision points) with their options and validity conditions, the
//! expansion of those declarations into concrete universes, the shared
//! input dataset, and the outcome contract that pipeline steps report
//! results through.
//!
//! # Example
//!
//! ```rust
//! use multiverse_core::{expand, BranchOption, BranchRegistry, Condition};
//!
//! let mut registry = BranchRegistry::new();
//! registry.declare("A", [BranchOption::new("a1"), BranchOption::new("a2")])?;
//! registry.declare(
//!     "B",
//!     [
//!         BranchOption::new("b1").when(Condition::is("A", "a1")),
//!         BranchOption::new("b2"),
//!     ],
//! )?;
//!
//! let universes = expand(&registry)?;
//! assert_eq!(universes.len(), 3);
//! # Ok::<(), multiverse_core::Error>(())
//! ```

pub mod condition;
pub mod dataset;
pub mod error;
pub mod expand;
pub mod outcome;
pub mod registry;
pub mod universe;
pub mod value;

pub use condition::Condition;
pub use dataset::{Column, ColumnData, Dataset, DatasetBuilder};
pub use error::{Error, Result};
pub use expand::expand;
pub use outcome::{Outcome, OutcomeDistribution, OutcomeKind, OutcomeStats};
pub use registry::{BranchOption, BranchRegistry, Parameter};
pub use universe::{Assignment, Universe, UniverseSet};
pub use value::Value;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
