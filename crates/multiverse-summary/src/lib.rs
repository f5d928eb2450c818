//! Outcome summarization for multiverse analysis
//!
//! Every numeric outcome a universe reports is reduced to a standardized
//! CDF sample: paired quantiles and cumulative probabilities over a
//! configured, deterministic grid of probability levels.
//!
//! - [`summarize_normal`] treats `(estimate, std_error)` as a normal
//!   distribution.
//! - [`summarize_distribution`] accepts any [`OutcomeDistribution`] and
//!   makes no normality assumption.
//!
//! # Example
//!
//! ```rust
//! use multiverse_summary::{summarize_normal, CdfGrid};
//!
//! let grid = CdfGrid::new(3).unwrap();
//! let result = summarize_normal("slope", 0.0, 1.0, &grid).unwrap();
//! assert_eq!(result.cdf.y, vec![0.25, 0.5, 0.75]);
//! assert!((result.cdf.x[2] - 0.674).abs() < 1e-3);
//! ```
//!
//! [`OutcomeDistribution`]: multiverse_core::OutcomeDistribution

mod cdf;
mod distributions;
mod grid;
mod summarize;
mod types;

pub use cdf::CdfSample;
pub use distributions::{EmpiricalDistribution, Parametric};
pub use grid::{CdfGrid, DEFAULT_RESOLUTION};
pub use summarize::{summarize, summarize_all, summarize_distribution, summarize_normal};
pub use types::TermResult;
