//! Summarized per-term result records

use crate::cdf::CdfSample;
use multiverse_core::OutcomeStats;

/// One summarized outcome term of one universe
#[derive(Debug, Clone, PartialEq)]
pub struct TermResult {
    /// Term name as recorded by the pipeline
    pub term: String,
    /// Point estimate
    pub estimate: f64,
    /// Standard error of the estimate
    pub std_error: f64,
    /// Optional statistics carried through from the outcome
    pub stats: OutcomeStats,
    /// CDF sample over the configured grid
    pub cdf: CdfSample,
}

impl TermResult {
    /// Test statistic, if recorded
    pub fn statistic(&self) -> Option<f64> {
        self.stats.statistic
    }

    /// p-value, if recorded
    pub fn p_value(&self) -> Option<f64> {
        self.stats.p_value
    }

    /// Confidence interval, if recorded
    pub fn conf_int(&self) -> Option<(f64, f64)> {
        self.stats.conf_low.zip(self.stats.conf_high)
    }
}
