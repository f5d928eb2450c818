//! Run-level execution summaries

use crate::runner::{UniverseResult, UniverseStatus};
use std::fmt;

/// Failures sharing a step and cause
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureGroup {
    pub step: String,
    pub cause: String,
    /// Affected universe ids, ascending
    pub universes: Vec<usize>,
}

/// Counts of universe outcomes, with failures grouped by cause
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub timed_out: usize,
    pub cancelled: usize,
    /// Failure groups in order of first occurrence
    pub failures: Vec<FailureGroup>,
}

impl ExecutionSummary {
    pub fn from_results(results: &[UniverseResult]) -> Self {
        let mut summary = Self {
            total: results.len(),
            ..Self::default()
        };

        for result in results {
            match &result.status {
                UniverseStatus::Succeeded => summary.succeeded += 1,
                UniverseStatus::TimedOut(_) => summary.timed_out += 1,
                UniverseStatus::Cancelled => summary.cancelled += 1,
                UniverseStatus::Failed(failure) => {
                    summary.failed += 1;
                    match summary
                        .failures
                        .iter_mut()
                        .find(|g| g.step == failure.step && g.cause == failure.cause)
                    {
                        Some(group) => group.universes.push(result.universe_id),
                        None => summary.failures.push(FailureGroup {
                            step: failure.step.clone(),
                            cause: failure.cause.clone(),
                            universes: vec![result.universe_id],
                        }),
                    }
                }
            }
        }

        summary
    }

    /// Whether every universe succeeded
    pub fn all_succeeded(&self) -> bool {
        self.succeeded == self.total
    }
}

impl fmt::Display for ExecutionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} universes: {} succeeded, {} failed, {} timed out, {} cancelled",
            self.total, self.succeeded, self.failed, self.timed_out, self.cancelled
        )?;
        for group in &self.failures {
            let ids: Vec<String> = group.universes.iter().map(|id| format!("#{id}")).collect();
            write!(
                f,
                "\n  step '{}': {} ({})",
                group.step,
                group.cause,
                ids.join(", ")
            )?;
        }
        Ok(())
    }
}
