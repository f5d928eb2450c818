//! Named numeric outcomes produced by pipeline steps
//!
//! Any step whose output should appear in the exported results records an
//! [`Outcome`]: a term name plus either a point estimate with standard error
//! (summarized under a normal assumption) or a distribution object.

use std::fmt;
use std::sync::Arc;

/// A distribution exposing its quantile and cumulative distribution functions
pub trait OutcomeDistribution: Send + Sync + fmt::Debug {
    /// Inverse CDF at probability `p` in (0, 1)
    fn quantile(&self, p: f64) -> f64;

    /// Cumulative probability at `x`
    fn cdf(&self, x: f64) -> f64;

    /// Mean, when the distribution knows it
    fn mean(&self) -> Option<f64> {
        None
    }

    /// Standard deviation, when the distribution knows it
    fn std_dev(&self) -> Option<f64> {
        None
    }
}

/// How an outcome describes its uncertainty
#[derive(Debug, Clone)]
pub enum OutcomeKind {
    /// Point estimate and standard error of an assumed normal distribution
    Normal { estimate: f64, std_error: f64 },
    /// Explicit distribution object
    Distribution(Arc<dyn OutcomeDistribution>),
}

/// Optional test statistics carried through to the results export
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OutcomeStats {
    pub statistic: Option<f64>,
    pub p_value: Option<f64>,
    pub conf_low: Option<f64>,
    pub conf_high: Option<f64>,
}

/// A single named outcome term
#[derive(Debug, Clone)]
pub struct Outcome {
    term: String,
    kind: OutcomeKind,
    stats: OutcomeStats,
}

impl Outcome {
    /// Outcome summarized as `Normal(estimate, std_error)`
    pub fn normal(term: impl Into<String>, estimate: f64, std_error: f64) -> Self {
        Self {
            term: term.into(),
            kind: OutcomeKind::Normal {
                estimate,
                std_error,
            },
            stats: OutcomeStats::default(),
        }
    }

    /// Outcome described by an explicit distribution
    pub fn distribution<D>(term: impl Into<String>, distribution: D) -> Self
    where
        D: OutcomeDistribution + 'static,
    {
        Self {
            term: term.into(),
            kind: OutcomeKind::Distribution(Arc::new(distribution)),
            stats: OutcomeStats::default(),
        }
    }

    /// Attach a test statistic
    pub fn with_statistic(mut self, statistic: f64) -> Self {
        self.stats.statistic = Some(statistic);
        self
    }

    /// Attach a p-value
    pub fn with_p_value(mut self, p_value: f64) -> Self {
        self.stats.p_value = Some(p_value);
        self
    }

    /// Attach a confidence interval
    pub fn with_conf_int(mut self, low: f64, high: f64) -> Self {
        self.stats.conf_low = Some(low);
        self.stats.conf_high = Some(high);
        self
    }

    /// Term name
    pub fn term(&self) -> &str {
        &self.term
    }

    /// Uncertainty description
    pub fn kind(&self) -> &OutcomeKind {
        &self.kind
    }

    /// Carried-through statistics
    pub fn stats(&self) -> &OutcomeStats {
        &self.stats
    }
}
