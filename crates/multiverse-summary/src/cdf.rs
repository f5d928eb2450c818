//! Discretized cumulative distribution samples

use multiverse_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Paired quantiles (`x`) and cumulative probabilities (`y`)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CdfSample {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl CdfSample {
    /// Create a sample from paired sequences, checking its invariants
    pub fn new(x: Vec<f64>, y: Vec<f64>) -> Result<Self> {
        let sample = Self { x, y };
        sample.validate()?;
        Ok(sample)
    }

    /// Number of points
    pub fn len(&self) -> usize {
        self.x.len()
    }

    /// Whether the sample has no points
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// `(x, y)` pairs
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.x.iter().copied().zip(self.y.iter().copied())
    }

    /// Check the invariants: equal lengths, finite strictly increasing `x`,
    /// non-decreasing `y` within `[0, 1]`.
    pub fn validate(&self) -> Result<()> {
        if self.x.len() != self.y.len() {
            return Err(Error::size_mismatch(self.x.len(), self.y.len(), "cdf.y"));
        }
        if self.x.iter().any(|v| !v.is_finite()) {
            return Err(Error::non_finite("cdf.x"));
        }
        if self.x.windows(2).any(|w| w[0] >= w[1]) {
            return Err(Error::Computation(
                "cdf.x must be strictly increasing".to_string(),
            ));
        }
        if self.y.iter().any(|p| !(0.0..=1.0).contains(p)) {
            return Err(Error::Computation("cdf.y must lie in [0, 1]".to_string()));
        }
        if self.y.windows(2).any(|w| w[0] > w[1]) {
            return Err(Error::Computation(
                "cdf.y must be non-decreasing".to_string(),
            ));
        }
        Ok(())
    }
}
