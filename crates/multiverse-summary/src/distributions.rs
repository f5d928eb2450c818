//! Distribution objects usable as outcomes

use multiverse_core::{Error, OutcomeDistribution, Result};
use statrs::distribution::ContinuousCDF;
use statrs::statistics::Distribution;
use std::fmt;

/// Adapter exposing any `statrs` continuous distribution as an outcome
///
/// ```rust
/// use multiverse_core::Outcome;
/// use multiverse_summary::Parametric;
/// use statrs::distribution::StudentsT;
///
/// let t = StudentsT::new(0.3, 0.1, 12.0).unwrap();
/// let outcome = Outcome::distribution("slope", Parametric::new(t));
/// assert_eq!(outcome.term(), "slope");
/// ```
#[derive(Clone)]
pub struct Parametric<D> {
    inner: D,
}

impl<D> Parametric<D> {
    /// Wrap a distribution
    pub fn new(inner: D) -> Self {
        Self { inner }
    }

    /// Wrapped distribution
    pub fn inner(&self) -> &D {
        &self.inner
    }
}

impl<D: fmt::Debug> fmt::Debug for Parametric<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Parametric").field(&self.inner).finish()
    }
}

impl<D> OutcomeDistribution for Parametric<D>
where
    D: ContinuousCDF<f64, f64> + Distribution<f64> + Send + Sync + fmt::Debug,
{
    fn quantile(&self, p: f64) -> f64 {
        self.inner.inverse_cdf(p)
    }

    fn cdf(&self, x: f64) -> f64 {
        self.inner.cdf(x)
    }

    fn mean(&self) -> Option<f64> {
        self.inner.mean()
    }

    fn std_dev(&self) -> Option<f64> {
        self.inner.std_dev()
    }
}

/// Distribution defined by a set of draws (bootstrap replicates,
/// posterior samples, permutation statistics)
#[derive(Debug, Clone, PartialEq)]
pub struct EmpiricalDistribution {
    sorted: Vec<f64>,
}

impl EmpiricalDistribution {
    /// Build from draws; requires at least two finite values
    pub fn new(mut draws: Vec<f64>) -> Result<Self> {
        if draws.len() < 2 {
            return Err(Error::InvalidInput(format!(
                "an empirical distribution needs at least 2 draws, got {}",
                draws.len()
            )));
        }
        if draws.iter().any(|v| !v.is_finite()) {
            return Err(Error::non_finite("draws"));
        }
        draws.sort_by(f64::total_cmp);
        Ok(Self { sorted: draws })
    }

    /// Number of draws
    pub fn len(&self) -> usize {
        self.sorted.len()
    }

    /// Always false; construction requires draws
    pub fn is_empty(&self) -> bool {
        self.sorted.is_empty()
    }

    /// Draws in ascending order
    pub fn sorted(&self) -> &[f64] {
        &self.sorted
    }
}

impl OutcomeDistribution for EmpiricalDistribution {
    /// Linear interpolation between order statistics at `(n - 1) * p`
    fn quantile(&self, p: f64) -> f64 {
        let n = self.sorted.len();
        let h = (n - 1) as f64 * p.clamp(0.0, 1.0);
        let lo = h.floor() as usize;
        let hi = (lo + 1).min(n - 1);
        let frac = h - lo as f64;
        self.sorted[lo] + frac * (self.sorted[hi] - self.sorted[lo])
    }

    /// Proportion of draws at or below `x`
    fn cdf(&self, x: f64) -> f64 {
        let below = self.sorted.partition_point(|&v| v <= x);
        below as f64 / self.sorted.len() as f64
    }

    fn mean(&self) -> Option<f64> {
        Some(self.sorted.iter().sum::<f64>() / self.sorted.len() as f64)
    }

    fn std_dev(&self) -> Option<f64> {
        let n = self.sorted.len() as f64;
        let mean = self.mean()?;
        let ss: f64 = self.sorted.iter().map(|v| (v - mean).powi(2)).sum();
        Some((ss / (n - 1.0)).sqrt())
    }
}
