//! Reduce outcomes to CDF samples over a configured grid

use crate::cdf::CdfSample;
use crate::grid::CdfGrid;
use crate::types::TermResult;
use multiverse_core::{Error, Outcome, OutcomeDistribution, OutcomeKind, OutcomeStats, Result};
use statrs::distribution::{ContinuousCDF, Normal};
use tracing::trace;

/// Φ(-1) and Φ(1): the central ±1σ band of a standard normal
const ONE_SIGMA_LOWER: f64 = 0.158_655_253_931_457_05;
const ONE_SIGMA_UPPER: f64 = 0.841_344_746_068_542_9;

/// Summarize an outcome assumed to be `Normal(estimate, std_error)`.
///
/// `cdf.x` holds the normal quantiles at each grid level and `cdf.y` the
/// levels themselves.
pub fn summarize_normal(
    term: &str,
    estimate: f64,
    std_error: f64,
    grid: &CdfGrid,
) -> Result<TermResult> {
    if !estimate.is_finite() {
        return Err(Error::non_finite(&format!("estimate of '{term}'")));
    }
    if !(std_error.is_finite() && std_error > 0.0) {
        return Err(Error::InvalidParameter(format!(
            "standard error of '{term}' must be positive and finite, got {std_error}"
        )));
    }

    let normal = Normal::new(estimate, std_error).map_err(|e| {
        Error::Computation(format!("Failed to create normal distribution: {e}"))
    })?;

    let x: Vec<f64> = grid.levels().iter().map(|&p| normal.inverse_cdf(p)).collect();
    let y = grid.levels().to_vec();
    let cdf = CdfSample::new(x, y)?;

    trace!(term, estimate, std_error, points = cdf.len(), "normal summary");
    Ok(TermResult {
        term: term.to_string(),
        estimate,
        std_error,
        stats: OutcomeStats::default(),
        cdf,
    })
}

/// Summarize an outcome described by an arbitrary distribution object.
///
/// No normality is assumed: `cdf.x` comes from the distribution's quantile
/// function and `cdf.y` from its CDF evaluated at those quantiles, clamped
/// to `[0, 1]` and made non-decreasing. The estimate is the distribution's
/// mean (median when unknown) and the standard error its standard deviation
/// (half the central ±1σ quantile band when unknown).
pub fn summarize_distribution(
    term: &str,
    distribution: &dyn OutcomeDistribution,
    grid: &CdfGrid,
) -> Result<TermResult> {
    let x: Vec<f64> = grid
        .levels()
        .iter()
        .map(|&p| distribution.quantile(p))
        .collect();
    if x.iter().any(|v| !v.is_finite()) {
        return Err(Error::non_finite(&format!("quantiles of '{term}'")));
    }
    if x.windows(2).any(|w| w[0] >= w[1]) {
        return Err(degenerate(term));
    }

    let mut running = 0.0f64;
    let y: Vec<f64> = x
        .iter()
        .map(|&q| {
            let p = distribution.cdf(q);
            let p = if p.is_nan() { running } else { p.clamp(0.0, 1.0) };
            running = running.max(p);
            running
        })
        .collect();

    let estimate = distribution
        .mean()
        .filter(|m| m.is_finite())
        .unwrap_or_else(|| distribution.quantile(0.5));
    let std_error = distribution
        .std_dev()
        .filter(|s| s.is_finite())
        .unwrap_or_else(|| {
            (distribution.quantile(ONE_SIGMA_UPPER) - distribution.quantile(ONE_SIGMA_LOWER)) / 2.0
        });

    let cdf = CdfSample::new(x, y)?;
    trace!(term, estimate, std_error, points = cdf.len(), "distribution summary");
    Ok(TermResult {
        term: term.to_string(),
        estimate,
        std_error,
        stats: OutcomeStats::default(),
        cdf,
    })
}

/// Summarize a recorded outcome, dispatching on how it describes its
/// uncertainty, and carry its optional statistics through.
pub fn summarize(outcome: &Outcome, grid: &CdfGrid) -> Result<TermResult> {
    let mut result = match outcome.kind() {
        OutcomeKind::Normal {
            estimate,
            std_error,
        } => summarize_normal(outcome.term(), *estimate, *std_error, grid)?,
        OutcomeKind::Distribution(d) => summarize_distribution(outcome.term(), d.as_ref(), grid)?,
    };
    result.stats = *outcome.stats();
    Ok(result)
}

/// Summarize outcomes in recording order
pub fn summarize_all<'a, I>(outcomes: I, grid: &CdfGrid) -> Result<Vec<TermResult>>
where
    I: IntoIterator<Item = &'a Outcome>,
{
    outcomes.into_iter().map(|o| summarize(o, grid)).collect()
}

fn degenerate(term: &str) -> Error {
    Error::Computation(format!(
        "distribution of '{term}' is degenerate: quantiles are not strictly increasing over the grid"
    ))
}
