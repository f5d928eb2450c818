//! Cumulative-probability grids for CDF sampling

use multiverse_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Default number of grid levels: the 1st through 99th percentile
pub const DEFAULT_RESOLUTION: usize = 99;

/// Deterministic, strictly increasing set of cumulative-probability levels
/// in the open interval (0, 1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "GridSpec", into = "GridSpec")]
pub struct CdfGrid {
    levels: Vec<f64>,
}

impl CdfGrid {
    /// `resolution` levels evenly spaced strictly inside (0, 1):
    /// `k / (resolution + 1)` for `k = 1..=resolution`.
    pub fn new(resolution: usize) -> Result<Self> {
        if resolution == 0 {
            return Err(Error::InvalidParameter(
                "CDF grid resolution must be at least 1".to_string(),
            ));
        }
        let denom = (resolution + 1) as f64;
        let levels = (1..=resolution).map(|k| k as f64 / denom).collect();
        Ok(Self { levels })
    }

    /// `resolution` evenly spaced levels from `lower` to `upper` inclusive
    pub fn with_bounds(resolution: usize, lower: f64, upper: f64) -> Result<Self> {
        if resolution < 2 {
            return Err(Error::InvalidParameter(
                "a bounded CDF grid needs at least 2 levels".to_string(),
            ));
        }
        for p in [lower, upper] {
            if !(p > 0.0 && p < 1.0) {
                return Err(Error::invalid_probability(p));
            }
        }
        if lower >= upper {
            return Err(Error::InvalidParameter(format!(
                "lower bound {lower} must be below upper bound {upper}"
            )));
        }
        let step = (upper - lower) / (resolution - 1) as f64;
        let mut levels: Vec<f64> = (0..resolution).map(|i| lower + step * i as f64).collect();
        // Pin the endpoint against accumulated rounding.
        levels[resolution - 1] = upper;
        Ok(Self { levels })
    }

    /// Explicit levels, which must be strictly increasing inside (0, 1)
    pub fn from_levels(levels: Vec<f64>) -> Result<Self> {
        if levels.is_empty() {
            return Err(Error::InvalidParameter(
                "CDF grid needs at least one level".to_string(),
            ));
        }
        for &p in &levels {
            if !(p > 0.0 && p < 1.0) {
                return Err(Error::invalid_probability(p));
            }
        }
        if levels.windows(2).any(|w| w[0] >= w[1]) {
            return Err(Error::InvalidParameter(
                "CDF grid levels must be strictly increasing".to_string(),
            ));
        }
        Ok(Self { levels })
    }

    /// Cumulative-probability levels
    pub fn levels(&self) -> &[f64] {
        &self.levels
    }

    /// Number of levels
    pub fn resolution(&self) -> usize {
        self.levels.len()
    }
}

impl Default for CdfGrid {
    fn default() -> Self {
        let denom = (DEFAULT_RESOLUTION + 1) as f64;
        Self {
            levels: (1..=DEFAULT_RESOLUTION).map(|k| k as f64 / denom).collect(),
        }
    }
}

/// Serialized form of a grid: a resolution, a bounded resolution or
/// explicit levels. Objects with extra fields match no form.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum GridSpec {
    Bounded(BoundedSpec),
    Resolution(ResolutionSpec),
    Levels(Vec<f64>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct BoundedSpec {
    resolution: usize,
    lower: f64,
    upper: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct ResolutionSpec {
    resolution: usize,
}

impl TryFrom<GridSpec> for CdfGrid {
    type Error = Error;

    fn try_from(spec: GridSpec) -> Result<Self> {
        match spec {
            GridSpec::Resolution(ResolutionSpec { resolution }) => CdfGrid::new(resolution),
            GridSpec::Bounded(BoundedSpec {
                resolution,
                lower,
                upper,
            }) => CdfGrid::with_bounds(resolution, lower, upper),
            GridSpec::Levels(levels) => CdfGrid::from_levels(levels),
        }
    }
}

impl From<CdfGrid> for GridSpec {
    fn from(grid: CdfGrid) -> Self {
        GridSpec::Levels(grid.levels)
    }
}
