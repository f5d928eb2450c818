//! Run configuration

use multiverse_core::{Error, Result};
use multiverse_summary::CdfGrid;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default number of lines per exported code fragment
pub const DEFAULT_FRAGMENT_LINES: usize = 12;

/// Settings for executing a multiverse
///
/// Every field has a default, so a configuration document only needs to
/// name what it changes:
///
/// ```rust
/// use multiverse_exec::RunConfig;
///
/// let config = RunConfig::from_json(r#"{"max_concurrency": 2, "universe_timeout_ms": 500}"#).unwrap();
/// assert_eq!(config.max_concurrency, 2);
/// assert_eq!(config.grid.resolution(), 99);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Upper bound on universes executing at once
    pub max_concurrency: usize,
    /// Per-universe wall-clock limit
    #[serde(rename = "universe_timeout_ms", with = "timeout_ms")]
    pub universe_timeout: Option<Duration>,
    /// Resume universes from cached states of shared step prefixes
    pub reuse_prefixes: bool,
    /// Probability levels for CDF summaries
    pub grid: CdfGrid,
    /// Maximum lines per code fragment in the code export
    pub max_fragment_lines: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_concurrency: num_cpus::get().max(1),
            universe_timeout: None,
            reuse_prefixes: false,
            grid: CdfGrid::default(),
            max_fragment_lines: DEFAULT_FRAGMENT_LINES,
        }
    }
}

impl RunConfig {
    /// Default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a JSON configuration document
    pub fn from_json(json: &str) -> Result<Self> {
        let config: RunConfig = serde_json::from_str(json)
            .map_err(|e| Error::InvalidInput(format!("invalid run configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Set the concurrency limit
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }

    /// Set a per-universe timeout
    pub fn with_universe_timeout(mut self, timeout: Duration) -> Self {
        self.universe_timeout = Some(timeout);
        self
    }

    /// Enable or disable prefix reuse
    pub fn with_prefix_reuse(mut self, enabled: bool) -> Self {
        self.reuse_prefixes = enabled;
        self
    }

    /// Set the CDF grid
    pub fn with_grid(mut self, grid: CdfGrid) -> Self {
        self.grid = grid;
        self
    }

    /// Set the code fragment size
    pub fn with_max_fragment_lines(mut self, lines: usize) -> Self {
        self.max_fragment_lines = lines;
        self
    }

    /// Check the settings for consistency
    pub fn validate(&self) -> Result<()> {
        if self.max_concurrency == 0 {
            return Err(Error::InvalidParameter(
                "max_concurrency must be at least 1".to_string(),
            ));
        }
        if self.universe_timeout == Some(Duration::ZERO) {
            return Err(Error::InvalidParameter(
                "universe timeout must be positive".to_string(),
            ));
        }
        if self.max_fragment_lines == 0 {
            return Err(Error::InvalidParameter(
                "max_fragment_lines must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

mod timeout_ms {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        value.map(|d| d.as_millis() as u64).serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(d)?.map(Duration::from_millis))
    }
}
