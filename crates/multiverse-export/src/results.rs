//! The results artifact: per-universe term summaries with CDF samples

use crate::error::{ExportError, Result};
use crate::exporter::{Document, Exporter};
use multiverse_exec::{MultiverseRun, UniverseResult};
use multiverse_summary::TermResult;
use serde::{Deserialize, Serialize};

/// One term of one universe, as written to `results.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermRecord {
    pub term: String,
    pub estimate: f64,
    #[serde(rename = "std.error")]
    pub std_error: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statistic: Option<f64>,
    #[serde(rename = "p.value", default, skip_serializing_if = "Option::is_none")]
    pub p_value: Option<f64>,
    #[serde(rename = "conf.low", default, skip_serializing_if = "Option::is_none")]
    pub conf_low: Option<f64>,
    #[serde(rename = "conf.high", default, skip_serializing_if = "Option::is_none")]
    pub conf_high: Option<f64>,
    #[serde(rename = "cdf.x")]
    pub cdf_x: Vec<f64>,
    #[serde(rename = "cdf.y")]
    pub cdf_y: Vec<f64>,
}

/// All terms of one universe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UniverseRecord {
    #[serde(rename = ".universe")]
    pub universe: usize,
    pub results: Vec<TermRecord>,
}

/// The results artifact: one record per universe, in universe-id order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultsDocument {
    pub universes: Vec<UniverseRecord>,
}

impl Document for ResultsDocument {}

impl ResultsDocument {
    /// Parse a `results.json` document
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Record for a universe id
    pub fn get(&self, universe: usize) -> Option<&UniverseRecord> {
        self.universes.iter().find(|u| u.universe == universe)
    }
}

/// Builds `results.json` from a finished run
#[derive(Debug, Clone)]
pub struct ResultsExporter<'a> {
    run: &'a MultiverseRun,
    include_failed: bool,
}

impl<'a> ResultsExporter<'a> {
    pub fn new(run: &'a MultiverseRun) -> Self {
        Self {
            run,
            include_failed: false,
        }
    }

    /// List failed, timed-out and cancelled universes with empty results
    /// instead of omitting them
    pub fn include_failed(mut self, include: bool) -> Self {
        self.include_failed = include;
        self
    }

    fn record(&self, result: &UniverseResult) -> Result<UniverseRecord> {
        let results = result
            .results
            .iter()
            .map(|term| term_record(result.universe_id, term))
            .collect::<Result<Vec<_>>>()?;
        Ok(UniverseRecord {
            universe: result.universe_id,
            results,
        })
    }
}

impl Exporter for ResultsExporter<'_> {
    type Document = ResultsDocument;

    const FILE_NAME: &'static str = "results.json";

    fn document(&self) -> Result<ResultsDocument> {
        let mut ordered: Vec<&UniverseResult> = self.run.universes.iter().collect();
        ordered.sort_by_key(|r| r.universe_id);

        let universes = ordered
            .into_iter()
            .filter_map(|result| {
                if result.is_success() {
                    Some(self.record(result))
                } else if self.include_failed {
                    Some(Ok(UniverseRecord {
                        universe: result.universe_id,
                        results: Vec::new(),
                    }))
                } else {
                    None
                }
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(ResultsDocument { universes })
    }
}

fn term_record(universe: usize, result: &TermResult) -> Result<TermRecord> {
    let missing = |field: &'static str| ExportError::MissingField {
        universe,
        term: result.term.clone(),
        field,
    };

    if result.term.is_empty() {
        return Err(missing("term"));
    }
    if !result.estimate.is_finite() {
        return Err(missing("estimate"));
    }
    if !result.std_error.is_finite() {
        return Err(missing("std.error"));
    }
    if result.cdf.x.is_empty() {
        return Err(missing("cdf.x"));
    }
    if result.cdf.x.len() != result.cdf.y.len() {
        return Err(ExportError::LengthMismatch {
            universe,
            term: result.term.clone(),
            x_len: result.cdf.x.len(),
            y_len: result.cdf.y.len(),
        });
    }
    result.cdf.validate().map_err(|e| ExportError::InvalidCdf {
        universe,
        term: result.term.clone(),
        reason: e.to_string(),
    })?;

    let (conf_low, conf_high) = (result.stats.conf_low, result.stats.conf_high);
    Ok(TermRecord {
        term: result.term.clone(),
        estimate: result.estimate,
        std_error: result.std_error,
        statistic: result.stats.statistic.filter(|v| v.is_finite()),
        p_value: result.stats.p_value.filter(|v| v.is_finite()),
        conf_low: conf_low.filter(|v| v.is_finite()),
        conf_high: conf_high.filter(|v| v.is_finite()),
        cdf_x: result.cdf.x.clone(),
        cdf_y: result.cdf.y.clone(),
    })
}
