//! JSON artifacts for multiverse visualization
//!
//! Three independent exporters produce the files a visualization front end
//! reads:
//!
//! - [`ResultsExporter`] → `results.json`, per-universe term summaries
//! - [`CodeExporter`] → `code.json`, source fragments and parameters
//! - [`DataExporter`] → `data.json`, the analysis input
//!
//! Each can return its document in memory or write it to disk through
//! [`export`]; both paths produce identical bytes.

mod code;
mod data;
mod error;
mod exporter;
mod results;

pub use code::{CodeDocument, CodeExporter};
pub use data::{parse_data_json, read_data_json, DataDocument, DataExporter, FieldRecord};
pub use error::{ExportError, Result};
pub use exporter::{export, Document, Exporter};
pub use results::{ResultsDocument, ResultsExporter, TermRecord, UniverseRecord};

use multiverse_core::Dataset;
use multiverse_exec::{Multiverse, MultiverseRun};
use std::path::Path;
use tracing::info;

/// Write `results.json`, `code.json` and `data.json` into `dir`.
///
/// All three documents are built before any file is written, so a
/// validation failure leaves the directory untouched.
pub fn write_artifacts(
    dir: &Path,
    multiverse: &Multiverse,
    run: &MultiverseRun,
    data: &Dataset,
) -> Result<()> {
    let results = ResultsExporter::new(run);
    let code = CodeExporter::new(multiverse);
    let dataset = DataExporter::new(data);

    let documents = [
        (ResultsExporter::FILE_NAME, results.document()?.to_json()?),
        (CodeExporter::FILE_NAME, code.document()?.to_json()?),
        (DataExporter::FILE_NAME, dataset.document()?.to_json()?),
    ];

    for (name, bytes) in &documents {
        exporter::write_atomic(&dir.join(name), bytes)?;
    }
    info!(dir = %dir.display(), universes = run.len(), "wrote multiverse artifacts");
    Ok(())
}
