//! Shared export plumbing: documents, exporters and atomic writes

use crate::error::Result;
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::debug;

/// A validated artifact ready to be serialized
pub trait Document: Serialize {
    /// Exact bytes written to disk for this document
    fn to_json(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }
}

/// Produces one artifact
pub trait Exporter {
    type Document: Document;

    /// Conventional file name of the artifact
    const FILE_NAME: &'static str;

    /// Build and validate the in-memory document
    fn document(&self) -> Result<Self::Document>;
}

/// Write the exporter's artifact to `path`, or return it when no path is
/// given.
///
/// The document is fully built and validated before anything touches the
/// filesystem; the file is then written next to its destination and renamed
/// into place, so a failed call never leaves a partial artifact.
pub fn export<E: Exporter>(exporter: &E, path: Option<&Path>) -> Result<Option<E::Document>> {
    let document = exporter.document()?;
    let Some(path) = path else {
        return Ok(Some(document));
    };

    let bytes = document.to_json()?;
    write_atomic(path, &bytes)?;
    debug!(path = %path.display(), bytes = bytes.len(), "wrote {}", E::FILE_NAME);
    Ok(None)
}

pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let tmp_path = path.with_extension("tmp");
    if let Err(e) = fs::write(&tmp_path, bytes).and_then(|()| fs::rename(&tmp_path, path)) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e.into());
    }
    Ok(())
}
