use std::path::{Path, PathBuf};

use scb_core::{stable_hash_string, to_canonical_json_bytes, write_atomic, BenchError, SweepSpec};
use serde::{Deserialize, Serialize};

use crate::model::ExecutionMode;

/// Provenance written next to a result file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepManifest {
    pub spec: SweepSpec,
    pub spec_hash: String,
    pub result_file: String,
    pub points: usize,
    pub execution: ExecutionMode,
    pub created_at: String,
    pub tool_version: String,
}

impl SweepManifest {
    /// Describes `spec` and the result file it produced.
    pub fn new(
        spec: &SweepSpec,
        result_file: &Path,
        execution: ExecutionMode,
    ) -> Result<Self, BenchError> {
        Ok(Self {
            spec: spec.clone(),
            spec_hash: stable_hash_string(spec)?,
            result_file: result_file
                .file_name()
                .map(|name| name.to_string_lossy().to_string())
                .unwrap_or_default(),
            points: spec.point_count(),
            execution,
            created_at: chrono::Utc::now().to_rfc3339(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
        })
    }

    /// `{stem}.manifest.json`
    pub fn file_name(&self) -> String {
        format!("{}.manifest.json", self.spec.stem())
    }
}

/// Writes the manifest into `dir`.
pub fn write_manifest(dir: &Path, manifest: &SweepManifest) -> Result<PathBuf, BenchError> {
    let path = dir.join(manifest.file_name());
    let bytes = to_canonical_json_bytes(manifest)?;
    write_atomic(&path, &bytes)?;
    Ok(path)
}
