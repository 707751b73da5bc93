//! Atomic file writes.

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::errors::{io_error, BenchError};

/// Writes `bytes` to `path` through a temporary sibling file and a rename, so
/// readers never observe a partially written file.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), BenchError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir).map_err(|err| io_error("tmp_create", dir, err))?;
    tmp.write_all(bytes)
        .map_err(|err| io_error("tmp_write", tmp.path(), err))?;
    tmp.as_file()
        .sync_all()
        .map_err(|err| io_error("tmp_sync", tmp.path(), err))?;
    tmp.persist(path)
        .map_err(|err| io_error("persist", path, err.error))?;
    Ok(())
}
