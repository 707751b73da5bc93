use std::env;
use std::path::{Path, PathBuf};

use scb_core::{io_error, BenchError};

/// Captures the process working directory and restores it when dropped.
///
/// Hooks may change directory while building a model; the sweep always ends
/// where it started, whether it completes or fails.
#[derive(Debug)]
pub struct WorkdirGuard {
    original: PathBuf,
}

impl WorkdirGuard {
    /// Records the current working directory.
    pub fn capture() -> Result<Self, BenchError> {
        let original =
            env::current_dir().map_err(|err| io_error("scb_exp.cwd", Path::new("."), err))?;
        Ok(Self { original })
    }

    /// The captured directory.
    pub fn path(&self) -> &Path {
        &self.original
    }

    /// Restores the captured directory now.
    pub fn restore(&self) -> Result<(), BenchError> {
        env::set_current_dir(&self.original)
            .map_err(|err| io_error("scb_exp.cwd_restore", &self.original, err))
    }
}

impl Drop for WorkdirGuard {
    fn drop(&mut self) {
        if let Err(err) = self.restore() {
            tracing::warn!(error = %err, "failed to restore working directory");
        }
    }
}
