//! Atomic output path. Writes go to a reserved temp path next to the target
//! and only get renamed into place once every rank has finished, so a crash
//! mid-write never leaves a partial file at the target path.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::{NamedTempFile, TempPath};

use crate::error::{Error, Result};

/// A reserved temporary path next to `target`, renamed into place only when
/// [`PendingPath::finalize`] is called.
pub struct PendingPath {
    target: PathBuf,
    temp_path: Option<TempPath>,
}

impl PendingPath {
    pub fn new(target: impl Into<PathBuf>) -> Result<Self> {
        let target = target.into();
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| Error::Writer(format!("create dir {}: {e}", parent.display())))?;
        }

        let dir = target.parent().unwrap_or_else(|| Path::new("."));
        let tmp = NamedTempFile::new_in(dir)
            .map_err(|e| Error::Writer(format!("create temp file in {}: {e}", dir.display())))?;

        Ok(PendingPath { target, temp_path: Some(tmp.into_temp_path()) })
    }

    pub fn path(&self) -> &Path {
        self.temp_path.as_ref().expect("not finalized").as_ref()
    }

    /// Rename the temp file into place. Must be called after all ranks have
    /// finished writing (after the final Phase B barrier).
    pub fn finalize(mut self) -> Result<()> {
        let temp_path = self.temp_path.take().expect("finalize called twice");
        temp_path
            .persist(&self.target)
            .map_err(|e| Error::Writer(format!("rename to {}: {}", self.target.display(), e.error)))
    }
}
