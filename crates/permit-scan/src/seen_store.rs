use std::collections::BTreeSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use crate::scan_types::ScanError;

/// Persists the ISO dates (`YYYY-MM-DD`) that have already been alerted on,
/// as a sorted JSON array in a single file.
#[derive(Debug, Clone)]
pub struct SeenStore {
    path: PathBuf,
}

impl SeenStore {
    /// Store backed by the file at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the seen dates; a missing file means nothing has been seen yet.
    ///
    /// An unreadable or undecodable file is an error, never an empty set.
    pub fn load(&self) -> Result<BTreeSet<String>, ScanError> {
        if !self.path.exists() {
            debug!("No state file at {}, starting empty", self.path.display());
            return Ok(BTreeSet::new());
        }

        let data = fs::read_to_string(&self.path).map_err(|e| {
            ScanError::State(format!("failed to read '{}': {}", self.path.display(), e))
        })?;

        let dates: Vec<String> = serde_json::from_str(&data).map_err(|e| {
            ScanError::State(format!("failed to decode '{}': {}", self.path.display(), e))
        })?;

        Ok(dates.into_iter().collect())
    }

    /// Replace the file contents with `seen`, sorted ascending.
    ///
    /// Writes to a temp file in the same directory and renames it over the
    /// target, so a reader sees either the old or the new contents. The temp
    /// file is removed if any step fails.
    pub fn save(&self, seen: &BTreeSet<String>) -> Result<(), ScanError> {
        let json = serde_json::to_string(seen)
            .map_err(|e| ScanError::State(format!("failed to encode seen dates: {}", e)))?;

        let dir = self.parent_dir();

        let mut file = NamedTempFile::new_in(dir).map_err(|e| {
            ScanError::State(format!(
                "failed to create temp file in '{}': {}",
                dir.display(),
                e
            ))
        })?;

        file.write_all(json.as_bytes())
            .map_err(|e| ScanError::State(format!("failed to write temp file: {}", e)))?;

        file.as_file()
            .sync_all()
            .map_err(|e| ScanError::State(format!("failed to sync temp file: {}", e)))?;

        file.persist(&self.path).map_err(|e| {
            ScanError::State(format!(
                "failed to replace '{}': {}",
                self.path.display(),
                e.error
            ))
        })?;

        debug!("Saved {} seen date(s) to {}", seen.len(), self.path.display());
        Ok(())
    }

    fn parent_dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }
}
