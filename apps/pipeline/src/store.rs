//! Durable store for the processed collection.
//!
//! The whole collection is rewritten after every completed applicant, so a
//! save must never leave a torn file behind for a reader (or the next run) to
//! trip over. Writes go to a temp file in the same directory and are renamed
//! into place. A missing or unreadable file on load is treated as an empty
//! store: the pipeline can rebuild everything by re-running, though a corrupt
//! file does cost the enrichments already paid for, hence the loud warning.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::warn;

use crate::errors::AppError;
use crate::models::applicant::ApplicantRecord;

pub struct ApplicationStore {
    path: PathBuf,
}

impl ApplicationStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the previously saved collection. Missing file or invalid content
    /// yields an empty collection; other I/O failures propagate.
    pub fn load(&self) -> Result<Vec<ApplicantRecord>, AppError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_str(&raw) {
            Ok(records) => Ok(records),
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "store content is not valid JSON; starting from an empty collection \
                     (previously saved enrichments will be recomputed)"
                );
                Ok(Vec::new())
            }
        }
    }

    /// Serializes and atomically replaces the store file. Failures here are
    /// fatal to the run: continuing would silently lose completed work.
    pub fn save(&self, records: &[ApplicantRecord]) -> Result<(), AppError> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let mut tmp = NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(tmp.as_file_mut(), records)?;
        tmp.persist(&self.path).map_err(|e| AppError::Io(e.error))?;
        Ok(())
    }
}
