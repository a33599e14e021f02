//! Session memory file store.

use super::json_file::{ReadOutcome, read_document, write_document};
use crate::Result;
use crate::models::SessionMemory;
use std::fs;
use std::path::{Path, PathBuf};

/// Loads and saves the session memory document.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    path: PathBuf,
}

impl MemoryStore {
    /// Creates a store backed by the file at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the memory file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path a corrupt memory file is moved to before starting fresh.
    #[must_use]
    pub fn quarantine_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(".corrupt");
        PathBuf::from(name)
    }

    /// Loads the memory document.
    ///
    /// A missing or malformed file yields a fresh document for `corrector`
    /// with the given `purpose`. A malformed file is first renamed to
    /// [`quarantine_path`](Self::quarantine_path) so the next save cannot
    /// destroy it.
    #[must_use]
    pub fn load(&self, corrector: &str, purpose: &str) -> SessionMemory {
        match read_document::<SessionMemory>(&self.path) {
            ReadOutcome::Loaded(mut memory) => {
                if memory.id.is_empty() {
                    memory.id = uuid::Uuid::new_v4().to_string();
                }
                if memory.purpose.is_empty() {
                    memory.purpose = purpose.to_string();
                }
                tracing::debug!(
                    path = %self.path.display(),
                    exchanges = memory.log.len(),
                    "Loaded session memory"
                );
                memory
            },
            ReadOutcome::Missing => SessionMemory::fresh(corrector, purpose),
            ReadOutcome::Corrupt(cause) => {
                self.quarantine(&cause);
                SessionMemory::fresh(corrector, purpose)
            },
        }
    }

    /// Writes the full document, overwriting the file.
    pub fn save(&self, memory: &SessionMemory) -> Result<()> {
        write_document(&self.path, memory)
    }

    fn quarantine(&self, cause: &str) {
        let target = self.quarantine_path();
        match fs::rename(&self.path, &target) {
            Ok(()) => tracing::warn!(
                path = %self.path.display(),
                moved_to = %target.display(),
                %cause,
                "Corrupted memory. Starting fresh."
            ),
            Err(e) => tracing::warn!(
                path = %self.path.display(),
                %cause,
                rename_error = %e,
                "Corrupted memory could not be moved aside. Starting fresh."
            ),
        }
    }
}
