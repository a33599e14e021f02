//! Whole-document JSON file persistence.
//!
//! Both the settings and the memory stores keep one JSON document per file,
//! read in full at startup and rewritten in full on save.

use crate::{Error, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::io;
use std::path::Path;

/// Maximum size of a persisted document (16MB).
/// Larger files are treated as corrupt instead of being read into memory.
const MAX_FILE_SIZE: u64 = 16 * 1024 * 1024;

/// Outcome of reading a JSON document from disk.
#[derive(Debug)]
pub enum ReadOutcome<T> {
    /// The file existed and parsed.
    Loaded(T),
    /// The file does not exist.
    Missing,
    /// The file exists but could not be read or parsed.
    Corrupt(String),
}

/// Reads and parses a JSON document.
///
/// Never fails: every problem is folded into [`ReadOutcome`] so callers can
/// fall back to a default document.
pub fn read_document<T: DeserializeOwned>(path: &Path) -> ReadOutcome<T> {
    let metadata = match fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return ReadOutcome::Missing,
        Err(e) => return ReadOutcome::Corrupt(e.to_string()),
    };

    if metadata.len() > MAX_FILE_SIZE {
        return ReadOutcome::Corrupt(format!(
            "file is {} bytes, limit is {MAX_FILE_SIZE}",
            metadata.len()
        ));
    }

    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => return ReadOutcome::Corrupt(e.to_string()),
    };

    match serde_json::from_str(&contents) {
        Ok(doc) => ReadOutcome::Loaded(doc),
        Err(e) => ReadOutcome::Corrupt(e.to_string()),
    }
}

/// Serializes a document as pretty-printed JSON and overwrites `path`.
///
/// Parent directories are created when missing.
pub fn write_document<T: Serialize>(path: &Path, doc: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| Error::OperationFailed {
            operation: "create_document_dir".to_string(),
            cause: format!("{}: {e}", parent.display()),
        })?;
    }

    let json = serde_json::to_string_pretty(doc).map_err(|e| Error::OperationFailed {
        operation: "serialize_document".to_string(),
        cause: e.to_string(),
    })?;

    fs::write(path, json).map_err(|e| Error::OperationFailed {
        operation: "write_document".to_string(),
        cause: format!("{}: {e}", path.display()),
    })
}
