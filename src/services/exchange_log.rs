//! Per-exchange audit files.
//!
//! Every exchange is written to its own plain-text file in the log directory.
//! Files are never read back. Each carries a short SHA-256 tag of the raw
//! input so entries about the same input can be correlated without reading
//! them; the tag is not a privacy measure, the input is stored alongside it.

use crate::{Error, Result};
use chrono::{DateTime, Local};
use sha2::{Digest, Sha256};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Number of hex characters of the input digest written to each entry.
pub const INPUT_DIGEST_LEN: usize = 10;

/// Upper bound on same-second suffixes tried before giving up.
const MAX_NAME_ATTEMPTS: u32 = 10_000;

/// Truncated lowercase hex SHA-256 of the raw input.
#[must_use]
pub fn input_digest(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    let mut digest = hex::encode(hasher.finalize());
    digest.truncate(INPUT_DIGEST_LEN);
    digest
}

/// Writer for the per-exchange log directory.
#[derive(Debug, Clone)]
pub struct ExchangeLog {
    dir: PathBuf,
}

impl ExchangeLog {
    /// Creates a writer for `dir`. The directory is created on first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The log directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes one exchange and returns the path of the new file.
    ///
    /// The file is named `entry_<YYYYMMDD_HHMMSS>.log` after `at`. When that
    /// name is taken, `_1`, `_2`, ... is appended to the stem; an existing
    /// file is never overwritten.
    pub fn write(
        &self,
        input: &str,
        output: &str,
        score: Option<f64>,
        at: DateTime<Local>,
    ) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir).map_err(|e| Error::OperationFailed {
            operation: "create_log_dir".to_string(),
            cause: format!("{}: {e}", self.dir.display()),
        })?;

        let stem = format!("entry_{}", at.format("%Y%m%d_%H%M%S"));
        let (path, mut file) = self.create_unique(&stem)?;

        let mut body = String::from("# Mechanized AIML Log\n");
        body.push_str(&format!("Input: {input}\n"));
        body.push_str(&format!("Hash (decipher in logs): {}\n", input_digest(input)));
        body.push_str(&format!("Output: {output}\n"));
        if let Some(score) = score {
            body.push_str(&format!("Score: {score}\n"));
        }

        file.write_all(body.as_bytes())
            .map_err(|e| Error::OperationFailed {
                operation: "write_exchange_log".to_string(),
                cause: format!("{}: {e}", path.display()),
            })?;

        tracing::debug!(file = %path.display(), "Exchange logged");
        Ok(path)
    }

    fn create_unique(&self, stem: &str) -> Result<(PathBuf, fs::File)> {
        for attempt in 0..MAX_NAME_ATTEMPTS {
            let name = if attempt == 0 {
                format!("{stem}.log")
            } else {
                format!("{stem}_{attempt}.log")
            };
            let path = self.dir.join(name);
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => return Ok((path, file)),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {},
                Err(e) => {
                    return Err(Error::OperationFailed {
                        operation: "create_exchange_log".to_string(),
                        cause: format!("{}: {e}", path.display()),
                    });
                },
            }
        }
        Err(Error::OperationFailed {
            operation: "create_exchange_log".to_string(),
            cause: format!("no free file name for {stem} in {}", self.dir.display()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn fixed_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap()
    }

    #[test]
    fn test_digest_is_truncated_sha256() {
        // sha256("hello") = 2cf24dba5fb0a30e26e83b2ac5b9e29e...
        assert_eq!(input_digest("hello"), "2cf24dba5f");
        assert_eq!(input_digest("").len(), INPUT_DIGEST_LEN);
    }

    #[test]
    fn test_entry_contents() {
        let dir = TempDir::new().unwrap();
        let log = ExchangeLog::new(dir.path().join("logs"));

        let path = log.write("hello", "Hi there!", Some(4.5), fixed_time()).unwrap();
        assert_eq!(path.file_name().unwrap(), "entry_20240309_140507.log");
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "# Mechanized AIML Log\n\
             Input: hello\n\
             Hash (decipher in logs): 2cf24dba5f\n\
             Output: Hi there!\n\
             Score: 4.5\n"
        );
    }

    #[test]
    fn test_score_line_omitted_without_score() {
        let dir = TempDir::new().unwrap();
        let log = ExchangeLog::new(dir.path());

        let path = log.write("a", "b", None, fixed_time()).unwrap();
        assert!(!fs::read_to_string(path).unwrap().contains("Score:"));
    }

    #[test]
    fn test_same_second_entries_do_not_collide() {
        let dir = TempDir::new().unwrap();
        let log = ExchangeLog::new(dir.path());

        let first = log.write("first", "1", None, fixed_time()).unwrap();
        let second = log.write("second", "2", None, fixed_time()).unwrap();
        let third = log.write("third", "3", None, fixed_time()).unwrap();

        assert_eq!(first.file_name().unwrap(), "entry_20240309_140507.log");
        assert_eq!(second.file_name().unwrap(), "entry_20240309_140507_1.log");
        assert_eq!(third.file_name().unwrap(), "entry_20240309_140507_2.log");
        assert!(fs::read_to_string(&first).unwrap().contains("Input: first"));
        assert!(fs::read_to_string(&second).unwrap().contains("Input: second"));
    }
}
