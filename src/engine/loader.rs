//! Rule file discovery and loading.

use super::ResponseEngine;
use crate::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// File extensions recognized as rule files.
pub const RULE_FILE_EXTENSIONS: &[&str] = &["aiml", "xml"];

/// Result of loading a rule directory.
#[derive(Debug, Default)]
pub struct RuleLoadReport {
    /// Files learned successfully, with the number of rules each added.
    pub loaded: Vec<(PathBuf, usize)>,
    /// Files that failed to load, with the error.
    pub failed: Vec<(PathBuf, Error)>,
}

impl RuleLoadReport {
    /// Total rules added across all loaded files.
    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.loaded.iter().map(|(_, n)| n).sum()
    }

    /// Returns true when no file was attempted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.loaded.is_empty() && self.failed.is_empty()
    }
}

/// Recursively collects rule files under `directory`.
///
/// Entries are visited in name order, files of a directory before its
/// subdirectories, so the load order is deterministic.
pub fn discover_rule_files(directory: &Path) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    walk(directory, &mut found)?;
    Ok(found)
}

fn walk(directory: &Path, found: &mut Vec<PathBuf>) -> Result<()> {
    let entries = fs::read_dir(directory).map_err(|e| Error::OperationFailed {
        operation: "read_rule_dir".to_string(),
        cause: format!("{}: {e}", directory.display()),
    })?;

    let mut files = Vec::new();
    let mut subdirs = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            subdirs.push(path);
        } else if is_rule_file(&path) {
            files.push(path);
        }
    }

    files.sort();
    subdirs.sort();
    found.extend(files);
    for subdir in subdirs {
        walk(&subdir, found)?;
    }
    Ok(())
}

fn is_rule_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| RULE_FILE_EXTENSIONS.contains(&ext))
}

/// Loads every rule file under `directory` into `engine`.
///
/// Never fails as a whole: a missing directory or an empty one is logged and
/// yields an empty report, and a file that fails to load is logged, recorded
/// and skipped. Rules from files that loaded stay loaded.
pub fn load_rules(engine: &mut dyn ResponseEngine, directory: &Path) -> RuleLoadReport {
    let mut report = RuleLoadReport::default();

    if !directory.is_dir() {
        tracing::warn!(dir = %directory.display(), "Rule directory not found");
        return report;
    }

    let files = match discover_rule_files(directory) {
        Ok(files) => files,
        Err(e) => {
            tracing::warn!(dir = %directory.display(), error = %e, "Rule directory unreadable");
            return report;
        },
    };

    if files.is_empty() {
        tracing::warn!(dir = %directory.display(), "No rule files found");
        return report;
    }

    for path in files {
        match engine.learn(&path) {
            Ok(count) => {
                tracing::info!(
                    file = %path.display(),
                    rules = count,
                    engine = engine.name(),
                    "Learned"
                );
                report.loaded.push((path, count));
            },
            Err(e) => {
                tracing::error!(file = %path.display(), error = %e, "Error learning rule file");
                report.failed.push((path, e));
            },
        }
    }

    report
}
