//! Settings file store.

use super::json_file::{ReadOutcome, read_document, write_document};
use crate::models::{Mode, Settings};
use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// Loads and saves the settings document.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    /// Creates a store backed by the file at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the settings file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads settings, falling back to the defaults when the file is missing
    /// or malformed.
    #[must_use]
    pub fn load(&self) -> Settings {
        match read_document::<Settings>(&self.path) {
            ReadOutcome::Loaded(settings) => {
                if settings.has_unrecognized_mode() {
                    tracing::warn!(
                        path = %self.path.display(),
                        mode = settings.raw_mode().unwrap_or_default(),
                        "Unrecognized mode in settings, using {}",
                        Mode::default()
                    );
                }
                settings
            },
            ReadOutcome::Missing => Settings::default(),
            ReadOutcome::Corrupt(cause) => {
                tracing::warn!(
                    path = %self.path.display(),
                    %cause,
                    "Settings file unreadable, using defaults"
                );
                Settings::default()
            },
        }
    }

    /// Writes the settings, overwriting the file.
    pub fn save(&self, settings: &Settings) -> Result<()> {
        write_document(&self.path, settings)
    }

    /// Parses `raw` as a mode, applies it and persists immediately.
    ///
    /// Unknown modes are rejected and nothing is written.
    pub fn set_mode(&self, settings: &mut Settings, raw: &str) -> Result<Mode> {
        let mode = Mode::parse(raw).ok_or_else(|| {
            Error::InvalidInput(format!(
                "unknown mode '{}' (expected one of: {})",
                raw.trim(),
                Mode::names()
            ))
        })?;

        settings.set_mode(mode);
        self.save(settings)?;
        tracing::info!(%mode, "Mode changed");
        Ok(mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> SettingsStore {
        SettingsStore::new(dir.path().join("settings.json"))
    }

    #[test]
    fn test_load_missing_returns_default() {
        let dir = TempDir::new().unwrap();
        assert_eq!(store_in(&dir).load(), Settings::default());
    }

    #[test]
    fn test_load_invalid_json_returns_default() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        fs::write(store.path(), "{\"mode\": ").unwrap();

        assert_eq!(store.load().mode(), Mode::Harmony);
    }

    #[test]
    fn test_load_non_object_returns_default() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        fs::write(store.path(), "[1, 2, 3]").unwrap();

        assert_eq!(store.load(), Settings::default());
    }

    #[test]
    fn test_set_mode_persists() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let mut settings = store.load();

        let mode = store.set_mode(&mut settings, "Fight-Abating").unwrap();
        assert_eq!(mode, Mode::FightAbating);
        assert_eq!(store.load().mode(), Mode::FightAbating);
    }

    #[test]
    fn test_set_unknown_mode_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let mut settings = store.load();

        let err = store.set_mode(&mut settings, "shouting").unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert!(!store.path().exists());
        assert_eq!(settings.mode(), Mode::Harmony);
    }
}
