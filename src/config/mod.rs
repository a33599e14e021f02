//! Configuration management.

use crate::observability::LogFormat;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable naming a config file to load instead of the defaults.
pub const CONFIG_PATH_ENV: &str = "RULEBOT_CONFIG_PATH";

/// Main configuration for a bot instance.
#[derive(Debug, Clone, PartialEq)]
pub struct BotConfig {
    /// Bot instance name, shown in the ready banner and stored in memory.
    pub name: String,
    /// Purpose string recorded in fresh memory documents.
    pub purpose: String,
    /// Directory holding the rule files.
    pub rules_dir: PathBuf,
    /// Session memory document.
    pub memory_file: PathBuf,
    /// Settings document.
    pub settings_file: PathBuf,
    /// Directory for per-exchange log files.
    pub log_dir: PathBuf,
    /// Save memory after every exchange instead of only at shutdown.
    pub flush_on_record: bool,
    /// Spell corrector configuration.
    pub corrector: CorrectorConfig,
    /// Logging configuration.
    pub logging: LoggingSettings,
    /// Config files the values were loaded from.
    pub config_sources: Vec<PathBuf>,
}

/// Spell corrector configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrectorConfig {
    /// Whether input is spell-corrected at all.
    pub enabled: bool,
    /// Word list for the dictionary corrector. The bundled list when unset.
    pub dictionary: Option<PathBuf>,
}

impl Default for CorrectorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dictionary: None,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    /// Default filter directive, used when no env filter is set.
    pub level: String,
    /// Output format.
    pub format: LogFormat,
    /// Append logs to this file instead of stderr.
    pub file: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            file: None,
        }
    }
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    /// Bot name.
    pub name: Option<String>,
    /// Memory purpose.
    pub purpose: Option<String>,
    /// Rules directory.
    pub rules_dir: Option<String>,
    /// Memory file.
    pub memory_file: Option<String>,
    /// Settings file.
    pub settings_file: Option<String>,
    /// Exchange log directory.
    pub log_dir: Option<String>,
    /// Flush memory after each exchange.
    pub flush_on_record: Option<bool>,
    /// Corrector section.
    pub corrector: Option<ConfigFileCorrector>,
    /// Logging section.
    pub logging: Option<ConfigFileLogging>,
}

/// Corrector section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileCorrector {
    /// Set to false to pass input through uncorrected.
    pub enabled: Option<bool>,
    /// Word list path.
    pub dictionary: Option<String>,
}

/// Logging section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileLogging {
    /// Filter directive.
    pub level: Option<String>,
    /// "pretty" or "json".
    pub format: Option<String>,
    /// Log file path.
    pub file: Option<String>,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: "Alice".to_string(),
            purpose: crate::models::DEFAULT_PURPOSE.to_string(),
            rules_dir: PathBuf::from("Achat"),
            memory_file: PathBuf::from("aiml_memory.json"),
            settings_file: PathBuf::from("settings.json"),
            log_dir: PathBuf::from("logs"),
            flush_on_record: false,
            corrector: CorrectorConfig::default(),
            logging: LoggingSettings::default(),
            config_sources: Vec::new(),
        }
    }
}

impl BotConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: &Path) -> crate::Result<Self> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| crate::Error::OperationFailed {
                operation: "read_config_file".to_string(),
                cause: format!("{}: {e}", path.display()),
            })?;

        let mut config = Self::from_toml(&contents).map_err(|e| match e {
            crate::Error::OperationFailed { operation, cause } => crate::Error::OperationFailed {
                operation,
                cause: format!("{}: {cause}", path.display()),
            },
            other => other,
        })?;
        config.config_sources.push(path.to_path_buf());
        Ok(config)
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid config document.
    pub fn from_toml(contents: &str) -> crate::Result<Self> {
        let file: ConfigFile =
            toml::from_str(contents).map_err(|e| crate::Error::OperationFailed {
                operation: "parse_config_file".to_string(),
                cause: e.to_string(),
            })?;
        Ok(Self::from_config_file(file))
    }

    /// Loads configuration from the default location.
    ///
    /// Checks the following paths in order:
    /// 1. Platform-specific config dir (`~/Library/Application Support/rulebot/` on macOS)
    /// 2. XDG config dir (`~/.config/rulebot/` for Unix compatibility)
    ///
    /// Returns default configuration if no config file is found.
    #[must_use]
    pub fn load_default() -> Self {
        for candidate in default_locations() {
            if !candidate.exists() {
                continue;
            }
            match Self::load_from_file(&candidate) {
                Ok(config) => return config,
                Err(e) => tracing::warn!(
                    path = %candidate.display(),
                    error = %e,
                    "Skipping unreadable config file"
                ),
            }
        }
        Self::default()
    }

    /// Resolves configuration for a process.
    ///
    /// An explicit path wins, then [`CONFIG_PATH_ENV`], then the default
    /// locations. Explicitly named files must load.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicitly named config file cannot be loaded.
    pub fn resolve(explicit: Option<&Path>) -> crate::Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from_file(path);
        }
        if let Some(path) = std::env::var_os(CONFIG_PATH_ENV).filter(|p| !p.is_empty()) {
            return Self::load_from_file(Path::new(&path));
        }
        Ok(Self::load_default())
    }

    /// Converts a `ConfigFile` to `BotConfig`.
    fn from_config_file(file: ConfigFile) -> Self {
        let mut config = Self::default();

        if let Some(name) = file.name {
            config.name = name;
        }
        if let Some(purpose) = file.purpose {
            config.purpose = purpose;
        }
        if let Some(dir) = file.rules_dir {
            config.rules_dir = PathBuf::from(dir);
        }
        if let Some(path) = file.memory_file {
            config.memory_file = PathBuf::from(path);
        }
        if let Some(path) = file.settings_file {
            config.settings_file = PathBuf::from(path);
        }
        if let Some(dir) = file.log_dir {
            config.log_dir = PathBuf::from(dir);
        }
        if let Some(flush) = file.flush_on_record {
            config.flush_on_record = flush;
        }
        if let Some(corrector) = file.corrector {
            if let Some(enabled) = corrector.enabled {
                config.corrector.enabled = enabled;
            }
            config.corrector.dictionary = corrector.dictionary.map(PathBuf::from);
        }
        if let Some(logging) = file.logging {
            if let Some(level) = logging.level {
                config.logging.level = level;
            }
            if let Some(format) = logging.format {
                config.logging.format = LogFormat::parse(&format);
            }
            config.logging.file = logging.file.map(PathBuf::from);
        }

        config
    }

    /// Places every relative data path under `dir`.
    #[must_use]
    pub fn with_data_dir(mut self, dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        for path in [
            &mut self.rules_dir,
            &mut self.memory_file,
            &mut self.settings_file,
            &mut self.log_dir,
        ] {
            if path.is_relative() {
                *path = dir.join(&*path);
            }
        }
        self
    }

    /// Sets the rules directory.
    #[must_use]
    pub fn with_rules_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.rules_dir = path.into();
        self
    }

    /// Sets whether memory is saved after every exchange.
    #[must_use]
    pub const fn with_flush_on_record(mut self, flush: bool) -> Self {
        self.flush_on_record = flush;
        self
    }
}

fn default_locations() -> Vec<PathBuf> {
    let Some(base_dirs) = directories::BaseDirs::new() else {
        return Vec::new();
    };
    vec![
        base_dirs.config_dir().join("rulebot").join("config.toml"),
        base_dirs
            .home_dir()
            .join(".config")
            .join("rulebot")
            .join("config.toml"),
    ]
}
