//! Conversation session.
//!
//! A [`Session`] owns everything one bot instance needs between startup and
//! shutdown: the response engine with its learned rules, the corrector, the
//! memory and settings documents with their stores, and the exchange log.
//!
//! # Persistence
//!
//! The memory document is kept in memory and written back by [`Session::flush`]
//! and [`Session::close`]. A dirty session that is dropped without being
//! closed flushes as well. With `flush_on_record` the document is also written
//! after every exchange. Exchange log files are always written immediately.

use super::{ExchangeLog, TextCorrector, influence, preprocess, respond};
use crate::config::BotConfig;
use crate::engine::{ResponseEngine, RuleLoadReport, load_rules};
use crate::models::{Exchange, Mode, SessionMemory, Settings};
use crate::storage::{MemoryStore, SettingsStore};
use crate::{Error, Result};
use chrono::Local;
use std::time::{Duration, Instant};

/// Final figures reported when a session closes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionSummary {
    /// Time since the session was opened.
    pub uptime: Duration,
    /// Exchanges recorded in the memory document, including earlier sessions.
    pub exchanges: usize,
}

impl SessionSummary {
    /// Uptime as `H:MM:SS.ffffff`.
    #[must_use]
    pub fn uptime_display(&self) -> String {
        format_uptime(self.uptime)
    }
}

/// Formats a duration as `H:MM:SS.ffffff`. Hours are not wrapped into days.
#[must_use]
pub fn format_uptime(duration: Duration) -> String {
    let secs = duration.as_secs();
    format!(
        "{}:{:02}:{:02}.{:06}",
        secs / 3600,
        (secs / 60) % 60,
        secs % 60,
        duration.subsec_micros()
    )
}

/// A running bot instance.
pub struct Session {
    name: String,
    engine: Box<dyn ResponseEngine>,
    corrector: Box<dyn TextCorrector>,
    rule_report: RuleLoadReport,
    memory: SessionMemory,
    memory_store: MemoryStore,
    settings: Settings,
    settings_store: SettingsStore,
    exchange_log: ExchangeLog,
    flush_on_record: bool,
    started: Instant,
    dirty: bool,
}

impl Session {
    /// Opens a session: learns the rule files, then loads memory and
    /// settings.
    ///
    /// Never fails. Missing or unreadable rules, memory and settings are
    /// logged and replaced by empty or default state.
    #[must_use]
    pub fn open(
        config: &BotConfig,
        mut engine: Box<dyn ResponseEngine>,
        corrector: Box<dyn TextCorrector>,
    ) -> Self {
        let started = Instant::now();
        let rule_report = load_rules(engine.as_mut(), &config.rules_dir);

        let memory_store = MemoryStore::new(&config.memory_file);
        let mut memory = memory_store.load(&config.name, &config.purpose);
        memory.corrector.clone_from(&config.name);

        let settings_store = SettingsStore::new(&config.settings_file);
        let settings = settings_store.load();

        tracing::info!(
            name = %config.name,
            session = %memory.id,
            rules = rule_report.rule_count(),
            failed_files = rule_report.failed.len(),
            exchanges = memory.exchange_count(),
            mode = %settings.mode(),
            "Session opened"
        );

        Self {
            name: config.name.clone(),
            engine,
            corrector,
            rule_report,
            memory,
            memory_store,
            settings,
            settings_store,
            exchange_log: ExchangeLog::new(&config.log_dir),
            flush_on_record: config.flush_on_record,
            started,
            dirty: false,
        }
    }

    /// Runs one input through the pipeline and records the exchange.
    ///
    /// The input is corrected, answered by the engine (or the keyword
    /// fallback) and framed by the current mode. The raw input, the final
    /// reply and the optional score are then appended to memory and written
    /// to a new exchange log file.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidInput`] for a score that is not a
    /// finite number, an error if the corrector or the engine fail, or if the
    /// exchange cannot be recorded.
    pub fn listen(&mut self, text: &str, score: Option<f64>) -> Result<String> {
        if let Some(score) = score.filter(|s| !s.is_finite()) {
            return Err(Error::InvalidInput(format!(
                "score must be a finite number, got {score}"
            )));
        }
        let received_at = Local::now();

        let processed = preprocess(self.corrector.as_ref(), text)?;
        let response = respond(self.engine.as_ref(), &processed)?;
        let reply = influence(&response, self.settings.mode());

        self.record(text, &reply, score, received_at)?;
        Ok(reply)
    }

    fn record(
        &mut self,
        input: &str,
        output: &str,
        score: Option<f64>,
        received_at: chrono::DateTime<Local>,
    ) -> Result<()> {
        self.memory.append(Exchange::new(input, output, received_at, score));
        self.dirty = true;

        self.exchange_log.write(input, output, score, received_at)?;

        if self.flush_on_record {
            self.flush()?;
        }
        Ok(())
    }

    /// Changes the response mode and persists the settings.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidInput`] for an unknown mode, in which
    /// case nothing changes, or an error if the settings cannot be written.
    pub fn set_mode(&mut self, raw: &str) -> Result<Mode> {
        self.settings_store.set_mode(&mut self.settings, raw)
    }

    /// Writes the memory document if it has unsaved exchanges.
    ///
    /// # Errors
    ///
    /// Returns an error if the memory file cannot be written.
    pub fn flush(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        self.memory_store.save(&self.memory)?;
        self.dirty = false;
        tracing::debug!(
            path = %self.memory_store.path().display(),
            exchanges = self.memory.exchange_count(),
            "Memory flushed"
        );
        Ok(())
    }

    /// Flushes memory and ends the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the final flush fails. The session is consumed
    /// either way.
    pub fn close(mut self) -> Result<SessionSummary> {
        let flushed = self.flush();
        self.dirty = false;

        let summary = SessionSummary {
            uptime: self.started.elapsed(),
            exchanges: self.memory.exchange_count(),
        };
        tracing::info!(
            session = %self.memory.id,
            uptime = %summary.uptime_display(),
            exchanges = summary.exchanges,
            "Shutting down"
        );

        flushed.map(|()| summary)
    }

    /// Bot instance name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The memory document as currently held.
    #[must_use]
    pub const fn memory(&self) -> &SessionMemory {
        &self.memory
    }

    /// Current settings.
    #[must_use]
    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Current response mode.
    #[must_use]
    pub fn mode(&self) -> Mode {
        self.settings.mode()
    }

    /// What the rule loader did at startup.
    #[must_use]
    pub const fn rule_report(&self) -> &RuleLoadReport {
        &self.rule_report
    }

    /// Returns true when memory has exchanges not yet written to disk.
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Time since the session was opened.
    #[must_use]
    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.dirty {
            if let Err(e) = self.flush() {
                tracing::error!(error = %e, "Failed to flush memory on drop");
            }
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("name", &self.name)
            .field("engine", &self.engine.name())
            .field("corrector", &self.corrector.name())
            .field("session", &self.memory.id)
            .field("exchanges", &self.memory.exchange_count())
            .field("dirty", &self.dirty)
            .finish_non_exhaustive()
    }
}
