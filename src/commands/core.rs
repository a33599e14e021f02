//! Core command handlers.

use rulebot::config::BotConfig;
use rulebot::engine::AimlKernel;
use rulebot::repl::{self, LoopEvent};
use rulebot::services::{Session, build_corrector};
use rulebot::storage::{ReadOutcome, SettingsStore, read_document};
use rulebot::SessionMemory;
use std::io;
use std::sync::mpsc;

fn open_session(config: &BotConfig) -> Session {
    Session::open(
        config,
        Box::new(AimlKernel::new()),
        build_corrector(&config.corrector),
    )
}

/// Chat command.
pub fn cmd_chat(config: &BotConfig) -> Result<(), Box<dyn std::error::Error>> {
    let session = open_session(config);

    let (tx, rx) = mpsc::channel::<LoopEvent>();
    repl::install_interrupt_handler(tx.clone())?;
    // The reader thread stays blocked on stdin after the loop ends; process
    // exit reclaims it.
    let _reader = repl::spawn_stdin_reader(tx);

    let mut stdout = io::stdout().lock();
    repl::run(session, &rx, &mut stdout)?;
    Ok(())
}

/// Ask command.
pub fn cmd_ask(
    config: &BotConfig,
    text: &str,
    score: Option<f64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = open_session(config);
    let reply = session.listen(text, score);
    let closed = session.close();

    println!("Bot> {}", reply?);
    closed?;
    Ok(())
}

/// Mode command.
pub fn cmd_mode(config: &BotConfig, value: &str) -> Result<(), Box<dyn std::error::Error>> {
    let store = SettingsStore::new(&config.settings_file);
    let mut settings = store.load();
    let mode = store.set_mode(&mut settings, value)?;
    println!("[settings] Mode set to {mode}");
    Ok(())
}

/// Status command.
///
/// Reads the memory file without repairing it, so a corrupt file is
/// reported rather than moved aside.
pub fn cmd_status(config: &BotConfig) -> Result<(), Box<dyn std::error::Error>> {
    println!("Rulebot Status");
    println!("==============");
    println!();
    println!("Version: {}", env!("CARGO_PKG_VERSION"));
    println!("Name: {}", config.name);
    println!();

    println!("Memory: {}", config.memory_file.display());
    match read_document::<SessionMemory>(&config.memory_file) {
        ReadOutcome::Loaded(memory) => {
            println!("  Session ID: {}", memory.id);
            println!("  Purpose: {}", memory.purpose);
            println!("  Exchanges: {}", memory.exchange_count());
            match memory.mean_score() {
                Some(mean) => println!("  Scores: {} (mean {mean:.2})", memory.scores.len()),
                None => println!("  Scores: 0"),
            }
        },
        ReadOutcome::Missing => println!("  Not created yet"),
        ReadOutcome::Corrupt(cause) => {
            println!("  Unreadable ({cause}); a fresh memory will be started");
        },
    }

    let settings = SettingsStore::new(&config.settings_file).load();
    println!("Settings: {}", config.settings_file.display());
    match settings.raw_mode() {
        Some(raw) if settings.has_unrecognized_mode() => {
            println!("  Mode: {} (unrecognized '{raw}')", settings.mode());
        },
        _ => println!("  Mode: {}", settings.mode()),
    }

    let rules_status = if config.rules_dir.is_dir() {
        "Available"
    } else {
        "Not found"
    };
    println!("Rules Directory: {rules_status}");
    println!("  Path: {}", config.rules_dir.display());
    println!("Exchange Logs: {}", config.log_dir.display());

    println!();
    println!("Use 'rulebot config --show' to view full configuration");

    Ok(())
}
