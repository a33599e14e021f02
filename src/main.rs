//! Binary entry point for rulebot.
//!
//! This binary provides the interactive chat loop and a few maintenance
//! commands around the bot's memory and settings files.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr in main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
// Allow needless_pass_by_value for command functions
#![allow(clippy::needless_pass_by_value)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

mod commands;

use clap::{Parser, Subcommand};
use rulebot::config::BotConfig;
use rulebot::observability;
use std::path::PathBuf;
use std::process::ExitCode;

use commands::{cmd_ask, cmd_chat, cmd_config, cmd_mode, cmd_status};

/// Rulebot - a rule-based chatbot with persistent memory.
#[derive(Parser)]
#[command(name = "rulebot")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Start the interactive chat loop (default).
    Chat,

    /// Answer a single input and exit.
    Ask {
        /// The input text.
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,

        /// Rating recorded with the exchange.
        #[arg(short, long, value_parser = parse_score)]
        score: Option<f64>,
    },

    /// Change the response mode.
    Mode {
        /// One of: harmony, mediation, arbitration, fight-abating.
        value: String,
    },

    /// Show memory and settings status.
    Status,

    /// Manage configuration.
    Config {
        /// Show the effective configuration.
        #[arg(long)]
        show: bool,
    },
}

/// Parses a score argument, accepting finite numbers only.
fn parse_score(raw: &str) -> Result<f64, String> {
    let score: f64 = raw.parse().map_err(|e| format!("{e}"))?;
    if score.is_finite() {
        Ok(score)
    } else {
        Err(format!("'{raw}' is not a finite number"))
    }
}

/// Main entry point.
fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match BotConfig::resolve(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        },
    };

    if let Err(e) = observability::init_from_settings(&config.logging, cli.verbose) {
        eprintln!("Failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    match run_command(cli, config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        },
    }
}

/// Runs the selected command.
fn run_command(cli: Cli, config: BotConfig) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Chat => cmd_chat(&config),
        Commands::Ask { text, score } => cmd_ask(&config, &text.join(" "), score),
        Commands::Mode { value } => cmd_mode(&config, &value),
        Commands::Status => cmd_status(&config),
        Commands::Config { show } => cmd_config(&config, show),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_argument_must_be_finite() {
        let cli = Cli::try_parse_from(["rulebot", "ask", "hello", "--score", "4.5"]).unwrap();
        let parsed = matches!(
            cli.command,
            Some(Commands::Ask { score: Some(s), .. }) if (s - 4.5).abs() < f64::EPSILON
        );
        assert!(parsed);

        for raw in ["nan", "inf", "-inf", "NaN", "abc"] {
            assert!(Cli::try_parse_from(["rulebot", "ask", "hello", "--score", raw]).is_err());
        }
    }
}
