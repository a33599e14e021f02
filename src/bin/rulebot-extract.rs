//! Extracts business records from a text file into a spreadsheet.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::print_stdout)]
#![allow(clippy::print_stderr)]
#![allow(clippy::multiple_crate_versions)]

use anyhow::Context;
use clap::Parser;
use rulebot::config::LoggingSettings;
use rulebot::{extract, observability};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Extract business records from free-form text.
#[derive(Parser)]
#[command(name = "rulebot-extract")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Text file to scan.
    input: PathBuf,

    /// Spreadsheet file to write (.xlsx or .csv).
    output: PathBuf,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let logging = LoggingSettings {
        level: "warn".to_string(),
        ..LoggingSettings::default()
    };
    if let Err(e) = observability::init_from_settings(&logging, false) {
        eprintln!("Failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    match run(&cli.input, &cli.output) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        },
    }
}

fn run(input: &Path, output: &Path) -> anyhow::Result<()> {
    let format = extract::ExportFormat::from_path(output)?;
    tracing::debug!(%format, path = %output.display(), "Export format selected");

    let text = std::fs::read_to_string(input)
        .with_context(|| format!("failed to read {}", input.display()))?;

    let records = extract::extract(&text);
    if records.is_empty() {
        println!("No business entries found.");
    }

    extract::export(&records, output)
        .with_context(|| format!("failed to write {}", output.display()))?;
    println!("Wrote {} rows to {}", records.len(), output.display());
    Ok(())
}
