//! Config command handler.

use rulebot::config::{BotConfig, CONFIG_PATH_ENV};
use rulebot::observability::LogFormat;

/// Config command.
pub fn cmd_config(config: &BotConfig, show: bool) -> Result<(), Box<dyn std::error::Error>> {
    if !show {
        println!("Use 'rulebot config --show' to view the effective configuration");
        return Ok(());
    }

    println!("Current Configuration");
    println!("=====================");
    println!();

    println!("Config Files Loaded:");
    if config.config_sources.is_empty() {
        println!("  (none - using defaults)");
    } else {
        for source in &config.config_sources {
            println!("  - {}", source.display());
        }
    }
    println!("  (override with --config or {CONFIG_PATH_ENV})");
    println!();

    println!("Name: {}", config.name);
    println!("Purpose: {}", config.purpose);
    println!("Rules Directory: {}", config.rules_dir.display());
    println!("Memory File: {}", config.memory_file.display());
    println!("Settings File: {}", config.settings_file.display());
    println!("Log Directory: {}", config.log_dir.display());
    println!("Flush On Record: {}", config.flush_on_record);
    println!();

    println!("Corrector:");
    println!("  Enabled: {}", config.corrector.enabled);
    println!(
        "  Dictionary: {}",
        config
            .corrector
            .dictionary
            .as_ref()
            .map_or_else(|| "(bundled)".to_string(), |p| p.display().to_string())
    );
    println!();

    println!("Logging:");
    println!("  Level: {}", config.logging.level);
    println!(
        "  Format: {}",
        match config.logging.format {
            LogFormat::Pretty => "pretty",
            LogFormat::Json => "json",
        }
    );
    println!(
        "  File: {}",
        config
            .logging
            .file
            .as_ref()
            .map_or_else(|| "(stderr)".to_string(), |p| p.display().to_string())
    );

    Ok(())
}
