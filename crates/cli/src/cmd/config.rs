//! Configuration display command

use anyhow::Result;
use lull_core::LullConfig;
use owo_colors::OwoColorize;
use std::path::Path;

/// Print the effective configuration
pub fn run(config: &LullConfig, path: Option<&Path>) -> Result<()> {
    println!("{}", "Lull Configuration".bold());
    match path {
        Some(path) => println!("{}: {}\n", "Location".dimmed(), path.display().dimmed()),
        None => println!("{}\n", "(built-in defaults)".dimmed()),
    }

    println!("{}", "[timer]".yellow());
    println!(
        "  {} = {} {}",
        "period_ms".cyan(),
        config.timer.period_ms,
        format!("({:?})", config.timer.period()).dimmed()
    );
    println!("  {} = {}", "start_enabled".cyan(), config.timer.start_enabled);

    println!("\n{}", "[debounce]".yellow());
    println!(
        "  {} = {} {}",
        "delay_ms".cyan(),
        config.debounce.delay_ms,
        format!("({:?})", config.debounce.delay()).dimmed()
    );
    println!("  {} = {}", "start_enabled".cyan(), config.debounce.start_enabled);

    println!("\n{}", "[logging]".yellow());
    println!("  {} = {}", "level".cyan(), config.logging.level);
    match &config.logging.directory {
        Some(directory) => println!("  {} = {}", "directory".cyan(), directory.display()),
        None => println!("  {} = {}", "directory".cyan(), "(stderr)".dimmed()),
    }

    Ok(())
}
