use clap::Parser;
use eyre::{Context, Result};
use log::info;
use std::fs;
use std::path::PathBuf;

mod cli;
mod commands;
mod config;
mod hook;
mod pattern;
mod permission;

use cli::{Cli, Commands};
use config::{LogLevel, Settings};
use hook::registry::HookRegistry;
use permission::PermissionPolicy;

fn setup_logging(log_level: &LogLevel) -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("gatehouse")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("gatehouse.log");

    // Setup env_logger with file output
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    // RUST_LOG env var takes precedence, otherwise use config log_level
    let mut builder = env_logger::Builder::new();

    if std::env::var("RUST_LOG").is_ok() {
        builder.parse_default_env();
    } else {
        builder.filter_level(log_level.as_filter());
    }

    builder.target(env_logger::Target::Pipe(target)).init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

fn run(cli: Cli, settings: Settings, policy: PermissionPolicy, registry: HookRegistry) -> Result<()> {
    match cli.command {
        Commands::Gate {
            tool,
            arguments,
            session,
            invocation,
        } => commands::gate::run(tool, arguments, session, invocation, &settings, &policy, &registry),
        Commands::Check { tool, arguments } => commands::check::run(tool, arguments, &settings, &policy),
        Commands::Hook { action } => commands::hook::run(action, &registry),
        Commands::Config { action } => commands::config::run(action, &settings),
        Commands::Doctor => commands::doctor::run(&settings),
        Commands::Completions { shell } => commands::completions::run(shell),
    }
}

fn main() -> Result<()> {
    // Parse CLI arguments first
    let cli = Cli::parse();

    // Load settings (before logging, so log messages in Settings::load are silent)
    let settings = Settings::load(cli.config.as_ref()).context("Failed to load settings")?;

    // Setup logging with log level from settings (or RUST_LOG env var)
    setup_logging(&settings.log_level).context("Failed to setup logging")?;

    info!("Starting gatehouse with settings from: {:?}", cli.config);

    // Rules and bindings are parsed once here; a malformed pattern or
    // unknown event key aborts before anything can fire.
    let policy = PermissionPolicy::from_settings(&settings.permissions)
        .context("Invalid permission configuration")?;
    let registry = HookRegistry::from_settings(&settings).context("Invalid hook configuration")?;

    // Run the command
    run(cli, settings, policy, registry).context("Command failed")?;

    Ok(())
}
