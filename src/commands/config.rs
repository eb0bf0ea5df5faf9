use colored::*;
use eyre::Result;

use crate::cli::{ConfigAction, OutputFormat};
use crate::config::Settings;
use crate::hook::registry::HookRegistry;
use crate::permission::{PermissionPolicy, UnmatchedDisposition};

pub fn run(action: ConfigAction, settings: &Settings) -> Result<()> {
    match action {
        ConfigAction::Show { format } => show(OutputFormat::resolve(format), settings),
        ConfigAction::Validate => validate(settings),
    }
}

fn show(format: OutputFormat, settings: &Settings) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(settings)?);
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yaml::to_string(settings)?);
        }
        OutputFormat::Text => {
            println!("{}", "Gatehouse Configuration".bold());
            println!();

            println!("{}:", "permissions".cyan());
            println!("  allow rules: {}", settings.permissions.allow.len());
            for rule in &settings.permissions.allow {
                println!("    {} {}", "✓".green(), rule);
            }
            println!("  deny rules: {}", settings.permissions.deny.len());
            for rule in &settings.permissions.deny {
                println!("    {} {}", "✗".red(), rule);
            }
            let unmatched = match settings.permissions.unmatched {
                UnmatchedDisposition::Allow => "allow",
                UnmatchedDisposition::Deny => "deny",
            };
            println!("  unmatched: {}", unmatched);
            println!();

            println!("{}:", "hooks".cyan());
            if settings.hooks.is_empty() {
                println!("  <none>");
            }
            for (event, bindings) in &settings.hooks {
                let commands: usize = bindings.iter().map(|b| b.hooks.len()).sum();
                println!("  {}: {} binding(s), {} command(s)", event, bindings.len(), commands);
            }
            println!();

            println!("{}: {}s", "timeout".cyan(), settings.timeout);
            println!("{}: {}", "log_level".cyan(), settings.log_level.as_filter());
        }
    }

    Ok(())
}

fn validate(settings: &Settings) -> Result<()> {
    let policy = PermissionPolicy::from_settings(&settings.permissions)?;
    let registry = HookRegistry::from_settings(settings)?;

    let binding_count: usize = settings.hooks.values().map(Vec::len).sum();
    let command_count: usize = settings
        .hooks
        .values()
        .flatten()
        .map(|binding| binding.hooks.len())
        .sum();

    println!(
        "{} Settings valid: {} allow rule(s), {} deny rule(s), {} binding(s), {} command(s)",
        "✓".green(),
        policy.allow_rules().len(),
        policy.deny_rules().len(),
        binding_count,
        command_count
    );

    if registry.is_empty() && policy.allow_rules().is_empty() && policy.deny_rules().is_empty() {
        println!(
            "  {} Nothing configured; every invocation passes through untouched",
            "⚠".yellow()
        );
    }

    Ok(())
}
