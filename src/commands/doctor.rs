//! Diagnose gatehouse setup issues

use colored::*;
use eyre::Result;

use crate::config::{HookCommandConfig, Settings};
use crate::pattern::Pattern;

pub fn run(settings: &Settings) -> Result<()> {
    println!("{}", "Gatehouse Doctor".bold());
    println!("{}", "═".repeat(50));
    println!();

    let mut issues = 0;

    // Settings discovery
    match Settings::discover() {
        Some(path) => {
            println!("{} Settings file: {}", "✓".green(), path.display());
        }
        None => {
            println!("{} No settings file found (using defaults)", "⚠".yellow());
            println!(
                "  Create {} to configure rules and hooks",
                Settings::config_dir().join("settings.json").display().to_string().cyan()
            );
        }
    }
    println!();

    // Permission rules
    println!("{}", "Permission rules:".bold());
    let rule_count = settings.permissions.allow.len() + settings.permissions.deny.len();
    if rule_count == 0 {
        println!("  {} No rules configured", "⚠".yellow());
    }
    for (tier, rules) in [("allow", &settings.permissions.allow), ("deny", &settings.permissions.deny)] {
        for rule in rules {
            match Pattern::parse(rule) {
                Ok(_) => println!("  {} {} ({})", "✓".green(), rule, tier),
                Err(e) => {
                    println!("  {} {} ({}): {}", "✗".red(), rule, tier, e);
                    issues += 1;
                }
            }
        }
    }
    println!();

    // Hook bindings
    println!("{}", "Hook bindings:".bold());
    if settings.hooks.is_empty() {
        println!("  {} No hooks configured", "⚠".yellow());
    }
    for (event, bindings) in &settings.hooks {
        if crate::hook::HookEvent::from_str(event).is_none() {
            println!("  {} Unknown event '{}'", "✗".red(), event);
            issues += 1;
            continue;
        }
        println!("  {}:", event.cyan());
        for binding in bindings {
            if let Err(e) = Pattern::parse(&binding.matcher) {
                println!("    {} matcher '{}': {}", "✗".red(), binding.matcher, e);
                issues += 1;
                continue;
            }
            for entry in &binding.hooks {
                let HookCommandConfig::Command { command, .. } = entry;
                match resolve_program(command) {
                    ProgramStatus::Found => println!("    {} {}", "✓".green(), command),
                    ProgramStatus::Missing(program) => {
                        println!("    {} {} ({} not found on PATH)", "✗".red(), command, program);
                        issues += 1;
                    }
                    ProgramStatus::Unchecked => {
                        println!("    {} {} (shell construct, not checked)", "⚠".yellow(), command);
                    }
                }
            }
        }
    }
    println!();

    // Summary
    println!("{}", "═".repeat(50));
    if issues == 0 {
        println!("{} All checks passed!", "✓".green().bold());
    } else {
        println!("{} {} issue(s) found", "⚠".yellow().bold(), issues);
    }

    Ok(())
}

enum ProgramStatus {
    Found,
    Missing(String),
    Unchecked,
}

/// Best-effort PATH check for a hook invocation. Commands are opaque shell
/// lines, so anything beyond a plain `program args...` form is skipped.
fn resolve_program(invocation: &str) -> ProgramStatus {
    if invocation.chars().any(|c| "|&;<>$`(){}".contains(c)) {
        return ProgramStatus::Unchecked;
    }

    let Some(program) = invocation.split_whitespace().next() else {
        return ProgramStatus::Unchecked;
    };

    if program.contains('/') {
        if std::path::Path::new(program).exists() {
            return ProgramStatus::Found;
        }
        return ProgramStatus::Missing(program.to_string());
    }

    match which::which(program) {
        Ok(_) => ProgramStatus::Found,
        Err(_) => ProgramStatus::Missing(program.to_string()),
    }
}
