//! Fire and inspect lifecycle hooks
//!
//! `dispatch` is the entry point the host runtime wires its lifecycle
//! events to; the payload arrives on stdin as JSON. The exit code tells the
//! runtime whether to proceed.

use colored::*;
use eyre::{Context, Result, bail};
use std::io::{self, Read};

use crate::cli::{HookAction, OutputFormat};
use crate::hook::dispatch::{DispatchOutcome, HookDispatcher};
use crate::hook::registry::HookRegistry;
use crate::hook::{HookEvent, ToolInvocationContext};

pub fn run(action: HookAction, registry: &HookRegistry) -> Result<()> {
    match action {
        HookAction::Dispatch { event, payload } => dispatch(&event, payload.as_deref(), registry),
        HookAction::List { event, format } => {
            list(event.as_deref(), OutputFormat::resolve(format), registry)
        }
    }
}

fn dispatch(event: &str, payload: Option<&str>, registry: &HookRegistry) -> Result<()> {
    let Some(event) = HookEvent::from_str(event) else {
        bail!("Unknown hook event '{}'", event);
    };

    // Read payload from stdin if not provided
    let payload_str = match payload {
        Some(p) => p.to_string(),
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read payload from stdin")?;
            buffer
        }
    };

    let payload: serde_json::Value = if payload_str.trim().is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_str(&payload_str).context("Failed to parse payload JSON")?
    };

    let context = ToolInvocationContext::from_payload(&payload);
    log::info!(
        "Dispatching {} for tool '{}' (invocation '{}')",
        event,
        context.tool_name,
        context.invocation_id
    );

    let outcome = HookDispatcher::new(registry).fire(event, &context);

    match &outcome {
        DispatchOutcome::Blocked { invocation, reason } => {
            eprintln!("{} Blocked by hook '{}': {}", "✗".red(), invocation, reason);
        }
        DispatchOutcome::PartiallyFailed { executed, failures } => {
            log::warn!(
                "{} dispatch ran {} command(s) with {} failure(s)",
                event,
                executed,
                failures.len()
            );
            for failure in failures {
                eprintln!("{} Hook '{}' failed: {}", "⚠".yellow(), failure.invocation, failure.message);
            }
        }
        DispatchOutcome::Completed { executed } => {
            log::info!("{} dispatch completed, {} command(s) run", event, executed);
        }
    }

    std::process::exit(outcome.exit_code());
}

fn list(event_filter: Option<&str>, format: OutputFormat, registry: &HookRegistry) -> Result<()> {
    let filter = match event_filter {
        Some(name) => match HookEvent::from_str(name) {
            Some(event) => Some(event),
            None => bail!("Unknown hook event '{}'", name),
        },
        None => None,
    };

    let entries: Vec<serde_json::Value> = registry
        .events()
        .filter(|(event, _)| filter.is_none_or(|wanted| *event == wanted))
        .map(|(event, bindings)| {
            serde_json::json!({
                "event": event.as_str(),
                "bindings": bindings
                    .iter()
                    .map(|binding| {
                        serde_json::json!({
                            "matcher": binding.matcher_source,
                            "commands": binding
                                .commands
                                .iter()
                                .map(|command| command.invocation.as_str())
                                .collect::<Vec<_>>()
                        })
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entries)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(&entries)?),
        OutputFormat::Text => {
            println!("{}", "Registered hook bindings:".bold());
            println!();

            if entries.is_empty() {
                println!("  {} No bindings configured", "⚠".yellow());
                return Ok(());
            }

            for (event, bindings) in registry
                .events()
                .filter(|(event, _)| filter.is_none_or(|wanted| *event == wanted))
            {
                println!("{}:", event.as_str().cyan());
                for binding in bindings {
                    let matcher = if binding.matcher.is_match_all() {
                        "<all tools>".dimmed().to_string()
                    } else {
                        binding.matcher_source.clone()
                    };
                    println!("  matcher: {}", matcher);
                    for command in &binding.commands {
                        println!("    {} {}", "→".blue(), command.invocation);
                    }
                }
                println!();
            }
        }
    }

    Ok(())
}
