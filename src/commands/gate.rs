//! Permission gate for tool invocations
//!
//! The host runtime calls this before running a tool: permission rules
//! first, then the PreToolUse hooks. Exit 0 means the tool may proceed,
//! exit 2 means it must not.

use colored::*;
use eyre::Result;
use log::info;

use crate::config::Settings;
use crate::hook::dispatch::{DispatchOutcome, HookDispatcher};
use crate::hook::registry::HookRegistry;
use crate::hook::{EXIT_BLOCK, HookEvent, ToolInvocationContext};
use crate::permission::{Evaluation, PermissionPolicy};

pub fn run(
    tool: String,
    arguments: String,
    session: String,
    invocation: String,
    settings: &Settings,
    policy: &PermissionPolicy,
    registry: &HookRegistry,
) -> Result<()> {
    let evaluation = policy.evaluate(&tool, &arguments);
    if !evaluation.permitted(settings.permissions.unmatched) {
        match evaluation {
            Evaluation::Deny(rule) => {
                info!("Denied {} '{}' by rule '{}'", tool, arguments, rule.source);
                eprintln!("{} Denied by rule '{}'", "✗".red(), rule.source);
            }
            _ => {
                info!("Denied {} '{}': no rule matched", tool, arguments);
                eprintln!("{} No rule matched and unmatched invocations are denied", "✗".red());
            }
        }
        std::process::exit(EXIT_BLOCK);
    }
    match evaluation {
        Evaluation::Allow(rule) => {
            info!("Allowed {} '{}' by rule '{}'", tool, arguments, rule.source);
        }
        _ => {
            info!("No rule matched {} '{}', allowing", tool, arguments);
        }
    }

    let context = ToolInvocationContext::new(tool, arguments, session, invocation);
    let outcome = HookDispatcher::new(registry).fire(HookEvent::PreToolUse, &context);

    match &outcome {
        DispatchOutcome::Blocked { invocation, reason } => {
            eprintln!("{} Blocked by hook '{}': {}", "✗".red(), invocation, reason);
        }
        DispatchOutcome::PartiallyFailed { failures, .. } => {
            for failure in failures {
                eprintln!("{} Hook '{}' failed: {}", "⚠".yellow(), failure.invocation, failure.message);
            }
        }
        DispatchOutcome::Completed { .. } => {}
    }

    std::process::exit(outcome.exit_code());
}
