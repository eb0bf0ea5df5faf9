//! Evaluate permission rules for one invocation
//!
//! Prints the decision and the rule that produced it, without firing hooks.

use colored::*;
use eyre::Result;

use crate::config::Settings;
use crate::hook::EXIT_BLOCK;
use crate::permission::{Evaluation, PermissionPolicy, UnmatchedDisposition};

pub fn run(tool: String, arguments: String, settings: &Settings, policy: &PermissionPolicy) -> Result<()> {
    let unmatched = settings.permissions.unmatched;

    match policy.evaluate(&tool, &arguments) {
        Evaluation::Allow(rule) => {
            println!("{} allowed by rule '{}'", "✓".green(), rule.source.cyan());
        }
        Evaluation::Deny(rule) => {
            println!("{} denied by rule '{}'", "✗".red(), rule.source.cyan());
            std::process::exit(EXIT_BLOCK);
        }
        Evaluation::Unspecified => {
            let disposition = match unmatched {
                UnmatchedDisposition::Allow => "allow".green(),
                UnmatchedDisposition::Deny => "deny".red(),
            };
            println!("{} no rule matched (unmatched disposition: {})", "⚠".yellow(), disposition);
            if unmatched == UnmatchedDisposition::Deny {
                std::process::exit(EXIT_BLOCK);
            }
        }
    }

    Ok(())
}
