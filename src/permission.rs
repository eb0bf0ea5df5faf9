//! Permission rule evaluation
//!
//! Decides whether a requested tool invocation is allowed before any hook
//! fires. Rules are loaded once at startup and never change afterwards, so
//! the policy is safe to share across concurrent evaluations.

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::PermissionsSection;
use crate::pattern::Pattern;

/// A single allow or deny rule, keeping its configured text for display.
#[derive(Debug, Clone)]
pub struct PermissionRule {
    pub source: String,
    pattern: Pattern,
}

impl PermissionRule {
    fn parse(source: &str) -> Result<Self> {
        let pattern = Pattern::parse(source)?;
        Ok(Self {
            source: source.to_string(),
            pattern,
        })
    }
}

/// Outcome of evaluating the rule lists for one invocation.
///
/// `Unspecified` means no rule matched; the caller decides what that means
/// via [`UnmatchedDisposition`], which is policy, not evaluation.
#[derive(Debug, Clone, Copy)]
pub enum Evaluation<'a> {
    Allow(&'a PermissionRule),
    Deny(&'a PermissionRule),
    Unspecified,
}

impl Evaluation<'_> {
    /// Resolve the evaluation into a go/no-go decision using the configured
    /// disposition for unmatched invocations.
    pub fn permitted(&self, unmatched: UnmatchedDisposition) -> bool {
        match self {
            Evaluation::Allow(_) => true,
            Evaluation::Deny(_) => false,
            Evaluation::Unspecified => unmatched == UnmatchedDisposition::Allow,
        }
    }
}

/// What to do when neither an allow nor a deny rule matches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UnmatchedDisposition {
    #[default]
    Allow,
    Deny,
}

/// Ordered allow and deny rule lists, parsed and validated at load time.
#[derive(Debug, Clone)]
pub struct PermissionPolicy {
    deny: Vec<PermissionRule>,
    allow: Vec<PermissionRule>,
}

impl PermissionPolicy {
    /// Build the policy from settings, failing on any malformed pattern.
    pub fn from_settings(permissions: &PermissionsSection) -> Result<Self> {
        let deny = permissions
            .deny
            .iter()
            .map(|source| {
                PermissionRule::parse(source)
                    .with_context(|| format!("Invalid deny rule '{}'", source))
            })
            .collect::<Result<Vec<_>>>()?;

        let allow = permissions
            .allow
            .iter()
            .map(|source| {
                PermissionRule::parse(source)
                    .with_context(|| format!("Invalid allow rule '{}'", source))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { deny, allow })
    }

    /// Evaluate one invocation against the rule lists.
    ///
    /// Deny rules are consulted first, in declared order; the first match in
    /// either tier wins. Pure: no logging, no side effects.
    pub fn evaluate(&self, tool_name: &str, arguments: &str) -> Evaluation<'_> {
        for rule in &self.deny {
            if rule.pattern.matches(tool_name, arguments) {
                return Evaluation::Deny(rule);
            }
        }

        for rule in &self.allow {
            if rule.pattern.matches(tool_name, arguments) {
                return Evaluation::Allow(rule);
            }
        }

        Evaluation::Unspecified
    }

    pub fn deny_rules(&self) -> &[PermissionRule] {
        &self.deny
    }

    pub fn allow_rules(&self) -> &[PermissionRule] {
        &self.allow
    }
}
