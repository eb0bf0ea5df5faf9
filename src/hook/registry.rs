//! Hook binding registry
//!
//! Built once from settings, then read-only. Lookups need no locking because
//! nothing mutates after construction.

use eyre::{Context, Result, bail};
use std::collections::HashMap;
use std::time::Duration;

use crate::config::{HookCommandConfig, Settings};
use crate::hook::HookEvent;
use crate::pattern::Pattern;

/// An external command bound through a [`HookBinding`].
#[derive(Debug, Clone)]
pub struct HookCommand {
    /// Command line passed verbatim to the shell.
    pub invocation: String,
    /// Per-command timeout, falling back to the registry default.
    pub timeout: Option<Duration>,
}

/// A matcher with its ordered command list, for one event type.
#[derive(Debug, Clone)]
pub struct HookBinding {
    pub matcher: Pattern,
    pub matcher_source: String,
    pub commands: Vec<HookCommand>,
}

/// All hook bindings, keyed by event, in declared order.
#[derive(Debug, Clone)]
pub struct HookRegistry {
    bindings: HashMap<HookEvent, Vec<HookBinding>>,
    default_timeout: Duration,
}

impl HookRegistry {
    /// Build the registry from settings, failing on unknown event keys or
    /// malformed matchers.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let mut bindings: HashMap<HookEvent, Vec<HookBinding>> = HashMap::new();

        for (event_key, configs) in &settings.hooks {
            let Some(event) = HookEvent::from_str(event_key) else {
                bail!("Unknown hook event '{}'", event_key);
            };

            let entries = bindings.entry(event).or_default();
            for config in configs {
                let matcher = Pattern::parse(&config.matcher).with_context(|| {
                    format!("Invalid matcher '{}' for event {}", config.matcher, event)
                })?;

                let commands = config
                    .hooks
                    .iter()
                    .map(|entry| {
                        let HookCommandConfig::Command { command, timeout } = entry;
                        HookCommand {
                            invocation: command.clone(),
                            timeout: timeout.map(Duration::from_secs),
                        }
                    })
                    .collect();

                entries.push(HookBinding {
                    matcher,
                    matcher_source: config.matcher.clone(),
                    commands,
                });
            }
        }

        Ok(Self {
            bindings,
            default_timeout: settings.timeout(),
        })
    }

    /// Bindings for one event, in declared configuration order.
    pub fn bindings_for(&self, event: HookEvent) -> &[HookBinding] {
        self.bindings.get(&event).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Effective timeout for one command.
    pub fn timeout_for(&self, command: &HookCommand) -> Duration {
        command.timeout.unwrap_or(self.default_timeout)
    }

    /// Events that have at least one binding, in the fixed event order.
    pub fn events(&self) -> impl Iterator<Item = (HookEvent, &[HookBinding])> {
        HookEvent::ALL
            .into_iter()
            .filter_map(|event| self.bindings.get(&event).map(|b| (event, b.as_slice())))
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.values().all(Vec::is_empty)
    }
}
