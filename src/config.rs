//! Settings loading and validation
//!
//! Settings are read exactly once at process start. A malformed file is
//! fatal: the process never runs with a partially-loaded rule set or hook
//! registry.

use eyre::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::permission::UnmatchedDisposition;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Main gatehouse settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub permissions: PermissionsSection,
    pub hooks: HooksSection,
    /// Default timeout for hook commands, in seconds.
    pub timeout: u64,
    pub log_level: LogLevel,
}

/// Allow and deny pattern lists, plus the disposition for invocations no
/// rule matches.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct PermissionsSection {
    pub allow: Vec<String>,
    pub deny: Vec<String>,
    pub unmatched: UnmatchedDisposition,
}

/// Hook bindings keyed by event name, in declared order.
///
/// Keys are validated against the fixed event set when the registry is
/// built; an unknown key aborts startup.
pub type HooksSection = IndexMap<String, Vec<BindingConfig>>;

/// One matcher with its ordered command list.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BindingConfig {
    /// Pattern tested against the tool invocation; empty means every tool.
    #[serde(default)]
    pub matcher: String,

    pub hooks: Vec<HookCommandConfig>,
}

/// A handler entry within a binding.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum HookCommandConfig {
    Command {
        /// Command line passed verbatim to the shell.
        command: String,

        /// Per-command timeout in seconds, overriding the global default.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timeout: Option<u64>,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
    Off,
}

impl LogLevel {
    pub fn as_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Trace => log::LevelFilter::Trace,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Off => log::LevelFilter::Off,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            permissions: PermissionsSection::default(),
            hooks: HooksSection::default(),
            timeout: DEFAULT_TIMEOUT_SECS,
            log_level: LogLevel::default(),
        }
    }
}

impl Settings {
    /// Load settings, either from an explicit path or via the discovery
    /// chain. Once a file is selected, any read or parse failure is fatal.
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path)
                .with_context(|| format!("Failed to load settings from {}", path.display()));
        }

        match Self::discover() {
            Some(path) => Self::load_from_file(&path)
                .with_context(|| format!("Failed to load settings from {}", path.display())),
            None => {
                log::info!("No settings file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Walk the discovery chain and return the first settings file that
    /// exists: `GATEHOUSE_SETTINGS` env var, then the user config dir, then
    /// a `gatehouse.json` in the working directory.
    pub fn discover() -> Option<PathBuf> {
        if let Ok(env_path) = std::env::var("GATEHOUSE_SETTINGS") {
            let path = Self::expand_path(Path::new(&env_path));
            if path.exists() {
                return Some(path);
            }
            log::warn!("GATEHOUSE_SETTINGS points at a missing file: {}", path.display());
        }

        if let Some(config_dir) = dirs::config_dir() {
            let path = config_dir.join("gatehouse").join("settings.json");
            if path.exists() {
                return Some(path);
            }
        }

        let local = PathBuf::from("gatehouse.json");
        if local.exists() {
            return Some(local);
        }

        None
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read settings file")?;

        let settings: Self = serde_json::from_str(&content).context("Failed to parse settings file")?;

        log::info!("Loaded settings from: {}", path.as_ref().display());
        Ok(settings)
    }

    /// Default hook command timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    /// The gatehouse config directory (where settings.json lives).
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("gatehouse")
    }

    /// Expand a path that may contain ~ or env vars.
    pub fn expand_path(path: &Path) -> PathBuf {
        let path_str = path.to_string_lossy();
        let expanded = shellexpand::full(&path_str).unwrap_or_else(|_| path_str.clone());
        PathBuf::from(expanded.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings() {
        let settings = Settings::default();
        assert!(settings.permissions.allow.is_empty());
        assert!(settings.permissions.deny.is_empty());
        assert_eq!(settings.permissions.unmatched, UnmatchedDisposition::Allow);
        assert!(settings.hooks.is_empty());
        assert_eq!(settings.timeout, 30);
    }

    #[test]
    fn parse_full_settings() {
        let content = r#"
        {
          "permissions": {
            "allow": ["Bash(uv:*)", "Edit"],
            "deny": ["Bash(rm *)"],
            "unmatched": "deny"
          },
          "hooks": {
            "PreToolUse": [
              {
                "matcher": "Bash",
                "hooks": [
                  { "type": "command", "command": "lint-gate", "timeout": 5 }
                ]
              }
            ],
            "PostToolUse": [
              { "hooks": [ { "type": "command", "command": "fmt-pass" } ] }
            ]
          },
          "timeout": 10
        }
        "#;

        let settings: Settings = serde_json::from_str(content).unwrap();
        assert_eq!(settings.permissions.allow.len(), 2);
        assert_eq!(settings.permissions.unmatched, UnmatchedDisposition::Deny);
        assert_eq!(settings.timeout, 10);

        let pre = &settings.hooks["PreToolUse"];
        assert_eq!(pre.len(), 1);
        assert_eq!(pre[0].matcher, "Bash");
        let HookCommandConfig::Command { command, timeout } = &pre[0].hooks[0];
        assert_eq!(command, "lint-gate");
        assert_eq!(*timeout, Some(5));

        let post = &settings.hooks["PostToolUse"];
        assert_eq!(post[0].matcher, "");
    }

    #[test]
    fn unknown_hook_entry_type_is_rejected() {
        let content = r#"
        {
          "hooks": {
            "Stop": [
              { "hooks": [ { "type": "webhook", "command": "x" } ] }
            ]
          }
        }
        "#;
        assert!(serde_json::from_str::<Settings>(content).is_err());
    }

    #[test]
    fn hooks_preserve_declaration_order() {
        let content = r#"
        {
          "hooks": {
            "Stop": [
              { "hooks": [ { "type": "command", "command": "first" } ] },
              { "hooks": [ { "type": "command", "command": "second" } ] },
              { "hooks": [ { "type": "command", "command": "third" } ] }
            ]
          }
        }
        "#;
        let settings: Settings = serde_json::from_str(content).unwrap();
        let commands: Vec<_> = settings.hooks["Stop"]
            .iter()
            .flat_map(|binding| &binding.hooks)
            .map(|entry| {
                let HookCommandConfig::Command { command, .. } = entry;
                command.as_str()
            })
            .collect();
        assert_eq!(commands, ["first", "second", "third"]);
    }

    #[test]
    fn expand_path_with_tilde() {
        let path = PathBuf::from("~/settings.json");
        let expanded = Settings::expand_path(&path);
        assert!(!expanded.to_string_lossy().contains('~'));
        assert!(expanded.to_string_lossy().contains("settings.json"));
    }
}
