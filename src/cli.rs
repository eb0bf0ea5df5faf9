use clap::{Parser, Subcommand, ValueEnum};
use std::io::IsTerminal;
use std::path::PathBuf;

/// Output format for commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// JSON format
    Json,
    /// YAML format
    Yaml,
}

impl OutputFormat {
    /// Resolve the effective output format.
    /// If user specified a format, use it.
    /// Otherwise: TTY → Text, non-TTY (pipe) → Json
    pub fn resolve(user_choice: Option<OutputFormat>) -> OutputFormat {
        match user_choice {
            Some(fmt) => fmt,
            None => {
                if std::io::stdout().is_terminal() {
                    OutputFormat::Text
                } else {
                    OutputFormat::Json
                }
            }
        }
    }
}

#[derive(Parser)]
#[command(
    name = "gatehouse",
    about = "Tool permission gate and hook dispatcher for AI coding agents",
    version = env!("GIT_DESCRIBE"),
    after_help = "Logs are written to: ~/.local/share/gatehouse/logs/gatehouse.log"
)]
pub struct Cli {
    /// Path to settings file
    #[arg(short, long, global = true, help = "Path to settings.json")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Gate a tool invocation: permission rules, then PreToolUse hooks
    Gate {
        /// Tool family being invoked (e.g. Bash, Edit)
        #[arg(long)]
        tool: String,

        /// The tool's argument string
        #[arg(long, default_value = "")]
        arguments: String,

        /// Session identifier supplied by the host runtime
        #[arg(long, default_value = "")]
        session: String,

        /// Invocation identifier supplied by the host runtime
        #[arg(long, default_value = "")]
        invocation: String,
    },

    /// Evaluate permission rules without firing any hooks
    Check {
        /// Tool family being invoked
        #[arg(long)]
        tool: String,

        /// The tool's argument string
        #[arg(long, default_value = "")]
        arguments: String,
    },

    /// Dispatch and inspect lifecycle hooks
    Hook {
        #[command(subcommand)]
        action: HookAction,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Diagnose setup issues
    Doctor,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand)]
pub enum HookAction {
    /// Fire a lifecycle event against the configured bindings
    Dispatch {
        /// Event type (pre-tool-use, post-tool-use, notification, stop, subagent-stop)
        event: String,

        /// Event payload JSON (reads from stdin if not provided)
        #[arg(long)]
        payload: Option<String>,
    },

    /// List registered hook bindings
    List {
        /// Filter by event type
        #[arg(long)]
        event: Option<String>,

        /// Output format (default: text for TTY, json for pipes)
        #[arg(long, short = 'o', value_enum)]
        format: Option<OutputFormat>,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show {
        /// Output format (default: text for TTY, json for pipes)
        #[arg(long, short = 'o', value_enum)]
        format: Option<OutputFormat>,
    },

    /// Validate permission rules and hook bindings
    Validate,
}
