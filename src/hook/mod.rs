//! Lifecycle hook handling
//!
//! Hooks are external commands bound to lifecycle events of the host agent
//! runtime. This module owns the event set, the invocation context handed to
//! handlers, and the machinery that dispatches events to bound commands.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod dispatch;
pub mod registry;
pub mod runner;

/// Exit codes shared with external handlers.
/// These match the host runtime's expectations.
pub const EXIT_ALLOW: i32 = 0;
pub const EXIT_BLOCK: i32 = 2;

/// Lifecycle event types. The set is closed and fixed at process start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub enum HookEvent {
    PreToolUse,
    PostToolUse,
    Notification,
    Stop,
    SubagentStop,
}

impl HookEvent {
    pub const ALL: [HookEvent; 5] = [
        Self::PreToolUse,
        Self::PostToolUse,
        Self::Notification,
        Self::Stop,
        Self::SubagentStop,
    ];

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().replace(['-', '_'], "").as_str() {
            "pretooluse" => Some(Self::PreToolUse),
            "posttooluse" => Some(Self::PostToolUse),
            "notification" => Some(Self::Notification),
            "stop" => Some(Self::Stop),
            "subagentstop" => Some(Self::SubagentStop),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PreToolUse => "PreToolUse",
            Self::PostToolUse => "PostToolUse",
            Self::Notification => "Notification",
            Self::Stop => "Stop",
            Self::SubagentStop => "SubagentStop",
        }
    }

    /// Whether a handler failure must block the guarded operation.
    ///
    /// Only the pre-execution gate is fail-closed; everything after the tool
    /// has run (and all session events) is best-effort.
    pub fn fail_closed(&self) -> bool {
        matches!(self, Self::PreToolUse)
    }
}

impl fmt::Display for HookEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Context for one tool invocation.
///
/// Created fresh per request, read-only once constructed, and discarded
/// after the invocation's lifecycle events complete. Never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct ToolInvocationContext {
    pub tool_name: String,
    pub arguments: String,
    pub session_id: String,
    pub invocation_id: String,
}

impl ToolInvocationContext {
    pub fn new(tool_name: String, arguments: String, session_id: String, invocation_id: String) -> Self {
        Self {
            tool_name,
            arguments,
            session_id,
            invocation_id,
        }
    }

    /// Build the JSON payload handlers receive on stdin.
    pub fn payload(&self, event: HookEvent) -> serde_json::Value {
        serde_json::json!({
            "event": event.as_str(),
            "timestamp": Utc::now().to_rfc3339(),
            "tool_name": self.tool_name,
            "tool_input": self.arguments,
            "session_id": self.session_id,
            "invocation_id": self.invocation_id,
        })
    }

    /// Extract a context from an incoming event payload, tolerating both
    /// snake_case and camelCase field names.
    pub fn from_payload(payload: &serde_json::Value) -> Self {
        let field = |snake: &str, camel: &str| {
            payload
                .get(snake)
                .or_else(|| payload.get(camel))
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string()
        };

        let arguments = payload
            .get("tool_input")
            .or_else(|| payload.get("toolInput"))
            .map(|v| match v.as_str() {
                Some(s) => s.to_string(),
                None => v.to_string(),
            })
            .unwrap_or_default();

        Self {
            tool_name: field("tool_name", "toolName"),
            arguments,
            session_id: field("session_id", "sessionId"),
            invocation_id: field("invocation_id", "invocationId"),
        }
    }
}
