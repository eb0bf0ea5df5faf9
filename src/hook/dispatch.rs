//! Hook event dispatching
//!
//! Drives every matching binding's commands in declared order, one at a
//! time. The pre-execution gate is fail-closed; post and session events are
//! fail-open. Those are the dispatcher's only promises — what the handlers
//! do with the event is theirs.

use log::{debug, error, info, warn};

use crate::hook::registry::HookRegistry;
use crate::hook::{EXIT_ALLOW, EXIT_BLOCK, HookEvent, ToolInvocationContext, runner};

/// How one dispatch call ended.
#[derive(Debug)]
pub enum DispatchOutcome {
    /// Every matching command ran and exited zero.
    Completed { executed: usize },
    /// A fail-closed event was denied; the guarded operation must not run.
    Blocked { invocation: String, reason: String },
    /// Some commands failed, but later commands still ran.
    PartiallyFailed {
        executed: usize,
        failures: Vec<CommandFailure>,
    },
}

/// One failed command within a fail-open dispatch.
#[derive(Debug)]
pub struct CommandFailure {
    pub invocation: String,
    /// None when the command could not be spawned at all.
    pub exit_code: Option<i32>,
    pub message: String,
}

impl DispatchOutcome {
    pub fn blocked(&self) -> bool {
        matches!(self, DispatchOutcome::Blocked { .. })
    }

    /// Exit code to hand back to the host runtime.
    pub fn exit_code(&self) -> i32 {
        if self.blocked() { EXIT_BLOCK } else { EXIT_ALLOW }
    }
}

/// Fires lifecycle events against an immutable registry.
///
/// Holds no per-dispatch state, so one dispatcher may serve concurrent
/// invocations; each `fire` call is internally sequential.
pub struct HookDispatcher<'a> {
    registry: &'a HookRegistry,
}

impl<'a> HookDispatcher<'a> {
    pub fn new(registry: &'a HookRegistry) -> Self {
        Self { registry }
    }

    /// Fire one event for one invocation.
    ///
    /// Commands run strictly in declared order because later hooks may
    /// depend on the side effects of earlier ones. All per-command errors
    /// are folded into the outcome; this never fails across the dispatch
    /// boundary.
    pub fn fire(&self, event: HookEvent, context: &ToolInvocationContext) -> DispatchOutcome {
        let payload = context.payload(event);
        let mut executed = 0;
        let mut failures = Vec::new();

        for binding in self.registry.bindings_for(event) {
            if !binding.matcher.matches(&context.tool_name, &context.arguments) {
                debug!(
                    "Skipping binding '{}' for {}: no match on {}",
                    binding.matcher_source, event, context.tool_name
                );
                continue;
            }

            for command in &binding.commands {
                let timeout = self.registry.timeout_for(command);
                debug!("Running {} hook: {}", event, command.invocation);

                let result = match runner::run(&command.invocation, event, &payload, timeout) {
                    Ok(result) => result,
                    Err(e) => {
                        if event.fail_closed() {
                            error!("Hook '{}' could not be started: {}", command.invocation, e);
                            return DispatchOutcome::Blocked {
                                invocation: command.invocation.clone(),
                                reason: format!("hook could not be started: {e}"),
                            };
                        }
                        error!("Hook '{}' could not be started: {}", command.invocation, e);
                        failures.push(CommandFailure {
                            invocation: command.invocation.clone(),
                            exit_code: None,
                            message: e.to_string(),
                        });
                        continue;
                    }
                };

                executed += 1;
                debug!(
                    "Hook '{}' exited with status {} after {}ms",
                    command.invocation,
                    result.exit_code,
                    result.duration.as_millis()
                );

                if result.timed_out() {
                    if event.fail_closed() {
                        return DispatchOutcome::Blocked {
                            invocation: command.invocation.clone(),
                            reason: format!("hook timed out after {}ms", timeout.as_millis()),
                        };
                    }
                    warn!("Hook '{}' timed out, continuing", command.invocation);
                    failures.push(CommandFailure {
                        invocation: command.invocation.clone(),
                        exit_code: Some(result.exit_code),
                        message: format!("timed out after {}ms", timeout.as_millis()),
                    });
                    continue;
                }

                if result.exit_code == EXIT_BLOCK && event.fail_closed() {
                    let stderr = result.stderr_text();
                    let reason = if stderr.is_empty() {
                        format!("blocked by hook '{}'", command.invocation)
                    } else {
                        stderr
                    };
                    info!("Hook '{}' blocked the invocation: {}", command.invocation, reason);
                    return DispatchOutcome::Blocked {
                        invocation: command.invocation.clone(),
                        reason,
                    };
                }

                if !result.success() {
                    warn!(
                        "Hook '{}' exited with status {}",
                        command.invocation, result.exit_code
                    );
                    failures.push(CommandFailure {
                        invocation: command.invocation.clone(),
                        exit_code: Some(result.exit_code),
                        message: result.stderr_text(),
                    });
                }
            }
        }

        if failures.is_empty() {
            debug!("{} dispatch completed, {} command(s) run", event, executed);
            DispatchOutcome::Completed { executed }
        } else {
            DispatchOutcome::PartiallyFailed { executed, failures }
        }
    }
}
