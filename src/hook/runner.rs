//! External hook command execution
//!
//! Runs one handler command as a child of the shell, feeding the event
//! payload on stdin and collecting both output streams before returning.
//! The call blocks the dispatching thread; ordering guarantees live in the
//! dispatcher, not here.

use eyre::{Context, Result};
use log::warn;
use std::io::{Read, Write};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use crate::hook::HookEvent;

/// Exit status reported when a command is killed for exceeding its timeout.
/// Mirrors the shell `timeout(1)` convention.
pub const EXIT_TIMEOUT: i32 = 124;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// What one handler command did.
#[derive(Debug)]
pub struct ExecutionResult {
    pub exit_code: i32,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub duration: Duration,
}

impl ExecutionResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    pub fn timed_out(&self) -> bool {
        self.exit_code == EXIT_TIMEOUT
    }

    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).trim().to_string()
    }
}

/// Run a handler command, blocking until it exits or the timeout expires.
///
/// A non-zero exit is not an error: it is encoded in the result and
/// interpreted by the dispatcher. The only error here is failing to start
/// the child at all. On timeout the child is killed and reaped, and the
/// result carries [`EXIT_TIMEOUT`].
pub fn run(
    invocation: &str,
    event: HookEvent,
    payload: &serde_json::Value,
    timeout: Duration,
) -> Result<ExecutionResult> {
    let payload_json = serde_json::to_string(payload).context("Failed to serialize hook payload")?;

    let started = Instant::now();
    let mut child = Command::new("sh")
        .arg("-c")
        .arg(invocation)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .env("GATEHOUSE_EVENT", event.as_str())
        .spawn()
        .with_context(|| format!("Failed to spawn hook command '{}'", invocation))?;

    // Feed stdin off-thread; a handler may exit without reading it, and a
    // handler that never reads must not stall the timeout loop below.
    let stdin_pipe = child.stdin.take();
    let payload_bytes = payload_json.into_bytes();
    let command_name = invocation.to_string();
    let stdin_writer = std::thread::spawn(move || {
        if let Some(mut stdin) = stdin_pipe {
            if let Err(e) = stdin.write_all(&payload_bytes) {
                warn!("Failed to write payload to hook '{}': {}", command_name, e);
            }
        }
    });

    // Drain both pipes off-thread so a chatty handler cannot deadlock
    // against a full pipe buffer while we wait for it to exit.
    let stdout_pipe = child.stdout.take();
    let stdout_reader = std::thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = stdout_pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        buf
    });
    let stderr_pipe = child.stderr.take();
    let stderr_reader = std::thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = stderr_pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        buf
    });

    let exit_code = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status.code().unwrap_or(1),
            Ok(None) => {
                if started.elapsed() >= timeout {
                    warn!(
                        "Hook command '{}' exceeded timeout of {}ms, killing",
                        invocation,
                        timeout.as_millis()
                    );
                    let _ = child.kill();
                    let _ = child.wait();
                    break EXIT_TIMEOUT;
                }
                std::thread::sleep(POLL_INTERVAL);
            }
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(e).with_context(|| format!("Failed to wait for hook command '{}'", invocation));
            }
        }
    };

    let _ = stdin_writer.join();
    let stdout = stdout_reader.join().unwrap_or_default();
    let stderr = stderr_reader.join().unwrap_or_default();

    Ok(ExecutionResult {
        exit_code,
        stdout,
        stderr,
        duration: started.elapsed(),
    })
}
