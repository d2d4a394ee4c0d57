//! Script hooks backed by an external executable.
//!
//! The program is run as
//! `program <name> <class> <type> [args...] [--key=value...]`; every
//! non-empty stdout line is one response value.

use dnsroute_application::ports::{ScriptCall, ScriptHook, ScriptOutcome};
use serde_json::Value;
use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tracing::debug;

const POLL_INTERVAL: Duration = Duration::from_millis(5);

#[derive(Debug, Clone)]
pub struct CommandScriptHook {
    program: PathBuf,
    timeout: Duration,
}

impl CommandScriptHook {
    pub fn new(program: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    fn command_args(call: &ScriptCall<'_>) -> Vec<String> {
        let mut argv = Vec::with_capacity(3 + call.args.len() + call.kwargs.len());
        argv.push(call.query_name.to_string());
        argv.push(call.query_class.to_string());
        argv.push(call.query_type.to_string());
        argv.extend(call.args.iter().map(argument_text));
        argv.extend(
            call.kwargs
                .iter()
                .map(|(key, value)| format!("--{}={}", key, argument_text(value))),
        );
        argv
    }

    fn wait(&self, child: &mut Child) -> Result<ExitStatus, String> {
        let deadline = Instant::now() + self.timeout;
        loop {
            match child.try_wait() {
                Ok(Some(status)) => return Ok(status),
                Ok(None) if Instant::now() >= deadline => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(format!("timed out after {} ms", self.timeout.as_millis()));
                }
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(e) => return Err(format!("wait failed: {}", e)),
            }
        }
    }
}

impl ScriptHook for CommandScriptHook {
    fn invoke(&self, call: &ScriptCall<'_>) -> ScriptOutcome {
        let mut child = match Command::new(&self.program)
            .args(Self::command_args(call))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                return ScriptOutcome::Failed(format!(
                    "failed to start {}: {}",
                    self.program.display(),
                    e
                ))
            }
        };

        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        let status = match self.wait(&mut child) {
            Ok(status) => status,
            Err(reason) => return ScriptOutcome::Failed(reason),
        };

        let stdout = stdout.and_then(|h| h.join().ok()).unwrap_or_default();
        let stderr = stderr.and_then(|h| h.join().ok()).unwrap_or_default();

        if !status.success() {
            let detail = stderr.lines().next().unwrap_or("").trim();
            return ScriptOutcome::Failed(if detail.is_empty() {
                status.to_string()
            } else {
                format!("{}: {}", status, detail)
            });
        }

        let values: Vec<String> = stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();

        debug!(
            program = %self.program.display(),
            domain = call.query_name,
            values = values.len(),
            "Script produced values"
        );

        ScriptOutcome::Values(values)
    }
}

/// Strings are passed bare; everything else as JSON text.
fn argument_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Pipes are read on their own threads so a chatty child cannot block on a
/// full pipe while we wait for it to exit.
fn drain<R: Read + Send + 'static>(mut pipe: R) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    })
}
