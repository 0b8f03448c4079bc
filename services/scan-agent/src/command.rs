//! Child process execution with a hard wall-clock timeout.
//!
//! `TokioCommandRunner` is the production implementation. Handlers hold
//! the trait object so tests can substitute a recording stub and never
//! spawn anything.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;

/// Outcome of one external command. Every failure mode is encoded here;
/// nothing escapes the runner as an `Err` or a panic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    pub stdout: String,
    pub stderr: String,
    /// Process exit code. `-1` when the command timed out, failed to
    /// launch, or died on a signal; `stderr` then carries the reason.
    pub exit_code: i32,
}

impl CommandResult {
    fn internal(reason: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: reason.into(),
            exit_code: -1,
        }
    }

    /// True when the command exited 0.
    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Seam between the HTTP layer and the host, sized for one method.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `program` with `args`, capturing output, bounded by `timeout`.
    async fn run(&self, program: &str, args: &[String], timeout: Duration) -> CommandResult;
}

/// Production runner on `tokio::process`. The child is spawned with
/// `kill_on_drop` and killed explicitly when the timeout fires, so no
/// process outlives its budget.
pub struct TokioCommandRunner;

#[async_trait]
impl CommandRunner for TokioCommandRunner {
    async fn run(&self, program: &str, args: &[String], timeout: Duration) -> CommandResult {
        let mut child = match Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
        {
            Ok(child) => child,
            Err(err) => return CommandResult::internal(err.to_string()),
        };

        // Drain both pipes while waiting, a child that fills one would
        // otherwise deadlock against a plain `wait`.
        let mut stdout_pipe = child.stdout.take();
        let mut stderr_pipe = child.stderr.take();

        tokio::select! {
            (status, stdout, stderr) = async {
                tokio::join!(
                    child.wait(),
                    read_to_end(&mut stdout_pipe),
                    read_to_end(&mut stderr_pipe),
                )
            } => {
                let exit_code = match status {
                    Ok(status) => status.code().unwrap_or(-1),
                    Err(err) => return CommandResult::internal(err.to_string()),
                };
                CommandResult {
                    stdout: String::from_utf8_lossy(&stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&stderr).into_owned(),
                    exit_code,
                }
            }
            () = tokio::time::sleep(timeout) => {
                let _ = child.kill().await;
                CommandResult::internal("Timeout")
            }
        }
    }
}

async fn read_to_end(pipe: &mut Option<impl AsyncRead + Unpin>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(reader) = pipe {
        let _ = reader.read_to_end(&mut buf).await;
    }
    buf
}
