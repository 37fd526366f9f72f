// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process-runner capability.
//!
//! Everything zackup does to the outside world happens through argv vectors
//! handed to child processes. The [`ProcessRunner`] trait is that seam: the
//! production [`SystemRunner`] spawns real children via tokio, while tests
//! substitute a recording fake.

use async_trait::async_trait;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};

/// Captured result of a finished child process.
#[derive(Debug, Clone, Default)]
pub struct Output {
    pub stdout: String,
    pub stderr: String,
    /// Exit code; `None` when the child was terminated by a signal.
    pub code: Option<i32>,
}

impl Output {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Stderr if any, falling back to stdout. For error messages.
    pub fn message(&self) -> &str {
        let err = self.stderr.trim();
        if err.is_empty() {
            self.stdout.trim()
        } else {
            err
        }
    }
}

/// Spawns child processes and yields their streams and exit codes.
#[async_trait]
pub trait ProcessRunner: Send + Sync + 'static {
    /// Run `program` to completion. When `stdin` is given it is written to
    /// the child and the pipe is closed afterwards. Both output streams are
    /// captured (and logged line by line).
    async fn run(
        &self,
        program: &Path,
        args: &[String],
        stdin: Option<String>,
    ) -> std::io::Result<Output>;

    /// Start a long-lived child (the SSH control master). The caller owns
    /// the returned handle and must shut it down.
    async fn spawn(&self, program: &Path, args: &[String])
        -> std::io::Result<Box<dyn ChildHandle>>;
}

/// A running child process started via [`ProcessRunner::spawn`].
#[async_trait]
pub trait ChildHandle: Send + Sync {
    /// Ask the child to terminate, escalating to SIGKILL after `grace`.
    /// Exit errors caused by our own termination are swallowed.
    async fn shutdown(self: Box<Self>, grace: Duration) -> std::io::Result<()>;
}

/// The real thing: tokio child processes.
#[derive(Clone, Default)]
pub struct SystemRunner;

#[async_trait]
impl ProcessRunner for SystemRunner {
    async fn run(
        &self,
        program: &Path,
        args: &[String],
        stdin: Option<String>,
    ) -> std::io::Result<Output> {
        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(if stdin.is_some() { Stdio::piped() } else { Stdio::null() })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = command.spawn()?;

        if let Some(input) = stdin {
            if let Some(mut pipe) = child.stdin.take() {
                pipe.write_all(input.as_bytes()).await?;
                pipe.flush().await?;
                // dropping the pipe closes the child's stdin
            }
        }

        let program_name = program.display().to_string();
        let stdout_pipe = child.stdout.take();
        let stderr_pipe = child.stderr.take();
        let (stdout, stderr, status) = tokio::join!(
            capture(&program_name, "stdout", stdout_pipe),
            capture(&program_name, "stderr", stderr_pipe),
            child.wait(),
        );

        Ok(Output { stdout, stderr, code: status?.code() })
    }

    async fn spawn(
        &self,
        program: &Path,
        args: &[String],
    ) -> std::io::Result<Box<dyn ChildHandle>> {
        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        Ok(Box::new(SystemChild { child }))
    }
}

/// Drain one output stream, logging each line as it arrives.
async fn capture<R>(program: &str, stream: &'static str, pipe: Option<R>) -> String
where
    R: tokio::io::AsyncRead + Unpin,
{
    let Some(pipe) = pipe else { return String::new() };

    let mut buf = String::new();
    let mut lines = BufReader::new(pipe).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                tracing::debug!(program, stream, "{line}");
                buf.push_str(&line);
                buf.push('\n');
            }
            Ok(None) => break,
            Err(error) => {
                tracing::error!(program, stream, %error, "unexpected end of stream");
                break;
            }
        }
    }
    buf
}

struct SystemChild {
    child: Child,
}

#[async_trait]
impl ChildHandle for SystemChild {
    async fn shutdown(mut self: Box<Self>, grace: Duration) -> std::io::Result<()> {
        if let Some(pid) = self.child.id() {
            let _ = kill(Pid::from_raw(pid as i32), Signal::SIGTERM);
        }

        match tokio::time::timeout(grace, self.child.wait()).await {
            Ok(status) => {
                // a non-zero exit here is the child reacting to our SIGTERM
                status?;
            }
            Err(_) => {
                tracing::warn!("child ignored SIGTERM, sending kill");
                self.child.start_kill()?;
                self.child.wait().await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
