// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Recording fakes shared between the daemon test modules.

use crate::process::{ChildHandle, Output, ProcessRunner};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// One recorded child-process invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub stdin: Option<String>,
}

impl Invocation {
    pub fn command_line(&self) -> String {
        let mut line = self.program.display().to_string();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

/// A [`ProcessRunner`] that records every invocation and replays canned
/// outputs instead of spawning children.
#[derive(Default)]
pub struct FakeRunner {
    invocations: Mutex<Vec<Invocation>>,
    scripted: Mutex<VecDeque<std::io::Result<Output>>>,
    spawned: Arc<AtomicUsize>,
    shutdowns: Arc<AtomicUsize>,
    fail_spawn: Mutex<bool>,
}

impl FakeRunner {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue the output for the next `run` call. Unscripted calls succeed
    /// with empty output.
    pub fn push_output(&self, output: Output) {
        self.scripted.lock().push_back(Ok(output));
    }

    pub fn push_success(&self, stdout: &str) {
        self.push_output(Output { stdout: stdout.to_string(), stderr: String::new(), code: Some(0) });
    }

    pub fn push_failure(&self, stderr: &str) {
        self.push_output(Output { stdout: String::new(), stderr: stderr.to_string(), code: Some(1) });
    }

    pub fn push_io_error(&self, message: &str) {
        self.scripted
            .lock()
            .push_back(Err(std::io::Error::new(std::io::ErrorKind::NotFound, message.to_string())));
    }

    pub fn fail_next_spawn(&self) {
        *self.fail_spawn.lock() = true;
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations.lock().clone()
    }

    pub fn command_lines(&self) -> Vec<String> {
        self.invocations().iter().map(Invocation::command_line).collect()
    }

    pub fn spawned(&self) -> usize {
        self.spawned.load(Ordering::Acquire)
    }

    pub fn shutdowns(&self) -> usize {
        self.shutdowns.load(Ordering::Acquire)
    }
}

#[async_trait]
impl ProcessRunner for FakeRunner {
    async fn run(
        &self,
        program: &Path,
        args: &[String],
        stdin: Option<String>,
    ) -> std::io::Result<Output> {
        self.invocations.lock().push(Invocation {
            program: program.to_path_buf(),
            args: args.to_vec(),
            stdin,
        });
        self.scripted.lock().pop_front().unwrap_or_else(|| Ok(Output { code: Some(0), ..Output::default() }))
    }

    async fn spawn(
        &self,
        program: &Path,
        args: &[String],
    ) -> std::io::Result<Box<dyn ChildHandle>> {
        self.invocations.lock().push(Invocation {
            program: program.to_path_buf(),
            args: args.to_vec(),
            stdin: None,
        });
        if std::mem::take(&mut *self.fail_spawn.lock()) {
            return Err(std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "spawn failed"));
        }
        self.spawned.fetch_add(1, Ordering::AcqRel);
        Ok(Box::new(FakeChild { shutdowns: self.shutdowns.clone() }))
    }
}

struct FakeChild {
    shutdowns: Arc<AtomicUsize>,
}

#[async_trait]
impl ChildHandle for FakeChild {
    async fn shutdown(self: Box<Self>, _grace: Duration) -> std::io::Result<()> {
        self.shutdowns.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }
}
