// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! SSH control master handling.
//!
//! One master per job multiplexes the pre/post script sessions and the
//! rsync transport through a socket under the mount base. The master is
//! started without a remote command and torn down once all dependent steps
//! have finished.

use crate::error::JobError;
use crate::process::{ChildHandle, ProcessRunner};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use zackup_config::JobConfig;

const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

pub struct SshMaster {
    runner: Arc<dyn ProcessRunner>,
    ssh_bin: PathBuf,
    control_path: PathBuf,

    host: String,
    user: String,
    port: u16,
    timeout: Option<Duration>,
    identity: Option<PathBuf>,

    tunnel: Option<Box<dyn ChildHandle>>,
}

impl SshMaster {
    pub fn new(
        runner: Arc<dyn ProcessRunner>,
        ssh_bin: &Path,
        control_path: PathBuf,
        job: &JobConfig,
    ) -> Self {
        Self {
            runner,
            ssh_bin: ssh_bin.to_path_buf(),
            control_path,
            host: job.host.clone(),
            user: job.ssh_user().to_string(),
            port: job.ssh_port(),
            timeout: job.ssh_timeout(),
            identity: job.ssh_identity().cloned(),
            tunnel: None,
        }
    }

    /// Start the control master. The process is started but not awaited;
    /// subsequent sessions block on the socket becoming available.
    pub async fn connect(&mut self) -> Result<(), JobError> {
        if self.tunnel.is_some() {
            return Err(JobError::SshConnect("already established".to_string()));
        }

        let args = self.master_args();
        tracing::info!(host = %self.host, ?args, "starting ssh control master");

        let tunnel = self
            .runner
            .spawn(&self.ssh_bin, &args)
            .await
            .map_err(|e| JobError::SshConnect(e.to_string()))?;
        self.tunnel = Some(tunnel);
        Ok(())
    }

    /// Run a script through the master: the lines are piped into
    /// `/bin/sh -esx` on the remote side.
    pub async fn execute(&self, script: &[String]) -> Result<(), JobError> {
        let mut stdin = script.join("\n");
        stdin.push('\n');

        let args = self.exec_args();
        let output = self
            .runner
            .run(&self.ssh_bin, &args, Some(stdin))
            .await
            .map_err(|e| JobError::SshExec(e.to_string()))?;

        if !output.success() {
            tracing::error!(host = %self.host, message = output.message(), "script failed");
            return Err(JobError::SshExec(output.message().to_string()));
        }
        Ok(())
    }

    /// Tear the master down: SIGTERM, then kill after a short grace period.
    /// Exit noise from our own termination is not reported.
    pub async fn close(&mut self) {
        let Some(tunnel) = self.tunnel.take() else { return };

        if let Err(error) = tunnel.shutdown(SHUTDOWN_GRACE).await {
            tracing::warn!(host = %self.host, %error, "unexpected ssh master termination");
        }
    }

    /// The `-e` command line rsync uses to tunnel through this master.
    pub fn transport_command(&self) -> String {
        let mut cmd = format!(
            "{} -S {} -p {} -x -oStrictHostKeyChecking=yes",
            self.ssh_bin.display(),
            self.control_path.display(),
            self.port,
        );
        if let Some(timeout) = self.timeout {
            cmd.push_str(&format!(" -oConnectTimeout={}", timeout.as_secs()));
        }
        cmd
    }

    fn master_args(&self) -> Vec<String> {
        let mut args = vec![
            "-S".to_string(),
            self.control_path.display().to_string(),
            "-o".to_string(),
            "ControlMaster=yes".to_string(),
            "-o".to_string(),
            "StrictHostKeyChecking=yes".to_string(),
        ];
        if let Some(timeout) = self.timeout {
            args.push("-o".to_string());
            args.push(format!("ConnectTimeout={}", timeout.as_secs()));
        }
        if let Some(identity) = &self.identity {
            args.push("-i".to_string());
            args.push(identity.display().to_string());
        }
        args.extend([
            "-n".to_string(), // disable stdin
            "-N".to_string(), // do not execute a remote command
            "-T".to_string(), // disable TTY allocation
            "-x".to_string(), // disable X11 forwarding
            "-p".to_string(),
            self.port.to_string(),
            "-l".to_string(),
            self.user.clone(),
            self.host.clone(),
        ]);
        args
    }

    fn exec_args(&self) -> Vec<String> {
        let mut args = vec![
            "-S".to_string(),
            self.control_path.display().to_string(),
            "-o".to_string(),
            "StrictHostKeyChecking=yes".to_string(),
        ];
        if let Some(timeout) = self.timeout {
            args.push("-o".to_string());
            args.push(format!("ConnectTimeout={}", timeout.as_secs()));
        }
        args.extend([
            "-p".to_string(),
            self.port.to_string(),
            "-x".to_string(),
            "-l".to_string(),
            self.user.clone(),
            self.host.clone(),
            "/bin/sh".to_string(),
            "-esx".to_string(),
        ]);
        args
    }
}

#[cfg(test)]
#[path = "ssh_tests.rs"]
mod tests;
