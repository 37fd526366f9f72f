// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The per-host job state machine:
//!
//! create dataset → open ssh master → pre-script → rsync → post-script →
//! close master → snapshot.
//!
//! Steps short-circuit on the first failure; the master is closed on every
//! exit path once it has been opened. Entry and exit are bracketed by the
//! metrics store so a job always ends up as exactly one success or failure.

use crate::error::JobError;
use crate::process::ProcessRunner;
use crate::queue::JobHandler;
use crate::ssh::SshMaster;
use crate::state::State;
use crate::zfs::Zfs;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use zackup_config::JobConfig;
use zackup_core::Clock;

pub struct Runner<C: Clock> {
    clock: C,
    process: Arc<dyn ProcessRunner>,
    state: Arc<State<C>>,
    zfs: Arc<Zfs>,
    rsync_bin: PathBuf,
    ssh_bin: PathBuf,
}

impl<C: Clock> Runner<C> {
    pub fn new(
        clock: C,
        process: Arc<dyn ProcessRunner>,
        state: Arc<State<C>>,
        zfs: Arc<Zfs>,
        rsync_bin: PathBuf,
        ssh_bin: PathBuf,
    ) -> Self {
        Self { clock, process, state, zfs, rsync_bin, ssh_bin }
    }

    /// Execute the backup job for one host.
    pub async fn perform_backup(&self, host: &str, job: &JobConfig) {
        self.state.start(host).await;
        let started = Instant::now();

        match self.run_steps(host, job).await {
            Ok(()) => {
                tracing::info!(host, elapsed_ms = started.elapsed().as_millis() as u64, "backup succeeded");
                self.state.success(host).await;
            }
            Err(error) => {
                tracing::error!(
                    host,
                    %error,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "backup failed"
                );
                self.state.failure(host).await;
            }
        }
    }

    async fn run_steps(&self, host: &str, job: &JobConfig) -> Result<(), JobError> {
        self.zfs.create(host).await?;

        let mut master =
            SshMaster::new(self.process.clone(), &self.ssh_bin, self.zfs.control_path(), job);
        master.connect().await?;

        let result = self.run_tunneled_steps(host, job, &master).await;
        master.close().await;
        result?;

        self.zfs.snapshot(host, self.clock.now()).await
    }

    /// The steps that depend on the control master being up.
    async fn run_tunneled_steps(
        &self,
        host: &str,
        job: &JobConfig,
        master: &SshMaster,
    ) -> Result<(), JobError> {
        let pre = job.pre_script.lines();
        if !pre.is_empty() {
            master.execute(&pre).await?;
        }

        self.rsync(host, job, master).await?;

        let post = job.post_script.lines();
        if !post.is_empty() {
            master.execute(&post).await?;
        }
        Ok(())
    }

    async fn rsync(
        &self,
        host: &str,
        job: &JobConfig,
        master: &SshMaster,
    ) -> Result<(), JobError> {
        let rsync = job.rsync.clone().unwrap_or_default();
        let source = format!("{}@{}:", job.ssh_user(), host);
        let destination = self.zfs.mount_path(host).display().to_string();
        let args = rsync.build_arg_vector(&master.transport_command(), &source, &destination);

        tracing::info!(host, ?args, "starting rsync");
        let output = self
            .process
            .run(&self.rsync_bin, &args, None)
            .await
            .map_err(|e| JobError::Sync(e.to_string()))?;

        if !output.success() {
            return Err(JobError::Sync(output.message().to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl<C: Clock> JobHandler for Runner<C> {
    async fn run(&self, host: String, job: JobConfig) {
        self.perform_backup(&host, &job).await;
    }
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
