// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Adapter for the `zfs` CLI. Datasets, snapshots and properties are only
//! ever touched through argv vectors handed to the process runner.

use crate::error::JobError;
use crate::process::ProcessRunner;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use zackup_core::Snapshot;

pub struct Zfs {
    runner: Arc<dyn ProcessRunner>,
    zfs_bin: PathBuf,
    root_dataset: String,
    mount_base: PathBuf,
}

impl Zfs {
    pub fn new(runner: Arc<dyn ProcessRunner>, root_dataset: &str, mount_base: &Path) -> Self {
        Self {
            runner,
            zfs_bin: PathBuf::from("zfs"),
            root_dataset: root_dataset.to_string(),
            mount_base: mount_base.to_path_buf(),
        }
    }

    /// Name of the per-host dataset, e.g. `backups/example.org`.
    pub fn dataset(&self, host: &str) -> String {
        format!("{}/{}", self.root_dataset, host)
    }

    /// Rsync destination directory for a host.
    pub fn mount_path(&self, host: &str) -> PathBuf {
        self.mount_base.join(host)
    }

    /// SSH control socket path pattern. `%h`/`%C` are expanded by ssh, so
    /// every host gets its own socket.
    pub fn control_path(&self) -> PathBuf {
        self.mount_base.join(".zackup_%h_%C")
    }

    /// `zfs create -p <root>/<host>`
    pub async fn create(&self, host: &str) -> Result<(), JobError> {
        self.zfs(&["create".to_string(), "-p".to_string(), self.dataset(host)], "create").await?;
        Ok(())
    }

    /// `zfs snapshot <root>/<host>@<RFC3339-UTC>`
    pub async fn snapshot(&self, host: &str, at: DateTime<Utc>) -> Result<(), JobError> {
        let name = Snapshot::name_for(&self.dataset(host), at);
        self.zfs(&["snapshot".to_string(), name], "snapshot").await?;
        Ok(())
    }

    /// List a host's snapshots, most recent first. Unparsable names are
    /// skipped; a failing `zfs list` yields an empty list.
    pub async fn list_snapshots(&self, host: &str) -> Vec<Snapshot> {
        let args = vec![
            "list".to_string(),
            "-r".to_string(),
            "-H".to_string(),
            "-o".to_string(),
            "name".to_string(),
            "-t".to_string(),
            "snapshot".to_string(),
            self.dataset(host),
        ];

        let output = match self.zfs(&args, "list").await {
            Ok(output) => output,
            Err(error) => {
                tracing::error!(host, %error, "listing snapshots failed");
                return Vec::new();
            }
        };

        let mut snapshots = Vec::new();
        for line in output.lines().map(str::trim).filter(|l| !l.is_empty()) {
            match Snapshot::parse(line) {
                Some(snap) => snapshots.push(snap),
                None => {
                    tracing::error!(snapshot = line, "unable to parse timestamp from snapshot")
                }
            }
        }

        // zfs list _should_ be in chronological order, but just in case ...
        snapshots.sort_by(|a, b| b.time.cmp(&a.time));
        snapshots
    }

    /// Read the given properties for a host's dataset. Returns `None` when
    /// the dataset does not exist (a fresh host is not an error). Each row
    /// is a `(property, value)` pair; unknown values (`-`) are skipped.
    pub async fn get_properties(
        &self,
        host: &str,
        props: &[&str],
    ) -> Result<Option<Vec<(String, String)>>, JobError> {
        let args = vec![
            "get".to_string(),
            "-H".to_string(),
            "-p".to_string(),
            "-t".to_string(),
            "filesystem".to_string(),
            "-s".to_string(),
            "local,none".to_string(),
            "-o".to_string(),
            "name,property,value".to_string(),
            props.join(","),
            self.dataset(host),
        ];

        let output = self
            .runner
            .run(&self.zfs_bin, &args, None)
            .await
            .map_err(|e| JobError::storage("get", e.to_string()))?;
        if !output.success() {
            tracing::debug!(host, message = output.message(), "no stored state for dataset");
            return Ok(None);
        }

        let dataset = self.dataset(host);
        let mut rows = Vec::new();
        for line in output.stdout.lines() {
            let mut cols = line.split('\t');
            let (Some(name), Some(property), Some(value)) =
                (cols.next(), cols.next(), cols.next())
            else {
                continue;
            };
            if name != dataset || value == "-" {
                continue;
            }
            rows.push((property.to_string(), value.to_string()));
        }
        Ok(Some(rows))
    }

    /// `zfs set <prop>=<val> ... <root>/<host>`
    pub async fn set_properties(&self, host: &str, pairs: &[String]) -> Result<(), JobError> {
        let mut args = vec!["set".to_string()];
        args.extend(pairs.iter().cloned());
        args.push(self.dataset(host));
        self.zfs(&args, "set").await?;
        Ok(())
    }

    async fn zfs(&self, args: &[String], action: &'static str) -> Result<String, JobError> {
        let output = self
            .runner
            .run(&self.zfs_bin, args, None)
            .await
            .map_err(|e| JobError::storage(action, e.to_string()))?;

        if !output.success() {
            tracing::error!(action, args = ?args, message = output.message(), "zfs failed");
            return Err(JobError::storage(action, output.message().to_string()));
        }
        tracing::debug!(action, args = ?args, "zfs succeeded");
        Ok(output.stdout)
    }
}

#[cfg(test)]
#[path = "zfs_tests.rs"]
mod tests;
