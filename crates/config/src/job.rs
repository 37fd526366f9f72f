// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-host job configuration and the globals merge.

use crate::rsync::RsyncConfig;
use crate::script::Script;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use zackup_core::RetentionConfig;

/// Config settings for a single backup job.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobConfig {
    /// Host name, injected from the config file location.
    #[serde(skip)]
    pub host: String,

    pub ssh: Option<SshConfig>,
    pub rsync: Option<RsyncConfig>,
    pub retention: Option<RetentionConfig>,

    #[serde(default)]
    pub pre_script: Script,
    #[serde(default)]
    pub post_script: Script,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SshConfig {
    pub user: Option<String>,
    pub port: Option<u16>,
    #[serde(rename = "identity_file")]
    pub identity: Option<PathBuf>,
    /// Connect timeout in seconds.
    pub timeout: Option<u64>,
}

impl JobConfig {
    pub fn ssh_user(&self) -> &str {
        self.ssh.as_ref().and_then(|s| s.user.as_deref()).unwrap_or("root")
    }

    pub fn ssh_port(&self) -> u16 {
        self.ssh.as_ref().and_then(|s| s.port).unwrap_or(22)
    }

    pub fn ssh_timeout(&self) -> Option<Duration> {
        self.ssh.as_ref().and_then(|s| s.timeout).map(Duration::from_secs)
    }

    pub fn ssh_identity(&self) -> Option<&PathBuf> {
        self.ssh.as_ref().and_then(|s| s.identity.as_ref())
    }

    /// Merge global defaults into this host config.
    ///
    /// Scalars inherit when locally unset. The rsync lists concatenate with
    /// the globals first unless the corresponding override flag is set on
    /// the host. Scripts always get the globals' lines prepended.
    pub(crate) fn merge_globals(&mut self, globals: &JobConfig) {
        if let Some(global_ssh) = &globals.ssh {
            match &mut self.ssh {
                None => self.ssh = Some(global_ssh.clone()),
                Some(ssh) => {
                    if ssh.user.is_none() {
                        ssh.user = global_ssh.user.clone();
                    }
                    if ssh.port.is_none() {
                        ssh.port = global_ssh.port;
                    }
                    if ssh.identity.is_none() {
                        ssh.identity = global_ssh.identity.clone();
                    }
                    if ssh.timeout.is_none() {
                        ssh.timeout = global_ssh.timeout;
                    }
                }
            }
        }

        if let Some(global_rsync) = &globals.rsync {
            match &mut self.rsync {
                None => self.rsync = Some(global_rsync.clone()),
                Some(rsync) => {
                    if !rsync.override_global_include {
                        prepend(&mut rsync.included, &global_rsync.included);
                    }
                    if !rsync.override_global_exclude {
                        prepend(&mut rsync.excluded, &global_rsync.excluded);
                    }
                    if !rsync.override_global_args {
                        prepend(&mut rsync.arguments, &global_rsync.arguments);
                    }
                }
            }
        }

        if let Some(global_retention) = &globals.retention {
            match &mut self.retention {
                None => self.retention = Some(global_retention.clone()),
                Some(retention) => {
                    retention.daily = retention.daily.or(global_retention.daily);
                    retention.weekly = retention.weekly.or(global_retention.weekly);
                    retention.monthly = retention.monthly.or(global_retention.monthly);
                    retention.yearly = retention.yearly.or(global_retention.yearly);
                }
            }
        }

        self.pre_script.prepend(&globals.pre_script);
        self.post_script.prepend(&globals.post_script);
    }
}

fn prepend(list: &mut Vec<String>, head: &[String]) {
    if head.is_empty() {
        return;
    }
    let mut merged = head.to_vec();
    merged.append(list);
    *list = merged;
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
