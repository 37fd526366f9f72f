// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-host backup metrics and status derivation.
//!
//! A [`HostMetrics`] record exists for every configured host. It is restored
//! from ZFS user properties at startup and updated by the job runner; the
//! scheduler, exporter and HTTP surface only ever see copies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Backup state of a single host, derived from its three timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Record exists but no job has ever started.
    Primed,
    Running,
    Success,
    Failed,
    Unknown,
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobStatus::Primed => "primed",
            JobStatus::Running => "running",
            JobStatus::Success => "success",
            JobStatus::Failed => "failed",
            JobStatus::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Snapshot of the current metrics for a host.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HostMetrics {
    pub host: String,

    pub started_at: Option<DateTime<Utc>>,
    pub succeeded_at: Option<DateTime<Utc>>,
    pub success_duration: Option<Duration>,
    pub failed_at: Option<DateTime<Utc>>,
    pub failure_duration: Option<Duration>,
    pub scheduled_at: Option<DateTime<Utc>>,

    pub space_used_by_snapshots: u64,
    pub space_used_by_dataset: u64,
    pub space_used_by_children: u64,
    pub space_used_by_ref_reservation: u64,
    pub compression_factor: f64,
}

impl HostMetrics {
    pub fn new(host: impl Into<String>) -> Self {
        Self { host: host.into(), ..Self::default() }
    }

    /// Total space attributed to this host's dataset.
    pub fn space_used_total(&self) -> u64 {
        self.space_used_by_snapshots
            + self.space_used_by_dataset
            + self.space_used_by_children
            + self.space_used_by_ref_reservation
    }

    /// Derive the host status from the start/success/failure timestamps.
    ///
    /// The ordering rules make the function total: overlapping timestamps
    /// (e.g. all three equal) fall through to `Unknown`.
    pub fn status(&self) -> JobStatus {
        let t0 = match self.started_at {
            None => return JobStatus::Primed,
            Some(t) => t,
        };
        let t_ok = self.succeeded_at;
        let t_err = self.failed_at;

        if t_ok.map_or(true, |t| t0 > t) && t_err.map_or(true, |t| t0 > t) {
            return JobStatus::Running;
        }
        if let Some(ok) = t_ok {
            if ok >= t0 && t_err.map_or(true, |err| ok > err) {
                return JobStatus::Success;
            }
        }
        if let Some(err) = t_err {
            if err >= t0 && t_ok.map_or(true, |ok| err > ok) {
                return JobStatus::Failed;
            }
        }
        JobStatus::Unknown
    }
}

#[cfg(test)]
#[path = "metrics_tests.rs"]
mod tests;
