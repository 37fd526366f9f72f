// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The metrics store.
//!
//! A process-wide map from host name to [`HostMetrics`], restored from ZFS
//! properties at startup and written back on every job transition. Records
//! stay in the map for the lifetime of the process even when a host
//! disappears from the configuration.

use crate::zfs::Zfs;
use crate::zprops;
use crate::JobError;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use zackup_core::{Clock, HostMetrics, JobStatus};

pub struct State<C: Clock> {
    clock: C,
    zfs: Arc<Zfs>,
    results: RwLock<HashMap<String, HostMetrics>>,
}

impl<C: Clock> State<C> {
    pub fn new(clock: C, zfs: Arc<Zfs>) -> Self {
        Self { clock, zfs, results: RwLock::new(HashMap::new()) }
    }

    /// Restore metrics for every configured host from dataset properties.
    /// Hosts without a dataset start primed; only a broken storage CLI is
    /// an error.
    pub async fn load(&self, hosts: &[String]) -> Result<(), JobError> {
        for host in hosts {
            let rows = self.zfs.get_properties(host, zprops::ALL_PROPS).await?;

            let mut results = self.results.write();
            let metrics =
                results.entry(host.clone()).or_insert_with(|| HostMetrics::new(host.clone()));
            for (property, value) in rows.into_iter().flatten() {
                zprops::decode_into(metrics, &property, &value);
            }
        }
        Ok(())
    }

    /// Stamp the start of a job and persist it.
    pub async fn start(&self, host: &str) {
        let now = self.clock.now();
        self.update(host, |m| {
            m.started_at = Some(now);
        });

        if let Err(error) = self.zfs.set_properties(host, &zprops::encode_start(now)).await {
            tracing::error!(host, %error, "failed to store start state");
        }
    }

    /// Stamp a successful job end, including the run duration.
    pub async fn success(&self, host: &str) {
        self.finish(host, true).await;
    }

    /// Stamp a failed job end, including the run duration.
    pub async fn failure(&self, host: &str) {
        self.finish(host, false).await;
    }

    async fn finish(&self, host: &str, succeeded: bool) {
        let now = self.clock.now();
        let mut duration = Duration::ZERO;

        self.update(host, |m| {
            duration = m
                .started_at
                .and_then(|started| (now - started).to_std().ok())
                .map(truncate_millis)
                .unwrap_or_default();
            if succeeded {
                m.succeeded_at = Some(now);
                m.success_duration = Some(duration);
            } else {
                m.failed_at = Some(now);
                m.failure_duration = Some(duration);
            }
        });

        let pairs = zprops::encode_result(succeeded, now, duration);
        if let Err(error) = self.zfs.set_properties(host, &pairs).await {
            tracing::error!(host, %error, "failed to store result state");
        }
    }

    /// Record the next planned run for a host.
    pub fn reschedule(&self, host: &str, at: DateTime<Utc>) {
        self.update(host, |m| {
            m.scheduled_at = Some(at);
        });
    }

    /// Current status for a host; unknown hosts read as primed-less `None`.
    pub fn get(&self, host: &str) -> Option<HostMetrics> {
        self.results.read().get(host).cloned()
    }

    pub fn status(&self, host: &str) -> Option<JobStatus> {
        self.results.read().get(host).map(HostMetrics::status)
    }

    /// A deep-copied, host-sorted view of all records.
    pub fn export(&self) -> Vec<HostMetrics> {
        let mut all: Vec<HostMetrics> = self.results.read().values().cloned().collect();
        all.sort_by(|a, b| a.host.cmp(&b.host));
        all
    }

    fn update(&self, host: &str, apply: impl FnOnce(&mut HostMetrics)) {
        let mut results = self.results.write();
        let metrics =
            results.entry(host.to_string()).or_insert_with(|| HostMetrics::new(host.to_string()));
        apply(metrics);
    }

    #[cfg(test)]
    pub(crate) fn insert(&self, metrics: HostMetrics) {
        self.results.write().insert(metrics.host.clone(), metrics);
    }
}

fn truncate_millis(duration: Duration) -> Duration {
    Duration::from_millis(duration.as_millis() as u64)
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
