// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Retention planning: fit a host's existing snapshots against its policy.
//!
//! Nothing is destroyed here: the delete set is computed and reported,
//! actual removal stays with the operator.

use crate::zfs::Zfs;
use thiserror::Error;
use zackup_config::JobConfig;
use zackup_core::{Clock, RetentionPolicy, Snapshot};

#[derive(Debug, Error)]
pub enum PruneError {
    #[error("no retention policy defined")]
    NoPolicy,
}

/// The keep/delete partition for one host.
#[derive(Debug, Clone)]
pub struct PrunePlan {
    pub host: String,
    pub keep: Vec<Snapshot>,
    pub delete: Vec<Snapshot>,
}

/// Partition the host's snapshots per its retention policy, anchored at
/// the clock's current time.
pub async fn plan<C: Clock>(zfs: &Zfs, clock: &C, job: &JobConfig) -> Result<PrunePlan, PruneError> {
    let retention = job.retention.as_ref().filter(|r| !r.is_empty()).ok_or(PruneError::NoPolicy)?;

    let snapshots = zfs.list_snapshots(&job.host).await;
    let policy = RetentionPolicy::new(clock.now(), retention);
    let (keep, delete) = policy.apply(&snapshots);

    Ok(PrunePlan { host: job.host.clone(), keep, delete })
}

#[cfg(test)]
#[path = "prune_tests.rs"]
mod tests;
