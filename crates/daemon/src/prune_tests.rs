// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_support::FakeRunner;
use std::path::Path;
use std::sync::Arc;
use zackup_core::{FakeClock, RetentionConfig};

fn job_with_retention(retention: Option<RetentionConfig>) -> JobConfig {
    JobConfig { host: "alpha".to_string(), retention, ..JobConfig::default() }
}

#[tokio::test]
async fn missing_policy_is_an_error() {
    let runner = FakeRunner::new();
    let zfs = Zfs::new(runner, "backups", Path::new("/zpool/zackup"));
    let clock = FakeClock::new();

    let err = plan(&zfs, &clock, &job_with_retention(None)).await.unwrap_err();
    assert!(matches!(err, PruneError::NoPolicy));

    let empty = Some(RetentionConfig::default());
    let err = plan(&zfs, &clock, &job_with_retention(empty)).await.unwrap_err();
    assert!(matches!(err, PruneError::NoPolicy));
}

#[tokio::test]
async fn partitions_listed_snapshots() {
    let runner = FakeRunner::new();
    let clock = FakeClock::new();
    let now = clock.now();

    // one snapshot inside the daily bucket, one old one
    let fresh = now + chrono::Duration::hours(1);
    let stale = now - chrono::Duration::days(30);
    runner.push_success(&format!(
        "backups/alpha@{}\nbackups/alpha@{}\n",
        fresh.format("%Y-%m-%dT%H:%M:%SZ"),
        stale.format("%Y-%m-%dT%H:%M:%SZ"),
    ));

    let zfs = Zfs::new(runner, "backups", Path::new("/zpool/zackup"));
    let retention = RetentionConfig { daily: Some(1), ..RetentionConfig::default() };
    let plan = plan(&zfs, &clock, &job_with_retention(Some(retention))).await.unwrap();

    assert_eq!(plan.host, "alpha");
    assert_eq!(plan.keep.len() + plan.delete.len(), 2);
    assert!(plan.keep.iter().any(|s| s.time == fresh));
}

#[tokio::test]
async fn empty_snapshot_list_yields_empty_plan() {
    let runner = FakeRunner::new();
    runner.push_failure("dataset does not exist");
    let zfs = Zfs::new(runner, "backups", Path::new("/zpool/zackup"));
    let clock = FakeClock::new();

    let retention = RetentionConfig { daily: Some(1), ..RetentionConfig::default() };
    let plan = plan(&zfs, &clock, &job_with_retention(Some(retention))).await.unwrap();
    assert!(plan.keep.is_empty());
    assert!(plan.delete.is_empty());
}
