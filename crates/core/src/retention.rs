// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Retention policy: partition a host's snapshots into keep and delete sets.
//!
//! A policy is an ordered list of time buckets built from the configured
//! daily/weekly/monthly/yearly counts. Within each bucket only the most
//! recent matching snapshot survives; snapshots matching no bucket at all
//! are deleted. A trailing "terminator" bucket with non-positive duration
//! matches everything and stops the walk, which protects snapshots older
//! than the oldest explicit bucket from implicit deletion.

use crate::snapshot::Snapshot;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Bucket interval lengths, in nanoseconds.
const DAILY: i64 = 24 * 3600 * 1_000_000_000;
const WEEKLY: i64 = 7 * DAILY;
const MONTHLY: i64 = 30 * DAILY;
const YEARLY: i64 = 360 * DAILY;

/// How many snapshots to keep per interval length. An absent count means
/// "no explicit buckets for that length"; if everything after the last
/// present count is absent, the policy gains a terminator bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionConfig {
    pub daily: Option<u32>,
    pub weekly: Option<u32>,
    pub monthly: Option<u32>,
    pub yearly: Option<u32>,
}

impl RetentionConfig {
    pub fn is_empty(&self) -> bool {
        self.daily.is_none()
            && self.weekly.is_none()
            && self.monthly.is_none()
            && self.yearly.is_none()
    }
}

/// A time interval `[start, start + duration)` in unix nanoseconds.
/// A non-positive duration means "infinite": the bucket matches every
/// timestamp and terminates policy evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bucket {
    pub start: i64,
    pub duration: i64,
}

impl Bucket {
    pub fn matches(&self, t: DateTime<Utc>) -> bool {
        let ns = t.timestamp_nanos_opt().unwrap_or(i64::MAX);
        self.duration <= 0 || (self.start <= ns && ns < self.start + self.duration)
    }

    fn is_terminator(&self) -> bool {
        self.duration <= 0
    }
}

/// An ordered list of buckets. Construction keeps the buckets grouped by
/// interval length (daily first), starts ascending within each group, with
/// an optional terminator at the end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetentionPolicy {
    buckets: Vec<Bucket>,
}

impl RetentionPolicy {
    /// Build the bucket list anchored at `now`.
    pub fn new(now: DateTime<Utc>, config: &RetentionConfig) -> Self {
        let now_ns = now.timestamp_nanos_opt().unwrap_or(0);
        let mut buckets = Vec::new();
        let mut add_terminator = false;

        let mut append = |duration: i64, count: Option<u32>, rest: &[Option<u32>]| {
            match count {
                None => {
                    if !add_terminator && rest.iter().all(Option::is_none) {
                        add_terminator = true;
                    }
                }
                Some(n) => {
                    for i in 0..i64::from(n) {
                        buckets.push(Bucket { start: now_ns + i * duration, duration });
                    }
                }
            }
        };

        // keep sorted by interval length!
        append(DAILY, config.daily, &[config.weekly, config.monthly, config.yearly]);
        append(WEEKLY, config.weekly, &[config.monthly, config.yearly]);
        append(MONTHLY, config.monthly, &[config.yearly]);
        append(YEARLY, config.yearly, &[]);

        if add_terminator {
            buckets.push(Bucket { start: now_ns, duration: -1 });
        }

        Self { buckets }
    }

    pub fn buckets(&self) -> &[Bucket] {
        &self.buckets
    }

    /// Partition `snapshots` into `(to_keep, to_delete)`.
    ///
    /// For each bucket, the most recent matching snapshot wins and every
    /// other match is marked for deletion. Snapshots matching no bucket are
    /// deleted as well. Input order is preserved in both outputs, and every
    /// input lands in exactly one of them.
    pub fn apply(&self, snapshots: &[Snapshot]) -> (Vec<Snapshot>, Vec<Snapshot>) {
        let mut marked = vec![false; snapshots.len()];
        let mut match_any = vec![false; snapshots.len()];

        for bucket in &self.buckets {
            let mut curr: Option<usize> = None;

            for (i, snap) in snapshots.iter().enumerate() {
                if !bucket.matches(snap.time) {
                    continue;
                }
                match_any[i] = true;

                match curr {
                    None => curr = Some(i),
                    Some(c) if snap.time > snapshots[c].time => {
                        marked[c] = true;
                        curr = Some(i);
                    }
                    Some(_) => marked[i] = true,
                }
            }

            if bucket.is_terminator() {
                break;
            }
        }

        let mut to_keep = Vec::new();
        let mut to_delete = Vec::new();
        for (i, snap) in snapshots.iter().enumerate() {
            if marked[i] || !match_any[i] {
                to_delete.push(snap.clone());
            } else {
                to_keep.push(snap.clone());
            }
        }
        (to_keep, to_delete)
    }
}

#[cfg(test)]
#[path = "retention_tests.rs"]
mod tests;
