// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! ZFS property names and codecs for the persisted metrics.

use chrono::{DateTime, TimeZone, Utc};
use std::time::Duration;
use zackup_core::HostMetrics;

// system properties.
pub const PROP_USED_BY_SNAPSHOTS: &str = "usedbysnapshots";
pub const PROP_USED_BY_DATASET: &str = "usedbydataset";
pub const PROP_USED_BY_CHILDREN: &str = "usedbychildren";
pub const PROP_USED_BY_REF_RESERVATION: &str = "usedbyrefreservation";
pub const PROP_COMPRESS_RATIO: &str = "compressratio";

// user properties (need a namespace).
pub const PROP_NS: &str = "de.digineo.zackup:";
pub const PROP_LAST_START: &str = "de.digineo.zackup:last_start"; // unix timestamp
pub const PROP_SUCCESS_DATE: &str = "de.digineo.zackup:s_date"; // unix timestamp
pub const PROP_SUCCESS_DURATION: &str = "de.digineo.zackup:s_duration"; // milliseconds
pub const PROP_FAILURE_DATE: &str = "de.digineo.zackup:f_date"; // unix timestamp
pub const PROP_FAILURE_DURATION: &str = "de.digineo.zackup:f_duration"; // milliseconds

/// All properties requested on state restore.
pub const ALL_PROPS: &[&str] = &[
    PROP_USED_BY_SNAPSHOTS,
    PROP_USED_BY_DATASET,
    PROP_USED_BY_CHILDREN,
    PROP_USED_BY_REF_RESERVATION,
    PROP_COMPRESS_RATIO,
    PROP_LAST_START,
    PROP_SUCCESS_DATE,
    PROP_SUCCESS_DURATION,
    PROP_FAILURE_DATE,
    PROP_FAILURE_DURATION,
];

/// Apply one `property`/`value` row to a metrics record. Rows with unknown
/// properties or undecodable values are ignored.
pub fn decode_into(metrics: &mut HostMetrics, property: &str, value: &str) {
    match property {
        PROP_USED_BY_SNAPSHOTS => {
            if let Ok(v) = value.parse() {
                metrics.space_used_by_snapshots = v;
            }
        }
        PROP_USED_BY_DATASET => {
            if let Ok(v) = value.parse() {
                metrics.space_used_by_dataset = v;
            }
        }
        PROP_USED_BY_CHILDREN => {
            if let Ok(v) = value.parse() {
                metrics.space_used_by_children = v;
            }
        }
        PROP_USED_BY_REF_RESERVATION => {
            if let Ok(v) = value.parse() {
                metrics.space_used_by_ref_reservation = v;
            }
        }
        PROP_COMPRESS_RATIO => {
            if let Ok(v) = value.trim_end_matches('x').parse() {
                metrics.compression_factor = v;
            }
        }
        PROP_LAST_START => {
            if let Some(t) = unix_time(value) {
                metrics.started_at = Some(t);
            }
        }
        PROP_SUCCESS_DATE => {
            if let Some(t) = unix_time(value) {
                metrics.succeeded_at = Some(t);
            }
        }
        PROP_SUCCESS_DURATION => {
            if let Some(d) = millis(value) {
                metrics.success_duration = Some(d);
            }
        }
        PROP_FAILURE_DATE => {
            if let Some(t) = unix_time(value) {
                metrics.failed_at = Some(t);
            }
        }
        PROP_FAILURE_DURATION => {
            if let Some(d) = millis(value) {
                metrics.failure_duration = Some(d);
            }
        }
        other => {
            tracing::trace!(property = other, value, "ignoring unknown property");
        }
    }
}

/// `zfs set` pairs for a job start.
pub fn encode_start(at: DateTime<Utc>) -> Vec<String> {
    vec![format!("{}={}", PROP_LAST_START, at.timestamp())]
}

/// `zfs set` pairs for a job result.
pub fn encode_result(success: bool, at: DateTime<Utc>, duration: Duration) -> Vec<String> {
    let (date_prop, duration_prop) = if success {
        (PROP_SUCCESS_DATE, PROP_SUCCESS_DURATION)
    } else {
        (PROP_FAILURE_DATE, PROP_FAILURE_DURATION)
    };
    vec![
        format!("{}={}", date_prop, at.timestamp()),
        format!("{}={}", duration_prop, duration.as_millis()),
    ]
}

fn unix_time(value: &str) -> Option<DateTime<Utc>> {
    let secs: i64 = value.parse().ok()?;
    Utc.timestamp_opt(secs, 0).single()
}

fn millis(value: &str) -> Option<Duration> {
    value.parse().ok().map(Duration::from_millis)
}

#[cfg(test)]
#[path = "zprops_tests.rs"]
mod tests;
