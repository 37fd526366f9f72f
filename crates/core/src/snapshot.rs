// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Snapshot names and their embedded timestamps.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// A single ZFS snapshot, identified by its fully qualified dataset name
/// (`<root>/<host>@<RFC3339>`) and the timestamp parsed back out of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub name: String,
    pub time: DateTime<Utc>,
}

impl Snapshot {
    /// Parse a snapshot name of the form `pool/host@2018-12-09T12:00:00Z`.
    /// Returns `None` when the name has no `@` part or the timestamp does
    /// not parse as RFC 3339.
    pub fn parse(name: &str) -> Option<Self> {
        let (_, stamp) = name.split_once('@')?;
        let time = DateTime::parse_from_rfc3339(stamp).ok()?.with_timezone(&Utc);
        Some(Self { name: name.to_string(), time })
    }

    /// Format a snapshot name for `dataset` at `time`.
    pub fn name_for(dataset: &str, time: DateTime<Utc>) -> String {
        format!("{}@{}", dataset, time.to_rfc3339_opts(SecondsFormat::Secs, true))
    }
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
