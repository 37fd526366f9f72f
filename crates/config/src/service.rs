// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Service-level configuration: parallelism, storage names, tool paths and
//! the daemon schedule.

use chrono::{DateTime, NaiveTime, TimeZone, Timelike, Utc};
use rand::Rng;
use serde::de::{self, Deserializer};
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Application-level config options, decoded from `<root>/config.yml`.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Worker pool size. Zero falls back to the pool minimum of one.
    #[serde(default)]
    pub parallel: u8,

    /// ZFS dataset under which per-host datasets are created.
    #[serde(default = "default_root_dataset")]
    pub root_dataset: String,

    /// Directory under which per-host datasets are mounted for rsync.
    /// A working directory (`<mount_base>/.zackup`) holds the SSH control
    /// sockets.
    #[serde(default = "default_mount_base")]
    pub mount_base: PathBuf,

    #[serde(default)]
    pub log_level: String,

    #[serde(default = "default_rsync_bin")]
    pub rsync_bin: PathBuf,

    #[serde(default = "default_ssh_bin")]
    pub ssh_bin: PathBuf,

    #[serde(default)]
    pub daemon: DaemonConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            parallel: 0,
            root_dataset: default_root_dataset(),
            mount_base: default_mount_base(),
            log_level: String::new(),
            rsync_bin: default_rsync_bin(),
            ssh_bin: default_ssh_bin(),
            daemon: DaemonConfig::default(),
        }
    }
}

fn default_root_dataset() -> String {
    "zroot".to_string()
}

fn default_mount_base() -> PathBuf {
    PathBuf::from("/zpool/zackup")
}

fn default_rsync_bin() -> PathBuf {
    PathBuf::from("rsync")
}

fn default_ssh_bin() -> PathBuf {
    PathBuf::from("ssh")
}

/// Daemon scheduling options.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DaemonConfig {
    #[serde(default)]
    pub schedule: Schedule,

    /// Random perturbation applied around the scheduled time of day, parsed
    /// from a suffixed duration string (`30s`, `5m`, ...).
    #[serde(default, deserialize_with = "deserialize_duration")]
    pub jitter: Duration,
}

impl ServiceConfig {
    /// Compute the next daemon run after `reference`, with jitter applied.
    ///
    /// The result is not stable for a fixed reference: a uniformly random
    /// offset in `[-jitter/2, +jitter/2)` (truncated to 100ms) is applied.
    /// The reference is first advanced by `jitter/2` so the result can never
    /// fall into `[reference, reference + jitter/2)`.
    pub fn next_schedule(&self, reference: DateTime<Utc>) -> DateTime<Utc> {
        self.next_schedule_with(reference, &mut rand::thread_rng())
    }

    /// Deterministic variant of [`next_schedule`](Self::next_schedule) for a
    /// caller-supplied random source.
    pub fn next_schedule_with<R: Rng>(
        &self,
        reference: DateTime<Utc>,
        rng: &mut R,
    ) -> DateTime<Utc> {
        let jitter_ns = self.daemon.jitter.as_nanos().min(i64::MAX as u128) as i64;

        let mut reference = reference;
        if jitter_ns > 0 {
            reference += chrono::Duration::nanoseconds(jitter_ns / 2);
        }

        let mut next = self.daemon.schedule.next(reference);

        if jitter_ns > 0 {
            let offset = rng.gen_range(0..jitter_ns) - jitter_ns / 2;
            let offset = offset - offset % 100_000_000; // 100ms granularity
            next += chrono::Duration::nanoseconds(offset);
        }

        next
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("invalid format, expected HH:MM:SS")]
    InvalidScheduleFormat,

    #[error("out of range, must be between 00:00:00 and 23:59:59")]
    ScheduleOutOfRange,
}

/// A time-of-day at which the daemon starts a backup cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Schedule {
    hour: u32,
    minute: u32,
    second: u32,
}

impl Schedule {
    /// The next instant strictly after `t` whose clock reads this schedule.
    pub fn next(&self, t: DateTime<Utc>) -> DateTime<Utc> {
        let mut date = t.date_naive();
        if (t.hour(), t.minute(), t.second()) >= (self.hour, self.minute, self.second) {
            date = date.succ_opt().unwrap_or(date);
        }

        let time =
            NaiveTime::from_hms_opt(self.hour, self.minute, self.second).unwrap_or_default();
        Utc.from_utc_datetime(&date.and_time(time))
    }
}

impl FromStr for Schedule {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = s.splitn(4, ':').collect();
        if fields.len() != 3 {
            return Err(ScheduleError::InvalidScheduleFormat);
        }

        let mut values = [0u32; 3];
        for (pos, field) in fields.iter().enumerate() {
            let value: i64 =
                field.trim().parse().map_err(|_| ScheduleError::InvalidScheduleFormat)?;
            let max = if pos == 0 { 23 } else { 59 };
            if value < 0 || value > max {
                return Err(ScheduleError::ScheduleOutOfRange);
            }
            values[pos] = value as u32;
        }

        Ok(Schedule { hour: values[0], minute: values[1], second: values[2] })
    }
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.hour, self.minute, self.second)
    }
}

impl<'de> Deserialize<'de> for Schedule {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

fn deserialize_duration<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse_duration(&raw).map_err(de::Error::custom)
}

/// Parse a duration string with an optional unit suffix.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    // Find the numeric prefix
    let (num_str, suffix) = s
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| (&s[..i], &s[i..]))
        .unwrap_or((s, ""));

    let num: u64 = num_str.parse().map_err(|_| format!("invalid number in duration: {}", s))?;

    let multiplier = match suffix.trim() {
        "ms" | "millis" | "millisecond" | "milliseconds" => {
            return Ok(Duration::from_millis(num));
        }
        "" | "s" | "sec" | "secs" | "second" | "seconds" => 1,
        "m" | "min" | "mins" | "minute" | "minutes" => 60,
        "h" | "hr" | "hrs" | "hour" | "hours" => 3600,
        "d" | "day" | "days" => 86400,
        other => return Err(format!("unknown duration suffix: {}", other)),
    };

    Ok(Duration::from_secs(num * multiplier))
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
