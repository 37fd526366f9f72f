// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-host status table.

use chrono::{DateTime, SecondsFormat, Utc};
use std::time::Duration;
use zackup_core::JobStatus;
use zackup_daemon::App;

pub fn status(app: &App, hosts: &[String]) -> anyhow::Result<()> {
    let exported = app.state.export();
    let selected: Vec<_> = exported
        .iter()
        .filter(|m| hosts.is_empty() || hosts.contains(&m.host))
        .collect();

    let longest = selected.iter().map(|m| m.host.len()).max().unwrap_or(0);
    let indent = " ".repeat(longest);

    for metrics in selected {
        let status = metrics.status();
        println!("{:<longest$}  status       {}", metrics.host, status);

        if matches!(status, JobStatus::Unknown | JobStatus::Running) {
            println!("{indent}  started      {}", fmt_time(metrics.started_at));
        }
        if matches!(status, JobStatus::Unknown | JobStatus::Success) {
            println!(
                "{indent}  succeeded at {} (took {})",
                fmt_time(metrics.succeeded_at),
                fmt_duration(metrics.success_duration),
            );
        }
        if matches!(status, JobStatus::Unknown | JobStatus::Failed) {
            println!(
                "{indent}  failed at    {} (took {})",
                fmt_time(metrics.failed_at),
                fmt_duration(metrics.failure_duration),
            );
        }
    }
    Ok(())
}

fn fmt_time(t: Option<DateTime<Utc>>) -> String {
    match t {
        None => "-".to_string(),
        Some(t) => t.to_rfc3339_opts(SecondsFormat::Secs, true),
    }
}

fn fmt_duration(duration: Option<Duration>) -> String {
    let Some(duration) = duration.filter(|d| !d.is_zero()) else {
        return "-".to_string();
    };

    let total = duration.as_secs();
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);
    match (hours, minutes) {
        (0, 0) => format!("{seconds}s"),
        (0, _) => format!("{minutes}m{seconds}s"),
        _ => format!("{hours}h{minutes}m{seconds}s"),
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
