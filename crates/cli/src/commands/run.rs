// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One-shot backup runs.

use zackup_daemon::App;

/// Enqueue the given hosts (or all configured ones) and wait for the jobs
/// to finish. Individual host failures are visible via `status` and the
/// exporter, not the exit code.
pub async fn run(app: &App, hosts: Vec<String>, parallel: Option<usize>) -> anyhow::Result<()> {
    if let Some(parallel) = parallel {
        app.queue.resize(parallel);
    }

    let hosts = if hosts.is_empty() { app.tree.hosts() } else { hosts };

    for host in hosts {
        let Some(job) = app.tree.host(&host) else {
            tracing::warn!(host, "unknown host, ignoring");
            continue;
        };
        app.queue.enqueue(host, job).await;
    }

    app.queue.wait().await;
    Ok(())
}
