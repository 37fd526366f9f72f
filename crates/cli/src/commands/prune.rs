// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Retention planning: report which snapshots fall out of policy.
//! Destructive removal is intentionally not implemented.

use zackup_daemon::{prune, App, PruneError};

pub async fn prune(app: &App, hosts: Vec<String>) -> anyhow::Result<()> {
    let hosts = if hosts.is_empty() { app.tree.hosts() } else { hosts };

    for host in hosts {
        let Some(job) = app.tree.host(&host) else {
            tracing::warn!(host, "unknown host, ignoring");
            continue;
        };

        match prune::plan(&app.zfs, &app.clock, &job).await {
            Ok(plan) => {
                println!(
                    "{}: keeping {} snapshots, {} out of policy",
                    plan.host,
                    plan.keep.len(),
                    plan.delete.len(),
                );
                for snapshot in &plan.delete {
                    println!("  would delete {}", snapshot.name);
                }
            }
            Err(PruneError::NoPolicy) => {
                tracing::warn!(host, "no retention policy defined, skipping");
            }
        }
    }
    Ok(())
}
