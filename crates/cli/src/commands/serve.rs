// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon mode: scheduler plus HTTP surface, with graceful shutdown on
//! SIGINT/SIGTERM.

use anyhow::Context;
use std::sync::Arc;
use tokio::signal::unix::{signal, SignalKind};
use zackup_daemon::{server, App};

pub async fn serve(app: App, listen: &str) -> anyhow::Result<()> {
    let mut scheduler = app.scheduler();
    scheduler.start();

    let registry = Arc::new(app.registry());
    let router = server::router(app.metrics_source(), registry);

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    let server_task = {
        let listen = listen.to_string();
        tokio::spawn(async move {
            server::serve(&listen, router, async {
                let _ = shutdown_rx.await;
            })
            .await
        })
    };

    shutdown_signal().await.context("cannot install signal handlers")?;
    tracing::info!("shutdown signal received");

    // scheduler first (no new jobs), then the http surface, then drain
    scheduler.stop().await;
    let _ = shutdown_tx.send(());
    server_task.await.context("http server task panicked")??;

    tracing::info!("waiting for running jobs to finish");
    app.queue.wait().await;

    tracing::info!("daemon stopped");
    Ok(())
}

/// Completes on the first SIGINT or SIGTERM.
async fn shutdown_signal() -> std::io::Result<()> {
    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;

    tokio::select! {
        _ = interrupt.recv() => {}
        _ = terminate.recv() => {}
    }
    Ok(())
}
