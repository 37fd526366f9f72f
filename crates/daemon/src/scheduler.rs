// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The daemon scheduler.
//!
//! A polling loop: a short first tick, then one walk per minute. Each walk
//! primes hosts without a planned run, skips hosts that are running or not
//! due yet, and enqueues the rest. Stop aborts the walk between hosts but
//! never cancels a job that is already running.

use crate::queue::Queue;
use crate::state::State;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use zackup_config::Tree;
use zackup_core::{Clock, JobStatus};

const FIRST_TICK: Duration = Duration::from_secs(10);
const TICK: Duration = Duration::from_secs(60);

pub struct Scheduler<C: Clock> {
    inner: Arc<SchedulerInner<C>>,
    quit_tx: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

struct SchedulerInner<C: Clock> {
    tree: Arc<Tree>,
    state: Arc<State<C>>,
    queue: Arc<Queue>,
    clock: C,
    stop: AtomicBool,
    /// Serializes walks; `stop` is checked per host inside.
    walk: tokio::sync::Mutex<()>,
}

impl<C: Clock> Scheduler<C> {
    pub fn new(tree: Arc<Tree>, state: Arc<State<C>>, queue: Arc<Queue>, clock: C) -> Self {
        let (quit_tx, _) = watch::channel(false);
        Self {
            inner: Arc::new(SchedulerInner {
                tree,
                state,
                queue,
                clock,
                stop: AtomicBool::new(false),
                walk: tokio::sync::Mutex::new(()),
            }),
            quit_tx,
            task: None,
        }
    }

    /// Start the polling loop.
    pub fn start(&mut self) {
        let inner = self.inner.clone();
        let mut quit_rx = self.quit_tx.subscribe();

        self.task = Some(tokio::spawn(async move {
            let mut delay = FIRST_TICK;
            loop {
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = quit_rx.changed() => break,
                }
                if inner.stop.load(Ordering::Acquire) {
                    break;
                }
                inner.walk_hosts().await;
                delay = TICK;
            }
            tracing::debug!("scheduler loop stopped");
        }));
    }

    /// Stop the loop and wait for it to exit. A walk in progress aborts at
    /// the next host; running jobs are left alone.
    pub async fn stop(&mut self) {
        self.inner.stop.store(true, Ordering::Release);
        let _ = self.quit_tx.send(true);

        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }

    #[cfg(test)]
    pub(crate) async fn walk_once(&self) {
        self.inner.walk_hosts().await;
    }
}

impl<C: Clock> SchedulerInner<C> {
    async fn walk_hosts(&self) {
        let _guard = self.walk.lock().await;

        for host in self.tree.hosts() {
            if self.stop.load(Ordering::Acquire) {
                break;
            }

            let now = self.clock.now();
            let metrics = self.state.get(&host);

            let scheduled_at = metrics.as_ref().and_then(|m| m.scheduled_at);
            let Some(scheduled_at) = scheduled_at else {
                // first sighting: plan the next run, pick the host up on a
                // later tick
                self.reschedule(&host);
                continue;
            };

            let status = metrics.map(|m| m.status()).unwrap_or(JobStatus::Primed);
            if status == JobStatus::Running || scheduled_at > now {
                continue;
            }

            let Some(job) = self.tree.host(&host) else {
                tracing::warn!(host, "configured host vanished, skipping");
                continue;
            };

            tracing::info!(host, "enqueueing scheduled backup");
            // may block while the backlog is full; that is the backpressure
            // contract, not an error
            self.queue.enqueue(host.clone(), job).await;
            self.reschedule(&host);
        }
    }

    fn reschedule(&self, host: &str) {
        let next = self.tree.service().next_schedule(self.clock.now());
        tracing::debug!(host, next = %next, "planned next run");
        self.state.reschedule(host, next);
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
