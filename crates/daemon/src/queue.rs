// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The worker pool.
//!
//! Jobs flow through a small bounded backlog into a resizable set of
//! workers. Enqueueing blocks while the backlog is full (backpressure, not
//! rejection). Downsizing retires workers via per-worker quit sentinels
//! that are only observed between items, so an in-flight job is never
//! interrupted and accepted backlog is never dropped.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, Notify};
use zackup_config::JobConfig;

/// Upper bound for [`Queue::resize`].
pub const MAX_PARALLEL: usize = 255;

/// Jobs waiting for a free worker.
const BACKLOG: usize = 16;

/// Executes one job per call. Implemented by the job [`Runner`](crate::Runner);
/// tests substitute recording fakes.
#[async_trait]
pub trait JobHandler: Send + Sync + 'static {
    async fn run(&self, host: String, job: JobConfig);
}

struct QueueItem {
    host: String,
    job: JobConfig,
}

/// Quit sentinel per worker. Dropping the sender closes the channel, which
/// the worker observes at its next item boundary.
struct WorkerHandle {
    _quit: oneshot::Sender<()>,
}

pub struct Queue {
    handler: Arc<dyn JobHandler>,
    jobs_tx: mpsc::Sender<QueueItem>,
    jobs_rx: Arc<tokio::sync::Mutex<mpsc::Receiver<QueueItem>>>,
    workers: Mutex<Vec<WorkerHandle>>,
    outstanding: Arc<AtomicUsize>,
    drained: Arc<Notify>,
}

impl Queue {
    /// Construct a queue with a single worker. Call [`resize`](Self::resize)
    /// to grow it.
    pub fn new(handler: Arc<dyn JobHandler>) -> Self {
        let (jobs_tx, jobs_rx) = mpsc::channel(BACKLOG);
        let queue = Self {
            handler,
            jobs_tx,
            jobs_rx: Arc::new(tokio::sync::Mutex::new(jobs_rx)),
            workers: Mutex::new(Vec::new()),
            outstanding: Arc::new(AtomicUsize::new(0)),
            drained: Arc::new(Notify::new()),
        };
        queue.resize(1);
        queue
    }

    /// Add a job. Blocks while the backlog is full, until a worker makes
    /// room.
    pub async fn enqueue(&self, host: String, job: JobConfig) {
        self.outstanding.fetch_add(1, Ordering::AcqRel);
        if self.jobs_tx.send(QueueItem { host, job }).await.is_err() {
            // only reachable when all receivers are gone, i.e. at teardown
            self.outstanding.fetch_sub(1, Ordering::AcqRel);
        }
    }

    /// Wait until every enqueued job has completed.
    pub async fn wait(&self) {
        loop {
            // register with the notifier before reading the counter, so a
            // completion between the check and the await is not lost
            let mut drained = std::pin::pin!(self.drained.notified());
            drained.as_mut().enable();

            if self.outstanding.load(Ordering::Acquire) == 0 {
                return;
            }
            drained.await;
        }
    }

    /// Change the worker count to `clamp(size, 1, MAX_PARALLEL)`.
    ///
    /// Growing spawns fresh workers. Shrinking closes the quit sentinels of
    /// the first surplus workers and drops their registry slots; each
    /// finishes its current item first, and the backlog is preserved.
    pub fn resize(&self, size: usize) {
        let size = size.clamp(1, MAX_PARALLEL);
        let mut workers = self.workers.lock();

        let current = workers.len();
        if size > current {
            for _ in current..size {
                workers.push(self.spawn_worker());
            }
        } else if size < current {
            // drain moves the surplus handles out of the backing storage, so
            // no quit sentinel stays reachable from the registry
            workers.drain(0..current - size);
        }
    }

    /// Current number of registered workers.
    pub fn workers(&self) -> usize {
        self.workers.lock().len()
    }

    fn spawn_worker(&self) -> WorkerHandle {
        let (quit_tx, mut quit_rx) = oneshot::channel::<()>();
        let handler = self.handler.clone();
        let jobs_rx = self.jobs_rx.clone();
        let outstanding = self.outstanding.clone();
        let drained = self.drained.clone();

        tokio::spawn(async move {
            loop {
                let item = tokio::select! {
                    _ = &mut quit_rx => break,
                    item = recv(&jobs_rx) => match item {
                        Some(item) => item,
                        None => break,
                    },
                };

                handler.run(item.host, item.job).await;

                if outstanding.fetch_sub(1, Ordering::AcqRel) == 1 {
                    drained.notify_waiters();
                }
            }
        });

        WorkerHandle { _quit: quit_tx }
    }
}

async fn recv(jobs_rx: &tokio::sync::Mutex<mpsc::Receiver<QueueItem>>) -> Option<QueueItem> {
    jobs_rx.lock().await.recv().await
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
