// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::time::Duration;
use tokio::sync::Semaphore;

/// Handler that tracks concurrency and can hold jobs until released.
struct GateHandler {
    gate: Semaphore,
    running: AtomicUsize,
    max_running: AtomicUsize,
    completed: AtomicUsize,
}

impl GateHandler {
    fn open() -> Arc<Self> {
        Arc::new(Self {
            gate: Semaphore::new(Semaphore::MAX_PERMITS),
            running: AtomicUsize::new(0),
            max_running: AtomicUsize::new(0),
            completed: AtomicUsize::new(0),
        })
    }

    fn closed() -> Arc<Self> {
        Arc::new(Self {
            gate: Semaphore::new(0),
            running: AtomicUsize::new(0),
            max_running: AtomicUsize::new(0),
            completed: AtomicUsize::new(0),
        })
    }

    fn release(&self, n: usize) {
        self.gate.add_permits(n);
    }

    fn completed(&self) -> usize {
        self.completed.load(Ordering::Acquire)
    }

    fn max_seen(&self) -> usize {
        self.max_running.load(Ordering::Acquire)
    }
}

#[async_trait]
impl JobHandler for GateHandler {
    async fn run(&self, _host: String, _job: JobConfig) {
        let running = self.running.fetch_add(1, Ordering::AcqRel) + 1;
        self.max_running.fetch_max(running, Ordering::AcqRel);

        let permit = self.gate.acquire().await.expect("gate closed");
        permit.forget();

        self.running.fetch_sub(1, Ordering::AcqRel);
        self.completed.fetch_add(1, Ordering::AcqRel);
    }
}

async fn enqueue_n(queue: &Queue, n: usize) {
    for i in 0..n {
        queue.enqueue(format!("host{i}"), JobConfig::default()).await;
    }
}

async fn settle() {
    // give workers a chance to pick up items
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn starts_with_one_worker() {
    let queue = Queue::new(GateHandler::open());
    assert_eq!(queue.workers(), 1);
}

#[tokio::test]
async fn resize_clamps_to_bounds() {
    let queue = Queue::new(GateHandler::open());

    queue.resize(0);
    assert_eq!(queue.workers(), 1);

    queue.resize(10_000);
    assert_eq!(queue.workers(), MAX_PARALLEL);

    queue.resize(4);
    assert_eq!(queue.workers(), 4);
}

#[tokio::test]
async fn wait_returns_after_all_jobs_complete() {
    let handler = GateHandler::open();
    let queue = Queue::new(handler.clone());

    enqueue_n(&queue, 3).await;
    queue.wait().await;
    assert_eq!(handler.completed(), 3);
}

#[tokio::test]
async fn wait_returns_immediately_when_idle() {
    let queue = Queue::new(GateHandler::open());
    queue.wait().await;
}

#[tokio::test]
async fn single_worker_serializes_jobs() {
    let handler = GateHandler::open();
    let queue = Queue::new(handler.clone());

    enqueue_n(&queue, 5).await;
    queue.wait().await;

    assert_eq!(handler.completed(), 5);
    assert_eq!(handler.max_seen(), 1);
}

#[tokio::test]
async fn resize_up_runs_jobs_in_parallel() {
    let handler = GateHandler::closed();
    let queue = Queue::new(handler.clone());
    queue.resize(3);

    enqueue_n(&queue, 3).await;
    settle().await;
    assert_eq!(handler.max_seen(), 3, "all three workers picked up a job");

    handler.release(3);
    queue.wait().await;
    assert_eq!(handler.completed(), 3);
}

#[tokio::test]
async fn resize_down_preserves_backlog_and_running_jobs() {
    let handler = GateHandler::closed();
    let queue = Queue::new(handler.clone());
    queue.resize(3);

    // six jobs: three picked up, three in the backlog
    enqueue_n(&queue, 6).await;
    settle().await;
    assert_eq!(handler.max_seen(), 3);

    // retire two workers while their jobs are still running
    queue.resize(1);
    assert_eq!(queue.workers(), 1, "registry drops retired slots immediately");

    // every job still completes: in-flight ones finish, the surviving
    // worker drains the backlog
    handler.release(6);
    queue.wait().await;
    assert_eq!(handler.completed(), 6);
}

#[tokio::test]
async fn enqueue_blocks_when_backlog_is_full() {
    let handler = GateHandler::closed();
    let queue = Arc::new(Queue::new(handler.clone()));

    // one job occupies the worker, sixteen fill the backlog
    enqueue_n(&queue, 17).await;
    settle().await;

    let blocked = {
        let queue = queue.clone();
        tokio::spawn(async move {
            queue.enqueue("blocked".to_string(), JobConfig::default()).await;
        })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!blocked.is_finished(), "enqueue must block on a full backlog");

    handler.release(18);
    queue.wait().await;
    assert_eq!(handler.completed(), 18);
    blocked.await.unwrap();
}

#[tokio::test]
async fn retired_workers_stop_taking_new_jobs() {
    let handler = GateHandler::open();
    let queue = Queue::new(handler.clone());
    queue.resize(2);
    queue.resize(1);
    settle().await;

    enqueue_n(&queue, 4).await;
    queue.wait().await;

    assert_eq!(handler.completed(), 4);
    assert_eq!(handler.max_seen(), 1, "only the surviving worker consumes");
}
