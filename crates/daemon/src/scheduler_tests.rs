// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::queue::JobHandler;
use crate::test_support::FakeRunner;
use crate::zfs::Zfs;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::path::Path;
use zackup_config::JobConfig;
use zackup_core::{FakeClock, HostMetrics};

struct CollectHandler {
    hosts: Mutex<Vec<String>>,
}

impl CollectHandler {
    fn new() -> Arc<Self> {
        Arc::new(Self { hosts: Mutex::new(Vec::new()) })
    }

    fn hosts(&self) -> Vec<String> {
        self.hosts.lock().clone()
    }
}

#[async_trait]
impl JobHandler for CollectHandler {
    async fn run(&self, host: String, _job: JobConfig) {
        self.hosts.lock().push(host);
    }
}

struct Fixture {
    _dir: tempfile::TempDir,
    clock: FakeClock,
    handler: Arc<CollectHandler>,
    state: Arc<State<FakeClock>>,
    queue: Arc<Queue>,
    scheduler: Scheduler<FakeClock>,
}

fn fixture() -> Fixture {
    let dir = tempfile::TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("config.yml"),
        "daemon:\n  schedule: \"04:00:00\"\n",
    )
    .unwrap();
    std::fs::write(dir.path().join("globals.yml"), "{}").unwrap();
    let hosts_dir = dir.path().join("hosts");
    std::fs::create_dir_all(&hosts_dir).unwrap();
    std::fs::write(hosts_dir.join("alpha.example.org.yml"), "{}").unwrap();

    let tree = Arc::new(Tree::open(dir.path()).unwrap());
    let clock = FakeClock::new();
    let runner = FakeRunner::new();
    let zfs = Arc::new(Zfs::new(runner, "backups", Path::new("/zpool/zackup")));
    let state = Arc::new(State::new(clock.clone(), zfs));
    let handler = CollectHandler::new();
    let queue = Arc::new(Queue::new(handler.clone()));
    let scheduler = Scheduler::new(tree, state.clone(), queue.clone(), clock.clone());

    Fixture { _dir: dir, clock, handler, state, queue, scheduler }
}

fn due(clock: &FakeClock, host: &str) -> HostMetrics {
    HostMetrics {
        scheduled_at: Some(clock.now() - chrono::Duration::minutes(1)),
        ..HostMetrics::new(host)
    }
}

#[tokio::test]
async fn first_walk_primes_unscheduled_hosts() {
    let f = fixture();
    f.scheduler.walk_once().await;
    f.queue.wait().await;

    // planned but not yet enqueued
    assert!(f.handler.hosts().is_empty());
    let planned = f.state.get("alpha.example.org").unwrap().scheduled_at.unwrap();
    assert!(planned > f.clock.now());
}

#[tokio::test]
async fn due_host_is_enqueued_and_replanned() {
    let f = fixture();
    f.state.insert(due(&f.clock, "alpha.example.org"));

    f.scheduler.walk_once().await;
    f.queue.wait().await;

    assert_eq!(f.handler.hosts(), vec!["alpha.example.org"]);
    let planned = f.state.get("alpha.example.org").unwrap().scheduled_at.unwrap();
    assert!(planned > f.clock.now(), "host is replanned after the enqueue");
}

#[tokio::test]
async fn running_host_is_skipped() {
    let f = fixture();
    let mut metrics = due(&f.clock, "alpha.example.org");
    metrics.started_at = Some(f.clock.now());
    f.state.insert(metrics);

    f.scheduler.walk_once().await;
    f.queue.wait().await;

    assert!(f.handler.hosts().is_empty());
}

#[tokio::test]
async fn future_scheduled_host_is_skipped() {
    let f = fixture();
    let mut metrics = HostMetrics::new("alpha.example.org");
    metrics.scheduled_at = Some(f.clock.now() + chrono::Duration::hours(2));
    f.state.insert(metrics);

    f.scheduler.walk_once().await;
    f.queue.wait().await;

    assert!(f.handler.hosts().is_empty());
}

#[tokio::test]
async fn repeated_walks_enqueue_once_per_due_period() {
    let f = fixture();
    f.state.insert(due(&f.clock, "alpha.example.org"));

    f.scheduler.walk_once().await;
    f.scheduler.walk_once().await;
    f.queue.wait().await;

    assert_eq!(f.handler.hosts().len(), 1, "replanned host is not re-enqueued");
}

#[tokio::test]
async fn stop_aborts_walks_and_joins_the_loop() {
    let mut f = fixture();
    f.state.insert(due(&f.clock, "alpha.example.org"));

    f.scheduler.start();
    f.scheduler.stop().await;

    // the loop never got past its first sleep
    assert!(f.handler.hosts().is_empty());
}
