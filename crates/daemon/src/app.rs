// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Application context: one struct owning every component, passed around
//! explicitly instead of global state.

use crate::exporter::{self, MetricsSource};
use crate::process::{ProcessRunner, SystemRunner};
use crate::queue::Queue;
use crate::runner::Runner;
use crate::scheduler::Scheduler;
use crate::state::State;
use crate::zfs::Zfs;
use crate::JobError;
use prometheus_client::registry::Registry;
use std::sync::Arc;
use zackup_config::Tree;
use zackup_core::{Clock, SystemClock};

pub struct App<C: Clock = SystemClock> {
    pub tree: Arc<Tree>,
    pub clock: C,
    pub state: Arc<State<C>>,
    pub zfs: Arc<Zfs>,
    pub runner: Arc<Runner<C>>,
    pub queue: Arc<Queue>,
}

impl App<SystemClock> {
    /// Assemble the production wiring from a loaded config tree.
    pub fn new(tree: Arc<Tree>) -> Self {
        Self::with_clock(tree, SystemClock)
    }
}

impl<C: Clock> App<C> {
    pub fn with_clock(tree: Arc<Tree>, clock: C) -> Self {
        let service = tree.service();
        let process: Arc<dyn ProcessRunner> = Arc::new(SystemRunner);

        let zfs = Arc::new(Zfs::new(process.clone(), &service.root_dataset, &service.mount_base));
        let state = Arc::new(State::new(clock.clone(), zfs.clone()));
        let runner = Arc::new(Runner::new(
            clock.clone(),
            process,
            state.clone(),
            zfs.clone(),
            service.rsync_bin.clone(),
            service.ssh_bin.clone(),
        ));

        let queue = Arc::new(Queue::new(runner.clone()));
        queue.resize(service.parallel as usize);

        Self { tree, clock, state, zfs, runner, queue }
    }

    /// Restore metrics for all configured hosts from dataset properties.
    pub async fn load_state(&self) -> Result<(), JobError> {
        self.state.load(&self.tree.hosts()).await
    }

    /// The daemon scheduler, not yet started.
    pub fn scheduler(&self) -> Scheduler<C> {
        Scheduler::new(
            self.tree.clone(),
            self.state.clone(),
            self.queue.clone(),
            self.clock.clone(),
        )
    }

    /// Prometheus registry backed by the metrics store.
    pub fn registry(&self) -> Registry {
        let source: Arc<dyn MetricsSource> = self.state.clone();
        exporter::registry(source)
    }

    pub fn metrics_source(&self) -> Arc<dyn MetricsSource> {
        self.state.clone()
    }
}
