// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! zackup-config: the configuration directory tree.
//!
//! A config root holds one service document (`config.yml`), one globals
//! document (`globals.yml`), per-host job documents in two layout variants
//! (`hosts/<host>/config.yml` or `hosts/<host>.yml`) and per-host hook
//! scripts (`hosts/<host>/pre.*.sh`, `post.*.sh`). [`Tree`] loads all of it
//! and hands out merged per-host [`JobConfig`] copies.

pub mod blacklist;
pub mod job;
pub mod rsync;
pub mod script;
pub mod service;
pub mod tree;

mod error;

pub use error::ConfigError;
pub use job::{JobConfig, SshConfig};
pub use rsync::RsyncConfig;
pub use script::Script;
pub use service::{Schedule, ScheduleError, ServiceConfig};
pub use tree::Tree;
