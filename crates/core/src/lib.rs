// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! zackup-core: domain types for the zackup backup service.
//!
//! Everything in this crate is free of I/O: host metrics and their status
//! derivation, snapshot names, the retention policy engine, and the clock
//! abstraction that keeps time-dependent code testable.

pub mod clock;
pub mod metrics;
pub mod retention;
pub mod snapshot;

pub use clock::{Clock, FakeClock, SystemClock};
pub use metrics::{HostMetrics, JobStatus};
pub use retention::{Bucket, RetentionConfig, RetentionPolicy};
pub use snapshot::Snapshot;
