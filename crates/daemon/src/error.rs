// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job-level errors. A backup job short-circuits on the first failure; the
//! runner records exactly one of these per failed run.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum JobError {
    /// The storage CLI exited non-zero or could not be spawned.
    #[error("zfs {action} failed: {message}")]
    Storage { action: &'static str, message: String },

    #[error("ssh master connect failed: {0}")]
    SshConnect(String),

    #[error("remote script failed: {0}")]
    SshExec(String),

    #[error("rsync failed: {0}")]
    Sync(String),
}

impl JobError {
    pub(crate) fn storage(action: &'static str, message: impl Into<String>) -> Self {
        Self::Storage { action, message: message.into() }
    }
}
