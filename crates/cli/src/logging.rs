// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Logging setup. Verbosity flags win over the configured service level;
//! with a GELF endpoint the records are shipped as JSON datagrams instead
//! of being printed.

use crate::gelf::GelfWriter;
use anyhow::Context;
use tracing_subscriber::EnvFilter;

pub fn init(verbosity: u8, service_level: &str, gelf: Option<&str>) -> anyhow::Result<()> {
    let level = match verbosity {
        0 if !service_level.is_empty() => service_level.to_string(),
        0 => "info".to_string(),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match gelf {
        Some(endpoint) => {
            let writer = GelfWriter::connect(endpoint)
                .with_context(|| format!("cannot reach GELF endpoint {endpoint}"))?;
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .with_writer(writer)
                .init();
        }
        None => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
        }
    }
    Ok(())
}
