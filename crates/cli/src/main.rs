// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! The `zackup` command line interface.

mod commands;
mod gelf;
mod logging;

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use zackup_config::Tree;
use zackup_daemon::App;

/// Fallback config root when neither `--root` nor `ZACKUP_ROOT` is given.
const DEFAULT_ROOT: &str = "/etc/zackup";

#[derive(Parser)]
#[command(
    name = "zackup",
    version,
    about = "A small utility to backup remote hosts into local ZFS datasets."
)]
struct Cli {
    /// Config root directory
    #[arg(short = 'r', long = "root", global = true, value_name = "DIR")]
    root: Option<PathBuf>,

    /// Increase log level (once for debug, twice for trace messages)
    #[arg(short = 'v', long = "verbose", global = true, action = ArgAction::Count)]
    verbose: u8,

    /// GELF UDP endpoint in host:port notation
    #[arg(long = "gelf", global = true, value_name = "host:port")]
    gelf: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Creates backups and stores them in a local per-host ZFS dataset
    Run {
        /// Hosts to back up (all configured hosts when empty)
        hosts: Vec<String>,

        /// Run at most N jobs in parallel (overrides the service config)
        #[arg(short = 'P', long = "parallel", value_name = "N")]
        parallel: Option<usize>,
    },

    /// Starts zackup as daemon
    Serve {
        /// Address to listen on
        #[arg(short = 'l', long = "listen", default_value = "127.0.0.1:3000")]
        listen: String,
    },

    /// Prints a list of hosts and their backup status
    Status {
        /// Hosts to report on (all known hosts when empty)
        hosts: Vec<String>,
    },

    /// Computes which snapshots the retention policy would keep
    Prune {
        /// Hosts to evaluate (all configured hosts when empty)
        hosts: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let root = cli
        .root
        .clone()
        .or_else(|| std::env::var_os("ZACKUP_ROOT").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_ROOT));

    let tree =
        Arc::new(Tree::open(&root).with_context(|| {
            format!("failed to read config tree from {}", root.display())
        })?);

    logging::init(cli.verbose, &tree.service().log_level, cli.gelf.as_deref())?;
    tracing::debug!(root = %root.display(), "config tree read");

    let app = App::new(tree);
    app.load_state().await.context("cannot restore state from ZFS metadata")?;

    match cli.command {
        Command::Run { hosts, parallel } => commands::run::run(&app, hosts, parallel).await,
        Command::Serve { listen } => commands::serve::serve(app, &listen).await,
        Command::Status { hosts } => commands::status::status(&app, &hosts),
        Command::Prune { hosts } => commands::prune::prune(&app, hosts).await,
    }
}
