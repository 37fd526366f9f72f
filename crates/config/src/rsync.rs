// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Rsync argument construction: include/exclude filter expansion plus the
//! sanitized pass-through arguments.

use crate::blacklist;
use serde::Deserialize;
use std::collections::HashSet;

/// Per-job rsync options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RsyncConfig {
    #[serde(default, rename = "include")]
    pub included: Vec<String>,

    #[serde(default, rename = "exclude")]
    pub excluded: Vec<String>,

    #[serde(default, rename = "args")]
    pub arguments: Vec<String>,

    /// Inhibits the inheritance of global include values when set to true.
    #[serde(default)]
    pub override_global_include: bool,
    /// See `override_global_include`.
    #[serde(default)]
    pub override_global_exclude: bool,
    /// See `override_global_include`.
    #[serde(default)]
    pub override_global_args: bool,
}

impl RsyncConfig {
    /// Create the full ARGV for rsync (without the program name).
    ///
    /// `ssh` is the remote-shell command line for `-e`, `src` and `dst` are
    /// the transfer endpoints (a trailing slash is enforced on both).
    pub fn build_arg_vector(&self, ssh: &str, src: &str, dst: &str) -> Vec<String> {
        let mut src = src.to_string();
        if !src.ends_with('/') {
            src.push('/');
        }
        let mut dst = dst.to_string();
        if !dst.ends_with('/') {
            dst.push('/');
        }

        let mut args = filter_args(&self.included, &self.excluded);
        args.push("-e".to_string());
        args.push(ssh.to_string());
        args.extend(blacklist::sanitize(&self.arguments));
        for fixed in ["--delete", "--delete-excluded", "--delete-delay", "--itemize-changes"] {
            args.push(fixed.to_string());
        }
        args.push(src);
        args.push(dst);
        args
    }
}

/// Build the `--include`/`--exclude` filter list.
///
/// This is modelled after BackupPC: to sync only `/home/craig` rsync needs
/// include/exclude pairs at each level (`--include /home --exclude /*`,
/// `--include /home/craig --exclude /home/*`). With multiple include paths
/// the pairs are generated level by level, all includes are emitted first
/// and all excludes afterwards (they commute), followed by the
/// user-specified excludes.
pub fn filter_args(included: &[String], excluded: &[String]) -> Vec<String> {
    let mut inc: Vec<String> = Vec::new();
    let mut exc: Vec<String> = Vec::new();
    let mut inc_seen: HashSet<String> = HashSet::new();
    let mut exc_seen: HashSet<String> = HashSet::new();

    let mut paths: Vec<Vec<String>> = Vec::new();
    for raw in included {
        let components = normalize(raw);
        if components.is_empty() {
            // If the user specifies "/" then just include it and don't
            // exclude "/*".
            if inc_seen.insert("/".to_string()) {
                inc.push("/".to_string());
            }
            continue;
        }
        paths.push(components);
    }

    let max_depth = paths.iter().map(Vec::len).max().unwrap_or(0);
    for depth in 1..=max_depth {
        for components in &paths {
            if components.len() < depth {
                continue;
            }

            let parent = format!("/{}", components[..depth - 1].join("/"));
            let star = if depth == 1 { "/*".to_string() } else { format!("{parent}/*") };
            if exc_seen.insert(star.clone()) {
                exc.push(star);
            }

            let prefix = format!("/{}", components[..depth].join("/"));
            if inc_seen.insert(prefix.clone()) {
                inc.push(prefix);
            }
        }
    }

    let mut list = Vec::with_capacity(inc.len() + exc.len() + excluded.len());
    list.extend(inc.into_iter().map(|f| format!("--include={f}")));
    list.extend(exc.into_iter().map(|f| format!("--exclude={f}")));
    // just append additional exclude lists onto the end
    list.extend(excluded.iter().map(|f| format!("--exclude={f}")));
    list
}

/// Resolve a user-supplied path into clean absolute components. An empty
/// result denotes the filesystem root.
fn normalize(path: &str) -> Vec<String> {
    let mut components: Vec<String> = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                components.pop();
            }
            other => components.push(other.to_string()),
        }
    }
    components
}

#[cfg(test)]
#[path = "rsync_tests.rs"]
mod tests;
