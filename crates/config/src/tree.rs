// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The configuration directory tree.

use crate::error::ConfigError;
use crate::job::JobConfig;
use crate::script::clean_lines;
use crate::service::ServiceConfig;
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// In-memory representation of the configuration directory.
///
/// Reads happen under a shared lock; `set_root`/`reload` swap the whole
/// inner state under the exclusive lock. [`Tree::host`] returns a merged
/// deep copy, so callers can never mutate shared state.
#[derive(Debug)]
pub struct Tree {
    inner: RwLock<TreeInner>,
}

#[derive(Debug)]
struct TreeInner {
    root: PathBuf,
    service: ServiceConfig,
    global: JobConfig,
    hosts: HashMap<String, JobConfig>,
}

impl Tree {
    /// Load the configuration tree rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let inner = TreeInner::load(root.into())?;
        Ok(Self { inner: RwLock::new(inner) })
    }

    /// Point the tree at a new root directory. A no-op when the root is
    /// unchanged; otherwise the tree is reloaded from the new location.
    pub fn set_root(&self, new_root: impl Into<PathBuf>) -> Result<(), ConfigError> {
        let new_root = new_root.into();
        if self.inner.read().root == new_root {
            return Ok(());
        }
        let fresh = TreeInner::load(new_root)?;
        *self.inner.write() = fresh;
        Ok(())
    }

    /// Re-read the current root directory.
    pub fn reload(&self) -> Result<(), ConfigError> {
        let root = self.inner.read().root.clone();
        let fresh = TreeInner::load(root)?;
        *self.inner.write() = fresh;
        Ok(())
    }

    pub fn root(&self) -> PathBuf {
        self.inner.read().root.clone()
    }

    /// Names of all configured hosts, sorted.
    pub fn hosts(&self) -> Vec<String> {
        let mut hosts: Vec<String> = self.inner.read().hosts.keys().cloned().collect();
        hosts.sort();
        hosts
    }

    /// A copy of the job description for a single host, with the globals
    /// merged in. `None` when the host is unknown.
    pub fn host(&self, name: &str) -> Option<JobConfig> {
        let inner = self.inner.read();
        let mut job = inner.hosts.get(name)?.clone();
        job.merge_globals(&inner.global);
        Some(job)
    }

    /// A copy of the current service configuration.
    pub fn service(&self) -> ServiceConfig {
        self.inner.read().service.clone()
    }
}

impl TreeInner {
    fn load(root: PathBuf) -> Result<Self, ConfigError> {
        let service: ServiceConfig = decode(&root.join("config.yml"))?;
        let global: JobConfig = decode(&root.join("globals.yml"))?;

        let mut hosts = HashMap::new();
        read_hosts(&root, &mut hosts)?;
        read_hooks(&root, &mut hosts)?;

        Ok(Self { root, service, global, hosts })
    }
}

fn decode<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
    serde_yaml::from_str(&raw).map_err(|source| ConfigError::Yaml { path: path.to_path_buf(), source })
}

/// Discover host configs in both layout variants:
/// `hosts/<host>/config.yml` (A) and `hosts/<host>.yml` (B).
/// The same host appearing in both variants is an error.
fn read_hosts(root: &Path, hosts: &mut HashMap<String, JobConfig>) -> Result<(), ConfigError> {
    let hosts_dir = root.join("hosts");
    let entries = match fs::read_dir(&hosts_dir) {
        Ok(entries) => entries,
        Err(source) if source.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(source) => return Err(ConfigError::Io { path: hosts_dir, source }),
    };

    let mut paths: Vec<PathBuf> = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| ConfigError::Io { path: hosts_dir.clone(), source })?;
        paths.push(entry.path());
    }
    paths.sort();

    for path in paths {
        if path.is_dir() {
            let config = path.join("config.yml");
            if !config.is_file() {
                continue;
            }
            let host = file_name(&path);
            insert_host(hosts, host, &config)?;
        } else if path.is_file() && path.extension().is_some_and(|ext| ext == "yml") {
            let host = file_name(&path).trim_end_matches(".yml").to_string();
            insert_host(hosts, host, &path)?;
        }
    }

    Ok(())
}

fn insert_host(
    hosts: &mut HashMap<String, JobConfig>,
    host: String,
    path: &Path,
) -> Result<(), ConfigError> {
    if hosts.contains_key(&host) {
        return Err(ConfigError::DuplicateHost(host));
    }

    let mut job: JobConfig = decode(path)?;
    job.host = host.clone();
    hosts.insert(host, job);
    Ok(())
}

/// Read hook lines from `hosts/<host>/pre.*.sh` and `post.*.sh`, sorted
/// lexicographically, into the host's scripts.
fn read_hooks(root: &Path, hosts: &mut HashMap<String, JobConfig>) -> Result<(), ConfigError> {
    for (host, job) in hosts.iter_mut() {
        let dir = root.join("hosts").join(host);

        for (prefix, script) in
            [("pre.", &mut job.pre_script), ("post.", &mut job.post_script)]
        {
            for file in hook_files(&dir, prefix)? {
                let raw = fs::read_to_string(&file)
                    .map_err(|source| ConfigError::Io { path: file.clone(), source })?;
                script.push_file_lines(clean_lines(&raw));
            }
        }
    }
    Ok(())
}

fn hook_files(dir: &Path, prefix: &str) -> Result<Vec<PathBuf>, ConfigError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(source) if source.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => return Err(ConfigError::Io { path: dir.to_path_buf(), source }),
    };

    let mut files: Vec<PathBuf> = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| ConfigError::Io { path: dir.to_path_buf(), source })?;
        let path = entry.path();
        let name = file_name(&path);
        if path.is_file() && name.starts_with(prefix) && name.ends_with(".sh") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn file_name(path: &Path) -> String {
    path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default()
}

#[cfg(test)]
#[path = "tree_tests.rs"]
mod tests;
