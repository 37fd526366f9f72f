// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::fs;
use tempfile::TempDir;

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn fixture() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();

    write(
        root,
        "config.yml",
        r#"
parallel: 2
root_dataset: backups
mount_base: /backups
daemon:
  schedule: "04:00:00"
  jitter: 30s
"#,
    );
    write(
        root,
        "globals.yml",
        r#"
ssh:
  user: backup
rsync:
  exclude:
    - "*.tmp"
pre_script: |
  echo global-pre
"#,
    );

    // variant A
    write(
        root,
        "hosts/alpha.example.org/config.yml",
        r#"
rsync:
  include:
    - /etc
"#,
    );
    // variant B
    write(
        root,
        "hosts/beta.example.org.yml",
        r#"
ssh:
  port: 2222
"#,
    );

    write(root, "hosts/alpha.example.org/pre.10-db.sh", "pg_dumpall > /tmp/pg.sql\n");
    write(root, "hosts/alpha.example.org/pre.00-first.sh", "# comment\necho first\n");
    write(root, "hosts/alpha.example.org/post.00-clean.sh", "rm /tmp/pg.sql\n");

    dir
}

#[test]
fn loads_service_and_hosts() {
    let dir = fixture();
    let tree = Tree::open(dir.path()).unwrap();

    let service = tree.service();
    assert_eq!(service.parallel, 2);
    assert_eq!(service.root_dataset, "backups");

    assert_eq!(tree.hosts(), vec!["alpha.example.org", "beta.example.org"]);
    assert_eq!(tree.root(), dir.path());
}

#[test]
fn host_returns_merged_copy() {
    let dir = fixture();
    let tree = Tree::open(dir.path()).unwrap();

    let alpha = tree.host("alpha.example.org").unwrap();
    assert_eq!(alpha.host, "alpha.example.org");
    // scalar inherited from globals
    assert_eq!(alpha.ssh_user(), "backup");
    // lists concatenate globals-first
    let rsync = alpha.rsync.as_ref().unwrap();
    assert_eq!(rsync.included, vec!["/etc"]);
    assert_eq!(rsync.excluded, vec!["*.tmp"]);

    assert!(tree.host("unknown.example.org").is_none());
}

#[test]
fn hook_files_are_sorted_and_cleaned() {
    let dir = fixture();
    let tree = Tree::open(dir.path()).unwrap();

    let alpha = tree.host("alpha.example.org").unwrap();
    // globals' inline lines first, then hook file lines sorted by name
    assert_eq!(alpha.pre_script.lines(), vec![
        "echo global-pre",
        "echo first",
        "pg_dumpall > /tmp/pg.sql",
    ]);
    assert_eq!(alpha.post_script.lines(), vec!["rm /tmp/pg.sql"]);
}

#[test]
fn duplicate_host_across_variants_is_rejected() {
    let dir = fixture();
    write(dir.path(), "hosts/alpha.example.org.yml", "ssh:\n  port: 22\n");

    let err = Tree::open(dir.path()).unwrap_err();
    assert!(matches!(err, ConfigError::DuplicateHost(host) if host == "alpha.example.org"));
}

#[test]
fn missing_service_document_fails() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "globals.yml", "{}");

    assert!(matches!(Tree::open(dir.path()).unwrap_err(), ConfigError::Io { .. }));
}

#[test]
fn invalid_yaml_reports_path() {
    let dir = fixture();
    write(dir.path(), "hosts/broken.example.org.yml", "ssh: [not, a, mapping\n");

    let err = Tree::open(dir.path()).unwrap_err();
    match err {
        ConfigError::Yaml { path, .. } => {
            assert!(path.ends_with("hosts/broken.example.org.yml"))
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn reload_picks_up_new_hosts() {
    let dir = fixture();
    let tree = Tree::open(dir.path()).unwrap();
    assert_eq!(tree.hosts().len(), 2);

    write(dir.path(), "hosts/gamma.example.org.yml", "{}");
    tree.reload().unwrap();
    assert_eq!(tree.hosts().len(), 3);
}

#[test]
fn set_root_ignores_unchanged_path() {
    let dir = fixture();
    let tree = Tree::open(dir.path()).unwrap();

    // adding a host without reloading stays invisible for an unchanged root
    write(dir.path(), "hosts/gamma.example.org.yml", "{}");
    tree.set_root(dir.path()).unwrap();
    assert_eq!(tree.hosts().len(), 2);
}

#[test]
fn set_root_swaps_tree() {
    let first = fixture();
    let tree = Tree::open(first.path()).unwrap();

    let second = TempDir::new().unwrap();
    write(second.path(), "config.yml", "root_dataset: other\n");
    write(second.path(), "globals.yml", "{}");

    tree.set_root(second.path()).unwrap();
    assert_eq!(tree.service().root_dataset, "other");
    assert!(tree.hosts().is_empty());
}
