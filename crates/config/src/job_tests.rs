// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use zackup_core::RetentionConfig;

fn strings(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn globals() -> JobConfig {
    JobConfig {
        ssh: Some(SshConfig {
            user: Some("backup".to_string()),
            port: Some(2222),
            identity: Some(PathBuf::from("/etc/zackup/id_ed25519")),
            timeout: Some(15),
        }),
        rsync: Some(RsyncConfig {
            included: strings(&["/etc"]),
            excluded: strings(&["*.cache"]),
            arguments: strings(&["--sparse"]),
            ..RsyncConfig::default()
        }),
        retention: Some(RetentionConfig {
            daily: Some(7),
            weekly: Some(4),
            monthly: None,
            yearly: None,
        }),
        pre_script: Script::from_inline(&["global-pre"]),
        post_script: Script::from_inline(&["global-post"]),
        ..JobConfig::default()
    }
}

#[test]
fn ssh_accessors_have_defaults() {
    let job = JobConfig::default();
    assert_eq!(job.ssh_user(), "root");
    assert_eq!(job.ssh_port(), 22);
    assert_eq!(job.ssh_timeout(), None);
    assert!(job.ssh_identity().is_none());
}

#[test]
fn merge_copies_missing_sections() {
    let mut job = JobConfig::default();
    job.merge_globals(&globals());

    assert_eq!(job.ssh_user(), "backup");
    assert_eq!(job.ssh_port(), 2222);
    assert_eq!(job.ssh_timeout(), Some(Duration::from_secs(15)));
    assert_eq!(job.rsync.as_ref().unwrap().included, strings(&["/etc"]));
    assert_eq!(job.retention.as_ref().unwrap().daily, Some(7));
}

#[test]
fn merge_keeps_local_scalars() {
    let mut job = JobConfig {
        ssh: Some(SshConfig { user: Some("admin".to_string()), ..SshConfig::default() }),
        ..JobConfig::default()
    };
    job.merge_globals(&globals());

    // locally set wins, unset inherits
    assert_eq!(job.ssh_user(), "admin");
    assert_eq!(job.ssh_port(), 2222);
}

#[test]
fn merge_concatenates_lists_globals_first() {
    let mut job = JobConfig {
        rsync: Some(RsyncConfig {
            included: strings(&["/home"]),
            excluded: strings(&["/home/scratch"]),
            arguments: strings(&["--perms"]),
            ..RsyncConfig::default()
        }),
        ..JobConfig::default()
    };
    job.merge_globals(&globals());

    let rsync = job.rsync.unwrap();
    assert_eq!(rsync.included, strings(&["/etc", "/home"]));
    assert_eq!(rsync.excluded, strings(&["*.cache", "/home/scratch"]));
    assert_eq!(rsync.arguments, strings(&["--sparse", "--perms"]));
}

#[test]
fn merge_honors_override_flags() {
    let mut job = JobConfig {
        rsync: Some(RsyncConfig {
            included: strings(&["/home"]),
            excluded: strings(&["/home/scratch"]),
            arguments: strings(&["--perms"]),
            override_global_include: true,
            override_global_args: true,
            ..RsyncConfig::default()
        }),
        ..JobConfig::default()
    };
    job.merge_globals(&globals());

    let rsync = job.rsync.unwrap();
    assert_eq!(rsync.included, strings(&["/home"]));
    assert_eq!(rsync.excluded, strings(&["*.cache", "/home/scratch"]));
    assert_eq!(rsync.arguments, strings(&["--perms"]));
}

#[test]
fn merge_retention_per_field() {
    let mut job = JobConfig {
        retention: Some(RetentionConfig { daily: Some(14), ..RetentionConfig::default() }),
        ..JobConfig::default()
    };
    job.merge_globals(&globals());

    let retention = job.retention.unwrap();
    assert_eq!(retention.daily, Some(14));
    assert_eq!(retention.weekly, Some(4));
    assert_eq!(retention.monthly, None);
}

#[test]
fn merge_prepends_scripts() {
    let mut job = JobConfig {
        pre_script: Script::from_inline(&["host-pre"]),
        ..JobConfig::default()
    };
    job.merge_globals(&globals());

    assert_eq!(job.pre_script.lines(), vec!["global-pre", "host-pre"]);
    assert_eq!(job.post_script.lines(), vec!["global-post"]);
}

#[test]
fn job_config_from_yaml() {
    let job: JobConfig = serde_yaml::from_str(
        r#"
ssh:
  user: admin
  port: 2200
  timeout: 30
rsync:
  include:
    - /var/www
  args: ["--acls"]
  override_global_args: true
retention:
  daily: 7
  yearly: 1
pre_script: |
  systemctl stop nginx
post_script: |
  systemctl start nginx
"#,
    )
    .unwrap();

    assert_eq!(job.ssh_user(), "admin");
    assert_eq!(job.ssh_port(), 2200);
    assert_eq!(job.ssh_timeout(), Some(Duration::from_secs(30)));
    assert_eq!(job.rsync.as_ref().unwrap().included, strings(&["/var/www"]));
    assert!(job.rsync.as_ref().unwrap().override_global_args);
    assert_eq!(job.retention.as_ref().unwrap().yearly, Some(1));
    assert_eq!(job.pre_script.lines(), vec!["systemctl stop nginx"]);
    assert_eq!(job.post_script.lines(), vec!["systemctl start nginx"]);
}
