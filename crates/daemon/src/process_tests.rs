// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn sh(script: &str) -> (std::path::PathBuf, Vec<String>) {
    (std::path::PathBuf::from("/bin/sh"), vec!["-c".to_string(), script.to_string()])
}

#[tokio::test]
async fn run_captures_both_streams() {
    let (program, args) = sh("echo out; echo err >&2");
    let output = SystemRunner.run(&program, &args, None).await.unwrap();

    assert!(output.success());
    assert_eq!(output.stdout, "out\n");
    assert_eq!(output.stderr, "err\n");
}

#[tokio::test]
async fn run_reports_exit_code() {
    let (program, args) = sh("exit 3");
    let output = SystemRunner.run(&program, &args, None).await.unwrap();

    assert!(!output.success());
    assert_eq!(output.code, Some(3));
}

#[tokio::test]
async fn run_pipes_stdin() {
    let (program, args) = sh("cat");
    let output =
        SystemRunner.run(&program, &args, Some("line1\nline2\n".to_string())).await.unwrap();

    assert!(output.success());
    assert_eq!(output.stdout, "line1\nline2\n");
}

#[tokio::test]
async fn run_missing_binary_is_io_error() {
    let program = std::path::PathBuf::from("/nonexistent/zackup-test-binary");
    assert!(SystemRunner.run(&program, &[], None).await.is_err());
}

#[tokio::test]
async fn spawn_and_shutdown_terminates_child() {
    let program = std::path::PathBuf::from("/bin/sleep");
    let child = SystemRunner.spawn(&program, &["30".to_string()]).await.unwrap();

    // sleep exits on SIGTERM well within the grace period
    child.shutdown(Duration::from_secs(5)).await.unwrap();
}

#[test]
fn output_message_prefers_stderr() {
    let output = Output {
        stdout: "ordinary\n".to_string(),
        stderr: "boom\n".to_string(),
        code: Some(1),
    };
    assert_eq!(output.message(), "boom");

    let output = Output { stdout: "only out\n".to_string(), ..Output::default() };
    assert_eq!(output.message(), "only out");
}
