//! CLI arg tests for hostwatch (viewer)
use assert_cmd::prelude::*;
use std::process::Command;

fn hostwatch(config_home: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("hostwatch").expect("binary exists");
    cmd.env("XDG_CONFIG_HOME", config_home)
        .env_remove("HOSTWATCH_REPORT_DIR");
    cmd
}

#[test]
fn help_mentions_flags() {
    let td = tempfile::tempdir().unwrap();
    let output = hostwatch(td.path()).arg("--help").output().expect("run --help");
    let text = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    for flag in ["--report-dir", "-r", "--tracking-secs", "-d", "--save", "--dry-run"] {
        assert!(text.contains(flag), "help text missing {flag}\n{text}");
    }
}

#[test]
fn dry_run_prints_effective_settings() {
    let td = tempfile::tempdir().unwrap();
    let output = hostwatch(td.path())
        .args(["ws://example:9/ws", "-d", "30", "-r", "/tmp/hw-reports", "--dry-run"])
        .output()
        .expect("run hostwatch");
    assert!(output.status.success());
    let text = String::from_utf8_lossy(&output.stdout);
    assert!(text.contains("url: ws://example:9/ws"), "{text}");
    assert!(text.contains("tracking_secs: 30"), "{text}");
    assert!(text.contains("report_dir: /tmp/hw-reports"), "{text}");
}

#[test]
fn rejects_non_websocket_url() {
    let td = tempfile::tempdir().unwrap();
    let output = hostwatch(td.path())
        .args(["http://example/ws", "--dry-run"])
        .output()
        .expect("run hostwatch");
    assert!(!output.status.success());
    let err = String::from_utf8_lossy(&output.stderr);
    assert!(err.contains("ws://"), "{err}");
}

#[test]
fn rejects_zero_tracking_secs() {
    let td = tempfile::tempdir().unwrap();
    let output = hostwatch(td.path())
        .args(["--tracking-secs", "0", "--dry-run"])
        .output()
        .expect("run hostwatch");
    assert!(!output.status.success());
}
