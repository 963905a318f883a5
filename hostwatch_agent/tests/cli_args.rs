//! CLI arg tests for hostwatch_agent (server)
use assert_cmd::prelude::*;
use std::process::Command;

#[test]
fn help_mentions_port_short_and_long() {
    let output = Command::cargo_bin("hostwatch_agent")
        .expect("binary exists")
        .arg("--help")
        .output()
        .expect("run agent --help");
    let text = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    assert!(
        text.contains("--port") && text.contains("-p") && text.contains("--demo"),
        "help text missing expected flags\n{text}"
    );
}

#[test]
fn starts_with_short_and_long_port() {
    // We verify port flags are accepted by ensuring the process starts (then we kill quickly).
    let exe = env!("CARGO_BIN_EXE_hostwatch_agent");

    for flag in ["--port", "-p"] {
        let mut child = Command::new(exe)
            .args(["--demo", flag, "0"])
            .spawn()
            .expect("spawn agent");
        // Give it a moment to bind
        std::thread::sleep(std::time::Duration::from_millis(150));
        assert!(
            child.try_wait().expect("poll child").is_none(),
            "agent exited early with {flag}"
        );
        let _ = child.kill();
        let _ = child.wait();
    }
}

#[test]
fn rejects_bad_port() {
    let output = Command::cargo_bin("hostwatch_agent")
        .expect("binary exists")
        .args(["--port", "not-a-port"])
        .output()
        .expect("run agent");
    assert!(!output.status.success());
}
