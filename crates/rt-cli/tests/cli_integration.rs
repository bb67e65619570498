//! CLI integration tests
//!
//! Tests the round-table CLI using assert_cmd.

use std::io::Write;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;

fn round_table() -> Command {
    let mut cmd = Command::cargo_bin("round-table")
        .expect("Failed to locate round-table binary - ensure it's built before running tests");
    cmd.env_remove("ROUND_TABLE_OPERATOR_NAME").env_remove("RUST_LOG");
    cmd
}

fn write_config(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).expect("Failed to create config file");
    file.write_all(content.as_bytes())
        .expect("Failed to write config file");
    path
}

#[test]
fn test_cli_help() {
    round_table()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("round-table"))
        .stdout(predicate::str::contains("--operator-name"));
}

#[test]
fn test_cli_version() {
    round_table()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("round-table"));
}

#[test]
fn test_missing_argument_is_bad_invocation() {
    round_table().assert().code(1);
}

#[test]
fn test_unknown_flag_is_bad_invocation() {
    round_table().args(["--bogus", "x.json"]).assert().code(1);
}

#[test]
fn test_missing_config_file() {
    let dir = tempfile::tempdir().unwrap();
    round_table()
        .arg(dir.path().join("absent.json"))
        .assert()
        .code(2)
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_duplicate_names_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        &dir,
        "agents.json",
        r#"[{ "name": "A", "cmd": "cat" }, { "name": "a", "cmd": "cat" }]"#,
    );

    round_table()
        .arg(path)
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Duplicate child name"));
}

#[test]
fn test_malformed_config_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, "agents.json", r#"[{ "name": "A", "cmd": "#);

    round_table().arg(path).assert().code(3);
}

#[test]
fn test_empty_config_has_no_children() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, "agents.json", "[]");

    round_table().arg(path).assert().code(4);
}

#[cfg(unix)]
mod unix {
    use super::*;

    #[test]
    fn test_no_child_starts() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            "agents.json",
            r#"[{ "name": "ghost", "cmd": "round-table-no-such-binary-xyz" }]"#,
        );

        round_table()
            .arg(path)
            .write_stdin("")
            .assert()
            .code(4)
            .stderr(predicate::str::contains("ghost"));
    }

    #[test]
    fn test_child_exit_code_propagates() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            "agents.toml",
            r#"
                [[children]]
                name = "quitter"
                cmd = "sh"
                args = ["-c", "exit 3"]
            "#,
        );

        round_table()
            .arg(path)
            .write_stdin("")
            .assert()
            .code(3)
            .stdout(predicate::str::contains("Exiting with code 3."));
    }

    #[test]
    fn test_echo_child_conversation() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            "agents.json",
            r#"[{ "name": "echo", "cmd": "cat" }]"#,
        );

        round_table()
            .args(["--operator-name", "alice"])
            .arg(path)
            .write_stdin("echo: hi there\n")
            .assert()
            .success()
            .stdout(predicate::str::contains(
                r#"[echo] [{"Role":"user","Text":"alice:hi there"}]"#,
            ))
            .stdout(predicate::str::contains("Captured 2 messages."))
            .stdout(predicate::str::contains("Exiting with code 0."))
            .stderr(predicate::str::contains("Spawned [echo] cat (window hidden)"));
    }

    #[test]
    fn test_second_interrupt_exits_without_waiting() {
        use std::process::{Command as StdCommand, Stdio};
        use std::time::{Duration, Instant};

        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            "agents.json",
            r#"[{ "name": "stubborn", "cmd": "sh", "args": ["-c", "sleep 5"] }]"#,
        );

        let mut child = StdCommand::new(assert_cmd::cargo::cargo_bin("round-table"))
            .arg(path)
            .env_remove("RUST_LOG")
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .unwrap();
        std::thread::sleep(Duration::from_millis(500));

        let interrupt = |pid: u32| {
            StdCommand::new("kill")
                .args(["-INT", &pid.to_string()])
                .status()
                .unwrap();
        };

        // the child ignores end of input, so the first interrupt is not enough
        interrupt(child.id());
        std::thread::sleep(Duration::from_millis(300));
        assert!(child.try_wait().unwrap().is_none());

        interrupt(child.id());
        let deadline = Instant::now() + Duration::from_secs(3);
        let status = loop {
            if let Some(status) = child.try_wait().unwrap() {
                break status;
            }
            assert!(Instant::now() < deadline, "round-table did not exit");
            std::thread::sleep(Duration::from_millis(20));
        };
        assert_eq!(status.code(), Some(130));
    }

    #[test]
    fn test_unknown_target_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            "agents.json",
            r#"[{ "name": "echo", "cmd": "cat" }]"#,
        );

        round_table()
            .arg(path)
            .write_stdin("Z: test\n")
            .assert()
            .success()
            .stderr(predicate::str::contains(r#"child "Z" not found or exited"#))
            .stdout(predicate::str::contains("Captured 0 messages."));
    }
}
