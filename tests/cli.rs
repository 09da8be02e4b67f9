//! Drive the explain binary end to end.

use std::process::{Command, Output};

use tempfile::tempdir;

fn explain(args: &[&str]) -> Output {
    let home = tempdir().unwrap();
    Command::new(env!("CARGO_BIN_EXE_explain"))
        .args(args)
        .env("XDG_CONFIG_HOME", home.path())
        .env("COLUMNS", "200")
        .env_remove("EXPLAIN_OPTIONS")
        .env_remove("LIBEXPLAIN_OPTIONS")
        .output()
        .unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn explains_a_missing_file() {
    let output = explain(&["--errno", "ENOENT", "open", "/no/such/file", "O_RDONLY"]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.starts_with("open(pathname = \"/no/such/file\", flags = O_RDONLY) failed"), "{text}");
    assert!(text.contains("\"no\" directory"), "{text}");
}

#[test]
fn json_report() {
    let output = explain(&["--json", "-e", "17", "mkdir", "/tmp", "0755"]);
    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["call"], "mkdir");
    assert_eq!(report["errno"], libc::EEXIST);
    assert_eq!(report["name"], "EEXIST");
    assert!(report["message"].as_str().unwrap().contains("there is already a \"tmp\" directory"));
}

#[test]
fn client_options_apply() {
    let output = explain(&["-o", "no-numeric-errno", "-e", "EBADF", "close", "1000"]);
    let text = stdout(&output);
    assert!(text.contains("failed, Bad file descriptor, because"), "{text}");
}

#[test]
fn lists_registered_calls() {
    let output = explain(&["--list"]);
    assert!(output.status.success());
    let text = stdout(&output);
    for name in ["open", "ioctl", "mkdir", "select"] {
        assert!(text.lines().any(|line| line.split_whitespace().next() == Some(name)), "{name}");
    }
}

#[test]
fn ioctl_registry_is_consistent() {
    let output = explain(&["--check-ioctl"]);
    assert!(output.status.success(), "{}", stdout(&output));
}

#[test]
fn unknown_call_suggests_a_name() {
    let output = explain(&["-e", "ENOENT", "opne", "/x"]);
    assert_eq!(output.status.code(), Some(2));
    let err = String::from_utf8_lossy(&output.stderr);
    assert!(err.contains("did you mean `open`"), "{err}");
}

#[test]
fn bad_errno_is_a_parse_error() {
    let output = explain(&["-e", "ENOENTT", "close", "3"]);
    assert_eq!(output.status.code(), Some(21));
}

#[test]
fn session_log_is_hashed() {
    let dir = tempdir().unwrap();
    let log = dir.path().join("session.log");
    let output = explain(&["--log", log.to_str().unwrap(), "-e", "EBADF", "close", "1000"]);
    assert!(output.status.success());
    let contents = std::fs::read_to_string(&log).unwrap();
    assert!(contents.contains("[INFO] [CALL] close"), "{contents}");
    assert!(dir.path().join("session.log.hash").exists());
}
