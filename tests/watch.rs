//! End-to-end watch session tests over the command validator

mod common;

use std::fs;
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use common::{testdir, validator_for};
use syncserve::CommandValidator;

fn write_after(path: PathBuf, delay: Duration, content: &'static str) {
    thread::spawn(move || {
        thread::sleep(delay);
        if let Some(parent) = path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        fs::write(path, content).unwrap();
    });
}

fn start_session(validator: &CommandValidator) -> i64 {
    validator
        .handle("watch_start\n.")
        .unwrap()
        .parse()
        .unwrap()
}

#[test]
fn watch_reports_modified_file() {
    let (_dir, root) = testdir();
    let validator = validator_for(&root);
    let id = start_session(&validator);

    write_after(root.join("file1.txt"), Duration::from_millis(100), "foobar");
    assert_eq!(
        validator.handle(&format!("watch_poll\n{id}")).unwrap(),
        "modify 'file1.txt' 6"
    );

    write_after(
        root.join("morefiles/file2.txt"),
        Duration::from_millis(100),
        "",
    );
    // the first write may leave a residual duplicate in the queue
    let mut seen = Vec::new();
    for _ in 0..4 {
        let report = validator.handle(&format!("watch_poll\n{id}")).unwrap();
        if report == "modify 'morefiles/file2.txt' 0" {
            seen.push(report);
            break;
        }
        seen.push(report);
    }
    assert_eq!(
        seen.last().map(String::as_str),
        Some("modify 'morefiles/file2.txt' 0"),
        "polled reports: {seen:?}"
    );

    assert_eq!(validator.handle(&format!("watch_stop\n{id}")).unwrap(), "");
}

#[test]
fn watch_suppresses_hidden_paths() {
    let (_dir, root) = testdir();
    let validator = validator_for(&root);
    let id = start_session(&validator);

    write_after(
        root.join(".git/secretfile.txt"),
        Duration::from_millis(50),
        "foobar",
    );
    write_after(root.join("file1.txt"), Duration::from_millis(250), "foobar");
    assert_eq!(
        validator.handle(&format!("watch_poll\n{id}")).unwrap(),
        "modify 'file1.txt' 6"
    );
    validator.handle(&format!("watch_stop\n{id}")).unwrap();
}

#[test]
fn watch_poll_times_out_with_no_activity() {
    let (_dir, root) = testdir();
    let validator = validator_for(&root);
    let id = start_session(&validator);

    let tick = Instant::now();
    assert_eq!(validator.handle(&format!("watch_poll\n{id}")).unwrap(), "");
    let elapsed = tick.elapsed();
    // the helper wires a two-second poll timeout
    assert!(elapsed >= Duration::from_secs(2));
    assert!(elapsed < Duration::from_secs(4));
    validator.handle(&format!("watch_stop\n{id}")).unwrap();
}

#[test]
fn watch_poll_after_stop_returns_sentinel() {
    let (_dir, root) = testdir();
    let validator = validator_for(&root);
    let id = start_session(&validator);
    validator.handle(&format!("watch_stop\n{id}")).unwrap();

    let tick = Instant::now();
    assert_eq!(
        validator.handle(&format!("watch_poll\n{id}")).unwrap(),
        "error ID_NO_LONGER_VALID"
    );
    assert!(tick.elapsed() < Duration::from_millis(500));
}

#[test]
fn watch_stop_on_unknown_id_is_a_no_op() {
    let (_dir, root) = testdir();
    let validator = validator_for(&root);
    assert_eq!(validator.handle("watch_stop\n123").unwrap(), "");
}

#[test]
fn watch_session_ids_increase() {
    let (_dir, root) = testdir();
    let validator = validator_for(&root);
    let first = start_session(&validator);
    let second = start_session(&validator);
    assert!(second > first);
    validator.handle(&format!("watch_stop\n{first}")).unwrap();
    validator.handle(&format!("watch_stop\n{second}")).unwrap();
}

#[test]
fn watch_start_rejects_traversal() {
    let (_dir, root) = testdir();
    let validator = validator_for(&root);
    let err = validator.handle("watch_start\n../elsewhere").unwrap_err();
    assert_eq!(err.code(), 400);
}
