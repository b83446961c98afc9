//! `sync` applies a plan's copy entries to the filesystem, respecting
//! dry-run and the freshness gate.

use assert_cmd::Command;
use predicates::str::contains;
use std::fs;
use tempfile::tempdir;

fn write_plan(path: &std::path::Path, source_dir: &std::path::Path, dest_dir: &std::path::Path, body: &str) {
    let xml = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<CodeSync>\n  <SourceDirectory>{}</SourceDirectory>\n  <DestDirectory>{}</DestDirectory>\n{body}\n</CodeSync>\n",
        source_dir.display(),
        dest_dir.display(),
    );
    fs::write(path, xml).unwrap();
}

#[test]
fn sync_copies_a_complete_entry() {
    let src = tempdir().unwrap();
    let dst = tempdir().unwrap();
    fs::write(src.path().join("a.txt"), b"payload").unwrap();

    let plan_path = dst.path().join("plan.xml");
    write_plan(
        &plan_path,
        src.path(),
        dst.path(),
        "  <Copy><Source>a.txt</Source><Destination>a.txt</Destination></Copy>",
    );

    Command::cargo_bin("codesync")
        .unwrap()
        .args(["sync"])
        .arg(&plan_path)
        .assert()
        .success()
        .stdout(contains("1 copied"));

    assert_eq!(fs::read(dst.path().join("a.txt")).unwrap(), b"payload");
}

#[test]
fn dry_run_reports_without_writing() {
    let src = tempdir().unwrap();
    let dst = tempdir().unwrap();
    fs::write(src.path().join("a.txt"), b"payload").unwrap();

    let plan_path = dst.path().join("plan.xml");
    write_plan(
        &plan_path,
        src.path(),
        dst.path(),
        "  <Copy><Source>a.txt</Source><Destination>a.txt</Destination></Copy>",
    );

    Command::cargo_bin("codesync")
        .unwrap()
        .args(["sync", "--dry-run"])
        .arg(&plan_path)
        .assert()
        .success()
        .stdout(contains("dry run"));

    assert!(!dst.path().join("a.txt").exists());
}

#[test]
fn sync_exits_nonzero_when_a_source_is_missing() {
    let src = tempdir().unwrap();
    let dst = tempdir().unwrap();

    let plan_path = dst.path().join("plan.xml");
    write_plan(
        &plan_path,
        src.path(),
        dst.path(),
        "  <Copy><Source>missing.txt</Source><Destination>missing.txt</Destination></Copy>",
    );

    Command::cargo_bin("codesync")
        .unwrap()
        .args(["sync"])
        .arg(&plan_path)
        .assert()
        .failure();
}
