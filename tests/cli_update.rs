//! Scenario F: updater carry-forward against a prior plan produced by a
//! real `analyze` run, driven through the binary.

use assert_cmd::Command;
use predicates::str::contains;
use std::fs;
use tempfile::tempdir;

fn write(root: &std::path::Path, rel: &str, contents: &[u8]) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

#[test]
fn scenario_f_stable_update_with_no_filesystem_changes() {
    let src = tempdir().unwrap();
    let dst = tempdir().unwrap();
    write(src.path(), "a.txt", b"hello");
    write(dst.path(), "a.txt", b"hello");
    let plan = dst.path().join("plan.xml");

    Command::cargo_bin("codesync")
        .unwrap()
        .args(["analyze"])
        .arg(src.path())
        .arg(dst.path())
        .args(["--output"])
        .arg(&plan)
        .assert()
        .success();

    let first_xml = fs::read_to_string(&plan).unwrap();
    assert!(first_xml.contains("<Source>a.txt</Source>"));

    Command::cargo_bin("codesync")
        .unwrap()
        .args(["update"])
        .arg(&plan)
        .assert()
        .success()
        .stdout(contains("1 previous matches carried forward"));

    let second_xml = fs::read_to_string(&plan).unwrap();
    assert!(second_xml.contains("<Source>a.txt</Source>"));
    assert!(second_xml.contains("<Destination>a.txt</Destination>"));
}

#[test]
fn update_resolves_a_newly_added_source() {
    let src = tempdir().unwrap();
    let dst = tempdir().unwrap();
    write(src.path(), "a.txt", b"hello");
    write(dst.path(), "a.txt", b"hello");
    let plan = dst.path().join("plan.xml");

    Command::cargo_bin("codesync")
        .unwrap()
        .args(["analyze"])
        .arg(src.path())
        .arg(dst.path())
        .args(["--output"])
        .arg(&plan)
        .assert()
        .success();

    write(src.path(), "b.txt", b"new file");
    write(dst.path(), "b.txt", b"new file");

    Command::cargo_bin("codesync")
        .unwrap()
        .args(["update"])
        .arg(&plan)
        .assert()
        .success()
        .stdout(contains("1 matched"));

    let xml = fs::read_to_string(&plan).unwrap();
    assert!(xml.contains("<Source>b.txt</Source>"));
}
