//! End-to-end tests for the `layer-stack new` command.

#[allow(dead_code)]
mod common;
#[allow(unused_imports)]
use common::prelude::*;

#[test]
fn test_new_creates_layer() {
    let fixture = TestFixture::new();

    fixture
        .command()
        .args(["new", "my-image"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[DIR ] my-image"))
        .stdout(predicate::str::contains("[FILE] my-image/properties.json5"))
        .stdout(predicate::str::contains("[FILE] my-image/build_steps.json5"))
        .stdout(predicate::str::contains(
            "[FILE] my-image/resources/010_example.ps1",
        ))
        .stdout(predicate::str::contains("Created new image layer at"));

    fixture
        .child("my-image/properties.json5")
        .assert(predicate::str::contains("imageTemplate"));
    fixture
        .child("my-image/resources/010_example.ps1")
        .assert(predicate::path::is_file());
}

#[test]
fn test_new_layer_builds() {
    let fixture = TestFixture::new();
    fixture.command().args(["new", "my-image"]).assert().success();

    fixture
        .command()
        .args(["build", "-l", "my-image", "-q"])
        .assert()
        .success();

    fixture
        .child("out/build_steps.json")
        .assert(predicate::str::contains("Run example script"));
}

#[test]
fn test_new_refuses_existing_path() {
    let fixture = TestFixture::new().with_file("taken/keep.txt", "keep");

    fixture
        .command()
        .args(["new", "taken"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    fixture.child("taken/keep.txt").assert("keep");
}

#[test]
fn test_new_requires_path() {
    let mut cmd = cargo_bin_cmd!("layer-stack");
    cmd.arg("new").assert().failure().code(2);
}
