use assert_cmd::prelude::*;
use predicates::str::contains;
use std::fs;
use std::process::Command;
use tempfile::{tempdir, TempDir};

const SCENE: &str = r#"<scene>
  <ambient>25 25 25</ambient>
  <shadows>true</shadows>
  <camera>
    <name>main</name>
    <position>0 5 15</position>
    <target>0 0 0</target>
    <fov>45</fov>
  </camera>
  <light>
    <name>lamp</name>
    <position>0 100 0</position>
  </light>
  <object>
    <name>Ground</name>
    <mesh>plane</mesh>
    <size>40</size>
  </object>
  <object>
    <name>Cube</name>
    <mesh>cube</mesh>
    <size>2</size>
    <position>0 10 0</position>
    <shadows>true</shadows>
  </object>
</scene>
"#;

fn write_scene() -> TempDir {
    let dir = tempdir().expect("temp dir");
    fs::write(dir.path().join("scene.xml"), SCENE).expect("write scene");
    dir
}

#[test]
fn cli_prints_scene_summary() {
    let dir = write_scene();
    let mut cmd = Command::cargo_bin("scenefx").expect("binary exists");
    cmd.arg(dir.path().join("scene.xml")).arg("--summary-only");
    cmd.assert()
        .success()
        .stdout(contains("Loaded scene with 2 objects (1 lights)"))
        .stdout(contains(" - Cube (12 triangles)"))
        .stdout(contains(" - Ground (2 triangles)"))
        .stdout(contains("shadows on"));
}

#[test]
fn cli_renders_a_single_frame() {
    let dir = write_scene();
    let mut cmd = Command::cargo_bin("scenefx").expect("binary exists");
    cmd.arg(dir.path().join("scene.xml"))
        .args(["--size", "64x64", "--start", "250"]);
    cmd.assert()
        .success()
        .stdout(contains("Rendered frame at 250 ms: 14 triangles"));
}

#[test]
fn cli_writes_a_frame_sequence() {
    let dir = write_scene();
    let out = dir.path().join("frames");
    let mut cmd = Command::cargo_bin("scenefx").expect("binary exists");
    cmd.arg(dir.path().join("scene.xml"))
        .arg("--out")
        .arg(&out)
        .args(["--end", "500", "--fps", "4", "--size", "32x24"]);
    cmd.assert().success().stdout(contains("Wrote 2 frame(s)"));

    assert!(out.join("frame0000.png").is_file());
    assert!(out.join("frame0001.png").is_file());
    assert!(!out.join("frame0002.png").exists());
}

#[test]
fn cli_reports_missing_scene() {
    let dir = tempdir().expect("temp dir");
    let mut cmd = Command::cargo_bin("scenefx").expect("binary exists");
    cmd.arg(dir.path().join("nope.xml"));
    cmd.assert().failure().stderr(contains("Error:"));
}

#[test]
fn cli_rejects_unknown_flags() {
    let dir = write_scene();
    let mut cmd = Command::cargo_bin("scenefx").expect("binary exists");
    cmd.arg(dir.path().join("scene.xml")).arg("--bogus");
    cmd.assert()
        .failure()
        .stderr(contains("Unknown argument: --bogus"));
}
