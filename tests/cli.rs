use assert_cmd::prelude::*;
use predicates::prelude::*;
use predicates::str::contains;
use std::io::Write;
use std::path::PathBuf;
use std::process::Command;
use tempfile::NamedTempFile;

fn asset(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("assets")
        .join(name)
}

fn write_room(tuning: &str) -> NamedTempFile {
    let room = format!(
        r#"<room>
  <light>
    <kind>ambient</kind>
    <color>255 255 255</color>
  </light>
  <object>
    <name>Crate</name>
    <shape>box</shape>
    <size>1 1 1</size>
  </object>
  <tuning>
    {tuning}
  </tuning>
</room>
"#
    );
    let mut tmp = NamedTempFile::new().expect("temp room");
    tmp.write_all(room.as_bytes()).expect("write room");
    tmp
}

fn viewer_with_room(room: &NamedTempFile) -> Command {
    let mut cmd = Command::cargo_bin("room-viewer").expect("binary exists");
    cmd.arg("--summary-only")
        .arg("--room")
        .arg(room.path())
        .arg("--avatar")
        .arg(asset("avatar.obj"))
        .arg("--animations")
        .arg(asset("animations.xml"));
    cmd
}

#[test]
fn walks_the_avatar_forward_with_held_keys() {
    let mut cmd = Command::cargo_bin("room-viewer").expect("binary exists");
    cmd.arg("--summary-only")
        .arg("--avatar")
        .arg(asset("avatar.obj"))
        .arg("--animations")
        .arg(asset("animations.xml"))
        .args(["--hold", "w", "--frames", "10", "--dt", "0.1"]);
    cmd.assert()
        .success()
        .stdout(contains(" - avatar pos=(0.00, 0.00, 2.00) yaw=0.00"))
        .stdout(contains(" - animations idle=0.35 walk=0.65"))
        .stdout(contains("[LOG] Avatar loaded"))
        .stdout(contains("[LOG] Animations loaded"));
}

#[test]
fn missing_avatar_is_reported_on_the_console() {
    let dir = tempfile::tempdir().expect("temp dir");
    let mut cmd = Command::cargo_bin("room-viewer").expect("binary exists");
    cmd.arg("--summary-only")
        .arg("--avatar")
        .arg(dir.path().join("missing.obj"))
        .arg("--animations")
        .arg(asset("animations.xml"))
        .args(["--hold", "ArrowUp", "--frames", "5"]);
    cmd.assert()
        .success()
        .stdout(contains(" - avatar absent"))
        .stdout(contains(" - animations not loaded"))
        .stdout(contains("[ERR] Avatar error: failed to read"))
        .stdout(contains("Anim error").not());
}

#[test]
fn custom_room_and_tuning_are_applied() {
    let room = write_room("<walk_speed>4</walk_speed>");
    let mut cmd = viewer_with_room(&room);
    cmd.args(["--joystick", "0,-1", "--frames", "4", "--dt", "0.25"]);
    cmd.assert()
        .success()
        .stdout(contains("Loaded room with 1 objects (1 lights)"))
        .stdout(contains(" - avatar pos=(0.00, 0.00, 4.00)"));
}

#[test]
fn console_capacity_from_the_room_limits_the_console() {
    let room = write_room("<console_capacity>1</console_capacity>");
    let mut cmd = viewer_with_room(&room);
    cmd.args(["--frames", "2"]);
    cmd.assert()
        .success()
        .stdout(contains("[LOG] Animations loaded"))
        .stdout(contains("[LOG] Avatar loaded").not());
}

#[test]
fn weight_smoothing_is_applied_per_frame() {
    let room = write_room("<weight_smoothing>0.5</weight_smoothing>");
    let mut cmd = viewer_with_room(&room);
    cmd.args(["--hold", "w", "--frames", "1", "--dt", "0.1"]);
    cmd.assert()
        .success()
        .stdout(contains(" - animations idle=0.50 walk=0.50"));
}

#[test]
fn out_of_range_smoothing_rejects_the_room() {
    let room = write_room("<weight_smoothing>1.5</weight_smoothing>");
    let mut cmd = viewer_with_room(&room);
    cmd.assert()
        .failure()
        .stderr(contains("failed to parse room"))
        .stderr(contains("<weight_smoothing> must be within [0, 1]"))
        .stdout(contains("Loaded room").not());
}

#[test]
fn rejects_unknown_arguments() {
    let mut cmd = Command::cargo_bin("room-viewer").expect("binary exists");
    cmd.arg("--summary-only").arg("--fly");
    cmd.assert()
        .failure()
        .stderr(contains("Unknown argument: --fly"));
}
