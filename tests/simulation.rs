use glam::{Vec2, Vec3};
use log::{LevelFilter, Log, Metadata, Record};
use room_viewer::{
    shared_console, AnimationClip, AssetError, AssetEvent, Avatar, AvatarNode, ConsoleLogger,
    FollowState, Gait, Handedness, HeadPose, ImmersiveSession, InputSnapshot, InputState, KeyCode,
    Mesh, NamedKey, Simulation, ViewerConfig, XrInputSource,
};

fn simulation_with_avatar() -> Simulation {
    let mut sim = Simulation::new(ViewerConfig::default());
    sim.apply_asset_event(AssetEvent::Avatar(Ok(AvatarNode {
        mesh: Mesh::default(),
        placement: Avatar::default(),
    })))
    .expect("avatar accepted");
    sim.apply_asset_event(AssetEvent::Animations(Ok(vec![
        AnimationClip::new("SambaDance", 4.2),
        AnimationClip::new("Idle", 2.8),
        AnimationClip::new("Walking", 1.1),
    ])))
    .expect("clips accepted");
    sim
}

fn keys(names: &[&str]) -> InputSnapshot {
    InputSnapshot::with_keys(
        names
            .iter()
            .map(|name| KeyCode::from_dom_key(name).expect("known key")),
    )
}

fn immersive(sources: Vec<XrInputSource>) -> ImmersiveSession {
    ImmersiveSession {
        input_sources: sources,
        head: HeadPose::default(),
    }
}

#[test]
fn holding_w_walks_forward_and_starts_blending() {
    let mut sim = simulation_with_avatar();
    let report = sim.frame(&keys(&["w"]), None, 0.5);
    assert_eq!(report.gait, Some(Gait::Walk));
    assert_eq!(report.follow, FollowState::Desktop);

    let avatar = sim.avatar().unwrap();
    assert!((avatar.position - Vec3::new(0.0, 0.0, 1.0)).length() < 1e-5);
    let weights = sim.animation_weights().unwrap();
    assert!((weights.walk - 0.1).abs() < 1e-6);
    assert!((weights.idle - 0.9).abs() < 1e-6);
}

#[test]
fn opposing_keys_cancel_out() {
    let mut sim = simulation_with_avatar();
    let report = sim.frame(&keys(&["w", "s"]), None, 0.5);
    assert_eq!(report.input.move_forward, 0.0);
    assert_eq!(report.gait, Some(Gait::Idle));
    assert_eq!(sim.avatar().unwrap(), &Avatar::default());
}

#[test]
fn no_input_never_moves_the_avatar() {
    let mut sim = simulation_with_avatar();
    for dt in [0.0, 0.016, 0.5, 3.0] {
        sim.frame(&InputSnapshot::default(), None, dt);
        assert_eq!(sim.avatar().unwrap(), &Avatar::default());
    }
}

#[test]
fn joystick_pulled_down_walks_backwards() {
    let mut sim = simulation_with_avatar();
    let input = InputState::new(35.0);
    assert!(input.touch_start(1));
    input.touch_move(1, Vec2::new(0.0, 17.5));
    let report = sim.frame(&input.snapshot(), None, 0.5);
    assert!((report.input.move_forward + 0.5).abs() < 1e-6);
    assert!(sim.avatar().unwrap().position.z < 0.0);
}

#[test]
fn weights_stay_in_unit_range() {
    let mut sim = simulation_with_avatar();
    let inputs = [keys(&["w"]), keys(&[]), keys(&["ArrowDown", "a"]), keys(&["d"])];
    for frame in 0..200 {
        let snapshot = &inputs[(frame / 7) % inputs.len()];
        sim.frame(snapshot, None, 0.01 * (frame % 5) as f32);
        let weights = sim.animation_weights().unwrap();
        assert!((0.0..=1.0).contains(&weights.idle));
        assert!((0.0..=1.0).contains(&weights.walk));
    }
}

#[test]
fn zero_dt_frames_are_idempotent_once_settled() {
    let mut sim = simulation_with_avatar();
    let session = immersive(Vec::new());
    sim.frame(&InputSnapshot::default(), Some(&session), 0.0);
    let avatar = *sim.avatar().unwrap();
    let weights = sim.animation_weights();
    let rig = sim.follow().clone();

    sim.frame(&InputSnapshot::default(), Some(&session), 0.0);
    assert_eq!(sim.avatar().unwrap(), &avatar);
    assert_eq!(sim.animation_weights(), weights);
    assert_eq!(sim.follow(), &rig);
}

#[test]
fn zero_dt_desktop_frames_are_idempotent_once_converged() {
    let mut sim = simulation_with_avatar();
    sim.frame(&keys(&["w", "d"]), None, 0.5);
    // Smoothing is a per-frame lerp, so weights and camera reach an f32 fixed point.
    for _ in 0..2000 {
        sim.frame(&InputSnapshot::default(), None, 0.0);
    }
    let avatar = *sim.avatar().unwrap();
    let weights = sim.animation_weights();
    let rig = sim.follow().clone();

    for _ in 0..3 {
        let report = sim.frame(&InputSnapshot::default(), None, 0.0);
        assert_eq!(report.follow, FollowState::Desktop);
        assert_eq!(sim.avatar().unwrap(), &avatar);
        assert_eq!(sim.animation_weights(), weights);
        assert_eq!(sim.follow(), &rig);
    }
}

#[test]
fn desktop_camera_settles_behind_the_avatar() {
    let mut sim = simulation_with_avatar();
    sim.frame(&keys(&["ArrowUp"]), None, 1.0);
    for _ in 0..300 {
        sim.frame(&InputSnapshot::default(), None, 0.016);
    }
    let avatar = sim.avatar().unwrap().position;
    let camera = &sim.follow().camera;
    assert!((camera.position - (avatar + Vec3::new(0.0, 2.0, 4.0))).length() < 1e-3);
    assert!((camera.target - (avatar + Vec3::Y)).length() < 1e-3);
}

#[test]
fn immersive_console_floats_in_front_of_the_head() {
    let mut sim = simulation_with_avatar();
    let session = immersive(Vec::new());
    let camera_before = sim.follow().camera.clone();
    let report = sim.frame(&InputSnapshot::default(), Some(&session), 0.016);
    assert_eq!(report.follow, FollowState::Immersive);

    let console = &sim.follow().console;
    assert!((console.position - Vec3::new(0.0, 1.6, -1.5)).length() < 1e-5);
    assert!((console.normal() - Vec3::Z).length() < 1e-5);
    assert_eq!(sim.follow().camera, camera_before);
}

#[test]
fn xr_thumbsticks_drive_the_avatar() {
    let mut sim = simulation_with_avatar();
    let session = immersive(vec![
        XrInputSource::with_axes(Handedness::Left, vec![0.0, 0.0, 0.0, -1.0]),
        XrInputSource::with_axes(Handedness::Right, vec![0.05, 0.0]),
        XrInputSource {
            handedness: Handedness::None,
            axes: None,
        },
    ]);
    let report = sim.frame(&InputSnapshot::default(), Some(&session), 0.5);
    assert_eq!(report.input.move_forward, 1.0);
    assert_eq!(report.input.turn, 0.0);
    assert!((sim.avatar().unwrap().position.z - 1.0).abs() < 1e-5);
}

#[test]
fn failed_avatar_freezes_the_scene_and_is_logged() {
    struct Quiet;
    impl Log for Quiet {
        fn enabled(&self, _: &Metadata<'_>) -> bool {
            false
        }
        fn log(&self, _: &Record<'_>) {}
        fn flush(&self) {}
    }

    let console = shared_console(20);
    ConsoleLogger::new(console.clone(), Box::new(Quiet), LevelFilter::Info)
        .install()
        .expect("first logger in this binary");

    let mut sim = Simulation::new(ViewerConfig::default());
    let err = sim
        .apply_asset_event(AssetEvent::Avatar(Err(AssetError::Fetch {
            url: "models/avatar.obj".into(),
            reason: "HTTP 404".into(),
        })))
        .unwrap_err();
    err.report();

    let rig = sim.follow().clone();
    for _ in 0..10 {
        let report = sim.frame(&keys(&["w", "ArrowLeft"]), None, 0.1);
        assert_eq!(report.follow, FollowState::NoAvatar);
    }
    assert!(sim.avatar().is_none());
    assert_eq!(sim.follow(), &rig);

    let console = console.lock();
    assert!(console.contains("[ERR] Avatar error: failed to fetch models/avatar.obj: HTTP 404"));
}

#[test]
fn named_and_character_aliases_do_not_stack() {
    let snapshot = InputSnapshot::with_keys([
        KeyCode::Character('w'),
        KeyCode::Named(NamedKey::Up),
        KeyCode::Character('a'),
        KeyCode::Named(NamedKey::Left),
    ]);
    let input = snapshot.keyboard();
    assert_eq!(input.move_forward, 1.0);
    assert_eq!(input.turn, 1.0);
}
