//! Glue shared by the native binary and the web entry point.

use std::fmt::Write as _;

use glam::{Mat4, Vec3};

use crate::config::ViewerConfig;
use crate::console::DebugConsole;
use crate::follow::OrbitCamera;
use crate::render::{CameraParams, LightParams};
use crate::scene::{LightKind, Scene};
use crate::simulation::Simulation;

pub fn camera_params(camera: &OrbitCamera, aspect: f32, config: &ViewerConfig) -> CameraParams {
    let projection = Mat4::perspective_rh(
        config.fov.to_radians(),
        aspect.max(0.01),
        config.near,
        config.far,
    );
    CameraParams {
        view_proj: projection * camera.view(),
        position: camera.position,
    }
}

/// Folds the room's ambient, point and directional lights into renderer uniforms.
/// Missing lights contribute nothing.
pub fn light_params(scene: &Scene) -> LightParams {
    let mut params = LightParams::default();
    if let Some(ambient) = scene.light(LightKind::Ambient) {
        params.ambient = ambient.color * ambient.intensity;
    }
    if let Some(point) = scene.light(LightKind::Point) {
        params.point_position = point.position;
        params.point_color = point.color;
        params.point_intensity = point.intensity;
        params.point_range = point.range;
    }
    if let Some(sun) = scene.light(LightKind::Directional) {
        // Directional lights aim at the origin.
        params.sun_direction = (-sun.position).try_normalize().unwrap_or(Vec3::NEG_Y);
        params.sun_color = sun.color * sun.intensity;
    }
    params
}

/// Human-readable summary of the simulation and the console lines.
pub fn final_state(simulation: &Simulation, console: &DebugConsole) -> String {
    let mut out = String::from("Final state:\n");
    match simulation.avatar() {
        Some(avatar) => {
            let _ = writeln!(
                out,
                " - avatar pos=({:.2}, {:.2}, {:.2}) yaw={:.2}",
                avatar.position.x, avatar.position.y, avatar.position.z, avatar.yaw
            );
        }
        None => out.push_str(" - avatar absent\n"),
    }
    match simulation.animation_weights() {
        Some(weights) => {
            let _ = writeln!(
                out,
                " - animations idle={:.2} walk={:.2}",
                weights.idle, weights.walk
            );
        }
        None => out.push_str(" - animations not loaded\n"),
    }
    let rig = simulation.follow();
    let _ = writeln!(
        out,
        " - camera pos=({:.2}, {:.2}, {:.2}) target=({:.2}, {:.2}, {:.2})",
        rig.camera.position.x,
        rig.camera.position.y,
        rig.camera.position.z,
        rig.camera.target.x,
        rig.camera.target.y,
        rig.camera.target.z
    );
    let _ = writeln!(
        out,
        " - console pos=({:.2}, {:.2}, {:.2})",
        rig.console.position.x, rig.console.position.y, rig.console.position.z
    );
    out.push_str("Debug console:\n");
    for line in console.lines() {
        let _ = writeln!(out, "   {line}");
    }
    out
}

pub fn print_final_state(simulation: &Simulation, console: &DebugConsole) {
    print!("{}", final_state(simulation, console));
}

#[cfg(not(target_arch = "wasm32"))]
pub use native::map_winit_key;

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use winit::keyboard::{Key, NamedKey as WinitNamed};

    use crate::input::{KeyCode, NamedKey};

    pub fn map_winit_key(key: &Key) -> Option<KeyCode> {
        match key {
            Key::Named(named) => Some(match named {
                WinitNamed::Space => KeyCode::Named(NamedKey::Space),
                WinitNamed::Enter => KeyCode::Named(NamedKey::Enter),
                WinitNamed::Tab => KeyCode::Named(NamedKey::Tab),
                WinitNamed::ArrowLeft => KeyCode::Named(NamedKey::Left),
                WinitNamed::ArrowRight => KeyCode::Named(NamedKey::Right),
                WinitNamed::ArrowUp => KeyCode::Named(NamedKey::Up),
                WinitNamed::ArrowDown => KeyCode::Named(NamedKey::Down),
                WinitNamed::Escape => KeyCode::Named(NamedKey::Escape),
                WinitNamed::Backspace => KeyCode::Named(NamedKey::Backspace),
                WinitNamed::Shift => KeyCode::Named(NamedKey::Shift),
                WinitNamed::Control => KeyCode::Named(NamedKey::Control),
                WinitNamed::Alt => KeyCode::Named(NamedKey::Alt),
                WinitNamed::F1 => KeyCode::Function(1),
                WinitNamed::F2 => KeyCode::Function(2),
                WinitNamed::F3 => KeyCode::Function(3),
                WinitNamed::F4 => KeyCode::Function(4),
                WinitNamed::F5 => KeyCode::Function(5),
                WinitNamed::F6 => KeyCode::Function(6),
                WinitNamed::F7 => KeyCode::Function(7),
                WinitNamed::F8 => KeyCode::Function(8),
                WinitNamed::F9 => KeyCode::Function(9),
                WinitNamed::F10 => KeyCode::Function(10),
                WinitNamed::F11 => KeyCode::Function(11),
                WinitNamed::F12 => KeyCode::Function(12),
                _ => return None,
            }),
            Key::Character(text) => KeyCode::from_dom_key(text),
            _ => None,
        }
    }
}
