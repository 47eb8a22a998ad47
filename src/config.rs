use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Tuning values shared by the simulation, the input layer and the renderers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Avatar linear speed in units per second.
    pub walk_speed: f32,
    /// Avatar angular speed in radians per second.
    pub turn_speed: f32,
    /// Per-frame lerp factor applied to the idle/walk weights.
    pub weight_smoothing: f32,
    /// Per-frame lerp factor applied to the desktop follow camera.
    pub camera_smoothing: f32,
    /// Camera position relative to the avatar in desktop mode.
    pub camera_offset: Vec3,
    /// Orbit target relative to the avatar in desktop mode.
    pub target_offset: Vec3,
    /// Distance of the debug console in front of the headset.
    pub console_distance: f32,
    /// Number of lines kept by the debug console.
    pub console_capacity: usize,
    /// Joystick knob travel in CSS pixels.
    pub joystick_radius: f32,
    pub joystick_deadzone: f32,
    pub gamepad_deadzone: f32,
    pub camera_start: Vec3,
    pub camera_look_at: Vec3,
    pub console_start: Vec3,
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            walk_speed: 2.0,
            turn_speed: 2.0,
            weight_smoothing: 0.1,
            camera_smoothing: 0.1,
            camera_offset: Vec3::new(0.0, 2.0, 4.0),
            target_offset: Vec3::new(0.0, 1.0, 0.0),
            console_distance: 1.5,
            console_capacity: 20,
            joystick_radius: 35.0,
            joystick_deadzone: 0.1,
            gamepad_deadzone: 0.1,
            camera_start: Vec3::new(0.0, 1.6, 3.0),
            camera_look_at: Vec3::new(0.0, 1.0, 0.0),
            console_start: Vec3::new(0.0, 1.0, -2.0),
            fov: 75.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}
