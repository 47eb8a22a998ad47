use glam::{Mat4, Vec3};

use crate::console::DebugConsole;
use crate::scene::Scene;

/// Camera parameters consumed by the renderer's uniform buffer.
#[derive(Clone, Debug)]
pub struct CameraParams {
    pub view_proj: Mat4,
    pub position: Vec3,
}

/// Room lighting folded into the renderer's uniform buffer.
#[derive(Clone, Debug, Default)]
pub struct LightParams {
    /// Ambient color premultiplied by intensity.
    pub ambient: Vec3,
    pub point_position: Vec3,
    pub point_color: Vec3,
    pub point_intensity: f32,
    pub point_range: f32,
    /// Direction the directional light travels in.
    pub sun_direction: Vec3,
    pub sun_color: Vec3,
}

/// Everything a renderer draws for one frame.
pub struct FrameView<'a> {
    pub scene: &'a Scene,
    /// Avatar model matrix, `None` while the avatar is absent.
    pub avatar: Option<Mat4>,
    pub console_transform: Mat4,
    pub console: &'a DebugConsole,
}
