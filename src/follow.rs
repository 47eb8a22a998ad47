//! Desktop follow camera and head-locked debug console placement.

use glam::{Mat3, Mat4, Quat, Vec3};

use crate::config::ViewerConfig;
use crate::input::xr::{HeadPose, ImmersiveSession};
use crate::locomotion::Avatar;

/// How the current frame is presented. Never stored between frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentationMode {
    Desktop,
    Immersive,
}

impl PresentationMode {
    pub fn from_session(session: Option<&ImmersiveSession>) -> Self {
        match session {
            Some(_) => Self::Immersive,
            None => Self::Desktop,
        }
    }
}

/// Branch taken by [`FollowRig::update`] on a given frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowState {
    NoAvatar,
    Desktop,
    Immersive,
}

/// Perspective camera orbiting a look-at target.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitCamera {
    pub position: Vec3,
    pub target: Vec3,
    view: Mat4,
}

impl OrbitCamera {
    pub fn new(position: Vec3, target: Vec3) -> Self {
        let mut camera = Self {
            position,
            target,
            view: Mat4::IDENTITY,
        };
        camera.update();
        camera
    }

    /// Recomputes the view transform after `position` or `target` moved.
    pub fn update(&mut self) {
        self.view = Mat4::look_at_rh(self.position, self.target, Vec3::Y);
    }

    pub fn view(&self) -> Mat4 {
        self.view
    }
}

/// Placement of the debug console quad.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConsolePlane {
    pub position: Vec3,
    /// Maps the quad's front (+Z) into world space.
    pub rotation: Quat,
}

impl ConsolePlane {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
        }
    }

    /// Floats the plane `distance` units along the head's gaze, facing back at it.
    pub fn place_in_front_of(&mut self, head: &HeadPose, distance: f32) {
        self.position = head.position + head.forward * distance;
        if let Some(rotation) = facing_rotation(self.position, head.position) {
            self.rotation = rotation;
        }
    }

    pub fn normal(&self) -> Vec3 {
        self.rotation * Vec3::Z
    }

    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation, self.position)
    }
}

/// Rotation turning +Z from `from` toward `toward`, keeping +Y up.
fn facing_rotation(from: Vec3, toward: Vec3) -> Option<Quat> {
    let z = (toward - from).try_normalize()?;
    let x = Vec3::Y
        .cross(z)
        .try_normalize()
        .or_else(|| Vec3::Z.cross(z).try_normalize())?;
    let y = z.cross(x);
    Some(Quat::from_mat3(&Mat3::from_cols(x, y, z)))
}

/// Owns the follow camera and console plane and moves them once per frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FollowRig {
    pub camera: OrbitCamera,
    pub console: ConsolePlane,
    camera_offset: Vec3,
    target_offset: Vec3,
    smoothing: f32,
    console_distance: f32,
}

impl FollowRig {
    pub fn new(config: &ViewerConfig) -> Self {
        Self {
            camera: OrbitCamera::new(config.camera_start, config.camera_look_at),
            console: ConsolePlane::new(config.console_start),
            camera_offset: config.camera_offset,
            target_offset: config.target_offset,
            smoothing: config.camera_smoothing,
            console_distance: config.console_distance,
        }
    }

    pub fn update(
        &mut self,
        avatar: Option<&Avatar>,
        session: Option<&ImmersiveSession>,
    ) -> FollowState {
        let Some(avatar) = avatar else {
            return FollowState::NoAvatar;
        };
        match (PresentationMode::from_session(session), session) {
            (PresentationMode::Immersive, Some(session)) => {
                self.console
                    .place_in_front_of(&session.head, self.console_distance);
                FollowState::Immersive
            }
            _ => {
                let eye = avatar.position + self.camera_offset;
                let target = avatar.position + self.target_offset;
                self.camera.position = self.camera.position.lerp(eye, self.smoothing);
                self.camera.target = self.camera.target.lerp(target, self.smoothing);
                self.camera.update();
                FollowState::Desktop
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rig() -> FollowRig {
        FollowRig::new(&ViewerConfig::default())
    }

    #[test]
    fn no_avatar_leaves_everything_in_place() {
        let mut rig = rig();
        let before = rig.clone();
        let session = ImmersiveSession::default();
        assert_eq!(rig.update(None, None), FollowState::NoAvatar);
        assert_eq!(rig.update(None, Some(&session)), FollowState::NoAvatar);
        assert_eq!(rig, before);
    }

    #[test]
    fn desktop_eases_camera_toward_offset() {
        let mut rig = rig();
        let avatar = Avatar::default();
        assert_eq!(rig.update(Some(&avatar), None), FollowState::Desktop);
        // start (0, 1.6, 3) toward (0, 2, 4)
        assert!((rig.camera.position - Vec3::new(0.0, 1.64, 3.1)).length() < 1e-5);
        assert!((rig.camera.target - Vec3::new(0.0, 1.0, 0.0)).length() < 1e-6);
        for _ in 0..300 {
            rig.update(Some(&avatar), None);
        }
        assert!((rig.camera.position - Vec3::new(0.0, 2.0, 4.0)).length() < 1e-3);
        assert_eq!(
            rig.camera.view(),
            Mat4::look_at_rh(rig.camera.position, rig.camera.target, Vec3::Y)
        );
    }

    #[test]
    fn immersive_floats_console_in_front_of_head() {
        let mut rig = rig();
        let camera_before = rig.camera.clone();
        let session = ImmersiveSession {
            head: HeadPose {
                position: Vec3::new(2.0, 1.7, 0.0),
                forward: Vec3::X,
            },
            ..ImmersiveSession::default()
        };
        let state = rig.update(Some(&Avatar::default()), Some(&session));
        assert_eq!(state, FollowState::Immersive);
        assert!((rig.console.position - Vec3::new(3.5, 1.7, 0.0)).length() < 1e-6);
        assert!((rig.console.normal() - Vec3::NEG_X).length() < 1e-5);
        assert_eq!(rig.camera, camera_before);
    }

    #[test]
    fn console_faces_head_when_looking_straight_up() {
        let mut plane = ConsolePlane::new(Vec3::ZERO);
        let head = HeadPose {
            position: Vec3::ZERO,
            forward: Vec3::Y,
        };
        plane.place_in_front_of(&head, 1.5);
        assert!((plane.position - Vec3::new(0.0, 1.5, 0.0)).length() < 1e-6);
        assert!((plane.normal() - Vec3::NEG_Y).length() < 1e-5);
    }
}
