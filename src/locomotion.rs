use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::input::InputVector;

/// Placed avatar root: position on the floor plus heading about +Y.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Avatar {
    pub position: Vec3,
    pub yaw: f32,
}

impl Default for Avatar {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            yaw: 0.0,
        }
    }
}

impl Avatar {
    pub fn new(position: Vec3, yaw: f32) -> Self {
        Self { position, yaw }
    }

    /// Local +Z rotated by the current heading.
    pub fn forward(&self) -> Vec3 {
        Quat::from_rotation_y(self.yaw) * Vec3::Z
    }

    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(Quat::from_rotation_y(self.yaw), self.position)
    }
}

/// Which animation the blender should favour this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gait {
    Idle,
    Walk,
}

/// Turns an input vector into avatar motion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocomotionController {
    pub linear_speed: f32,
    pub angular_speed: f32,
}

impl Default for LocomotionController {
    fn default() -> Self {
        Self {
            linear_speed: 2.0,
            angular_speed: 2.0,
        }
    }
}

impl LocomotionController {
    pub fn new(linear_speed: f32, angular_speed: f32) -> Self {
        Self {
            linear_speed,
            angular_speed,
        }
    }

    /// Moves along the current heading, then turns. Any non-zero forward
    /// request, however small, counts as walking.
    pub fn step(&self, avatar: &mut Avatar, input: InputVector, dt: f32) -> Gait {
        let gait = if input.move_forward != 0.0 {
            let forward = avatar.forward();
            avatar.position += forward * (input.move_forward * self.linear_speed * dt);
            Gait::Walk
        } else {
            Gait::Idle
        };
        if input.turn != 0.0 {
            avatar.yaw += input.turn * self.angular_speed * dt;
        }
        gait
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn walks_along_heading() {
        let controller = LocomotionController::default();
        let mut avatar = Avatar::default();
        let gait = controller.step(&mut avatar, InputVector::new(1.0, 0.0), 0.5);
        assert_eq!(gait, Gait::Walk);
        assert!((avatar.position - Vec3::new(0.0, 0.0, 1.0)).length() < 1e-6);
    }

    #[test]
    fn heading_rotates_forward_vector() {
        let avatar = Avatar::new(Vec3::ZERO, FRAC_PI_2);
        assert!((avatar.forward() - Vec3::X).length() < 1e-6);
    }

    #[test]
    fn turning_and_moving_share_a_frame() {
        let controller = LocomotionController::default();
        let mut avatar = Avatar::default();
        controller.step(&mut avatar, InputVector::new(-1.0, 1.0), 0.25);
        assert!((avatar.position.z + 0.5).abs() < 1e-6);
        assert!((avatar.yaw - 0.5).abs() < 1e-6);
    }

    #[test]
    fn tiny_forward_still_walks() {
        let controller = LocomotionController::default();
        let mut avatar = Avatar::default();
        let gait = controller.step(&mut avatar, InputVector::new(1e-7, 0.0), 0.0);
        assert_eq!(gait, Gait::Walk);
        assert_eq!(avatar, Avatar::default());
    }

    #[test]
    fn no_input_is_idle_and_still() {
        let controller = LocomotionController::default();
        let mut avatar = Avatar::new(Vec3::new(1.0, 0.0, -2.0), 0.3);
        let before = avatar;
        for dt in [0.0, 0.016, 1.0, 10.0] {
            assert_eq!(controller.step(&mut avatar, InputVector::ZERO, dt), Gait::Idle);
        }
        assert_eq!(avatar, before);
    }
}
