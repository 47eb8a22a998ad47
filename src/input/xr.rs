use glam::Vec3;

use super::InputVector;

/// Which hand an XR input source is held in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Handedness {
    #[default]
    None,
    Left,
    Right,
}

impl Handedness {
    /// Parses the WebXR `XRInputSource.handedness` string.
    pub fn from_name(name: &str) -> Self {
        match name {
            "left" => Self::Left,
            "right" => Self::Right,
            _ => Self::None,
        }
    }
}

/// One tracked controller of the immersive session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XrInputSource {
    pub handedness: Handedness,
    /// `None` for sources without a gamepad (hands, gaze).
    pub axes: Option<Vec<f32>>,
}

impl XrInputSource {
    pub fn with_axes(handedness: Handedness, axes: Vec<f32>) -> Self {
        Self {
            handedness,
            axes: Some(axes),
        }
    }
}

/// Viewer position and look direction in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadPose {
    pub position: Vec3,
    pub forward: Vec3,
}

impl Default for HeadPose {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 1.6, 0.0),
            forward: Vec3::NEG_Z,
        }
    }
}

/// Per-frame view of an active immersive session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImmersiveSession {
    pub input_sources: Vec<XrInputSource>,
    pub head: HeadPose,
}

/// Reads a thumbstick axis. Profiles with a touchpad report the stick on
/// indices 2/3 and leave 0/1 for the pad; others only have 0/1.
pub fn thumbstick_axis(axes: &[f32], primary: usize, fallback: usize) -> f32 {
    match axes.get(primary).copied() {
        Some(value) if value != 0.0 && !value.is_nan() => value,
        _ => axes
            .get(fallback)
            .copied()
            .filter(|value| !value.is_nan())
            .unwrap_or(0.0),
    }
}

/// Left stick vertical walks, right stick horizontal turns.
pub fn gamepad_contribution(sources: &[XrInputSource], deadzone: f32) -> InputVector {
    let mut input = InputVector::ZERO;
    for source in sources {
        let Some(axes) = source.axes.as_deref() else {
            continue;
        };
        match source.handedness {
            Handedness::Left => {
                let value = thumbstick_axis(axes, 3, 1);
                if value.abs() > deadzone {
                    input.move_forward -= value;
                }
            }
            Handedness::Right => {
                let value = thumbstick_axis(axes, 2, 0);
                if value.abs() > deadzone {
                    input.turn -= value;
                }
            }
            Handedness::None => {}
        }
    }
    input
}
