use glam::Vec2;

use super::InputVector;

/// On-screen joystick driven by a single tracked touch.
#[derive(Debug, Clone, PartialEq)]
pub struct TouchJoystick {
    radius: f32,
    tracked: Option<i32>,
    knob: Vec2,
    vector: Vec2,
}

impl TouchJoystick {
    pub fn new(radius: f32) -> Self {
        Self {
            radius: radius.max(f32::EPSILON),
            tracked: None,
            knob: Vec2::ZERO,
            vector: Vec2::ZERO,
        }
    }

    pub fn touch_start(&mut self, touch_id: i32) -> bool {
        if self.tracked.is_some() {
            return false;
        }
        self.tracked = Some(touch_id);
        true
    }

    pub fn touch_move(&mut self, touch_id: i32, offset: Vec2) -> Option<Vec2> {
        if self.tracked != Some(touch_id) {
            return None;
        }
        let distance = offset.length();
        let knob = if distance > self.radius {
            offset * (self.radius / distance)
        } else {
            offset
        };
        self.knob = knob;
        self.vector = knob / self.radius;
        Some(knob)
    }

    pub fn touch_end(&mut self, touch_id: i32) -> bool {
        if self.tracked != Some(touch_id) {
            return false;
        }
        self.tracked = None;
        self.knob = Vec2::ZERO;
        self.vector = Vec2::ZERO;
        true
    }

    pub fn set_vector(&mut self, vector: Vec2) {
        self.vector = vector;
        self.knob = vector * self.radius;
    }

    pub fn tracked_touch(&self) -> Option<i32> {
        self.tracked
    }

    /// Knob offset from the zone centre in pixels.
    pub fn knob_offset(&self) -> Vec2 {
        self.knob
    }

    /// Normalised stick deflection; screen down is positive `y`.
    pub fn vector(&self) -> Vec2 {
        self.vector
    }
}

/// Maps a joystick deflection to movement. Pushing up (negative `y`) walks
/// forward; each axis is ignored inside the deadzone.
pub fn contribution(vector: Vec2, deadzone: f32) -> InputVector {
    let mut input = InputVector::ZERO;
    if vector.y.abs() > deadzone {
        input.move_forward -= vector.y;
    }
    if vector.x.abs() > deadzone {
        input.turn -= vector.x;
    }
    input
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_to_radius_and_normalises() {
        let mut stick = TouchJoystick::new(35.0);
        assert!(stick.touch_start(7));
        let knob = stick.touch_move(7, Vec2::new(0.0, 70.0)).unwrap();
        assert_eq!(knob, Vec2::new(0.0, 35.0));
        assert_eq!(stick.vector(), Vec2::new(0.0, 1.0));

        stick.touch_move(7, Vec2::new(17.5, 0.0));
        assert_eq!(stick.vector(), Vec2::new(0.5, 0.0));
    }

    #[test]
    fn ignores_untracked_touches() {
        let mut stick = TouchJoystick::new(35.0);
        stick.touch_start(1);
        assert!(!stick.touch_start(2));
        assert_eq!(stick.touch_move(2, Vec2::new(10.0, 10.0)), None);
        assert_eq!(stick.vector(), Vec2::ZERO);
        assert!(!stick.touch_end(2));
        assert_eq!(stick.tracked_touch(), Some(1));
    }

    #[test]
    fn release_recentres_the_knob() {
        let mut stick = TouchJoystick::new(35.0);
        stick.touch_start(3);
        stick.touch_move(3, Vec2::new(-20.0, 5.0));
        assert!(stick.touch_end(3));
        assert_eq!(stick.knob_offset(), Vec2::ZERO);
        assert_eq!(stick.vector(), Vec2::ZERO);
        assert!(stick.touch_start(4));
    }

    #[test]
    fn deadzone_filters_each_axis() {
        let input = contribution(Vec2::new(0.05, 0.5), 0.1);
        assert_eq!(input, InputVector::new(-0.5, 0.0));

        let input = contribution(Vec2::new(-0.3, -0.1), 0.1);
        assert_eq!(input, InputVector::new(0.0, 0.3));
    }
}
