//! Idle/walk crossfade.
//!
//! Both clips play for as long as the blender exists; locomotion only moves
//! their weights. Weights are eased with a fixed per-frame factor, so the
//! crossfade takes about ten frames whatever the frame rate.

use serde::{Deserialize, Serialize};

use crate::error::AssetError;
use crate::locomotion::Gait;

/// Named clip as described by the animation manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationClip {
    pub name: String,
    /// Length in seconds.
    pub duration: f32,
}

impl AnimationClip {
    pub fn new(name: impl Into<String>, duration: f32) -> Self {
        Self {
            name: name.into(),
            duration,
        }
    }
}

/// A looping clip with a blend weight.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipAction {
    clip: AnimationClip,
    time: f32,
    weight: f32,
}

impl ClipAction {
    fn new(clip: AnimationClip, weight: f32) -> Self {
        Self {
            clip,
            time: 0.0,
            weight,
        }
    }

    pub fn clip(&self) -> &AnimationClip {
        &self.clip
    }

    /// Playback position within the clip, in seconds.
    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn weight(&self) -> f32 {
        self.weight
    }

    fn advance(&mut self, dt: f32) {
        if self.clip.duration > 0.0 {
            self.time = (self.time + dt).rem_euclid(self.clip.duration);
        }
    }

    fn ease_toward(&mut self, target: f32, factor: f32) {
        self.weight = lerp(self.weight, target, factor);
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationWeights {
    pub idle: f32,
    pub walk: f32,
}

/// Crossfades the idle and walk actions.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationBlender {
    idle: ClipAction,
    walk: ClipAction,
    smoothing: f32,
}

impl AnimationBlender {
    /// Picks the first clip named like `idle`/`walk`, falling back to the
    /// first and second clip respectively.
    pub fn from_clips(clips: &[AnimationClip], smoothing: f32) -> Result<Self, AssetError> {
        let idle = find_clip(clips, "idle", 0).ok_or(AssetError::MissingClip("idle"))?;
        let walk = find_clip(clips, "walk", 1).ok_or(AssetError::MissingClip("walk"))?;
        Ok(Self {
            idle: ClipAction::new(idle.clone(), 1.0),
            walk: ClipAction::new(walk.clone(), 0.0),
            smoothing,
        })
    }

    /// Eases both weights toward the gait's targets by one frame step.
    pub fn blend(&mut self, gait: Gait) {
        let (idle_target, walk_target) = match gait {
            Gait::Walk => (0.0, 1.0),
            Gait::Idle => (1.0, 0.0),
        };
        self.walk.ease_toward(walk_target, self.smoothing);
        self.idle.ease_toward(idle_target, self.smoothing);
    }

    /// Advances both actions; neither ever stops playing.
    pub fn advance(&mut self, dt: f32) {
        self.idle.advance(dt);
        self.walk.advance(dt);
    }

    pub fn weights(&self) -> AnimationWeights {
        AnimationWeights {
            idle: self.idle.weight,
            walk: self.walk.weight,
        }
    }

    pub fn idle(&self) -> &ClipAction {
        &self.idle
    }

    pub fn walk(&self) -> &ClipAction {
        &self.walk
    }
}

fn find_clip<'a>(
    clips: &'a [AnimationClip],
    keyword: &str,
    fallback: usize,
) -> Option<&'a AnimationClip> {
    clips
        .iter()
        .find(|clip| clip.name.to_lowercase().contains(keyword))
        .or_else(|| clips.get(fallback))
}

/// Linear interpolation; with `t` in [0, 1] the result stays between `a` and `b`.
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clips() -> Vec<AnimationClip> {
        vec![
            AnimationClip::new("SambaDance", 4.0),
            AnimationClip::new("Walking", 1.2),
            AnimationClip::new("Idle_Breathing", 3.0),
        ]
    }

    #[test]
    fn selects_clips_by_name() {
        let blender = AnimationBlender::from_clips(&clips(), 0.1).unwrap();
        assert_eq!(blender.idle().clip().name, "Idle_Breathing");
        assert_eq!(blender.walk().clip().name, "Walking");
    }

    #[test]
    fn falls_back_to_clip_order() {
        let clips = vec![AnimationClip::new("A", 1.0), AnimationClip::new("B", 1.0)];
        let blender = AnimationBlender::from_clips(&clips, 0.1).unwrap();
        assert_eq!(blender.idle().clip().name, "A");
        assert_eq!(blender.walk().clip().name, "B");
    }

    #[test]
    fn missing_clips_are_rejected() {
        assert!(matches!(
            AnimationBlender::from_clips(&[], 0.1),
            Err(AssetError::MissingClip("idle"))
        ));
        let single = vec![AnimationClip::new("Idle", 1.0)];
        assert!(matches!(
            AnimationBlender::from_clips(&single, 0.1),
            Err(AssetError::MissingClip("walk"))
        ));
    }

    #[test]
    fn walking_crossfades_by_a_tenth_per_frame() {
        let mut blender = AnimationBlender::from_clips(&clips(), 0.1).unwrap();
        blender.blend(Gait::Walk);
        let weights = blender.weights();
        assert!((weights.walk - 0.1).abs() < 1e-6);
        assert!((weights.idle - 0.9).abs() < 1e-6);
    }

    #[test]
    fn weights_stay_in_unit_range() {
        let mut blender = AnimationBlender::from_clips(&clips(), 0.1).unwrap();
        for frame in 0..500 {
            let gait = if (frame / 37) % 2 == 0 { Gait::Walk } else { Gait::Idle };
            blender.blend(gait);
            let weights = blender.weights();
            assert!((0.0..=1.0).contains(&weights.idle));
            assert!((0.0..=1.0).contains(&weights.walk));
        }
    }

    #[test]
    fn clip_time_loops() {
        let mut blender = AnimationBlender::from_clips(&clips(), 0.1).unwrap();
        blender.advance(1.5);
        assert!((blender.walk().time() - 0.3).abs() < 1e-5);
        assert!((blender.idle().time() - 1.5).abs() < 1e-5);
    }
}
