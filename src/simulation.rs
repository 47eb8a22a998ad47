//! Per-frame update of the avatar, its animations and the follow rig.
//!
//! [`Simulation`] owns every piece of mutable viewer state. The host calls
//! [`Simulation::frame`] once per displayed frame and feeds load completions
//! through [`Simulation::apply_asset_event`]; nothing else mutates it.

use log::{info, warn};

use crate::animation::{AnimationBlender, AnimationWeights};
use crate::assets::AssetEvent;
use crate::config::ViewerConfig;
use crate::error::{AssetKind, ViewerError};
use crate::follow::{FollowRig, FollowState};
use crate::input::xr::ImmersiveSession;
use crate::input::{self, InputSnapshot, InputVector};
use crate::locomotion::{Avatar, Gait, LocomotionController};
use crate::mesh::Mesh;

/// Whether the avatar asset has arrived.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum AvatarSlot {
    #[default]
    Absent,
    Present(Avatar),
}

impl AvatarSlot {
    pub fn get(&self) -> Option<&Avatar> {
        match self {
            Self::Present(avatar) => Some(avatar),
            Self::Absent => None,
        }
    }

    pub fn get_mut(&mut self) -> Option<&mut Avatar> {
        match self {
            Self::Present(avatar) => Some(avatar),
            Self::Absent => None,
        }
    }
}

/// What a single frame did, for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    pub input: InputVector,
    /// `None` while the avatar is absent.
    pub gait: Option<Gait>,
    pub follow: FollowState,
}

#[derive(Debug, Clone)]
pub struct Simulation {
    config: ViewerConfig,
    locomotion: LocomotionController,
    avatar: AvatarSlot,
    avatar_mesh: Option<Mesh>,
    animations: Option<AnimationBlender>,
    follow: FollowRig,
}

impl Simulation {
    pub fn new(config: ViewerConfig) -> Self {
        Self {
            locomotion: LocomotionController::new(config.walk_speed, config.turn_speed),
            follow: FollowRig::new(&config),
            avatar: AvatarSlot::Absent,
            avatar_mesh: None,
            animations: None,
            config,
        }
    }

    /// Applies a finished load. A failed load leaves its slot empty for good.
    pub fn apply_asset_event(&mut self, event: AssetEvent) -> Result<(), ViewerError> {
        match event {
            AssetEvent::Avatar(Ok(node)) => {
                self.avatar = AvatarSlot::Present(node.placement);
                self.avatar_mesh = Some(node.mesh);
                info!("Avatar loaded");
            }
            AssetEvent::Avatar(Err(source)) => {
                return Err(ViewerError::asset(AssetKind::Avatar, source));
            }
            AssetEvent::Animations(Ok(clips)) => {
                if self.avatar.get().is_none() {
                    warn!("ignoring {} clip(s) loaded without an avatar", clips.len());
                    return Ok(());
                }
                let blender = AnimationBlender::from_clips(&clips, self.config.weight_smoothing)
                    .map_err(|source| ViewerError::asset(AssetKind::Animations, source))?;
                self.animations = Some(blender);
                info!("Animations loaded");
            }
            AssetEvent::Animations(Err(source)) => {
                return Err(ViewerError::asset(AssetKind::Animations, source));
            }
        }
        Ok(())
    }

    /// Aggregates input, moves the avatar, blends its clips and updates the
    /// follow rig. Everything past input aggregation is skipped while the
    /// avatar is absent.
    pub fn frame(
        &mut self,
        snapshot: &InputSnapshot,
        session: Option<&ImmersiveSession>,
        dt: f32,
    ) -> FrameReport {
        let input = input::aggregate(snapshot, session, &self.config);
        let Some(avatar) = self.avatar.get_mut() else {
            return FrameReport {
                input,
                gait: None,
                follow: FollowState::NoAvatar,
            };
        };

        let gait = self.locomotion.step(avatar, input, dt);
        if let Some(blender) = self.animations.as_mut() {
            blender.blend(gait);
            blender.advance(dt);
        }
        let follow = self.follow.update(Some(&*avatar), session);

        FrameReport {
            input,
            gait: Some(gait),
            follow,
        }
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn avatar(&self) -> Option<&Avatar> {
        self.avatar.get()
    }

    pub fn avatar_slot(&self) -> &AvatarSlot {
        &self.avatar
    }

    pub fn avatar_mesh(&self) -> Option<&Mesh> {
        self.avatar_mesh.as_ref()
    }

    pub fn animations(&self) -> Option<&AnimationBlender> {
        self.animations.as_ref()
    }

    pub fn animation_weights(&self) -> Option<AnimationWeights> {
        self.animations.as_ref().map(AnimationBlender::weights)
    }

    pub fn follow(&self) -> &FollowRig {
        &self.follow
    }
}
