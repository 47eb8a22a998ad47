//! Avatar and animation loading.
//!
//! Loads complete exactly once, successfully or not, and are delivered as
//! [`AssetEvent`]s to `Simulation::apply_asset_event`. Clips are requested
//! only after the avatar arrived, so a missing avatar never produces an
//! animation event.

use roxmltree::Document;

use crate::animation::AnimationClip;
use crate::error::AssetError;
use crate::locomotion::Avatar;
use crate::mesh::Mesh;
use crate::obj::load_obj_from_str;

/// Successful avatar load: the mesh and its initial placement.
#[derive(Debug, Clone, PartialEq)]
pub struct AvatarNode {
    pub mesh: Mesh,
    pub placement: Avatar,
}

/// Completion of one asynchronous load.
#[derive(Debug)]
pub enum AssetEvent {
    Avatar(Result<AvatarNode, AssetError>),
    Animations(Result<Vec<AnimationClip>, AssetError>),
}

/// Builds the avatar node from OBJ text. The node starts at the origin facing +Z.
pub fn avatar_from_obj(source: &str, data: &str) -> Result<AvatarNode, AssetError> {
    let mesh = load_obj_from_str(data).map_err(|err| AssetError::Mesh {
        path: source.to_string(),
        reason: format!("{err:#}"),
    })?;
    Ok(AvatarNode {
        mesh,
        placement: Avatar::default(),
    })
}

/// Parses `<animations><clip name=".." duration=".."/></animations>`.
pub fn clips_from_manifest(source: &str, xml: &str) -> Result<Vec<AnimationClip>, AssetError> {
    let manifest_error = |reason: String| AssetError::Manifest {
        path: source.to_string(),
        reason,
    };
    let document = Document::parse(xml).map_err(|err| manifest_error(err.to_string()))?;
    document
        .descendants()
        .filter(|node| node.has_tag_name("clip"))
        .map(|node| -> Result<AnimationClip, AssetError> {
            let name = node
                .attribute("name")
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .ok_or_else(|| manifest_error("<clip> is missing a name".to_string()))?;
            let duration = node
                .attribute("duration")
                .ok_or_else(|| manifest_error(format!("clip {name} has no duration")))?
                .trim()
                .parse::<f32>()
                .map_err(|err| manifest_error(format!("clip {name} duration: {err}")))?;
            Ok(AnimationClip::new(name, duration))
        })
        .collect()
}

#[cfg(not(target_arch = "wasm32"))]
pub use native::{load_animations, load_avatar, AssetLoader};

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::fs;
    use std::path::{Path, PathBuf};
    use std::sync::mpsc::{self, Receiver};
    use std::thread;

    use super::{avatar_from_obj, clips_from_manifest, AssetEvent, AvatarNode};
    use crate::animation::AnimationClip;
    use crate::error::AssetError;

    fn read(path: &Path) -> Result<String, AssetError> {
        fs::read_to_string(path).map_err(|source| AssetError::Io {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn load_avatar(path: &Path) -> Result<AvatarNode, AssetError> {
        avatar_from_obj(&path.display().to_string(), &read(path)?)
    }

    pub fn load_animations(path: &Path) -> Result<Vec<AnimationClip>, AssetError> {
        clips_from_manifest(&path.display().to_string(), &read(path)?)
    }

    /// Loads the avatar, then its clips, on a background thread.
    pub struct AssetLoader {
        events: Receiver<AssetEvent>,
    }

    impl AssetLoader {
        pub fn spawn(avatar: PathBuf, animations: PathBuf) -> Self {
            let (sender, events) = mpsc::channel();
            thread::spawn(move || {
                let avatar = load_avatar(&avatar);
                let loaded = avatar.is_ok();
                if sender.send(AssetEvent::Avatar(avatar)).is_err() || !loaded {
                    return;
                }
                let _ = sender.send(AssetEvent::Animations(load_animations(&animations)));
            });
            Self { events }
        }

        /// Events that completed since the last poll. Never blocks.
        pub fn poll(&self) -> Vec<AssetEvent> {
            self.events.try_iter().collect()
        }

        /// Blocks until every load has completed.
        pub fn wait(self) -> Vec<AssetEvent> {
            self.events.iter().collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_clip_manifest() {
        let xml = r#"<animations>
            <clip name="Idle" duration="2.5"/>
            <clip name=" Walk " duration="1.1"/>
        </animations>"#;
        let clips = clips_from_manifest("anim.xml", xml).unwrap();
        assert_eq!(
            clips,
            vec![AnimationClip::new("Idle", 2.5), AnimationClip::new("Walk", 1.1)]
        );
    }

    #[test]
    fn manifest_errors_name_the_source() {
        let err = clips_from_manifest("anim.xml", "<animations><clip name=\"Idle\"/></animations>")
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid animation manifest anim.xml: clip Idle has no duration"
        );
        assert!(clips_from_manifest("anim.xml", "<animations>").is_err());
    }

    #[test]
    fn avatar_starts_at_origin() {
        let node = avatar_from_obj("a.obj", "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").unwrap();
        assert_eq!(node.placement, Avatar::default());
        assert_eq!(node.mesh.indices.len(), 3);
        assert!(matches!(
            avatar_from_obj("a.obj", "# empty"),
            Err(AssetError::Mesh { .. })
        ));
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn loader_skips_clips_when_avatar_fails() {
        let loader = AssetLoader::spawn(
            "/nonexistent/avatar.obj".into(),
            "/nonexistent/animations.xml".into(),
        );
        let events = loader.wait();
        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0],
            AssetEvent::Avatar(Err(AssetError::Io { .. }))
        ));
    }
}
