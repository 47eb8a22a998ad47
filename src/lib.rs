//! Core of the room viewer: a furnished room with an avatar driven by
//! keyboard, touch joystick and XR gamepads.
//!
//! The simulation (input aggregation, locomotion, animation blending, follow
//! camera and console placement) is platform independent and runs headless.
//! Windowing and GPU rendering live in [`render`] and the binary; the
//! browser build adds a canvas renderer and a wasm-bindgen entry point.

pub mod animation;
pub mod app;
pub mod assets;
pub mod config;
pub mod console;
pub mod error;
pub mod follow;
pub mod input;
pub mod locomotion;
pub mod mesh;
pub mod obj;
pub mod render;
pub mod scene;
pub mod simulation;
#[cfg(target_arch = "wasm32")]
pub mod wasm;

pub use animation::{AnimationBlender, AnimationClip, AnimationWeights};
#[cfg(not(target_arch = "wasm32"))]
pub use assets::AssetLoader;
pub use assets::{AssetEvent, AvatarNode};
pub use config::ViewerConfig;
pub use console::{shared_console, ConsoleHandle, ConsoleLogger, DebugConsole};
pub use error::{AssetError, AssetKind, ViewerError};
pub use follow::{ConsolePlane, FollowRig, FollowState, OrbitCamera, PresentationMode};
pub use input::xr::{Handedness, HeadPose, ImmersiveSession, XrInputSource};
pub use input::{InputSnapshot, InputState, InputVector, KeyCode, NamedKey};
pub use locomotion::{Avatar, Gait, LocomotionController};
pub use mesh::Mesh;
pub use obj::load_obj_from_str;
pub use render::{CameraParams, FrameView, LightParams, Renderer};
pub use scene::{Light, LightKind, Scene, SceneObject, Shape};
pub use simulation::{AvatarSlot, FrameReport, Simulation};
