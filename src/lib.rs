//! # Sightline
//!
//! **Controller and gaze focus for VR frame players.**
//!
//! Feed it the tracked poses for a frame and it tells you which device is
//! pointing at the target: the right controller, the left controller, or
//! nobody (the headset). The answer comes with a highlight color and routes
//! trigger presses to the controller that owns focus.
//!
//! ## Quick Start
//!
//! ```
//! use sightline::*;
//!
//! let mut player = FramePlayer::new(
//!     SessionConfig::new()
//!         .three_dof(false)
//!         .locomotion(false)
//!         .world_origin(Vec3::ZERO)
//!         .sphere([0.0, 0.0, -4.0], 0.8),
//! )
//! .unwrap();
//!
//! let poses = DevicePoses::new()
//!     .with(DeviceRole::Hmd, DevicePose::tracked(Mat4::IDENTITY))
//!     .with(DeviceRole::ControllerRight, DevicePose::tracked(Mat4::IDENTITY));
//!
//! let out = player.step(&FrameInput::new(poses));
//! assert_eq!(out.focus.owner, DeviceRole::ControllerRight);
//! assert_eq!(out.focus.color, Color::RIGHT_HAND);
//! ```
//!
//! ## Pieces
//!
//! - [`Ray::intersect_sphere`] — nearest forward hit on a sphere
//! - [`controller_ray`] / [`gaze_ray`] — poses to world-space rays
//! - [`FocusTracker`] — edge-triggered focus ownership
//! - [`FramePlayer`] — the per-frame driver tying it together

mod color;
mod config;
mod device;
mod error;
mod focus;
mod input;
mod locomotion;
mod picking;
mod player;
mod projection;
mod transform;

pub use color::Color;
pub use config::{GazeTriggerType, InteractionMode, SessionConfig, next_render_scale};
pub use device::{DevicePose, DevicePoses, DeviceRole};
pub use error::{Result, SightlineError};
pub use focus::{FocusHandoff, FocusState, FocusTracker, highlight};
pub use input::{Button, ButtonAction, ButtonEvent, Input};
pub use locomotion::Locomotion;
pub use picking::{Collider, HIT_EPSILON, Ray, RayHit, ray_hits_entity, raycast, raycast_all};
pub use player::{FrameInput, FrameOutput, FramePlayer, PointerRay, PoseReport, Target};
pub use projection::{
    WorldTransform, anchor_offset, controller_ray, gaze_ray, head_angles, ray_from_matrix,
    three_dof_anchor,
};
pub use transform::Transform;

// Re-export glam math types for convenience
pub use glam::{Mat3, Mat4, Quat, Vec3, Vec4};

// ECS support
pub use hecs::{Entity, World};
