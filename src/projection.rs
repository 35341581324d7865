//! Turning tracked poses into world-space rays.
//!
//! Every ray passes through the same chain of transforms:
//!
//! ```text
//! world_from_device = world_translation * rotate_y(world_rotation) * head_pose * local
//! ```
//!
//! where `local` is the controller pose (6DOF), a view-anchored controller
//! pose (3DOF, see [`three_dof_anchor`]), or identity for the gaze ray. The
//! ray starts at the translation of `world_from_device` and points along its
//! local `-Z` axis.

use glam::{Mat3, Mat4, Vec3};
use serde::{Deserialize, Serialize};

use crate::picking::Ray;

/// Height of a 3DOF controller model below the eye.
const ANCHOR_HEIGHT: f32 = -0.12;
/// Sideways distance of a 3DOF controller model from the view center.
const ANCHOR_SIDE: f32 = 0.1;
/// Forward distance of the first pair of 3DOF controller models.
const ANCHOR_DEPTH: f32 = -0.45;
/// Extra depth for each additional pair of controllers.
const ANCHOR_PAIR_STEP: f32 = 0.3;

/// Placement of the movable world origin.
///
/// The scene is not centered on the tracking origin: locomotion shifts and
/// spins it, and every ray has to follow.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorldTransform {
    /// World origin offset.
    pub translation: Vec3,
    /// Rotation about the Y axis, in degrees.
    pub rotation_degrees: f32,
}

impl Default for WorldTransform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation_degrees: 0.0,
        }
    }
}

impl WorldTransform {
    pub fn new(translation: Vec3) -> Self {
        Self {
            translation,
            rotation_degrees: 0.0,
        }
    }

    pub fn rotated(mut self, degrees: f32) -> Self {
        self.rotation_degrees = degrees;
        self
    }

    pub fn rotation_matrix(&self) -> Mat4 {
        Mat4::from_rotation_y(self.rotation_degrees.to_radians())
    }

    /// `translation * rotate_y(rotation)`.
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_translation(self.translation) * self.rotation_matrix()
    }
}

/// Yaw, pitch, and roll (radians) read from the inverse of a head pose.
pub fn head_angles(head: Mat4) -> (f32, f32, f32) {
    let m = head.inverse().to_cols_array();
    let yaw = (-m[8]).atan2(m[10]);
    let pitch = (-m[9]).clamp(-1.0, 1.0).asin();
    let roll = m[1].atan2(m[5]);
    (yaw, pitch, roll)
}

/// Fixed head-relative position of a 3DOF controller model.
///
/// Slot 0 sits to the right, slot 1 to the left; each further pair steps
/// back by a constant distance.
pub fn anchor_offset(slot: usize) -> Vec3 {
    let x = if slot % 2 == 0 { ANCHOR_SIDE } else { -ANCHOR_SIDE };
    let z = ANCHOR_DEPTH - (slot / 2) as f32 * ANCHOR_PAIR_STEP;
    Vec3::new(x, ANCHOR_HEIGHT, z)
}

/// Head-relative transform of a controller that only reports orientation.
///
/// A 3DOF controller has no position of its own, so it is pinned to
/// [`anchor_offset`] in front of the viewer. The head's rotation is undone
/// first so that, once the head pose is applied again, the controller keeps
/// the orientation it reports in tracking space.
pub fn three_dof_anchor(head: Mat4, controller: Mat4, slot: usize) -> Mat4 {
    let (yaw, pitch, roll) = head_angles(head);
    let unrotate =
        Mat4::from_rotation_z(roll) * Mat4::from_rotation_x(pitch) * Mat4::from_rotation_y(-yaw);
    let mut local = unrotate * controller;
    local.w_axis = anchor_offset(slot).extend(1.0);
    local
}

/// Build a ray from a `world_from_device` matrix.
///
/// Origin is the translation column; direction is the transformed local
/// forward axis (`-Z`), normalized.
pub fn ray_from_matrix(world_from_device: Mat4) -> Ray {
    let origin = world_from_device.w_axis.truncate();
    let forward = Mat3::from_mat4(world_from_device) * Vec3::NEG_Z;
    Ray::new(origin, forward)
}

/// World-space pointing ray of a controller.
///
/// Pass `anchor_slot` to treat the controller as 3DOF and pin it in view;
/// `None` uses the reported pose as-is.
pub fn controller_ray(
    head: Mat4,
    controller: Mat4,
    world: &WorldTransform,
    anchor_slot: Option<usize>,
) -> Ray {
    let local = match anchor_slot {
        Some(slot) => three_dof_anchor(head, controller, slot),
        None => controller,
    };
    ray_from_matrix(world.matrix() * head * local)
}

/// World-space gaze ray straight out of the head.
pub fn gaze_ray(head: Mat4, world: &WorldTransform) -> Ray {
    ray_from_matrix(world.matrix() * head)
}
