//! Driving the world origin around the viewer.
//!
//! The viewer never moves through tracking space. Instead the world origin
//! is shifted and spun, and both the view matrix and every pointing ray read
//! the resulting [`WorldTransform`].

use glam::{Mat4, Vec3, Vec4};

use crate::projection::WorldTransform;

/// World drive state.
#[derive(Clone, Debug)]
pub struct Locomotion {
    world: WorldTransform,
    /// Turn rate in degrees per second. Positive turns the world clockwise.
    pub drive_angle: f32,
    /// Forward speed in world units per second.
    pub drive_speed: f32,
    bound: f32,
}

impl Locomotion {
    /// Start at `origin`, keeping the world origin within `±far_clip / 2`.
    pub fn new(origin: Vec3, far_clip: f32) -> Self {
        Self {
            world: WorldTransform::new(origin),
            drive_angle: 0.0,
            drive_speed: 0.0,
            bound: far_clip * 0.5,
        }
    }

    pub fn world(&self) -> &WorldTransform {
        &self.world
    }

    /// Put the world back at `origin` with no rotation.
    pub fn reset(&mut self, origin: Vec3) {
        self.world = WorldTransform::new(origin);
    }

    pub fn set_drive(&mut self, angle: f32, speed: f32) {
        self.drive_angle = angle;
        self.drive_speed = speed;
    }

    /// Advance the drive by `dt` seconds with the head at `hmd`.
    ///
    /// Forward motion follows the direction the head faces, turned by the
    /// world rotation but ignoring the head's own position.
    pub fn update(&mut self, hmd: Mat4, dt: f32) {
        self.world.rotation_degrees += -self.drive_angle * dt;

        let hmd_rotation = rotation_only(hmd);
        let direction = (self.world.rotation_matrix() * hmd_rotation) * Vec4::Z;
        let step = direction.truncate() * (-self.drive_speed * dt);

        let bound = Vec3::splat(self.bound);
        self.world.translation = (self.world.translation + step).clamp(-bound, bound);
    }

    /// View matrix for a head pose under the current world placement.
    ///
    /// World rotation is applied between the head's translation and rotation
    /// so looking up or down does not tilt the drive plane.
    pub fn view_matrix(&self, hmd: Mat4) -> Mat4 {
        let world_translation = Mat4::from_translation(self.world.translation);
        let hmd_translation = Mat4::from_translation(hmd.w_axis.truncate());
        (world_translation * hmd_translation * self.world.rotation_matrix() * rotation_only(hmd))
            .inverse()
    }
}

fn rotation_only(m: Mat4) -> Mat4 {
    let mut rotation = m;
    rotation.w_axis = Vec4::W;
    rotation
}
