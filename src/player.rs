//! The per-frame driver.
//!
//! [`FramePlayer`] owns the scene (a single pickable target sphere in a
//! `hecs` world), the focus state machine, the world drive, and controller
//! button state. Each call to [`FramePlayer::step`] consumes one
//! [`FrameInput`] snapshot from the tracking runtime and returns what the
//! renderer needs for that frame.
//!
//! Within a frame the order is:
//!
//! 1. Button events are applied. Activations route to the controller that
//!    held focus at the end of the previous frame.
//! 2. The world drive advances and the view matrix is rebuilt.
//! 3. Unless the system has captured input, every usable controller casts a
//!    ray at the target and the focus tracker is updated.
//! 4. In gaze mode the head ray runs last and decides focus on its own.

use glam::{Mat4, Vec3};
use tracing::{debug, info, trace};

use crate::config::{GazeTriggerType, InteractionMode, SessionConfig, next_render_scale};
use crate::device::{DevicePoses, DeviceRole};
use crate::error::{Result, SightlineError};
use crate::focus::{FocusState, FocusTracker};
use crate::input::{Button, ButtonEvent, Input};
use crate::locomotion::Locomotion;
use crate::picking::{Collider, Ray, ray_hits_entity};
use crate::projection::{controller_ray, gaze_ray};
use crate::transform::Transform;

/// Distance the target jumps sideways when activated.
const TARGET_NUDGE: f32 = 1.0;

/// Marks the entity that focus is computed against.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Target {
    /// Position the target returns to on every second activation.
    pub home: Vec3,
}

/// Everything the runtime reports for one frame.
#[derive(Clone, Debug, Default)]
pub struct FrameInput {
    pub poses: DevicePoses,
    pub events: Vec<ButtonEvent>,
    /// The system UI has taken input focus; skip all hit testing.
    pub input_captured: bool,
    /// Seconds since the previous frame.
    pub dt: f32,
}

impl FrameInput {
    pub fn new(poses: DevicePoses) -> Self {
        Self {
            poses,
            ..Default::default()
        }
    }

    pub fn event(mut self, event: ButtonEvent) -> Self {
        self.events.push(event);
        self
    }

    pub fn captured(mut self, captured: bool) -> Self {
        self.input_captured = captured;
        self
    }

    pub fn dt(mut self, dt: f32) -> Self {
        self.dt = dt;
        self
    }
}

/// A ray cast this frame and where it struck the target, if anywhere.
#[derive(Clone, Copy, Debug)]
pub struct PointerRay {
    pub device: DeviceRole,
    pub ray: Ray,
    pub hit: Option<Vec3>,
}

/// Counts reported when the set of tracked devices changes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoseReport {
    pub valid_poses: usize,
    pub controllers: usize,
    pub classes: String,
}

/// What the renderer needs after a frame.
#[derive(Clone, Debug)]
pub struct FrameOutput {
    pub focus: FocusState,
    pub sphere_center: Vec3,
    pub pointers: Vec<PointerRay>,
    pub view: Mat4,
    pub render_scale: f32,
    /// The target was moved by an activation this frame.
    pub activated: bool,
}

/// Per-frame focus driver for a single target sphere.
pub struct FramePlayer {
    config: SessionConfig,
    world: hecs::World,
    target: hecs::Entity,
    focus: FocusTracker,
    locomotion: Locomotion,
    input: Input,
    head: Mat4,
    view: Mat4,
    report: Option<PoseReport>,
}

impl FramePlayer {
    pub fn new(config: SessionConfig) -> Result<Self> {
        config.validate()?;

        let mut world = hecs::World::new();
        let target = world.spawn((
            Transform::from_position(config.sphere_center),
            Collider::sphere(config.sphere_radius),
            Target {
                home: config.sphere_center,
            },
        ));

        info!(
            mode = %config.interaction_mode,
            gaze_trigger = %config.gaze_trigger,
            three_dof = config.three_dof,
            "frame player ready"
        );

        Ok(Self {
            focus: FocusTracker::new(config.handoff),
            locomotion: Locomotion::new(config.world_origin, config.far_clip),
            config,
            world,
            target,
            input: Input::new(),
            head: Mat4::IDENTITY,
            view: Mat4::IDENTITY,
            report: None,
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn focus(&self) -> FocusState {
        self.focus.state()
    }

    pub fn locomotion(&self) -> &Locomotion {
        &self.locomotion
    }

    pub fn locomotion_mut(&mut self) -> &mut Locomotion {
        &mut self.locomotion
    }

    /// The scene world, for callers that add their own pickable entities.
    pub fn world(&self) -> &hecs::World {
        &self.world
    }

    pub fn target(&self) -> hecs::Entity {
        self.target
    }

    /// Device counts from the last frame that changed them.
    pub fn pose_report(&self) -> Option<&PoseReport> {
        self.report.as_ref()
    }

    pub fn sphere_center(&self) -> Vec3 {
        self.world
            .get::<&Transform>(self.target)
            .map(|transform| transform.position)
            .unwrap_or(self.config.sphere_center)
    }

    /// SystemDefault → Gaze → Controller → SystemDefault.
    pub fn switch_interaction_mode(&mut self) -> InteractionMode {
        self.config.interaction_mode = self.config.interaction_mode.next();
        info!(mode = %self.config.interaction_mode, "interaction mode switched");
        self.config.interaction_mode
    }

    /// The runtime changed the mode on its own.
    pub fn set_interaction_mode(&mut self, mode: InteractionMode) {
        if self.config.interaction_mode != mode {
            info!(mode = %mode, "interaction mode changed by system");
            self.config.interaction_mode = mode;
        }
    }

    /// Timeout → Button → TimeoutButton → Timeout.
    pub fn switch_gaze_trigger_type(&mut self) -> GazeTriggerType {
        self.config.gaze_trigger = self.config.gaze_trigger.next();
        info!(gaze_trigger = %self.config.gaze_trigger, "gaze trigger type switched");
        self.config.gaze_trigger
    }

    pub fn switch_render_scale(&mut self) -> f32 {
        self.config.render_scale = next_render_scale(self.config.render_scale);
        info!(scale = self.config.render_scale, "render scale switched");
        self.config.render_scale
    }

    /// Activate the target with `device`.
    ///
    /// Only the controller holding focus can move the target. The first
    /// activation nudges it toward that controller's side, the next one puts
    /// it back home. Returns true if the target moved.
    pub fn activate(&mut self, device: DeviceRole) -> Result<bool> {
        if !device.is_controller() {
            return Err(SightlineError::NotAController(device));
        }
        Ok(self.move_target(device))
    }

    fn move_target(&mut self, device: DeviceRole) -> bool {
        if self.focus.owner() != device {
            return false;
        }

        let nudge = match device {
            DeviceRole::ControllerLeft => Vec3::new(-TARGET_NUDGE, 0.0, 0.0),
            _ => Vec3::new(TARGET_NUDGE, 0.0, 0.0),
        };

        let Ok((transform, target)) = self
            .world
            .query_one_mut::<(&mut Transform, &Target)>(self.target)
        else {
            return false;
        };
        transform.position = if transform.position == target.home {
            target.home + nudge
        } else {
            target.home
        };
        debug!(device = %device, center = ?transform.position, "target moved");
        true
    }

    /// Run one frame.
    pub fn step(&mut self, frame: &FrameInput) -> FrameOutput {
        let activated = self.apply_input(frame);

        let hmd = frame.poses.tracked(DeviceRole::Hmd);
        if let Some(hmd) = hmd {
            self.head = hmd;
            self.view = if self.config.locomotion {
                self.locomotion.update(hmd, frame.dt);
                self.locomotion.view_matrix(hmd)
            } else {
                hmd.inverse()
            };
        }

        let mut pointers = Vec::new();
        let controllers = if frame.input_captured {
            trace!("input captured by system, skipping hit tests");
            self.report.as_ref().map_or(0, |report| report.controllers)
        } else {
            self.update_controller_focus(&frame.poses, &mut pointers);
            let controllers = pointers.len();
            if self.config.interaction_mode == InteractionMode::Gaze && hmd.is_some() {
                self.update_gaze_focus(&mut pointers);
            }
            controllers
        };
        self.report_poses(&frame.poses, controllers);

        FrameOutput {
            focus: self.focus.state(),
            sphere_center: self.sphere_center(),
            pointers,
            view: self.view,
            render_scale: self.config.render_scale,
            activated,
        }
    }

    fn apply_input(&mut self, frame: &FrameInput) -> bool {
        self.input.begin_frame();
        for role in DeviceRole::CONTROLLERS {
            if !frame.poses.is_connected(role) {
                self.input.release_device(role);
            }
        }
        for event in &frame.events {
            self.input.handle_event(event);
        }

        let mut activated = false;
        let mut menu = false;
        for role in DeviceRole::CONTROLLERS {
            let connected = frame.poses.is_connected(role);
            if self.input.activate_pressed(role, connected) {
                activated |= self.move_target(role);
            }
            menu |= connected && self.input.button_pressed(role, Button::Menu);
        }
        if menu {
            self.switch_render_scale();
        }
        activated
    }

    fn cast(&self, device: DeviceRole, ray: Ray) -> PointerRay {
        let hit = ray_hits_entity(&self.world, &ray, self.target).map(|hit| hit.point);
        PointerRay { device, ray, hit }
    }

    fn update_controller_focus(&mut self, poses: &DevicePoses, pointers: &mut Vec<PointerRay>) {
        let world = *self.locomotion.world();
        let mut hits = [None, None];

        for (slot, role) in DeviceRole::CONTROLLERS.into_iter().enumerate() {
            let Some(pose) = poses.usable(role) else {
                continue;
            };
            // Controllers with their own positional tracking are never anchored.
            let anchor = if self.config.three_dof && !pose.six_dof {
                role.anchor_slot()
            } else {
                None
            };
            let pointer = self.cast(
                role,
                controller_ray(self.head, pose.transform, &world, anchor),
            );
            hits[slot] = Some(pointer.hit.is_some());
            pointers.push(pointer);
        }

        self.focus.update_controllers(hits[0], hits[1]);
    }

    fn update_gaze_focus(&mut self, pointers: &mut Vec<PointerRay>) {
        let pointer = self.cast(DeviceRole::Hmd, gaze_ray(self.head, self.locomotion.world()));
        self.focus
            .update_gaze(pointer.hit.is_some(), self.config.default_controller);
        pointers.push(pointer);
    }

    fn report_poses(&mut self, poses: &DevicePoses, controllers: usize) {
        let report = PoseReport {
            valid_poses: poses.valid_count(),
            controllers,
            classes: poses.pose_classes(),
        };
        if self.report.as_ref() != Some(&report) {
            debug!(
                poses = report.valid_poses,
                classes = %report.classes,
                controllers = report.controllers,
                "tracked devices changed"
            );
            self.report = Some(report);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::device::DevicePose;
    use crate::focus::FocusHandoff;

    use DeviceRole::{ControllerLeft as Left, ControllerRight as Right, Hmd};

    /// Controllers unanchored and the world at the tracking origin, so
    /// controller poses are world poses offset by the head.
    fn player(config: SessionConfig) -> FramePlayer {
        FramePlayer::new(
            config
                .three_dof(false)
                .locomotion(false)
                .world_origin(Vec3::ZERO)
                .sphere([0.0, 0.0, -4.0], 0.8),
        )
        .unwrap()
    }

    fn aimed(hit: bool) -> DevicePose {
        // Straight down -Z hits the sphere; turned around it misses.
        let transform = if hit {
            Mat4::IDENTITY
        } else {
            Mat4::from_rotation_y(std::f32::consts::PI)
        };
        DevicePose::tracked(transform)
    }

    fn frame(right: Option<bool>, left: Option<bool>) -> FrameInput {
        let mut poses = DevicePoses::new().with(Hmd, DevicePose::tracked(Mat4::IDENTITY));
        if let Some(hit) = right {
            poses.set(Right, aimed(hit));
        }
        if let Some(hit) = left {
            poses.set(Left, aimed(hit));
        }
        FrameInput::new(poses).dt(1.0 / 60.0)
    }

    #[test]
    fn controller_frames_drive_focus_and_color() {
        let mut player = player(SessionConfig::new());
        let script = [
            (false, false),
            (true, false),
            (false, false),
            (false, true),
            (false, false),
        ];
        let expected = [
            (Hmd, Color::NEUTRAL),
            (Right, Color::RIGHT_HAND),
            (Hmd, Color::NEUTRAL),
            (Left, Color::LEFT_HAND),
            (Hmd, Color::NEUTRAL),
        ];
        for ((right, left), (owner, color)) in script.into_iter().zip(expected) {
            let out = player.step(&frame(Some(right), Some(left)));
            assert_eq!(out.focus.owner, owner);
            assert_eq!(out.focus.color, color);
        }
    }

    #[test]
    fn pointers_report_hit_points() {
        let mut player = player(SessionConfig::new());
        let out = player.step(&frame(Some(true), Some(false)));
        assert_eq!(out.pointers.len(), 2);

        let right = out.pointers.iter().find(|p| p.device == Right).unwrap();
        let point = right.hit.unwrap();
        assert!((point - Vec3::new(0.0, 0.0, -3.2)).length() < 1e-4);

        let left = out.pointers.iter().find(|p| p.device == Left).unwrap();
        assert!(left.hit.is_none());
    }

    #[test]
    fn disconnected_controller_is_skipped() {
        let mut player = player(SessionConfig::new());
        player.step(&frame(Some(true), None));
        assert_eq!(player.focus().owner, Right);

        // Right drops out: no release edge, focus stays.
        let out = player.step(&frame(None, None));
        assert!(out.pointers.is_empty());
        assert_eq!(out.focus.owner, Right);
    }

    #[test]
    fn captured_input_freezes_focus() {
        let mut player = player(SessionConfig::new());
        player.step(&frame(Some(true), None));
        let out = player.step(&frame(Some(false), None).captured(true));
        assert_eq!(out.focus.owner, Right);
        assert!(out.pointers.is_empty());
    }

    #[test]
    fn gaze_mode_uses_head_ray_and_default_controller() {
        let mut player = player(
            SessionConfig::new()
                .interaction_mode(InteractionMode::Gaze)
                .default_controller(Left),
        );

        let looking = FrameInput::new(DevicePoses::new().with(Hmd, aimed(true)));
        let out = player.step(&looking);
        assert_eq!(out.focus.owner, Left);
        assert_eq!(out.focus.color, Color::LEFT_HAND);

        let away = FrameInput::new(DevicePoses::new().with(Hmd, aimed(false)));
        assert_eq!(player.step(&away).focus.owner, Hmd);
    }

    #[test]
    fn activation_toggles_target_for_focused_controller_only() {
        // Wide enough that the right ray still hits after the nudge.
        let mut player = FramePlayer::new(
            SessionConfig::new()
                .three_dof(false)
                .locomotion(false)
                .world_origin(Vec3::ZERO)
                .sphere([0.0, 0.0, -4.0], 1.5)
                .handoff(FocusHandoff::FirstEngaged),
        )
        .unwrap();
        player.step(&frame(Some(true), Some(false)));
        assert_eq!(player.focus().owner, Right);

        // Left trigger is ignored while right holds focus.
        let out = player.step(
            &frame(Some(true), Some(false)).event(ButtonEvent::pressed(Left, Button::Trigger)),
        );
        assert!(!out.activated);
        assert_eq!(out.sphere_center, Vec3::new(0.0, 0.0, -4.0));

        let out = player.step(
            &frame(Some(true), Some(false)).event(ButtonEvent::pressed(Right, Button::Touchpad)),
        );
        assert!(out.activated);
        assert_eq!(out.sphere_center, Vec3::new(1.0, 0.0, -4.0));

        // Second activation sends it home.
        let out = player.step(
            &frame(Some(true), Some(false))
                .event(ButtonEvent::released(Right, Button::Touchpad))
                .event(ButtonEvent::pressed(Right, Button::DigitalTrigger)),
        );
        assert!(out.activated);
        assert_eq!(out.sphere_center, Vec3::new(0.0, 0.0, -4.0));
    }

    #[test]
    fn left_activation_nudges_left() {
        let mut player = player(SessionConfig::new());
        player.step(&frame(Some(false), Some(true)));
        assert!(player.activate(Left).unwrap());
        assert_eq!(player.sphere_center(), Vec3::new(-1.0, 0.0, -4.0));
        assert!(matches!(
            player.activate(Hmd),
            Err(SightlineError::NotAController(Hmd))
        ));
    }

    #[test]
    fn menu_press_cycles_render_scale() {
        let mut player = player(SessionConfig::new());
        let out = player
            .step(&frame(Some(false), None).event(ButtonEvent::pressed(Right, Button::Menu)));
        assert_eq!(out.render_scale, 0.5);
    }

    #[test]
    fn switches_cycle_modes() {
        let mut player = player(SessionConfig::new());
        assert_eq!(player.switch_interaction_mode(), InteractionMode::Gaze);
        assert_eq!(player.switch_gaze_trigger_type(), GazeTriggerType::Button);
        player.set_interaction_mode(InteractionMode::Controller);
        assert_eq!(player.config().interaction_mode, InteractionMode::Controller);
    }

    #[test]
    fn three_dof_controllers_are_pinned_in_view() {
        let mut player = FramePlayer::new(
            SessionConfig::new()
                .locomotion(false)
                .world_origin(Vec3::ZERO)
                .sphere([0.1, -0.12, -3.0], 0.5),
        )
        .unwrap();
        let poses = DevicePoses::new()
            .with(Hmd, DevicePose::tracked(Mat4::IDENTITY))
            .with(
                Right,
                DevicePose::tracked(Mat4::from_translation(Vec3::new(5.0, 5.0, 5.0))),
            );
        let out = player.step(&FrameInput::new(poses));
        let right = out.pointers.iter().find(|p| p.device == Right).unwrap();
        assert!((right.ray.origin - Vec3::new(0.1, -0.12, -0.45)).length() < 1e-4);
        assert_eq!(out.focus.owner, Right);
    }

    #[test]
    fn locomotion_moves_rays_with_the_world() {
        let mut player = FramePlayer::new(
            SessionConfig::new()
                .three_dof(false)
                .world_origin(Vec3::ZERO)
                .sphere([0.0, 0.0, -4.0], 0.8),
        )
        .unwrap();
        player.locomotion_mut().set_drive(0.0, 1.0);

        let poses = DevicePoses::new().with(Hmd, DevicePose::tracked(Mat4::IDENTITY));
        let out = player.step(&FrameInput::new(poses).dt(1.0));
        let translation = player.locomotion().world().translation;
        assert!((translation - Vec3::new(0.0, 0.0, -1.0)).length() < 1e-4);
        let eye = out.view.inverse().w_axis.truncate();
        assert!((eye - Vec3::new(0.0, 0.0, -1.0)).length() < 1e-4);
    }

    #[test]
    fn menu_on_disconnected_controller_is_ignored() {
        let mut player = player(SessionConfig::new());
        let out =
            player.step(&frame(None, None).event(ButtonEvent::pressed(Right, Button::Menu)));
        assert_eq!(out.render_scale, 1.0);

        let out = player
            .step(&frame(None, Some(false)).event(ButtonEvent::pressed(Left, Button::Menu)));
        assert_eq!(out.render_scale, 0.5);
    }

    #[test]
    fn disconnected_focus_owner_activates_by_trigger_only() {
        let mut player = player(SessionConfig::new());
        player.step(&frame(Some(true), None));
        assert_eq!(player.focus().owner, Right);

        let out =
            player.step(&frame(None, None).event(ButtonEvent::pressed(Right, Button::Touchpad)));
        assert!(!out.activated);
        assert_eq!(out.sphere_center, Vec3::new(0.0, 0.0, -4.0));

        let out =
            player.step(&frame(None, None).event(ButtonEvent::pressed(Right, Button::Trigger)));
        assert!(out.activated);
        assert_eq!(out.sphere_center, Vec3::new(1.0, 0.0, -4.0));
    }

    #[test]
    fn positionally_tracked_controllers_skip_the_anchor() {
        let mut player = FramePlayer::new(
            SessionConfig::new()
                .locomotion(false)
                .world_origin(Vec3::ZERO),
        )
        .unwrap();
        let controller = Mat4::from_translation(Vec3::new(0.3, 0.0, 0.0));
        let poses = DevicePoses::new()
            .with(Hmd, DevicePose::tracked(Mat4::IDENTITY))
            .with(Right, DevicePose::tracked(controller).six_dof(true))
            .with(Left, DevicePose::tracked(controller));

        let out = player.step(&FrameInput::new(poses));
        let right = out.pointers.iter().find(|p| p.device == Right).unwrap();
        assert!((right.ray.origin - Vec3::new(0.3, 0.0, 0.0)).length() < 1e-4);
        let left = out.pointers.iter().find(|p| p.device == Left).unwrap();
        assert!((left.ray.origin - Vec3::new(-0.1, -0.12, -0.45)).length() < 1e-4);
    }

    #[test]
    fn lost_head_pose_reuses_last_valid_one() {
        let mut player = player(SessionConfig::new());
        let head = Mat4::from_translation(Vec3::new(2.0, 0.0, 0.0));
        let tracked = DevicePoses::new()
            .with(Hmd, DevicePose::tracked(head))
            .with(Right, aimed(true));
        let first = player.step(&FrameInput::new(tracked));

        let lost = DevicePoses::new()
            .with(Hmd, DevicePose::lost())
            .with(Right, aimed(true));
        let out = player.step(&FrameInput::new(lost));
        let right = out.pointers.iter().find(|p| p.device == Right).unwrap();
        assert!((right.ray.origin - Vec3::new(2.0, 0.0, 0.0)).length() < 1e-4);
        assert!(right.hit.is_none());
        assert_eq!(out.view, first.view);
    }

    #[test]
    fn lost_head_pose_skips_gaze() {
        let mut player = player(
            SessionConfig::new()
                .interaction_mode(InteractionMode::Gaze)
                .default_controller(Right),
        );
        let out = player.step(&FrameInput::new(DevicePoses::new().with(Hmd, aimed(true))));
        assert_eq!(out.focus.owner, Right);

        let out = player.step(&FrameInput::new(
            DevicePoses::new().with(Hmd, DevicePose::lost()),
        ));
        assert!(out.pointers.iter().all(|p| p.device != Hmd));
        assert_eq!(out.focus.owner, Right);
    }

    #[test]
    fn view_without_locomotion_is_inverse_head() {
        let mut player = player(SessionConfig::new());
        let head = Mat4::from_rotation_translation(
            glam::Quat::from_rotation_y(0.7),
            Vec3::new(0.2, 1.6, -0.3),
        );
        let out = player.step(&FrameInput::new(
            DevicePoses::new().with(Hmd, DevicePose::tracked(head)),
        ));
        assert!(out.view.abs_diff_eq(head.inverse(), 1e-5));
    }

    #[test]
    fn pose_report_tracks_device_changes() {
        let mut player = player(SessionConfig::new());
        assert!(player.pose_report().is_none());

        player.step(&frame(Some(false), Some(false)));
        assert_eq!(
            player.pose_report(),
            Some(&PoseReport {
                valid_poses: 3,
                controllers: 2,
                classes: "HRL".to_string(),
            })
        );

        player.step(&frame(Some(true), None));
        let report = player.pose_report().unwrap();
        assert_eq!((report.valid_poses, report.controllers), (2, 1));
        assert_eq!(report.classes, "HR");
    }

    #[test]
    fn captured_input_keeps_controller_count() {
        let mut player = player(SessionConfig::new());
        player.step(&frame(Some(false), Some(false)));

        player.step(&frame(Some(false), Some(false)).captured(true));
        let report = player.pose_report().unwrap();
        assert_eq!(report.controllers, 2);
        assert_eq!(report.valid_poses, 3);
    }

    #[test]
    fn invalid_config_is_rejected() {
        assert!(FramePlayer::new(SessionConfig::new().sphere([0.0, 0.0, 0.0], -1.0)).is_err());
    }
}
