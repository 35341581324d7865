//! Session configuration for the frame player.
//!
//! Everything the demo used to keep in process-wide toggles lives in
//! [`SessionConfig`]: interaction mode, gaze trigger type, 3DOF handling,
//! locomotion, render scale, and the target sphere. The config is handed to
//! [`FramePlayer::new`](crate::FramePlayer::new) and changed afterwards only
//! through the player's switch methods.
//!
//! Configs can be built in code or loaded from JSON:
//!
//! ```
//! use sightline::{InteractionMode, SessionConfig};
//!
//! let config = SessionConfig::from_json_str(
//!     r#"{ "interaction_mode": "gaze", "sphere_radius": 0.5 }"#,
//! ).unwrap();
//! assert_eq!(config.interaction_mode, InteractionMode::Gaze);
//! assert_eq!(config.sphere_radius, 0.5);
//! ```

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::device::DeviceRole;
use crate::error::{Result, SightlineError};
use crate::focus::FocusHandoff;

/// Smallest render scale reached when cycling.
const MIN_RENDER_SCALE: f32 = 0.5;
/// Step added per render scale switch.
const RENDER_SCALE_STEP: f32 = 0.1;

fn normalize_key(value: &str) -> String {
    value.trim().to_ascii_lowercase().replace(['_', ' '], "-")
}

/// Which device performs hit tests.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InteractionMode {
    /// Let the runtime decide; controllers drive focus.
    #[default]
    SystemDefault,
    /// The head's forward ray drives focus.
    Gaze,
    /// Handheld controllers drive focus.
    Controller,
}

impl InteractionMode {
    /// SystemDefault → Gaze → Controller → SystemDefault.
    pub fn next(self) -> Self {
        match self {
            Self::SystemDefault => Self::Gaze,
            Self::Gaze => Self::Controller,
            Self::Controller => Self::SystemDefault,
        }
    }

    pub fn canonical(self) -> &'static str {
        match self {
            Self::SystemDefault => "system-default",
            Self::Gaze => "gaze",
            Self::Controller => "controller",
        }
    }
}

impl fmt::Display for InteractionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical())
    }
}

impl FromStr for InteractionMode {
    type Err = &'static str;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match normalize_key(value).as_str() {
            "system-default" | "default" | "system" => Self::SystemDefault,
            "gaze" | "head" => Self::Gaze,
            "controller" | "controllers" => Self::Controller,
            _ => return Err("unknown interaction mode"),
        })
    }
}

/// How a gaze selection is confirmed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GazeTriggerType {
    #[default]
    Timeout,
    Button,
    TimeoutButton,
}

impl GazeTriggerType {
    /// Timeout → Button → TimeoutButton → Timeout.
    pub fn next(self) -> Self {
        match self {
            Self::Timeout => Self::Button,
            Self::Button => Self::TimeoutButton,
            Self::TimeoutButton => Self::Timeout,
        }
    }

    pub fn canonical(self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::Button => "button",
            Self::TimeoutButton => "timeout-button",
        }
    }
}

impl fmt::Display for GazeTriggerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical())
    }
}

impl FromStr for GazeTriggerType {
    type Err = &'static str;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match normalize_key(value).as_str() {
            "timeout" => Self::Timeout,
            "button" => Self::Button,
            "timeout-button" | "both" => Self::TimeoutButton,
            _ => return Err("unknown gaze trigger type"),
        })
    }
}

/// Next render scale in the cycle `0.5, 0.6, … 1.0, 0.5, …`.
pub fn next_render_scale(scale: f32) -> f32 {
    if (scale - 1.0).abs() <= f32::EPSILON {
        MIN_RENDER_SCALE
    } else {
        (scale + RENDER_SCALE_STEP).min(1.0)
    }
}

/// Configuration for a frame player session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub interaction_mode: InteractionMode,
    pub gaze_trigger: GazeTriggerType,
    /// Treat controllers as orientation-only and pin them in view.
    pub three_dof: bool,
    /// Enable world drive.
    pub locomotion: bool,
    /// Side that takes focus when the gaze ray hits.
    pub default_controller: DeviceRole,
    pub handoff: FocusHandoff,
    /// Home position of the target sphere.
    pub sphere_center: Vec3,
    pub sphere_radius: f32,
    /// Initial world origin, a little back and up so the viewer starts clear of the scene.
    pub world_origin: Vec3,
    pub near_clip: f32,
    pub far_clip: f32,
    pub render_scale: f32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            interaction_mode: InteractionMode::SystemDefault,
            gaze_trigger: GazeTriggerType::Timeout,
            three_dof: true,
            locomotion: true,
            default_controller: DeviceRole::ControllerRight,
            handoff: FocusHandoff::LatestEngaged,
            sphere_center: Vec3::new(1.0, 2.0, -4.0),
            sphere_radius: 0.8,
            world_origin: Vec3::new(1.0, 1.5, 2.0),
            near_clip: 0.1,
            far_clip: 100.0,
            render_scale: 1.0,
        }
    }
}

impl SessionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn interaction_mode(mut self, mode: InteractionMode) -> Self {
        self.interaction_mode = mode;
        self
    }

    pub fn gaze_trigger(mut self, trigger: GazeTriggerType) -> Self {
        self.gaze_trigger = trigger;
        self
    }

    pub fn three_dof(mut self, three_dof: bool) -> Self {
        self.three_dof = three_dof;
        self
    }

    pub fn locomotion(mut self, locomotion: bool) -> Self {
        self.locomotion = locomotion;
        self
    }

    pub fn default_controller(mut self, role: DeviceRole) -> Self {
        self.default_controller = role;
        self
    }

    pub fn handoff(mut self, handoff: FocusHandoff) -> Self {
        self.handoff = handoff;
        self
    }

    pub fn sphere(mut self, center: impl Into<Vec3>, radius: f32) -> Self {
        self.sphere_center = center.into();
        self.sphere_radius = radius;
        self
    }

    pub fn world_origin(mut self, origin: impl Into<Vec3>) -> Self {
        self.world_origin = origin.into();
        self
    }

    pub fn clip_planes(mut self, near: f32, far: f32) -> Self {
        self.near_clip = near;
        self.far_clip = far;
        self
    }

    pub fn render_scale(mut self, scale: f32) -> Self {
        self.render_scale = scale;
        self
    }

    /// Parse a JSON config. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.default_controller.is_controller() {
            return Err(SightlineError::NotAController(self.default_controller));
        }
        if !(self.sphere_radius > 0.0) {
            return Err(SightlineError::InvalidConfig(format!(
                "sphere_radius must be positive, got {}",
                self.sphere_radius
            )));
        }
        if !(self.near_clip > 0.0 && self.near_clip < self.far_clip) {
            return Err(SightlineError::InvalidConfig(format!(
                "clip planes must satisfy 0 < near < far, got near={} far={}",
                self.near_clip, self.far_clip
            )));
        }
        if !(self.render_scale > 0.0 && self.render_scale <= 1.0) {
            return Err(SightlineError::InvalidConfig(format!(
                "render_scale must be in (0, 1], got {}",
                self.render_scale
            )));
        }
        Ok(())
    }
}
