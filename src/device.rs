//! Tracked device roles and the per-frame pose snapshot.
//!
//! The tracking runtime refreshes every device's pose once per frame. A
//! [`DevicePoses`] snapshot holds those records keyed by [`DeviceRole`], so
//! lookups never depend on a device's position in some runtime-side array.
//!
//! # Example
//!
//! ```
//! use sightline::{DevicePose, DevicePoses, DeviceRole, Mat4, Vec3};
//!
//! let poses = DevicePoses::new()
//!     .with(DeviceRole::Hmd, DevicePose::tracked(Mat4::IDENTITY))
//!     .with(
//!         DeviceRole::ControllerRight,
//!         DevicePose::tracked(Mat4::from_translation(Vec3::new(0.2, -0.3, -0.4))),
//!     );
//!
//! assert!(poses.tracked(DeviceRole::ControllerRight).is_some());
//! assert!(poses.tracked(DeviceRole::ControllerLeft).is_none());
//! ```

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use glam::Mat4;
use serde::{Deserialize, Serialize};

use crate::error::SightlineError;

/// The role a tracked device plays in the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeviceRole {
    /// The head-mounted display. Also the owner of focus when no controller has it.
    Hmd,
    /// The right-hand controller.
    ControllerRight,
    /// The left-hand controller.
    ControllerLeft,
}

impl DeviceRole {
    /// Every role, in the order the runtime reports them.
    pub const ALL: [DeviceRole; 3] = [
        DeviceRole::Hmd,
        DeviceRole::ControllerRight,
        DeviceRole::ControllerLeft,
    ];

    /// Handheld controllers, right first.
    pub const CONTROLLERS: [DeviceRole; 2] = [DeviceRole::ControllerRight, DeviceRole::ControllerLeft];

    /// Returns true for handheld controllers.
    pub fn is_controller(self) -> bool {
        !matches!(self, DeviceRole::Hmd)
    }

    /// The controller in the other hand, or `None` for the HMD.
    pub fn other_controller(self) -> Option<DeviceRole> {
        match self {
            DeviceRole::Hmd => None,
            DeviceRole::ControllerRight => Some(DeviceRole::ControllerLeft),
            DeviceRole::ControllerLeft => Some(DeviceRole::ControllerRight),
        }
    }

    /// Slot used to place a 3DOF controller model in view.
    ///
    /// Even slots sit on the right, odd slots on the left.
    pub fn anchor_slot(self) -> Option<usize> {
        match self {
            DeviceRole::Hmd => None,
            DeviceRole::ControllerRight => Some(0),
            DeviceRole::ControllerLeft => Some(1),
        }
    }

    /// Single-letter class tag used in pose reports.
    pub fn class_char(self) -> char {
        match self {
            DeviceRole::Hmd => 'H',
            DeviceRole::ControllerRight => 'R',
            DeviceRole::ControllerLeft => 'L',
        }
    }

    pub fn canonical(self) -> &'static str {
        match self {
            DeviceRole::Hmd => "hmd",
            DeviceRole::ControllerRight => "controller-right",
            DeviceRole::ControllerLeft => "controller-left",
        }
    }
}

impl fmt::Display for DeviceRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical())
    }
}

impl FromStr for DeviceRole {
    type Err = SightlineError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let key = value.trim().to_ascii_lowercase().replace('_', "-");
        Ok(match key.as_str() {
            "hmd" | "head" => DeviceRole::Hmd,
            "controller-right" | "right" | "r" => DeviceRole::ControllerRight,
            "controller-left" | "left" | "l" => DeviceRole::ControllerLeft,
            _ => return Err(SightlineError::UnknownDevice(value.to_string())),
        })
    }
}

/// One device's tracking record for the current frame.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DevicePose {
    /// Device-to-tracking-space transform.
    pub transform: Mat4,
    /// Whether the runtime produced a usable pose this frame.
    pub valid: bool,
    /// Whether the device is currently connected.
    pub connected: bool,
    /// Whether the pose carries position as well as orientation.
    pub six_dof: bool,
}

impl Default for DevicePose {
    fn default() -> Self {
        Self {
            transform: Mat4::IDENTITY,
            valid: false,
            connected: false,
            six_dof: false,
        }
    }
}

impl DevicePose {
    /// A connected device with a valid orientation-only pose.
    pub fn tracked(transform: Mat4) -> Self {
        Self {
            transform,
            valid: true,
            connected: true,
            six_dof: false,
        }
    }

    /// A device that is connected but lost tracking this frame.
    pub fn lost() -> Self {
        Self {
            connected: true,
            ..Default::default()
        }
    }

    pub fn six_dof(mut self, six_dof: bool) -> Self {
        self.six_dof = six_dof;
        self
    }

    /// True when the pose can drive a ray this frame.
    pub fn is_usable(&self) -> bool {
        self.connected && self.valid
    }
}

/// Snapshot of every device pose for a single frame.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DevicePoses {
    poses: HashMap<DeviceRole, DevicePose>,
}

impl DevicePoses {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`DevicePoses::set`].
    pub fn with(mut self, role: DeviceRole, pose: DevicePose) -> Self {
        self.set(role, pose);
        self
    }

    pub fn set(&mut self, role: DeviceRole, pose: DevicePose) {
        self.poses.insert(role, pose);
    }

    pub fn remove(&mut self, role: DeviceRole) -> Option<DevicePose> {
        self.poses.remove(&role)
    }

    /// The raw record for a role, if the runtime reported one.
    pub fn get(&self, role: DeviceRole) -> Option<&DevicePose> {
        self.poses.get(&role)
    }

    /// The full record, only if the device is connected with a valid pose.
    pub fn usable(&self, role: DeviceRole) -> Option<&DevicePose> {
        self.get(role).filter(|pose| pose.is_usable())
    }

    /// The device transform, only if the device is connected with a valid pose.
    pub fn tracked(&self, role: DeviceRole) -> Option<Mat4> {
        self.usable(role).map(|pose| pose.transform)
    }

    /// Whether the runtime reports the device as connected this frame.
    pub fn is_connected(&self, role: DeviceRole) -> bool {
        self.get(role).is_some_and(|pose| pose.connected)
    }

    /// Number of devices with a valid pose.
    pub fn valid_count(&self) -> usize {
        self.poses.values().filter(|pose| pose.valid).count()
    }

    /// Class letters of every validly tracked device, e.g. `"HRL"`.
    pub fn pose_classes(&self) -> String {
        DeviceRole::ALL
            .iter()
            .filter(|role| self.get(**role).is_some_and(|pose| pose.valid))
            .map(|role| role.class_char())
            .collect()
    }
}
