//! Which device currently has focus on the target.
//!
//! [`FocusTracker`] turns per-frame hit results into a single focus owner:
//! the headset, the right controller, or the left controller. The owner
//! tints the target and decides which controller's trigger activates it.
//!
//! Each controller keeps a sticky "is hitting" flag. Focus only changes on
//! edges of those flags:
//!
//! - **Engage** (miss → hit): the controller takes focus. Under
//!   [`FocusHandoff::FirstEngaged`] it only does so if no other controller is
//!   already holding focus on the target.
//! - **Release** (hit → miss): focus passes to the other controller if it is
//!   still hitting, otherwise back to the headset.
//!
//! Gaze interaction bypasses the flags entirely: a gaze hit hands focus to
//! the default controller's side, a miss returns it to the headset.
//!
//! # Example
//!
//! ```
//! use sightline::{DeviceRole, FocusHandoff, FocusTracker};
//!
//! let mut focus = FocusTracker::new(FocusHandoff::LatestEngaged);
//! focus.update_controllers(Some(true), Some(false));
//! assert_eq!(focus.owner(), DeviceRole::ControllerRight);
//!
//! focus.update_controllers(Some(false), Some(false));
//! assert_eq!(focus.owner(), DeviceRole::Hmd);
//! ```

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::color::Color;
use crate::device::DeviceRole;

/// What happens when a second controller engages while another holds focus.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FocusHandoff {
    /// The controller that engaged most recently takes focus.
    #[default]
    LatestEngaged,
    /// A controller holding focus keeps it until it releases.
    FirstEngaged,
}

impl FromStr for FocusHandoff {
    type Err = &'static str;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let key = value.trim().to_ascii_lowercase().replace('_', "-");
        Ok(match key.as_str() {
            "latest-engaged" | "latest" => Self::LatestEngaged,
            "first-engaged" | "first" | "sticky" => Self::FirstEngaged,
            _ => return Err("unknown focus handoff"),
        })
    }
}

/// Highlight color for a focus owner.
pub fn highlight(owner: DeviceRole) -> Color {
    match owner {
        DeviceRole::Hmd => Color::NEUTRAL,
        DeviceRole::ControllerRight => Color::RIGHT_HAND,
        DeviceRole::ControllerLeft => Color::LEFT_HAND,
    }
}

/// Snapshot of the focus for rendering and input routing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FocusState {
    pub owner: DeviceRole,
    pub color: Color,
}

/// Focus state machine for the interactive target.
#[derive(Clone, Debug)]
pub struct FocusTracker {
    owner: DeviceRole,
    right_hitting: bool,
    left_hitting: bool,
    handoff: FocusHandoff,
}

impl Default for FocusTracker {
    fn default() -> Self {
        Self::new(FocusHandoff::default())
    }
}

impl FocusTracker {
    pub fn new(handoff: FocusHandoff) -> Self {
        Self {
            owner: DeviceRole::Hmd,
            right_hitting: false,
            left_hitting: false,
            handoff,
        }
    }

    pub fn owner(&self) -> DeviceRole {
        self.owner
    }

    pub fn color(&self) -> Color {
        highlight(self.owner)
    }

    pub fn state(&self) -> FocusState {
        FocusState {
            owner: self.owner,
            color: self.color(),
        }
    }

    pub fn handoff(&self) -> FocusHandoff {
        self.handoff
    }

    pub fn set_handoff(&mut self, handoff: FocusHandoff) {
        self.handoff = handoff;
    }

    /// The sticky hit flag for a controller. Always false for the HMD.
    pub fn is_hitting(&self, role: DeviceRole) -> bool {
        match role {
            DeviceRole::Hmd => false,
            DeviceRole::ControllerRight => self.right_hitting,
            DeviceRole::ControllerLeft => self.left_hitting,
        }
    }

    fn set_hitting(&mut self, role: DeviceRole, hitting: bool) {
        match role {
            DeviceRole::Hmd => {}
            DeviceRole::ControllerRight => self.right_hitting = hitting,
            DeviceRole::ControllerLeft => self.left_hitting = hitting,
        }
    }

    fn set_owner(&mut self, owner: DeviceRole) -> bool {
        if self.owner == owner {
            return false;
        }
        debug!(from = %self.owner, to = %owner, color = ?highlight(owner), "focus changed");
        self.owner = owner;
        true
    }

    /// Feed one controller's hit result. Returns true if the owner changed.
    ///
    /// The HMD is not a controller and is ignored here; use
    /// [`FocusTracker::update_gaze`] for head rays.
    pub fn update_controller(&mut self, role: DeviceRole, hit: bool) -> bool {
        let Some(other) = role.other_controller() else {
            return false;
        };
        let was_hitting = self.is_hitting(role);

        if hit && !was_hitting {
            self.set_hitting(role, true);
            let holder_engaged = self.owner.is_controller() && self.is_hitting(self.owner);
            match self.handoff {
                FocusHandoff::LatestEngaged => self.set_owner(role),
                FocusHandoff::FirstEngaged if !holder_engaged || self.owner == role => {
                    self.set_owner(role)
                }
                FocusHandoff::FirstEngaged => false,
            }
        } else if !hit && was_hitting {
            self.set_hitting(role, false);
            if self.is_hitting(other) {
                self.set_owner(other)
            } else {
                self.set_owner(DeviceRole::Hmd)
            }
        } else {
            false
        }
    }

    /// Feed one frame of controller results. `None` means the controller was
    /// not evaluated this frame and its flag is left alone.
    ///
    /// Releases are applied before engages. If both controllers engage in
    /// the same frame, the right controller ends up with focus.
    pub fn update_controllers(&mut self, right: Option<bool>, left: Option<bool>) -> bool {
        let mut changed = false;

        for (role, hit) in [
            (DeviceRole::ControllerRight, right),
            (DeviceRole::ControllerLeft, left),
        ] {
            if hit == Some(false) {
                changed |= self.update_controller(role, false);
            }
        }

        let engage_order = match self.handoff {
            FocusHandoff::LatestEngaged => [
                (DeviceRole::ControllerLeft, left),
                (DeviceRole::ControllerRight, right),
            ],
            FocusHandoff::FirstEngaged => [
                (DeviceRole::ControllerRight, right),
                (DeviceRole::ControllerLeft, left),
            ],
        };
        for (role, hit) in engage_order {
            if hit == Some(true) {
                changed |= self.update_controller(role, true);
            }
        }

        changed
    }

    /// Feed the gaze ray's hit result. Returns true if the owner changed.
    ///
    /// A hit gives focus to `default_controller`; a miss returns it to the
    /// HMD. The controllers' sticky flags are not consulted or changed.
    pub fn update_gaze(&mut self, hit: bool, default_controller: DeviceRole) -> bool {
        if hit {
            self.set_owner(default_controller)
        } else {
            self.set_owner(DeviceRole::Hmd)
        }
    }
}
