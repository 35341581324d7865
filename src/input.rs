use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::device::DeviceRole;

/// Controller buttons the frame player reacts to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Button {
    /// Analog trigger crossing its press threshold.
    Trigger,
    /// Digital trigger alias reported by some controllers.
    DigitalTrigger,
    Touchpad,
    Menu,
}

impl Button {
    /// Buttons that activate the focused target.
    pub const ACTIVATE: [Button; 3] = [Button::Trigger, Button::DigitalTrigger, Button::Touchpad];

    /// Touchpad and menu are polled, so they only count on a connected
    /// controller. Trigger events arrive queued and count regardless.
    pub fn needs_connection(self) -> bool {
        matches!(self, Button::Touchpad | Button::Menu)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ButtonAction {
    Pressed,
    Released,
}

/// A button transition reported by the runtime's event queue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonEvent {
    pub device: DeviceRole,
    pub button: Button,
    pub action: ButtonAction,
}

impl ButtonEvent {
    pub fn pressed(device: DeviceRole, button: Button) -> Self {
        Self {
            device,
            button,
            action: ButtonAction::Pressed,
        }
    }

    pub fn released(device: DeviceRole, button: Button) -> Self {
        Self {
            device,
            button,
            action: ButtonAction::Released,
        }
    }
}

/// Tracks button state for every controller.
#[derive(Clone, Debug, Default)]
pub struct Input {
    buttons_down: HashSet<(DeviceRole, Button)>,
    buttons_pressed: HashSet<(DeviceRole, Button)>,
    buttons_released: HashSet<(DeviceRole, Button)>,
}

impl Input {
    pub fn new() -> Self {
        Self::default()
    }

    /// Call at the start of each frame to reset per-frame state.
    pub fn begin_frame(&mut self) {
        self.buttons_pressed.clear();
        self.buttons_released.clear();
    }

    /// Process a button event and update input state.
    ///
    /// A repeated press while the button is already held is not a new press.
    pub fn handle_event(&mut self, event: &ButtonEvent) {
        let key = (event.device, event.button);
        match event.action {
            ButtonAction::Pressed => {
                if !self.buttons_down.contains(&key) {
                    self.buttons_pressed.insert(key);
                }
                self.buttons_down.insert(key);
            }
            ButtonAction::Released => {
                if self.buttons_down.remove(&key) {
                    self.buttons_released.insert(key);
                }
            }
        }
    }

    /// Forget everything held by a controller, e.g. after it disconnects.
    pub fn release_device(&mut self, device: DeviceRole) {
        self.buttons_down.retain(|(role, _)| *role != device);
    }

    /// Returns true if the button is currently held down.
    pub fn button_down(&self, device: DeviceRole, button: Button) -> bool {
        self.buttons_down.contains(&(device, button))
    }

    /// Returns true if the button was pressed this frame.
    pub fn button_pressed(&self, device: DeviceRole, button: Button) -> bool {
        self.buttons_pressed.contains(&(device, button))
    }

    /// Returns true if the button was released this frame.
    pub fn button_released(&self, device: DeviceRole, button: Button) -> bool {
        self.buttons_released.contains(&(device, button))
    }

    /// Returns true if any activating button was pressed this frame.
    ///
    /// On a disconnected controller only the triggers count.
    pub fn activate_pressed(&self, device: DeviceRole, connected: bool) -> bool {
        Button::ACTIVATE
            .iter()
            .filter(|button| connected || !button.needs_connection())
            .any(|button| self.button_pressed(device, *button))
    }
}
