use serde::{Deserialize, Serialize};

/// Linear RGBA color.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Target tint while the headset owns focus.
    pub const NEUTRAL: Color = Color::rgb(0.0, 1.0, 0.0);
    /// Target tint while the right controller owns focus.
    pub const RIGHT_HAND: Color = Color::rgb(0.678, 0.231, 0.129);
    /// Target tint while the left controller owns focus.
    pub const LEFT_HAND: Color = Color::rgb(0.0, 0.0, 1.0);

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}
