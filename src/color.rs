//! Per-role colours. The engine assigns colours; it never paints.

use alloc::format;
use alloc::string::String;

use crate::chain::Role;

/// 8-bit sRGB colour.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color { r, g, b }
    }

    /// Parse `#rrggbb` (the `#` is optional).
    pub fn from_hex(s: &str) -> Option<Self> {
        let hex = s.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Color { r: channel(0)?, g: channel(2)?, b: channel(4)? })
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Channel-wise linear interpolation, `t` clamped to [0, 1].
    pub fn lerp(self, other: Color, t: f32) -> Color {
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
        let mix = |a: u8, b: u8| libm::roundf(a as f32 + (b as f32 - a as f32) * t) as u8;
        Color {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
        }
    }
}

/// Colour table, one entry per role; loop beads blend start to end.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ColorScheme {
    pub loop_start: Color,
    pub loop_end: Color,
    pub tail: Color,
    pub terminal: Color,
    pub anchor: Color,
}

impl Default for ColorScheme {
    fn default() -> Self {
        ColorScheme {
            loop_start: Color::rgb(0x3b, 0x82, 0xf6),
            loop_end: Color::rgb(0xa8, 0x55, 0xf7),
            tail: Color::rgb(0xf5, 0x9e, 0x0b),
            terminal: Color::rgb(0x78, 0x35, 0x0f),
            anchor: Color::rgb(0xea, 0xb3, 0x08),
        }
    }
}

/// Colour of a body with `role` in a loop of `loop_count` beads.
pub fn color_for(role: Role, loop_count: usize, scheme: &ColorScheme) -> Color {
    match role {
        Role::Loop { position, .. } => {
            let t = if loop_count > 1 {
                position as f32 / (loop_count - 1) as f32
            } else {
                0.0
            };
            scheme.loop_start.lerp(scheme.loop_end, t)
        }
        Role::Tail { .. } => scheme.tail,
        Role::Terminal { .. } => scheme.terminal,
        Role::Anchor => scheme.anchor,
    }
}
