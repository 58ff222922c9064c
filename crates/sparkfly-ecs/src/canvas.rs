//! The drawing side of the Renderer/Input boundary.
//!
//! Components draw through the [`Canvas`] trait and never touch a GPU or a
//! window. The engine crate provides a recorder that captures the calls for
//! the real renderer (and for tests).

use serde::{Deserialize, Serialize};

use crate::geometry::Vec2;

/// An RGBA colour, 8 bits per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    /// Red.
    pub r: u8,
    /// Green.
    pub g: u8,
    /// Blue.
    pub b: u8,
    /// Alpha; 0xff is opaque.
    pub a: u8,
}

impl Color {
    /// Opaque white.
    pub const WHITE: Color = Color::rgba(0xff, 0xff, 0xff, 0xff);
    /// Opaque black.
    pub const BLACK: Color = Color::rgba(0x00, 0x00, 0x00, 0xff);

    /// Build a colour from its four channels.
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Unpack `0xRRGGBBAA`.
    pub const fn from_hex(rgba: u32) -> Self {
        Self::rgba(
            (rgba >> 24) as u8,
            (rgba >> 16) as u8,
            (rgba >> 8) as u8,
            rgba as u8,
        )
    }

    /// Channels as `0.0..=1.0` floats.
    pub fn to_f32(self) -> [f32; 4] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
            self.a as f32 / 255.0,
        ]
    }
}

/// Handle to a sprite the renderer knows how to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextureId {
    Fly,
    Spark,
    Insulator,
    Minus,
    Plus,
}

/// Drawing primitives available to component draw hooks.
///
/// `centered` means `position` is the middle of the drawn item rather than
/// its top-left corner.
pub trait Canvas {
    /// Fill the whole frame with `color`.
    fn clear(&mut self, color: Color);

    /// Filled circle.
    fn draw_circle(&mut self, center: Vec2, radius: f64, color: Color);

    /// Filled axis-aligned box.
    fn draw_box(&mut self, position: Vec2, width: f64, height: f64, color: Color, centered: bool);

    /// Straight segment from `start` to `end`, `thickness` pixels wide.
    fn draw_line(&mut self, start: Vec2, end: Vec2, color: Color, thickness: f64);

    /// A line of text at `size` points.
    fn draw_text(&mut self, text: &str, position: Vec2, size: u32, color: Color, centered: bool);

    /// A sprite at its native size.
    fn draw_texture(&mut self, position: Vec2, texture: TextureId, centered: bool);
}
