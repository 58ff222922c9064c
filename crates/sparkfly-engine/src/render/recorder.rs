//! Headless capture of a frame's draw calls.
//!
//! [`FrameRecorder`] implements [`Canvas`] by appending one [`DrawCommand`]
//! per call. The tick loop draws every frame into a recorder; the windowed
//! renderer replays the recorded commands on the GPU, and tests inspect them
//! directly.

use sparkfly_ecs::canvas::{Canvas, Color, TextureId};
use sparkfly_ecs::geometry::Vec2;

// ---------------------------------------------------------------------------
// DrawCommand
// ---------------------------------------------------------------------------

/// One recorded draw call, in canvas pixels (y pointing down).
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// Fill the frame.
    Clear(Color),
    /// Filled circle.
    Circle {
        center: Vec2,
        radius: f64,
        color: Color,
    },
    /// Filled rectangle, already resolved to its top-left corner.
    Rect {
        top_left: Vec2,
        width: f64,
        height: f64,
        color: Color,
    },
    Line {
        start: Vec2,
        end: Vec2,
        color: Color,
        thickness: f64,
    },
    /// Text; centring is resolved by the renderer, which knows glyph sizes.
    Text {
        text: String,
        position: Vec2,
        size: u32,
        color: Color,
        centered: bool,
    },
    /// Sprite; centring is resolved by the renderer, which knows sprite sizes.
    Texture {
        position: Vec2,
        texture: TextureId,
        centered: bool,
    },
}

// ---------------------------------------------------------------------------
// FrameRecorder
// ---------------------------------------------------------------------------

/// A [`Canvas`] that records instead of drawing.
#[derive(Debug, Clone, Default)]
pub struct FrameRecorder {
    commands: Vec<DrawCommand>,
}

impl FrameRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands recorded since the last [`Canvas::clear`], in call order.
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// The strings of every recorded text command.
    pub fn texts(&self) -> impl Iterator<Item = &str> + '_ {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    /// Number of sprites recorded for `texture`.
    pub fn texture_count(&self, texture: TextureId) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Texture { texture: t, .. } if *t == texture))
            .count()
    }
}

impl Canvas for FrameRecorder {
    /// Starts a new frame: earlier commands are dropped.
    fn clear(&mut self, color: Color) {
        self.commands.clear();
        self.commands.push(DrawCommand::Clear(color));
    }

    fn draw_circle(&mut self, center: Vec2, radius: f64, color: Color) {
        self.commands.push(DrawCommand::Circle {
            center,
            radius,
            color,
        });
    }

    fn draw_box(&mut self, position: Vec2, width: f64, height: f64, color: Color, centered: bool) {
        let top_left = if centered {
            position - Vec2::new(width / 2.0, height / 2.0)
        } else {
            position
        };
        self.commands.push(DrawCommand::Rect {
            top_left,
            width,
            height,
            color,
        });
    }

    fn draw_line(&mut self, start: Vec2, end: Vec2, color: Color, thickness: f64) {
        self.commands.push(DrawCommand::Line {
            start,
            end,
            color,
            thickness,
        });
    }

    fn draw_text(&mut self, text: &str, position: Vec2, size: u32, color: Color, centered: bool) {
        self.commands.push(DrawCommand::Text {
            text: text.to_owned(),
            position,
            size,
            color,
            centered,
        });
    }

    fn draw_texture(&mut self, position: Vec2, texture: TextureId, centered: bool) {
        self.commands.push(DrawCommand::Texture {
            position,
            texture,
            centered,
        });
    }
}
