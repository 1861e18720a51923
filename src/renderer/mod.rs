//! Draw-list rendering
//!
//! Scenes describe a frame as a list of primitive commands in logical screen
//! coordinates. A [`Surface`] backend turns the list into pixels (or cells).

pub mod terminal;

pub use terminal::{Canvas, TerminalSurface};

use glam::Vec2;

use crate::assets::{Sprite, SpriteShape};
use crate::sim::Rect;

/// 8-bit RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Scale brightness (0.0 - 1.0+)
    pub fn scaled(self, factor: f32) -> Self {
        let f = |c: u8| (c as f32 * factor).clamp(0.0, 255.0) as u8;
        Self::rgb(f(self.r), f(self.g), f(self.b))
    }
}

/// Colors for game elements
pub mod colors {
    use super::Color;

    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const RED: Color = Color::rgb(255, 0, 0);
    pub const GREEN: Color = Color::rgb(0, 255, 0);
    pub const BLUE: Color = Color::rgb(0, 0, 255);
    pub const YELLOW: Color = Color::rgb(255, 255, 0);
    pub const GREY: Color = Color::rgb(100, 100, 100);
    pub const LIGHT_GREY: Color = Color::rgb(200, 200, 200);

    pub const BUTTON: Color = Color::rgb(100, 100, 255);
    pub const BUTTON_HOVER: Color = Color::rgb(150, 150, 255);
    pub const TERMINAL_GREEN: Color = Color::rgb(0, 255, 0);
    pub const CRT_FRAME: Color = Color::rgb(0, 60, 0);
    pub const SCANLINE: Color = Color::rgb(10, 10, 10);
    pub const REWIND: Color = Color::rgb(120, 180, 255);
}

/// Horizontal text anchoring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Left,
    Center,
}

/// One primitive draw command
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCmd {
    FillRect { rect: Rect, color: Color },
    StrokeRect { rect: Rect, color: Color },
    Circle { center: Vec2, radius: f32, color: Color },
    Line { from: Vec2, to: Vec2, color: Color },
    Text { pos: Vec2, text: String, color: Color, align: Align },
}

/// A frame under construction
#[derive(Debug, Clone)]
pub struct Frame {
    /// Background color
    pub clear: Color,
    /// Real seconds since start, for blinking/animated decoration
    pub time: f64,
    commands: Vec<DrawCmd>,
}

impl Frame {
    pub fn new(time: f64) -> Self {
        Self {
            clear: colors::BLACK,
            time,
            commands: Vec::new(),
        }
    }

    pub fn commands(&self) -> &[DrawCmd] {
        &self.commands
    }

    pub fn fill(&mut self, color: Color) {
        self.clear = color;
        self.commands.clear();
    }

    pub fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.commands.push(DrawCmd::FillRect { rect, color });
    }

    pub fn stroke_rect(&mut self, rect: Rect, color: Color) {
        self.commands.push(DrawCmd::StrokeRect { rect, color });
    }

    pub fn circle(&mut self, center: Vec2, radius: f32, color: Color) {
        self.commands.push(DrawCmd::Circle {
            center,
            radius,
            color,
        });
    }

    pub fn line(&mut self, from: Vec2, to: Vec2, color: Color) {
        self.commands.push(DrawCmd::Line { from, to, color });
    }

    pub fn text(&mut self, pos: Vec2, text: impl Into<String>, color: Color) {
        self.commands.push(DrawCmd::Text {
            pos,
            text: text.into(),
            color,
            align: Align::Left,
        });
    }

    /// Text horizontally centered on `pos.x`
    pub fn text_centered(&mut self, pos: Vec2, text: impl Into<String>, color: Color) {
        self.commands.push(DrawCmd::Text {
            pos,
            text: text.into(),
            color,
            align: Align::Center,
        });
    }

    /// Draw a sprite with its top-left corner at `pos`
    pub fn sprite(&mut self, sprite: &Sprite, pos: Vec2) {
        let rect = Rect::new(pos, sprite.size);
        match sprite.shape {
            SpriteShape::Rect => self.fill_rect(rect, sprite.color),
            SpriteShape::Circle => {
                self.circle(rect.center(), sprite.size.min_element() / 2.0, sprite.color)
            }
        }
    }
}

/// Something that can show a finished frame
pub trait Surface {
    fn present(&mut self, frame: &Frame) -> std::io::Result<()>;
}

/// Surface that discards frames (headless runs, tests)
#[derive(Debug, Default)]
pub struct NullSurface {
    pub frames_presented: u64,
}

impl Surface for NullSurface {
    fn present(&mut self, _frame: &Frame) -> std::io::Result<()> {
        self.frames_presented += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sprite_commands_follow_shape() {
        let mut frame = Frame::new(0.0);
        let ball = Sprite::placeholder(Vec2::splat(20.0), colors::RED, SpriteShape::Circle);
        frame.sprite(&ball, Vec2::new(10.0, 10.0));
        assert_eq!(
            frame.commands(),
            &[DrawCmd::Circle {
                center: Vec2::new(20.0, 20.0),
                radius: 10.0,
                color: colors::RED
            }]
        );
    }

    #[test]
    fn test_fill_resets_commands() {
        let mut frame = Frame::new(0.0);
        frame.text(Vec2::ZERO, "hi", colors::WHITE);
        frame.fill(colors::BLUE);
        assert!(frame.commands().is_empty());
        assert_eq!(frame.clear, colors::BLUE);
    }

    #[test]
    fn test_color_scaled_clamps() {
        assert_eq!(Color::rgb(200, 100, 0).scaled(2.0), Color::rgb(255, 200, 0));
    }
}
