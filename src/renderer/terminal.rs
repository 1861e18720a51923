//! Terminal backend
//!
//! Rasterizes a [`Frame`] into a grid of character cells scaled from the
//! logical 800x600 screen, then writes only the cells that changed since the
//! previous frame using crossterm.

use std::io::{self, Write};

use crossterm::{cursor, event, execute, queue, style, terminal};
use glam::Vec2;

use super::{Align, Color, DrawCmd, Frame, Surface};
use crate::consts::{SCREEN_HEIGHT, SCREEN_WIDTH};
use crate::sim::Rect;

/// One terminal character cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    pub fg: Color,
    pub bg: Color,
}

impl Cell {
    fn blank(bg: Color) -> Self {
        Self { ch: ' ', fg: bg, bg }
    }
}

/// A rasterized frame
#[derive(Debug, Clone, PartialEq)]
pub struct Canvas {
    cols: u16,
    rows: u16,
    cells: Vec<Cell>,
}

impl Canvas {
    pub fn new(cols: u16, rows: u16, bg: Color) -> Self {
        Self {
            cols,
            rows,
            cells: vec![Cell::blank(bg); cols as usize * rows as usize],
        }
    }

    /// Rasterize a frame at the given terminal size
    pub fn rasterize(frame: &Frame, cols: u16, rows: u16) -> Self {
        let mut canvas = Self::new(cols, rows, frame.clear);
        for command in frame.commands() {
            canvas.draw(command);
        }
        canvas
    }

    pub fn size(&self) -> (u16, u16) {
        (self.cols, self.rows)
    }

    pub fn get(&self, col: u16, row: u16) -> Option<&Cell> {
        if col < self.cols && row < self.rows {
            self.cells.get(row as usize * self.cols as usize + col as usize)
        } else {
            None
        }
    }

    /// Characters of one row (handy for tests and debugging)
    pub fn row_text(&self, row: u16) -> String {
        (0..self.cols)
            .filter_map(|col| self.get(col, row).map(|c| c.ch))
            .collect()
    }

    fn scale(&self) -> Vec2 {
        Vec2::new(
            self.cols as f32 / SCREEN_WIDTH,
            self.rows as f32 / SCREEN_HEIGHT,
        )
    }

    fn cell_of(&self, p: Vec2) -> (i32, i32) {
        let s = p * self.scale();
        (s.x.floor() as i32, s.y.floor() as i32)
    }

    /// Logical position of a cell's center
    fn cell_center(&self, col: i32, row: i32) -> Vec2 {
        (Vec2::new(col as f32, row as f32) + 0.5) / self.scale()
    }

    fn cell_mut(&mut self, col: i32, row: i32) -> Option<&mut Cell> {
        if col < 0 || row < 0 || col >= self.cols as i32 || row >= self.rows as i32 {
            return None;
        }
        let idx = row as usize * self.cols as usize + col as usize;
        self.cells.get_mut(idx)
    }

    /// Covered cell span of a rect; never empty so tiny shapes stay visible
    fn span(&self, rect: &Rect) -> (i32, i32, i32, i32) {
        let s = self.scale();
        let c0 = (rect.left() * s.x).floor() as i32;
        let r0 = (rect.top() * s.y).floor() as i32;
        let c1 = ((rect.right() * s.x).ceil() as i32).max(c0 + 1);
        let r1 = ((rect.bottom() * s.y).ceil() as i32).max(r0 + 1);
        (c0, r0, c1, r1)
    }

    fn draw(&mut self, command: &DrawCmd) {
        match command {
            DrawCmd::FillRect { rect, color } => {
                let (c0, r0, c1, r1) = self.span(rect);
                for row in r0..r1 {
                    for col in c0..c1 {
                        if let Some(cell) = self.cell_mut(col, row) {
                            *cell = Cell::blank(*color);
                        }
                    }
                }
            }
            DrawCmd::StrokeRect { rect, color } => {
                let (c0, r0, c1, r1) = self.span(rect);
                let (c1, r1) = (c1 - 1, r1 - 1);
                for col in c0..=c1 {
                    self.put(col, r0, '─', *color);
                    self.put(col, r1, '─', *color);
                }
                for row in r0..=r1 {
                    self.put(c0, row, '│', *color);
                    self.put(c1, row, '│', *color);
                }
                self.put(c0, r0, '┌', *color);
                self.put(c1, r0, '┐', *color);
                self.put(c0, r1, '└', *color);
                self.put(c1, r1, '┘', *color);
            }
            DrawCmd::Circle {
                center,
                radius,
                color,
            } => {
                let bounds = Rect::centered(*center, Vec2::splat(radius * 2.0));
                let (c0, r0, c1, r1) = self.span(&bounds);
                let mut any = false;
                for row in r0..r1 {
                    for col in c0..c1 {
                        if self.cell_center(col, row).distance(*center) <= *radius {
                            if let Some(cell) = self.cell_mut(col, row) {
                                *cell = Cell::blank(*color);
                                any = true;
                            }
                        }
                    }
                }
                if !any {
                    let (col, row) = self.cell_of(*center);
                    self.put(col, row, '●', *color);
                }
            }
            DrawCmd::Line { from, to, color } => {
                let (ac, ar) = self.cell_of(*from);
                let (bc, br) = self.cell_of(*to);
                let (dc, dr) = (bc - ac, br - ar);
                let ch = if dr == 0 {
                    '─'
                } else if dc == 0 {
                    '│'
                } else if (dc > 0) == (dr > 0) {
                    '╲'
                } else {
                    '╱'
                };
                let steps = dc.abs().max(dr.abs()).max(1);
                for i in 0..=steps {
                    let t = i as f32 / steps as f32;
                    let col = ac + (dc as f32 * t).round() as i32;
                    let row = ar + (dr as f32 * t).round() as i32;
                    self.put(col, row, ch, *color);
                }
            }
            DrawCmd::Text {
                pos,
                text,
                color,
                align,
            } => {
                let (mut col, row) = self.cell_of(*pos);
                let width = text.chars().count() as i32;
                if *align == Align::Center {
                    col -= width / 2;
                }
                for (i, ch) in text.chars().enumerate() {
                    self.put(col + i as i32, row, ch, *color);
                }
            }
        }
    }

    /// Write a glyph, keeping the cell's background
    fn put(&mut self, col: i32, row: i32, ch: char, fg: Color) {
        if let Some(cell) = self.cell_mut(col, row) {
            cell.ch = ch;
            cell.fg = fg;
        }
    }
}

fn term_color(c: Color) -> style::Color {
    style::Color::Rgb {
        r: c.r,
        g: c.g,
        b: c.b,
    }
}

/// Crossterm surface writing to any `Write`
pub struct TerminalSurface<W: Write> {
    out: W,
    /// Fixed size, or `None` to follow the real terminal
    size: Option<(u16, u16)>,
    previous: Option<Canvas>,
}

impl TerminalSurface<io::Stdout> {
    /// Surface on stdout that tracks the terminal size
    pub fn stdout() -> Self {
        Self {
            out: io::stdout(),
            size: None,
            previous: None,
        }
    }
}

impl<W: Write> TerminalSurface<W> {
    /// Surface with a fixed cell grid
    pub fn with_size(out: W, cols: u16, rows: u16) -> Self {
        Self {
            out,
            size: Some((cols, rows)),
            previous: None,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_canvas(&mut self, canvas: &Canvas) -> io::Result<()> {
        let previous = self
            .previous
            .as_ref()
            .filter(|p| p.size() == canvas.size());
        let mut colors: Option<(Color, Color)> = None;
        let mut cursor_at: Option<(u16, u16)> = None;

        for row in 0..canvas.rows {
            for col in 0..canvas.cols {
                let Some(cell) = canvas.get(col, row) else {
                    continue;
                };
                if previous.and_then(|p| p.get(col, row)) == Some(cell) {
                    continue;
                }
                if cursor_at != Some((col, row)) {
                    queue!(self.out, cursor::MoveTo(col, row))?;
                }
                if colors != Some((cell.fg, cell.bg)) {
                    queue!(
                        self.out,
                        style::SetForegroundColor(term_color(cell.fg)),
                        style::SetBackgroundColor(term_color(cell.bg))
                    )?;
                    colors = Some((cell.fg, cell.bg));
                }
                queue!(self.out, style::Print(cell.ch))?;
                cursor_at = Some((col + 1, row));
            }
        }
        queue!(self.out, style::ResetColor)?;
        self.out.flush()
    }
}

impl<W: Write> Surface for TerminalSurface<W> {
    fn present(&mut self, frame: &Frame) -> io::Result<()> {
        let (cols, rows) = match self.size {
            Some(size) => size,
            None => terminal::size()?,
        };
        let canvas = Canvas::rasterize(frame, cols, rows);
        self.write_canvas(&canvas)?;
        self.previous = Some(canvas);
        Ok(())
    }
}

/// Raw-mode terminal session, restored on drop (including during a panic)
pub struct TerminalSession {
    /// Terminal reports key release events
    pub key_release: bool,
}

impl TerminalSession {
    pub fn start() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        let mut out = io::stdout();
        execute!(
            out,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            event::EnableMouseCapture
        )?;

        let key_release = terminal::supports_keyboard_enhancement().unwrap_or(false);
        if key_release {
            execute!(
                out,
                event::PushKeyboardEnhancementFlags(
                    event::KeyboardEnhancementFlags::REPORT_EVENT_TYPES
                )
            )?;
        }
        log::info!("Terminal session started (key release events: {})", key_release);
        Ok(Self { key_release })
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        let mut out = io::stdout();
        if self.key_release {
            let _ = execute!(out, event::PopKeyboardEnhancementFlags);
        }
        let _ = execute!(
            out,
            event::DisableMouseCapture,
            cursor::Show,
            terminal::LeaveAlternateScreen
        );
        let _ = terminal::disable_raw_mode();
    }
}
