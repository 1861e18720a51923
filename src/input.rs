//! Event sources
//!
//! The loop pulls a batch of [`GameEvent`]s once per frame from an
//! [`EventSource`]. [`TerminalEvents`] reads crossterm input; terminals that
//! never report key releases get a synthesized `KeyUp` once a key stops
//! auto-repeating. [`ScriptedEvents`] replays a fixed script.

use std::collections::VecDeque;
use std::io;
use std::time::{Duration, Instant};

use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEvent, MouseEventKind,
};
use glam::Vec2;

use crate::consts::{SCREEN_HEIGHT, SCREEN_WIDTH};
use crate::event::{GameEvent, Key, MouseButton};

/// A key without release events counts as released this long after its
/// last (auto-repeated) press
pub const SYNTHETIC_RELEASE: Duration = Duration::from_millis(400);

/// Anything that yields input events
pub trait EventSource {
    /// Events that arrived since the previous poll. Never blocks.
    fn poll(&mut self) -> io::Result<Vec<GameEvent>>;
}

/// Map a terminal key to a logical key
pub fn map_key(code: KeyCode) -> Option<Key> {
    let key = match code {
        KeyCode::Left => Key::Left,
        KeyCode::Right => Key::Right,
        KeyCode::Up => Key::Up,
        KeyCode::Down => Key::Down,
        KeyCode::Enter => Key::Enter,
        KeyCode::Esc => Key::Escape,
        KeyCode::Backspace | KeyCode::Char('r') | KeyCode::Char('R') => Key::Rewind,
        KeyCode::Char('f') | KeyCode::Char('F') => Key::Replay,
        KeyCode::Char(' ') => Key::Space,
        KeyCode::Char(c) => Key::Char(c.to_ascii_lowercase()),
        _ => return None,
    };
    Some(key)
}

fn map_button(button: event::MouseButton) -> MouseButton {
    match button {
        event::MouseButton::Left => MouseButton::Left,
        event::MouseButton::Right => MouseButton::Right,
        event::MouseButton::Middle => MouseButton::Middle,
    }
}

fn is_quit(key: &KeyEvent) -> bool {
    matches!(key.code, KeyCode::Char('q'))
        || (key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL))
}

/// crossterm-backed event source
#[derive(Debug)]
pub struct TerminalEvents {
    /// Terminal size in cells, for mouse scaling
    cols: u16,
    rows: u16,
    /// Terminal reports key release events
    key_release: bool,
    /// Keys currently down and when they were last pressed
    held: Vec<(Key, Instant)>,
}

impl TerminalEvents {
    pub fn new(cols: u16, rows: u16, key_release: bool) -> Self {
        Self {
            cols: cols.max(1),
            rows: rows.max(1),
            key_release,
            held: Vec::new(),
        }
    }

    /// Source sized to the current terminal
    pub fn from_terminal(key_release: bool) -> io::Result<Self> {
        let (cols, rows) = crossterm::terminal::size()?;
        Ok(Self::new(cols, rows, key_release))
    }

    /// Logical position of the center of a terminal cell
    pub fn cell_to_logical(&self, col: u16, row: u16) -> Vec2 {
        Vec2::new(
            (col as f32 + 0.5) * SCREEN_WIDTH / self.cols as f32,
            (row as f32 + 0.5) * SCREEN_HEIGHT / self.rows as f32,
        )
    }

    fn translate_key(&mut self, key: KeyEvent, now: Instant, out: &mut Vec<GameEvent>) {
        if key.kind != KeyEventKind::Release && is_quit(&key) {
            out.push(GameEvent::Quit);
            return;
        }
        let Some(mapped) = map_key(key.code) else {
            return;
        };

        match key.kind {
            KeyEventKind::Release => {
                self.held.retain(|(k, _)| *k != mapped);
                out.push(GameEvent::KeyUp(mapped));
            }
            KeyEventKind::Press | KeyEventKind::Repeat => {
                if let Some(entry) = self.held.iter_mut().find(|(k, _)| *k == mapped) {
                    // Auto-repeat of a key already down
                    entry.1 = now;
                } else {
                    self.held.push((mapped, now));
                    out.push(GameEvent::KeyDown(mapped));
                }
            }
        }
    }

    /// Translate one crossterm event at time `now`
    pub fn translate(&mut self, event: Event, now: Instant) -> Vec<GameEvent> {
        let mut out = Vec::new();
        match event {
            Event::Key(key) => self.translate_key(key, now, &mut out),
            Event::Mouse(MouseEvent {
                kind, column, row, ..
            }) => {
                let pos = self.cell_to_logical(column, row);
                match kind {
                    MouseEventKind::Moved | MouseEventKind::Drag(_) => {
                        out.push(GameEvent::MouseMove(pos))
                    }
                    MouseEventKind::Down(button) => out.push(GameEvent::MouseDown {
                        button: map_button(button),
                        pos,
                    }),
                    _ => {}
                }
            }
            Event::Resize(cols, rows) => {
                self.cols = cols.max(1);
                self.rows = rows.max(1);
                log::debug!("Terminal resized to {}x{}", cols, rows);
            }
            _ => {}
        }
        out
    }

    /// Synthesized releases for keys that stopped repeating before `now`.
    /// Does nothing when the terminal reports real releases.
    pub fn expire_held(&mut self, now: Instant) -> Vec<GameEvent> {
        if self.key_release {
            return Vec::new();
        }
        let mut released = Vec::new();
        self.held.retain(|(key, last)| {
            if now.saturating_duration_since(*last) >= SYNTHETIC_RELEASE {
                released.push(GameEvent::KeyUp(*key));
                false
            } else {
                true
            }
        });
        released
    }

    pub fn key_release(&self) -> bool {
        self.key_release
    }

    /// Whether `key` is currently considered down
    pub fn is_down(&self, key: Key) -> bool {
        self.held.iter().any(|(k, _)| *k == key)
    }
}

impl EventSource for TerminalEvents {
    fn poll(&mut self) -> io::Result<Vec<GameEvent>> {
        let mut events = Vec::new();
        while event::poll(Duration::ZERO)? {
            let raw = event::read()?;
            events.extend(self.translate(raw, Instant::now()));
        }
        events.extend(self.expire_held(Instant::now()));
        Ok(events)
    }
}

/// Replays pre-recorded batches, one batch per poll
#[derive(Debug, Default, Clone)]
pub struct ScriptedEvents {
    frames: VecDeque<Vec<GameEvent>>,
}

impl ScriptedEvents {
    pub fn new(frames: impl IntoIterator<Item = Vec<GameEvent>>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
        }
    }

    /// Queue another batch
    pub fn push(&mut self, events: Vec<GameEvent>) {
        self.frames.push_back(events);
    }

    /// `n` polls that yield nothing
    pub fn idle(&mut self, n: usize) {
        self.frames.extend(std::iter::repeat_with(Vec::new).take(n));
    }

    pub fn is_exhausted(&self) -> bool {
        self.frames.is_empty()
    }
}

impl EventSource for ScriptedEvents {
    fn poll(&mut self) -> io::Result<Vec<GameEvent>> {
        Ok(self.frames.pop_front().unwrap_or_default())
    }
}
