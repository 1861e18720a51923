//! Input and system events delivered once per frame

use glam::Vec2;

/// Logical keys the game reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Left,
    Right,
    Up,
    Down,
    /// Fire / confirm
    Space,
    Enter,
    Escape,
    /// Hold to step backward through history
    Rewind,
    /// Hold to step forward through rewound history
    Replay,
    /// Any other printable key (lowercased)
    Char(char),
}

/// Mouse buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Timer identifier chosen by the scene that scheduled it
pub type TimerId = u32;

/// A single discrete event
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    /// Window closed / Ctrl-C
    Quit,
    KeyDown(Key),
    KeyUp(Key),
    /// Pointer moved (logical coordinates)
    MouseMove(Vec2),
    MouseDown { button: MouseButton, pos: Vec2 },
    /// A timer scheduled through the scene context expired
    Timer(TimerId),
}

impl GameEvent {
    /// Position of a left click, if this is one
    pub fn left_click(&self) -> Option<Vec2> {
        match self {
            GameEvent::MouseDown {
                button: MouseButton::Left,
                pos,
            } => Some(*pos),
            _ => None,
        }
    }

    pub fn is_key_down(&self, key: Key) -> bool {
        matches!(self, GameEvent::KeyDown(k) if *k == key)
    }
}
