//! Scenes and the scene manager
//!
//! A scene is one mode of the game (menu, intro, battle). Exactly one scene is
//! current at a time; the [`SceneManager`] owns every scene, drives their
//! lifecycle and records a [`Snapshot`] after each forward tick so play can be
//! rewound.

pub mod battle;
pub mod dodger;
pub mod intro;
pub mod manager;
pub mod menu;

pub use battle::BattleScene;
pub use dodger::DodgerScene;
pub use intro::IntroScene;
pub use manager::SceneManager;
pub use menu::MenuScene;

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use crate::context::SceneContext;
use crate::event::GameEvent;
use crate::renderer::Frame;

/// What a tick does with the current scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TickMode {
    /// Simulate forward and record the result
    #[default]
    Advance,
    /// Restore the previous recorded state
    Rewind,
    /// Restore the next recorded state (only after rewinding)
    Replay,
}

/// Opaque, immutable capture of a scene's simulation state.
///
/// Cloning is cheap (shared pointer); the inner value is only reachable
/// through `&T`, so the stored copy can never change after capture.
#[derive(Clone, Default)]
pub struct Snapshot(Option<Rc<dyn Any>>);

impl Snapshot {
    /// Snapshot of a scene with no simulation state
    pub fn empty() -> Self {
        Self(None)
    }

    pub fn new<T: Any>(value: T) -> Self {
        Self(Some(Rc::new(value)))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }

    /// Borrow the captured value if it has type `T`
    pub fn get<T: Any>(&self) -> Option<&T> {
        self.0.as_deref().and_then(|value| value.downcast_ref::<T>())
    }
}

impl fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            f.write_str("Snapshot(empty)")
        } else {
            f.write_str("Snapshot(..)")
        }
    }
}

/// Capability set of a scene
pub trait Scene {
    /// Called once each time the scene becomes current
    fn initialize(&mut self, ctx: &mut SceneContext);

    /// Called once each time the scene stops being current
    fn finalize(&mut self, ctx: &mut SceneContext);

    /// React to one input/system event
    fn handle_event(&mut self, _event: &GameEvent, _ctx: &mut SceneContext) {}

    /// Advance the simulation by `dt` seconds. Must be deterministic for a
    /// given state and `dt`.
    fn advance(&mut self, dt: f32, ctx: &mut SceneContext);

    /// Draw into the frame
    fn render(&self, frame: &mut Frame);

    /// Capture everything needed to resume simulation from this point
    fn capture_state(&self) -> Snapshot {
        Snapshot::empty()
    }

    /// Overwrite simulation state from a snapshot taken by `capture_state`
    fn restore_state(&mut self, _snapshot: &Snapshot) {}
}
