//! Invasori Infinito - a Space Invaders style shooter with time rewind
//!
//! Core modules:
//! - `scene`: Scene trait, snapshots and the scene manager
//! - `rewind`: Bounded history buffer behind the rewind feature
//! - `game`: Frame loop driving events, ticks and rendering
//! - `sim`: Deterministic battle simulation (ship, lasers, enemies, boss)
//! - `renderer`: Draw-list frames and the terminal backend
//! - `dodger`: The Drop Dodger easter egg

pub mod assets;
pub mod clock;
pub mod context;
pub mod dodger;
pub mod error;
pub mod event;
pub mod game;
pub mod highscores;
pub mod input;
pub mod renderer;
pub mod rewind;
pub mod scene;
pub mod settings;
pub mod sim;

pub use error::{GameError, SceneError};
pub use highscores::HighScoreFile;
pub use rewind::RewindBuffer;
pub use scene::{Scene, SceneManager, Snapshot, TickMode};
pub use settings::{Difficulty, Settings};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Window title
    pub const GAME_TITLE: &str = "Invasori Infinito";

    /// Logical screen size (all scenes draw in these coordinates)
    pub const SCREEN_WIDTH: f32 = 800.0;
    pub const SCREEN_HEIGHT: f32 = 600.0;

    /// Width of the centered gameplay area
    pub const PLAY_AREA_WIDTH: f32 = 720.0;

    /// Target tick cadence (Hz)
    pub const TICK_RATE: u32 = 60;
    /// Largest delta fed to a scene, prevents huge steps after a stall
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Seconds of history kept for rewind
    pub const DEFAULT_REWIND_SECONDS: u32 = 10;

    /// Scene names
    pub const SCENE_MENU: &str = "menu";
    pub const SCENE_INTRO: &str = "intro";
    pub const SCENE_BATTLE: &str = "game";
    pub const SCENE_DODGER: &str = "dodger";
}

/// Center of the logical screen
#[inline]
pub fn screen_center() -> Vec2 {
    Vec2::new(consts::SCREEN_WIDTH / 2.0, consts::SCREEN_HEIGHT / 2.0)
}
