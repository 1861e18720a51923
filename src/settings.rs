//! Game settings and preferences
//!
//! Persisted as JSON next to the executable (or wherever `--settings`
//! points). Command-line flags override individual fields after loading.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_REWIND_SECONDS, TICK_RATE};
use crate::error::Result;

/// Default settings file name
pub const SETTINGS_FILE: &str = "settings.json";
/// Default Drop Dodger high score file
pub const HIGH_SCORE_FILE: &str = "high_score.txt";

/// Drop Dodger difficulty levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "medium" | "med" => Some(Difficulty::Medium),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    /// Maximum drops falling at once
    pub fn max_drops(&self) -> usize {
        match self {
            Difficulty::Easy => 12,
            Difficulty::Medium => 20,
            Difficulty::Hard => 40,
        }
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Target ticks per second (0 runs uncapped)
    pub tick_rate: u32,
    /// Seconds of battle history kept for rewind (0 disables recording)
    pub rewind_seconds: u32,

    // === HUD ===
    /// Show FPS counter
    pub show_fps: bool,

    // === Battle ===
    /// Fixed RNG seed for reproducible runs
    pub seed: Option<u64>,

    // === Drop Dodger ===
    pub difficulty: Difficulty,
    pub high_score_file: PathBuf,

    // === Paths ===
    /// Directory sprites are loaded from
    pub asset_root: PathBuf,
    /// Log destination; `invasori.log` when unset
    pub log_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tick_rate: TICK_RATE,
            rewind_seconds: DEFAULT_REWIND_SECONDS,

            show_fps: false,

            seed: None,

            difficulty: Difficulty::Easy,
            high_score_file: PathBuf::from(HIGH_SCORE_FILE),

            asset_root: PathBuf::from("assets"),
            log_file: None,
        }
    }
}

impl Settings {
    /// Number of snapshots the rewind buffer holds. An uncapped loop
    /// (`tick_rate` 0) sizes the history as if it ran at [`TICK_RATE`].
    pub fn rewind_capacity(&self) -> usize {
        let rate = if self.tick_rate == 0 { TICK_RATE } else { self.tick_rate };
        rate as usize * self.rewind_seconds as usize
    }

    /// Load settings from a JSON file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let json = match std::fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No settings at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };
        let settings = serde_json::from_str(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Like [`Settings::load`], but any failure falls back to the defaults
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_else(|e| {
            log::warn!("Ignoring settings at {}: {}", path.display(), e);
            Self::default()
        })
    }

    /// Save settings as pretty-printed JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        log::info!("Settings saved to {}", path.display());
        Ok(())
    }
}
