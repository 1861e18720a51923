//! Drop Dodger high score
//!
//! A single integer in a plain-text file. A missing or unreadable file
//! counts as 0; the file is only rewritten when a run beats it.

use std::path::{Path, PathBuf};

use crate::error::Result;

/// High score persisted in a text file
#[derive(Debug, Clone)]
pub struct HighScoreFile {
    path: PathBuf,
}

impl HighScoreFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored high score (0 if missing or malformed)
    pub fn load(&self) -> u64 {
        match std::fs::read_to_string(&self.path) {
            Ok(text) => text.trim().parse().unwrap_or_else(|_| {
                log::warn!("Malformed high score in {}, treating as 0", self.path.display());
                0
            }),
            Err(_) => 0,
        }
    }

    /// Store `score` if it beats the saved one. Returns true if written.
    pub fn submit(&self, score: u64) -> Result<bool> {
        let best = self.load();
        if score <= best {
            return Ok(false);
        }
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, score.to_string())?;
        log::info!("New high score {} (was {})", score, best);
        Ok(true)
    }
}
