//! Asset lookup with placeholder fallback
//!
//! Image decoding is out of scope: a sprite records its size and a tint,
//! and whether its source file was readable. When the file is missing the
//! caller's placeholder is used and a warning is logged, so scenes never
//! have to deal with load failures.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use glam::Vec2;

use crate::renderer::Color;

/// Shape used when drawing a sprite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpriteShape {
    #[default]
    Rect,
    Circle,
}

/// Where a sprite came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpriteSource {
    /// Backing file was found
    File,
    /// Deterministic stand-in
    Placeholder,
}

/// A drawable sprite
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sprite {
    pub size: Vec2,
    pub color: Color,
    pub shape: SpriteShape,
    pub source: SpriteSource,
}

impl Sprite {
    pub fn placeholder(size: Vec2, color: Color, shape: SpriteShape) -> Self {
        Self {
            size,
            color,
            shape,
            source: SpriteSource::Placeholder,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.source == SpriteSource::Placeholder
    }
}

/// Resolves logical asset paths under a root directory
#[derive(Debug, Clone)]
pub struct AssetLoader {
    root: PathBuf,
    /// Paths already reported missing (warn once each)
    missing: HashSet<PathBuf>,
}

impl Default for AssetLoader {
    fn default() -> Self {
        Self::new("assets")
    }
}

impl AssetLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            missing: HashSet::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Load a sprite, falling back to a placeholder of the same size
    pub fn sprite(&mut self, path: &str, size: Vec2, color: Color, shape: SpriteShape) -> Sprite {
        let full = self.root.join(path);
        match std::fs::File::open(&full) {
            Ok(_) => Sprite {
                size,
                color,
                shape,
                source: SpriteSource::File,
            },
            Err(e) => {
                if self.missing.insert(full.clone()) {
                    log::warn!(
                        "Failed to load image {}: {} - using placeholder",
                        full.display(),
                        e
                    );
                }
                Sprite::placeholder(size, color, shape)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::colors;

    #[test]
    fn test_missing_file_gives_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let mut loader = AssetLoader::new(dir.path());
        let sprite = loader.sprite("img/boss.png", Vec2::new(100.0, 80.0), colors::RED, SpriteShape::Rect);
        assert!(sprite.is_placeholder());
        assert_eq!(sprite.size, Vec2::new(100.0, 80.0));
        assert_eq!(sprite.color, colors::RED);
    }

    #[test]
    fn test_existing_file_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("ship.png"), b"png").unwrap();
        let mut loader = AssetLoader::new(dir.path());
        let sprite = loader.sprite("ship.png", Vec2::splat(40.0), colors::WHITE, SpriteShape::Rect);
        assert_eq!(sprite.source, SpriteSource::File);
    }
}
