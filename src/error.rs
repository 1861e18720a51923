//! Error types
//!
//! Configuration problems (scene registry) are reported to the caller and
//! never take the process down. Everything the frame loop can fail with is
//! collected in [`GameError`].

/// Scene registry and transition errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SceneError {
    /// A scene with this name is already registered
    #[error("scene '{0}' is already registered")]
    Duplicate(String),

    /// No scene is registered under this name
    #[error("scene '{0}' not found")]
    NotFound(String),
}

/// Errors surfaced by the game loop and the binary
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    /// Terminal or file I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Scene setup failure
    #[error("scene error: {0}")]
    Scene(#[from] SceneError),

    /// Settings file could not be encoded/decoded
    #[error("settings error: {0}")]
    Settings(#[from] serde_json::Error),

    /// A scene panicked inside the frame loop
    #[error("game loop panicked: {0}")]
    Panic(String),
}

pub type Result<T, E = GameError> = std::result::Result<T, E>;
