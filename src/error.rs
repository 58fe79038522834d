//! Error taxonomy
//!
//! - `ResourceLoad`: a missing or corrupt asset. Always recovered with a placeholder.
//! - `InvalidLevel`: malformed tile/spawn data. The level is not loaded.
//! - `Invariant`: a programming defect. Panics in debug builds, rejected in release.
//! - `Settings`: settings text that is not valid JSON for `Settings`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GameError {
    #[error("failed to load resource `{path}`: {reason}")]
    ResourceLoad { path: String, reason: String },

    #[error("invalid level data: {0}")]
    InvalidLevel(String),

    #[error("invariant violated: {0}")]
    Invariant(String),

    #[error("invalid settings: {0}")]
    Settings(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, GameError>;

/// Report an invariant violation: fail fast in development builds, log and
/// hand back an error in release builds.
pub(crate) fn invariant(message: impl Into<String>) -> GameError {
    let message = message.into();
    debug_assert!(false, "invariant violated: {message}");
    log::error!("invariant violated: {}", message);
    GameError::Invariant(message)
}
