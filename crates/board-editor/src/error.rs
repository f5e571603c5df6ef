//! Errors raised at external boundaries.
//!
//! Local conditions (missing ids, history exhaustion, content decode
//! failures) never surface here; they are absorbed where they occur.

use board_render::{LoadError, SurfaceError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BoardError {
    /// Document load/save failed.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Asset lookup failed.
    #[error("asset error: {0}")]
    Asset(String),

    /// AI generation failed.
    #[error("generation failed: {0}")]
    Generation(String),

    /// Document could not be encoded or decoded.
    #[error("codec error: {0}")]
    Codec(String),

    #[error("surface error: {0}")]
    Surface(#[from] SurfaceError),

    #[error("content load error: {0}")]
    Load(#[from] LoadError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
