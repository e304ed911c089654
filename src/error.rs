//! Error types for loss computation.

use mlx_rs::error::Exception;
use thiserror::Error;

/// Result type for loss operations.
pub type Result<T> = std::result::Result<T, LossError>;

/// Error type for loss operations.
#[derive(Error, Debug)]
pub enum LossError {
    /// MLX operation error.
    #[error("MLX error: {0}")]
    Mlx(#[from] Exception),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Audio processing error.
    #[error("Audio error: {0}")]
    Audio(String),
}
