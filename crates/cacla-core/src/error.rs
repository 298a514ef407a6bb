//! Error types for CACLA

use thiserror::Error;

/// Main error type for CACLA
#[derive(Error, Debug)]
pub enum CaclaError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Experience buffer used before allocation")]
    NotAllocated,

    #[error("Experience buffer already allocated")]
    AlreadyAllocated,
}

/// Result type alias for CACLA operations
pub type Result<T> = std::result::Result<T, CaclaError>;
