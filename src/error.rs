//! Unified error type for matrixcode.

use thiserror::Error;

/// Errors that can occur while resolving or running a renderer.
#[derive(Debug, Error)]
pub enum MatrixcodeError {
    /// Bad renderer name, malformed options, or a renderer used without a symbol.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A renderer precondition was not met (module shape, format, size limit).
    #[error("Validation error: {0}")]
    Validation(String),

    /// The image encoder rejected the rendered canvas.
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// A symbol description file could not be read or parsed.
    #[error("Symbol file error: {0}")]
    SymbolFile(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl MatrixcodeError {
    /// Returns true for [`MatrixcodeError::Configuration`].
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    /// Returns true for [`MatrixcodeError::Validation`].
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

/// Shorthand result type used throughout the crate.
pub type Result<T> = std::result::Result<T, MatrixcodeError>;
