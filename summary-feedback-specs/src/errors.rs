//! Error types for the fixture system.

use thiserror::Error;

/// Errors that can occur while loading or running fixtures.
#[derive(Debug, Error)]
pub enum SpecError {
    /// Error parsing a fixture file.
    #[error("parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// Error loading a fixture or expected-failures file.
    #[error("failed to load {path}: {message}")]
    Load { path: String, message: String },

    /// A step could not be executed (e.g. a selection outside its sentence).
    #[error("step at line {line} failed: {message}")]
    Step { line: usize, message: String },
}

/// Result type for fixture operations.
pub type SpecResult<T> = Result<T, SpecError>;
