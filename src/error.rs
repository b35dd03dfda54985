//! Error handling module for the launcher
//!
//! Provides centralized error handling with proper error types using thiserror.
//! All errors in the application should use these types for consistency.

#![allow(dead_code)] // Error variants and helpers are available for future use

use thiserror::Error;

use crate::manifest::ManifestError;

/// Main error type for the launcher
#[derive(Error, Debug)]
pub enum LauncherError {
    /// IO errors (file operations, spawning children, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors (loading, parsing, validation)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Interpreter errors (no Python 3 on PATH, unparseable version)
    #[error("Interpreter error: {0}")]
    Interpreter(String),

    /// Module probe errors (library unimportable after install)
    #[error("Probe error: {0}")]
    Probe(String),

    /// Dependency installation errors (pip failures)
    #[error("Install error: {0}")]
    Install(String),

    /// Hand-off errors (entry point missing, exec failure)
    #[error("Launch error: {0}")]
    Launch(String),

    /// Validation errors (user input, config values)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Dependency manifest errors
    #[error("Manifest error: {0}")]
    Manifest(#[from] ManifestError),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// General errors (catch-all for edge cases)
    #[error("{0}")]
    General(String),
}

/// Result type alias for launcher operations
pub type Result<T> = std::result::Result<T, LauncherError>;

// Convenient error constructors
impl LauncherError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an interpreter error
    pub fn interpreter(msg: impl Into<String>) -> Self {
        Self::Interpreter(msg.into())
    }

    /// Create a module probe error
    pub fn probe(msg: impl Into<String>) -> Self {
        Self::Probe(msg.into())
    }

    /// Create a dependency installation error
    pub fn install(msg: impl Into<String>) -> Self {
        Self::Install(msg.into())
    }

    /// Create a hand-off error
    pub fn launch(msg: impl Into<String>) -> Self {
        Self::Launch(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a general error
    pub fn general(msg: impl Into<String>) -> Self {
        Self::General(msg.into())
    }
}

/// Create a general error (convenience function)
pub fn general_error(msg: impl Into<String>) -> LauncherError {
    LauncherError::General(msg.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LauncherError::interpreter("no Python 3 interpreter found on PATH");
        assert_eq!(
            err.to_string(),
            "Interpreter error: no Python 3 interpreter found on PATH"
        );

        let err = LauncherError::config("entry point must be specified");
        assert_eq!(
            err.to_string(),
            "Configuration error: entry point must be specified"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: LauncherError = io_err.into();
        assert!(matches!(err, LauncherError::Io(_)));
    }
}
