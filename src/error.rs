//! Error types for Keel.
//!
//! Only conditions that abort a unit (or a whole command) are errors.
//! Missing names/bodies, unresolved references and malformed hash pairs
//! are ordinary data and never surface here.

use std::path::PathBuf;

/// Errors produced by the Keel library.
#[derive(Debug, thiserror::Error)]
pub enum KeelError {
    /// The file extension does not map to a supported grammar.
    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// tree-sitter produced no tree for the input.
    #[error("failed to parse {path}")]
    Parse { path: PathBuf },

    /// The syntax tree handle is unusable (e.g. it does not cover the source
    /// it claims to describe, or a recorded declaration can't be located).
    #[error("invalid syntax tree for {path}: {reason}")]
    InvalidTree { path: PathBuf, reason: String },

    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, KeelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = KeelError::UnsupportedLanguage("lua".to_string());
        assert_eq!(err.to_string(), "unsupported language: lua");

        let err = KeelError::InvalidTree {
            path: PathBuf::from("src/a.rs"),
            reason: "root does not cover source".to_string(),
        };
        assert!(err.to_string().contains("src/a.rs"));
        assert!(err.to_string().contains("root does not cover source"));
    }

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: KeelError = io.into();
        assert!(matches!(err, KeelError::Io(_)));
    }
}
