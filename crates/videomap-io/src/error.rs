//! Error types for project persistence.

use std::path::PathBuf;

/// Result type alias for persistence operations.
pub type Result<T> = std::result::Result<T, IoError>;

/// Errors raised while reading or writing project files.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// Generic I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// RON decoding failed
    #[error("RON parse error: {0}")]
    RonParse(#[from] ron::error::SpannedError),

    /// RON encoding failed
    #[error("RON error: {0}")]
    Ron(#[from] ron::Error),

    /// The file extension is not a known project format
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// The file was written by an incompatible version
    #[error("Project version mismatch: expected {expected}, found {found}")]
    VersionMismatch {
        /// Version this build writes
        expected: String,
        /// Version found in the file
        found: String,
    },

    /// The file exceeds the load limit
    #[error("File too large: {size} bytes (limit {limit} bytes)")]
    FileTooLarge {
        /// Actual size in bytes
        size: u64,
        /// Allowed size in bytes
        limit: u64,
    },

    /// The project path does not name a file
    #[error("Invalid path: {0}")]
    InvalidPath(PathBuf),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = IoError::UnsupportedFormat("txt".to_string());
        assert_eq!(err.to_string(), "Unsupported file format: txt");
    }

    #[test]
    fn test_file_too_large_display() {
        let err = IoError::FileTooLarge {
            size: 1024,
            limit: 500,
        };
        let err_str = err.to_string();
        assert!(err_str.contains("1024"));
        assert!(err_str.contains("500"));
    }
}
