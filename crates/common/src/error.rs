//! Error types shared across Gazemap crates.

use std::path::PathBuf;

/// Top-level error type for Gazemap operations.
///
/// The processing core never produces these from steady-state sample
/// handling; they cover configuration, surface geometry and image export.
#[derive(Debug, thiserror::Error)]
pub enum GazemapError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Render error: {message}")]
    Render { message: String },

    #[error("Export error: {message}")]
    Export { message: String },

    #[error("Invalid surface geometry: {message}")]
    InvalidSurface { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Result type alias using GazemapError.
pub type GazemapResult<T> = Result<T, GazemapError>;

impl GazemapError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render {
            message: msg.into(),
        }
    }

    pub fn export(msg: impl Into<String>) -> Self {
        Self::Export {
            message: msg.into(),
        }
    }

    pub fn invalid_surface(msg: impl Into<String>) -> Self {
        Self::InvalidSurface {
            message: msg.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = GazemapError::invalid_surface("width must be positive");
        assert_eq!(
            err.to_string(),
            "Invalid surface geometry: width must be positive"
        );

        let err = GazemapError::FileNotFound {
            path: PathBuf::from("/tmp/missing.jsonl"),
        };
        assert!(err.to_string().contains("missing.jsonl"));
    }

    #[test]
    fn test_io_error_converts() {
        fn open_missing() -> GazemapResult<String> {
            Ok(std::fs::read_to_string(
                "/definitely/not/a/gazemap/path.json",
            )?)
        }
        assert!(matches!(open_missing(), Err(GazemapError::Io(_))));
    }
}
