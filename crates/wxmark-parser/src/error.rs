//! Error types for the rendering engine

use thiserror::Error;

/// Rendering engine error type
#[derive(Error, Debug)]
pub enum RenderError {
    /// Filesystem access failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Settings file could not be parsed
    #[error("Invalid settings: {0}")]
    Config(#[from] toml::de::Error),

    /// Settings could not be written back out
    #[error("Settings serialization error: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    /// An extension refused to hook into the engine
    #[error("Extension '{extension}' failed to register: {reason}")]
    Registration {
        extension: &'static str,
        reason: String,
    },

    /// Input exceeds the configured size limit
    #[error("File too large: {size} bytes (max {max})")]
    FileTooLarge { size: usize, max: usize },

    /// Asset lookup or loading failed
    #[error("Asset error: {0}")]
    Asset(String),
}

/// Result type for rendering operations
pub type RenderResult<T> = Result<T, RenderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_error_display() {
        let err = RenderError::Registration {
            extension: "math",
            reason: "missing renderer".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Extension 'math' failed to register: missing renderer"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: RenderError = io.into();
        assert!(matches!(err, RenderError::Io(_)));
    }
}
