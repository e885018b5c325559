//! Error types for stylist-content

/// Result type for stylist-content operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in stylist-content operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Failed to parse {format} content: {message}")]
    ParseError { format: String, message: String },

    #[error("Failed to serialize {format} content: {message}")]
    SerializeError { format: String, message: String },

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Key '{path}' is both a value and a table")]
    StructuralConflict { path: String },

    #[error("Expected a table at '{path}'")]
    NotAMap { path: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    pub fn parse(format: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ParseError {
            format: format.into(),
            message: message.into(),
        }
    }

    pub fn serialize(format: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SerializeError {
            format: format.into(),
            message: message.into(),
        }
    }
}
