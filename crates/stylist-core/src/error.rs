//! Error types for stylist-core

use std::path::PathBuf;

/// Result type for stylist-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in stylist-core operations
///
/// Problems with style content or target files are not errors; they are
/// reported as violations. These variants cover what stops an operation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Project configuration file is malformed
    #[error("Invalid configuration in {path}: {message}")]
    Config { path: PathBuf, message: String },

    /// Cache policy string does not match the grammar
    #[error("Invalid cache policy '{0}': expected 'never', 'forever' or '<n> <unit>'")]
    InvalidCachePolicy(String),

    /// Style reference cannot be understood
    #[error("Invalid style reference '{reference}': {reason}")]
    InvalidReference { reference: String, reason: String },

    /// Network access needed while offline
    #[error("Style {reference} is not available in offline mode")]
    Offline { reference: String },

    /// Remote fetch failed
    #[error("Failed to fetch {reference}: {message}")]
    Fetch { reference: String, message: String },

    /// Style reference points nowhere
    #[error("Style {reference} not found")]
    StyleNotFound { reference: String },

    /// Style text is not a valid TOML document
    #[error("Failed to parse style {reference}: {message}")]
    StyleParse { reference: String, message: String },

    // Transparent wrappers for underlying crate errors
    /// Filesystem error from stylist-fs
    #[error(transparent)]
    Fs(#[from] stylist_fs::Error),

    /// Content error from stylist-content
    #[error(transparent)]
    Content(#[from] stylist_content::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// TOML serialization error
    #[error(transparent)]
    TomlSer(#[from] toml::ser::Error),
}

impl Error {
    /// Whether this error came from retrieving a style (as opposed to a
    /// local configuration or I/O problem).
    pub fn is_style_unavailable(&self) -> bool {
        matches!(
            self,
            Error::Offline { .. }
                | Error::Fetch { .. }
                | Error::StyleNotFound { .. }
                | Error::StyleParse { .. }
                | Error::InvalidReference { .. }
        )
    }
}
