//! Well-known project paths.

use std::path::Path;

/// Files and directories stylist looks for inside a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StylistPath {
    /// The `stylist.toml` project configuration
    ProjectConfig,
    /// The `stylist-style.toml` style picked up by convention
    ConventionStyle,
    /// The `.cache/stylist` directory holding fetched styles
    CacheDir,
    /// Subdirectory of the cache holding one file per fetched style
    StyleCacheDir,
    /// The materialized merged style inside the cache directory
    MergedStyle,
}

impl StylistPath {
    /// Get the string representation of the path.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProjectConfig => "stylist.toml",
            Self::ConventionStyle => "stylist-style.toml",
            Self::CacheDir => ".cache/stylist",
            Self::StyleCacheDir => "styles",
            Self::MergedStyle => "merged-style.toml",
        }
    }
}

impl AsRef<Path> for StylistPath {
    fn as_ref(&self) -> &Path {
        Path::new(self.as_str())
    }
}

impl AsRef<str> for StylistPath {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl std::fmt::Display for StylistPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
