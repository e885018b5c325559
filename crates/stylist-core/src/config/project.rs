//! The `stylist.toml` project configuration file

use serde::Deserialize;
use stylist_fs::{ConfigStore, NormalizedPath, StylistPath};

use crate::style::{CachePolicy, OneOrMany};
use crate::{Error, Result};

/// Settings read from `stylist.toml` at the project root.
///
/// ```toml
/// style = ["./my-style.toml", "gh://org/styles@v1/python"]
/// cache = "1 hour"
/// offline = false
/// materialize = false
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Style references, one string or a list
    #[serde(default)]
    pub style: Option<OneOrMany>,
    /// Cache policy text, parsed by [`CachePolicy`]
    #[serde(default)]
    pub cache: Option<String>,
    #[serde(default)]
    pub offline: bool,
    /// Write the merged style into the cache directory
    #[serde(default)]
    pub materialize: bool,
}

impl ProjectConfig {
    /// Parse configuration text
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config {
            path: StylistPath::ProjectConfig.as_str().into(),
            message: e.to_string(),
        })
    }

    /// Load `stylist.toml` from `root`; a missing file yields defaults.
    pub fn load(root: &NormalizedPath) -> Result<Self> {
        let path = root.join(StylistPath::ProjectConfig.as_str());
        tracing::debug!(%path, "Loading project configuration");

        match ConfigStore::new().load_if_exists(&path) {
            Ok(Some(config)) => Ok(config),
            Ok(None) => {
                tracing::debug!(%path, "No project configuration, using defaults");
                Ok(Self::default())
            }
            Err(stylist_fs::Error::ConfigParse { path, message, .. }) => {
                Err(Error::Config { path, message })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Configured style references in declaration order
    pub fn styles(&self) -> Vec<String> {
        self.style.as_ref().map(OneOrMany::to_vec).unwrap_or_default()
    }

    pub fn cache_policy(&self) -> Result<CachePolicy> {
        match &self.cache {
            Some(text) => text.parse(),
            None => Ok(CachePolicy::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_parse_full() {
        let config = ProjectConfig::parse(
            r#"
style = ["./mine", "pkg://stylist/python/black"]
cache = "forever"
offline = true
materialize = true
"#,
        )
        .unwrap();

        assert_eq!(config.styles(), vec!["./mine", "pkg://stylist/python/black"]);
        assert_eq!(config.cache_policy().unwrap(), CachePolicy::Forever);
        assert!(config.offline);
        assert!(config.materialize);
    }

    #[test]
    fn test_single_style_string() {
        let config = ProjectConfig::parse(r#"style = "gh://org/styles/base""#).unwrap();
        assert_eq!(config.styles(), vec!["gh://org/styles/base"]);
    }

    #[test]
    fn test_defaults() {
        let config = ProjectConfig::parse("").unwrap();
        assert!(config.styles().is_empty());
        assert_eq!(
            config.cache_policy().unwrap(),
            CachePolicy::ExpiresAfter(TimeDelta::hours(1))
        );
        assert!(!config.offline);
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        assert!(matches!(ProjectConfig::parse("colour = 1"), Err(Error::Config { .. })));
    }

    #[test]
    fn test_bad_cache_policy() {
        let config = ProjectConfig::parse(r#"cache = "often""#).unwrap();
        assert!(matches!(config.cache_policy(), Err(Error::InvalidCachePolicy(_))));
    }

    #[test]
    fn test_load_missing_file_is_default() {
        let temp = TempDir::new().unwrap();
        let config = ProjectConfig::load(&NormalizedPath::new(temp.path())).unwrap();
        assert!(config.styles().is_empty());
    }

    #[test]
    fn test_load_reads_project_file() {
        let temp = TempDir::new().unwrap();
        let content = "style = \"./mine\"\noffline = true\n";
        std::fs::write(temp.path().join("stylist.toml"), content).unwrap();
        let config = ProjectConfig::load(&NormalizedPath::new(temp.path())).unwrap();
        assert_eq!(config.styles(), vec!["./mine"]);
        assert!(config.offline);
    }

    #[test]
    fn test_load_reports_file_path() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("stylist.toml"), "style = [").unwrap();
        let err = ProjectConfig::load(&NormalizedPath::new(temp.path())).unwrap_err();
        assert!(matches!(err, Error::Config { ref path, .. } if path.ends_with("stylist.toml")));
    }
}
