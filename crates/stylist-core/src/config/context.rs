//! Per-invocation context

use std::sync::Arc;

use semver::Version;
use stylist_fs::{NormalizedPath, StylistPath};

use super::project::ProjectConfig;
use crate::Result;
use crate::style::{CachePolicy, HttpTransport, Transport};

/// Environment variable forcing offline mode when set to a truthy value
pub const OFFLINE_ENV: &str = "STYLIST_OFFLINE";

/// Everything one run needs, built once and passed down by reference.
#[derive(Clone)]
pub struct Context {
    root: NormalizedPath,
    cache_dir: NormalizedPath,
    styles: Vec<String>,
    offline: bool,
    cache_policy: CachePolicy,
    materialize: bool,
    version: Version,
    transport: Arc<dyn Transport>,
}

impl Context {
    /// Context with default settings for the project at `root`.
    pub fn new(root: NormalizedPath) -> Result<Self> {
        let cache_dir = root.join(StylistPath::CacheDir.as_str());
        Ok(Self {
            root,
            cache_dir,
            styles: Vec::new(),
            offline: false,
            cache_policy: CachePolicy::default(),
            materialize: false,
            version: engine_version(),
            transport: Arc::new(HttpTransport::new()?),
        })
    }

    /// Context configured from `stylist.toml` and the environment.
    pub fn load(root: NormalizedPath) -> Result<Self> {
        let config = ProjectConfig::load(&root)?;
        let offline = config.offline || env_flag(OFFLINE_ENV);
        let cache_policy = config.cache_policy()?;

        Ok(Self::new(root)?
            .with_styles(config.styles())
            .with_offline(offline)
            .with_cache_policy(cache_policy)
            .with_materialize(config.materialize))
    }

    pub fn with_styles(mut self, styles: Vec<String>) -> Self {
        self.styles = styles;
        self
    }

    pub fn with_offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    pub fn with_cache_policy(mut self, policy: CachePolicy) -> Self {
        self.cache_policy = policy;
        self
    }

    pub fn with_materialize(mut self, materialize: bool) -> Self {
        self.materialize = materialize;
        self
    }

    /// Pretend to be a different stylist release (for version gates)
    pub fn with_version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }

    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = transport;
        self
    }

    pub fn root(&self) -> &NormalizedPath {
        &self.root
    }

    pub fn cache_dir(&self) -> &NormalizedPath {
        &self.cache_dir
    }

    /// Style references configured for the project, possibly empty
    pub fn styles(&self) -> &[String] {
        &self.styles
    }

    pub fn offline(&self) -> bool {
        self.offline
    }

    pub fn cache_policy(&self) -> CachePolicy {
        self.cache_policy
    }

    pub fn materialize(&self) -> bool {
        self.materialize
    }

    pub fn version(&self) -> &Version {
        &self.version
    }

    pub fn transport(&self) -> Arc<dyn Transport> {
        Arc::clone(&self.transport)
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("root", &self.root)
            .field("styles", &self.styles)
            .field("offline", &self.offline)
            .field("cache_policy", &self.cache_policy)
            .field("version", &self.version)
            .finish()
    }
}

/// The running stylist release
pub fn engine_version() -> Version {
    Version::parse(env!("CARGO_PKG_VERSION")).unwrap_or_else(|_| Version::new(0, 0, 0))
}

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|value| matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}
