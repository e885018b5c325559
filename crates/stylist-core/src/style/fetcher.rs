//! Retrieval of style text for a [`StyleRef`]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::Client;
use stylist_fs::{NormalizedPath, io};

use super::cache::StyleCache;
use super::reference::StyleRef;
use super::resources;
use crate::{Error, Result};

const FORGE_API: &str = "https://api.github.com/repos";
const FORGE_TOKEN_ENV: &str = "GITHUB_TOKEN";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Blocking GET of a URL's body.
///
/// Implementations report a missing resource as [`Error::StyleNotFound`]
/// and everything else as [`Error::Fetch`].
pub trait Transport: Send + Sync {
    fn get(&self, url: &str) -> Result<String>;
}

/// [`Transport`] backed by a `reqwest` blocking client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    token: Option<String>,
}

impl HttpTransport {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("stylist/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::Fetch {
                reference: "http client".to_string(),
                message: e.to_string(),
            })?;
        let token = std::env::var(FORGE_TOKEN_ENV).ok().filter(|t| !t.is_empty());
        Ok(Self { client, token })
    }

    fn is_forge_url(url: &str) -> bool {
        url.starts_with(FORGE_API) || url.starts_with("https://raw.githubusercontent.com/")
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str) -> Result<String> {
        let fetch_error = |message: String| Error::Fetch {
            reference: url.to_string(),
            message,
        };

        let mut request = self.client.get(url);
        if let Some(token) = &self.token {
            if Self::is_forge_url(url) {
                request = request.bearer_auth(token);
            }
        }

        tracing::debug!(url, "GET");
        let response = request.send().map_err(|e| fetch_error(e.to_string()))?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(Error::StyleNotFound {
                reference: url.to_string(),
            });
        }
        if !status.is_success() {
            return Err(fetch_error(format!("HTTP {status}")));
        }
        response.text().map_err(|e| fetch_error(e.to_string()))
    }
}

/// Resolves references to text, consulting the cache for remote ones.
pub struct StyleFetcher {
    cache: StyleCache,
    transport: Arc<dyn Transport>,
    offline: bool,
    /// `owner/repo` -> default branch
    default_branches: HashMap<String, String>,
}

impl StyleFetcher {
    pub fn new(cache: StyleCache, transport: Arc<dyn Transport>, offline: bool) -> Self {
        Self {
            cache,
            transport,
            offline,
            default_branches: HashMap::new(),
        }
    }

    /// Fetch the text behind `reference`.
    pub fn fetch(&mut self, reference: &StyleRef) -> Result<String> {
        match reference {
            StyleRef::Local(path) => read_local(path, reference),
            StyleRef::Package { path } => resources::lookup(path)
                .map(str::to_string)
                .ok_or_else(|| Error::StyleNotFound {
                    reference: reference.to_string(),
                }),
            StyleRef::Http(_) | StyleRef::Forge { .. } => self.fetch_remote(reference),
        }
    }

    fn fetch_remote(&mut self, reference: &StyleRef) -> Result<String> {
        let key = reference.to_string();
        if let Some(content) = self.cache.get(&key) {
            tracing::debug!(reference = %key, "Style cache hit");
            return Ok(content);
        }
        if self.offline {
            return Err(Error::Offline { reference: key });
        }

        let url = match reference {
            StyleRef::Http(url) => url.to_string(),
            StyleRef::Forge {
                owner,
                repo,
                git_ref,
                path,
            } => {
                let git_ref = match git_ref {
                    Some(git_ref) => git_ref.clone(),
                    None => self.default_branch(owner, repo)?,
                };
                StyleRef::forge_raw_url(owner, repo, &git_ref, path)
            }
            StyleRef::Local(_) | StyleRef::Package { .. } => {
                return Err(Error::InvalidReference {
                    reference: key,
                    reason: "not a remote reference".to_string(),
                });
            }
        };

        tracing::info!(reference = %key, %url, "Fetching style");
        let content = self.transport.get(&url).map_err(|e| match e {
            Error::StyleNotFound { .. } => Error::StyleNotFound { reference: key.clone() },
            Error::Fetch { message, .. } => Error::Fetch {
                reference: key.clone(),
                message,
            },
            other => other,
        })?;

        if let Err(e) = self.cache.put(&key, &content) {
            tracing::warn!(reference = %key, error = %e, "Could not cache fetched style");
        }
        Ok(content)
    }

    /// Default branch of a forge repository, asked for once per fetcher.
    fn default_branch(&mut self, owner: &str, repo: &str) -> Result<String> {
        let slug = format!("{owner}/{repo}");
        if let Some(branch) = self.default_branches.get(&slug) {
            return Ok(branch.clone());
        }

        let url = format!("{FORGE_API}/{slug}");
        let body = self.transport.get(&url)?;
        let metadata: serde_json::Value = serde_json::from_str(&body)?;
        let branch = metadata
            .get("default_branch")
            .and_then(|b| b.as_str())
            .ok_or_else(|| Error::Fetch {
                reference: url.clone(),
                message: "response has no default_branch".to_string(),
            })?
            .to_string();

        tracing::debug!(repository = %slug, %branch, "Resolved default branch");
        self.default_branches.insert(slug, branch.clone());
        Ok(branch)
    }
}

fn read_local(path: &NormalizedPath, reference: &StyleRef) -> Result<String> {
    if !path.is_file() {
        return Err(Error::StyleNotFound {
            reference: reference.to_string(),
        });
    }
    Ok(io::read_text(path)?)
}
