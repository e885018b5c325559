//! Style references and their canonical form
//!
//! A reference names where a style document lives. Every syntactic variant
//! is canonicalized on parse (scheme normalized, `.toml` appended), so the
//! [`Display`](std::fmt::Display) form doubles as the dedup and cache key.
//!
//! | Written as | Parsed as |
//! |---|---|
//! | `./styles/base`, `~/x.toml`, `file:///abs/x` | [`StyleRef::Local`] |
//! | `https://host/path/style` | [`StyleRef::Http`] |
//! | `gh://owner/repo@v1/path`, `https://github.com/o/r/blob/<ref>/<path>` | [`StyleRef::Forge`] |
//! | `pkg://stylist/python/black`, `pkg://stylist.python.black` | [`StyleRef::Package`] |
//!
//! In both forge forms the ref ends at the first `/`, so a branch such as
//! `feature/x` is written percent-encoded: `gh://o/r@feature%2Fx/style`.

use std::fmt;

use regex::Regex;
use stylist_fs::NormalizedPath;
use url::Url;

use crate::{Error, Result};

/// Extension appended to references that lack it
pub const DEFAULT_EXTENSION: &str = "toml";

const FORGE_HOST: &str = "github.com";
const FORGE_RAW_HOST: &str = "https://raw.githubusercontent.com";
const FORGE_SHORTHAND: &str = r"^(?P<owner>[^/@]+)/(?P<repo>[^/@]+)(?:@(?P<git_ref>[^/]+))?/(?P<path>.+)$";

/// Where a style document lives.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StyleRef {
    /// A file on the local filesystem (absolute, cleaned)
    Local(NormalizedPath),
    /// A plain HTTP(S) resource
    Http(Url),
    /// A file in a source-forge repository; `git_ref` defaults to the
    /// repository's default branch
    Forge {
        owner: String,
        repo: String,
        git_ref: Option<String>,
        path: String,
    },
    /// A style bundled with stylist, as `<namespace>/<path>.toml`
    Package { path: String },
}

impl StyleRef {
    /// Parse `raw`, resolving relative forms against `parent` (the including
    /// style) or, for top-level references, against `root`.
    pub fn parse(raw: &str, parent: Option<&StyleRef>, root: &NormalizedPath) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(invalid(raw, "empty reference"));
        }

        if let Some((scheme, rest)) = raw.split_once("://") {
            return match scheme.to_lowercase().as_str() {
                "file" => Ok(Self::local(root, rest)),
                "http" | "https" => Self::parse_http(raw),
                "gh" | "github" => Self::parse_forge(raw, rest),
                "pkg" | "package" => Self::parse_package(raw, rest),
                other => Err(invalid(raw, &format!("unsupported scheme '{other}'"))),
            };
        }

        let anchored = raw.starts_with('/') || raw.starts_with('~') || NormalizedPath::new(raw).is_absolute();
        match parent {
            Some(parent) if !anchored => parent.join(raw),
            _ => Ok(Self::local(root, raw)),
        }
    }

    fn local(root: &NormalizedPath, raw: &str) -> Self {
        let path = root.resolve(raw).with_default_extension(DEFAULT_EXTENSION);
        Self::Local(path.canonical())
    }

    fn parse_http(raw: &str) -> Result<Self> {
        let url = Url::parse(raw).map_err(|e| invalid(raw, &e.to_string()))?;

        if url.host_str() == Some(FORGE_HOST) {
            let segments: Vec<&str> = url.path_segments().map(|s| s.collect()).unwrap_or_default();
            if let [owner, repo, "blob", git_ref, path @ ..] = segments.as_slice() {
                if !path.is_empty() {
                    return Ok(Self::Forge {
                        owner: owner.to_string(),
                        repo: repo.to_string(),
                        git_ref: Some(decode_ref(git_ref)),
                        path: with_extension(&path.join("/")),
                    });
                }
            }
        }

        Ok(Self::Http(url_with_extension(url)))
    }

    fn parse_forge(raw: &str, rest: &str) -> Result<Self> {
        let pattern = Regex::new(FORGE_SHORTHAND).map_err(|e| invalid(raw, &e.to_string()))?;
        let captures = pattern
            .captures(rest)
            .ok_or_else(|| invalid(raw, "expected owner/repo[@ref]/path"))?;

        Ok(Self::Forge {
            owner: captures["owner"].to_string(),
            repo: captures["repo"].to_string(),
            git_ref: captures.name("git_ref").map(|m| decode_ref(m.as_str())),
            path: with_extension(&clean_relative(&captures["path"])),
        })
    }

    fn parse_package(raw: &str, rest: &str) -> Result<Self> {
        let bare = rest
            .trim_matches('/')
            .strip_suffix(".toml")
            .unwrap_or(rest.trim_matches('/'));
        let path = if bare.contains('/') {
            bare.to_string()
        } else {
            bare.replace('.', "/")
        };
        if path.is_empty() {
            return Err(invalid(raw, "empty resource path"));
        }
        Ok(Self::Package {
            path: with_extension(&clean_relative(&path)),
        })
    }

    /// Resolve a relative reference found inside this style.
    fn join(&self, raw: &str) -> Result<Self> {
        match self {
            Self::Local(path) => {
                let dir = path.parent().unwrap_or_else(|| NormalizedPath::new("/"));
                Ok(Self::local(&dir, raw))
            }
            Self::Http(url) => {
                let joined = url.join(raw).map_err(|e| invalid(raw, &e.to_string()))?;
                Ok(Self::Http(url_with_extension(joined)))
            }
            Self::Forge {
                owner,
                repo,
                git_ref,
                path,
            } => Ok(Self::Forge {
                owner: owner.clone(),
                repo: repo.clone(),
                git_ref: git_ref.clone(),
                path: with_extension(&sibling(path, raw)),
            }),
            Self::Package { path } => Ok(Self::Package {
                path: with_extension(&sibling(path, raw)),
            }),
        }
    }

    /// Whether fetching this reference needs the network.
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Forge { .. })
    }

    /// Raw-content URL of a forge reference once its ref is known.
    pub fn forge_raw_url(owner: &str, repo: &str, git_ref: &str, path: &str) -> String {
        format!("{FORGE_RAW_HOST}/{owner}/{repo}/{git_ref}/{path}")
    }
}

impl fmt::Display for StyleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(path) => write!(f, "file://{path}"),
            Self::Http(url) => write!(f, "{url}"),
            Self::Forge {
                owner,
                repo,
                git_ref,
                path,
            } => match git_ref {
                Some(git_ref) => {
                    let git_ref = git_ref.replace('/', "%2F");
                    write!(f, "gh://{owner}/{repo}@{git_ref}/{path}")
                }
                None => write!(f, "gh://{owner}/{repo}/{path}"),
            },
            Self::Package { path } => write!(f, "pkg://{path}"),
        }
    }
}

fn decode_ref(raw: &str) -> String {
    raw.replace("%2F", "/").replace("%2f", "/")
}

fn invalid(reference: &str, reason: &str) -> Error {
    Error::InvalidReference {
        reference: reference.to_string(),
        reason: reason.to_string(),
    }
}

fn with_extension(path: &str) -> String {
    let suffix = format!(".{DEFAULT_EXTENSION}");
    if path.ends_with(&suffix) {
        path.to_string()
    } else {
        format!("{path}{suffix}")
    }
}

fn url_with_extension(mut url: Url) -> Url {
    let path = with_extension(url.path());
    url.set_path(&path);
    url
}

/// Clean a slash-separated path that must stay relative to its container.
fn clean_relative(path: &str) -> String {
    NormalizedPath::new(path)
        .clean()
        .as_str()
        .trim_start_matches("../")
        .trim_start_matches('/')
        .to_string()
}

/// `raw` resolved against the directory holding `path`.
fn sibling(path: &str, raw: &str) -> String {
    let dir = match path.rsplit_once('/') {
        Some((dir, _)) => dir,
        None => "",
    };
    clean_relative(NormalizedPath::new(dir).join(raw).as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn root() -> NormalizedPath {
        NormalizedPath::new("/project")
    }

    fn key(raw: &str) -> String {
        StyleRef::parse(raw, None, &root()).unwrap().to_string()
    }

    #[rstest]
    #[case("./styles/base", "file:///project/styles/base.toml")]
    #[case("styles/base.toml", "file:///project/styles/base.toml")]
    #[case("file:///etc/stylist/x", "file:///etc/stylist/x.toml")]
    #[case("https://example.com/styles/python", "https://example.com/styles/python.toml")]
    #[case("HTTPS://example.com/a.toml", "https://example.com/a.toml")]
    #[case("gh://org/styles/python/black", "gh://org/styles/python/black.toml")]
    #[case("github://org/styles@v1/base.toml", "gh://org/styles@v1/base.toml")]
    #[case("https://github.com/org/styles/blob/main/python.toml", "gh://org/styles@main/python.toml")]
    #[case("pkg://stylist/python/black", "pkg://stylist/python/black.toml")]
    #[case("package://stylist.python.black", "pkg://stylist/python/black.toml")]
    fn test_canonical_keys(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(key(raw), expected);
    }

    #[test]
    fn test_ref_ends_at_first_slash() {
        let parsed = StyleRef::parse("gh://o/r@feature/x/p", None, &root()).unwrap();
        assert_eq!(
            parsed,
            StyleRef::Forge {
                owner: "o".into(),
                repo: "r".into(),
                git_ref: Some("feature".into()),
                path: "x/p.toml".into(),
            }
        );
    }

    #[rstest]
    #[case("gh://o/r@feature%2Fx/p")]
    #[case("https://github.com/o/r/blob/feature%2Fx/p.toml")]
    fn test_encoded_slash_in_ref(#[case] raw: &str) {
        let parsed = StyleRef::parse(raw, None, &root()).unwrap();
        let StyleRef::Forge { git_ref, path, .. } = &parsed else {
            panic!("expected a forge reference, got {parsed:?}");
        };
        assert_eq!(git_ref.as_deref(), Some("feature/x"));
        assert_eq!(path, "p.toml");
        assert_eq!(parsed.to_string(), "gh://o/r@feature%2Fx/p.toml");
        assert_eq!(key(&parsed.to_string()), parsed.to_string());
    }

    #[test]
    fn test_variants_share_one_key() {
        assert_eq!(key("./base"), key("base.toml"));
        assert_eq!(key("pkg://stylist/python/black.toml"), key("pkg://stylist.python.black"));
    }

    #[rstest]
    #[case("/project/styles/python.toml", "../base", "file:///project/base.toml")]
    #[case("https://example.com/styles/python.toml", "base", "https://example.com/styles/base.toml")]
    #[case("gh://org/styles@v1/python/black.toml", "../base", "gh://org/styles@v1/base.toml")]
    #[case("pkg://stylist/python/black.toml", "flake8", "pkg://stylist/python/flake8.toml")]
    fn test_relative_includes_stay_in_parent_location(
        #[case] parent: &str,
        #[case] raw: &str,
        #[case] expected: &str,
    ) {
        let parent = StyleRef::parse(parent, None, &root()).unwrap();
        let child = StyleRef::parse(raw, Some(&parent), &root()).unwrap();
        assert_eq!(child.to_string(), expected);
    }

    #[test]
    fn test_absolute_include_inside_remote_is_local() {
        let parent = StyleRef::parse("https://example.com/a.toml", None, &root()).unwrap();
        let child = StyleRef::parse("/etc/x", Some(&parent), &root()).unwrap();
        assert!(matches!(child, StyleRef::Local(_)));
    }

    #[rstest]
    #[case("")]
    #[case("ftp://host/x")]
    #[case("gh://only-owner")]
    fn test_invalid_references(#[case] raw: &str) {
        assert!(matches!(
            StyleRef::parse(raw, None, &root()),
            Err(Error::InvalidReference { .. })
        ));
    }

    #[test]
    fn test_remote_detection() {
        assert!(StyleRef::parse("gh://o/r/p", None, &root()).unwrap().is_remote());
        assert!(!StyleRef::parse("pkg://stylist/default", None, &root()).unwrap().is_remote());
    }
}
