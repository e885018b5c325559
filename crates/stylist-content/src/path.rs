//! Key paths into nested value trees
//!
//! A [`KeyPath`] is an ordered list of map keys. Because segments are kept
//! separately, a key that itself contains a dot (for example a file name
//! such as `setup.cfg`) never needs escaping while the path is in use.
//!
//! # Path Syntax
//!
//! The dotted form is only used at the edges, when a path is written by a
//! human or shown in a message:
//!
//! - Dot-separated keys: `flake8.ignore`
//! - Quoted segments keep their dots: `tool."setup.cfg".key`
//!
//! # Examples
//!
//! ```
//! use stylist_content::KeyPath;
//!
//! let path = KeyPath::parse(r#"files."setup.cfg".ignore"#);
//! assert_eq!(path.segments(), &["files", "setup.cfg", "ignore"]);
//! assert_eq!(path.to_string(), r#"files."setup.cfg".ignore"#);
//! ```

use std::fmt;

/// An ordered sequence of map keys addressing a node in a value tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyPath(Vec<String>);

impl KeyPath {
    /// The empty path, addressing the root of a tree.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Build a path from segments.
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// Parse the dotted form.
    ///
    /// Dots inside double quotes belong to the segment; empty segments
    /// produced by stray dots are dropped.
    pub fn parse(dotted: &str) -> Self {
        let mut segments = Vec::new();
        let mut current = String::new();
        let mut quoted = false;
        let mut was_quoted = false;

        for ch in dotted.chars() {
            match ch {
                '"' => {
                    quoted = !quoted;
                    was_quoted = true;
                }
                '.' if !quoted => {
                    if !current.is_empty() || was_quoted {
                        segments.push(std::mem::take(&mut current));
                    }
                    was_quoted = false;
                }
                _ => current.push(ch),
            }
        }

        if !current.is_empty() || was_quoted {
            segments.push(current);
        }

        Self(segments)
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// A new path with `segment` appended.
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        Self(segments)
    }

    /// The path without its last segment.
    pub fn parent(&self) -> Option<Self> {
        let (_, init) = self.0.split_last()?;
        Some(Self(init.to_vec()))
    }

    pub fn last(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    pub fn first(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    /// Whether `prefix` addresses this node or one of its ancestors.
    pub fn starts_with(&self, prefix: &KeyPath) -> bool {
        self.0.starts_with(&prefix.0)
    }

    /// The remainder after `prefix`, if this path lies under it.
    pub fn strip_prefix(&self, prefix: &KeyPath) -> Option<KeyPath> {
        self.0
            .strip_prefix(prefix.0.as_slice())
            .map(|rest| Self(rest.to_vec()))
    }

    /// Every proper ancestor, shortest first. The root is not included.
    pub fn ancestors(&self) -> impl Iterator<Item = KeyPath> + '_ {
        (1..self.0.len()).map(|n| Self(self.0[..n].to_vec()))
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            if segment.is_empty() || segment.contains('.') {
                write!(f, "\"{segment}\"")?;
            } else {
                f.write_str(segment)?;
            }
        }
        Ok(())
    }
}

impl From<&str> for KeyPath {
    fn from(dotted: &str) -> Self {
        Self::parse(dotted)
    }
}

impl From<Vec<String>> for KeyPath {
    fn from(segments: Vec<String>) -> Self {
        Self(segments)
    }
}
