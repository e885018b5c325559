//! Slash-normalized paths for project files, styles and cache artifacts

use std::path::{Path, PathBuf};

/// A path stored with `/` separators on every platform.
///
/// Style references and cache keys are derived from these strings, so two
/// spellings of the same location must compare equal once cleaned.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NormalizedPath {
    inner: String,
}

impl NormalizedPath {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            inner: path.as_ref().to_string_lossy().replace('\\', "/"),
        }
    }

    /// Create a path from user input, expanding a leading `~` to the
    /// home directory.
    pub fn expand(raw: &str) -> Self {
        let home = || dirs::home_dir().map(Self::new);
        if raw == "~" {
            if let Some(home) = home() {
                return home;
            }
        } else if let Some(rest) = raw.strip_prefix("~/") {
            if let Some(home) = home() {
                return home.join(rest);
            }
        }
        Self::new(raw)
    }

    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Native path for handing to `std::fs`
    pub fn to_native(&self) -> PathBuf {
        PathBuf::from(&self.inner)
    }

    /// Append `segment` (which may itself contain separators).
    pub fn join(&self, segment: &str) -> Self {
        let segment = segment.replace('\\', "/");
        let inner = match self.inner.as_str() {
            "" => segment,
            base if base.ends_with('/') => format!("{base}{segment}"),
            base => format!("{base}/{segment}"),
        };
        Self { inner }
    }

    /// Resolve `reference` against this directory.
    ///
    /// Absolute and home-relative references ignore the base. The result is
    /// lexically cleaned.
    pub fn resolve(&self, reference: &str) -> Self {
        let expanded = Self::expand(reference);
        if expanded.is_absolute() {
            expanded.clean()
        } else {
            self.join(expanded.as_str()).clean()
        }
    }

    /// Whether the path is rooted (`/x` or a drive letter like `C:/x`).
    pub fn is_absolute(&self) -> bool {
        let bytes = self.inner.as_bytes();
        self.inner.starts_with('/')
            || (bytes.len() >= 3 && bytes[0].is_ascii_alphabetic() && &bytes[1..3] == b":/")
    }

    /// Whether this path, read as relative to some base, would leave it:
    /// absolute, home-relative, or climbing out through `..`.
    pub fn escapes(&self) -> bool {
        if self.is_absolute() || self.inner.starts_with('~') {
            return true;
        }
        let cleaned = self.clean();
        cleaned.inner == "." || cleaned.inner == ".." || cleaned.inner.starts_with("../")
    }

    /// Join a relative name that must stay below this directory.
    pub fn join_within(&self, relative: &str) -> Option<Self> {
        let relative = Self::new(relative);
        (!relative.escapes()).then(|| self.join(relative.clean().as_str()))
    }

    /// Lexically remove `.` segments, resolve `..` and collapse repeated
    /// slashes without touching the filesystem.
    pub fn clean(&self) -> Self {
        let absolute = self.inner.starts_with('/');
        let mut parts: Vec<&str> = Vec::new();
        for part in self.inner.split('/') {
            match part {
                "" | "." => {}
                ".." => match parts.last() {
                    Some(last) if *last != ".." => {
                        parts.pop();
                    }
                    _ if absolute => {}
                    _ => parts.push(".."),
                },
                other => parts.push(other),
            }
        }
        let body = parts.join("/");
        let inner = match (absolute, body.is_empty()) {
            (true, _) => format!("/{body}"),
            (false, true) => ".".to_string(),
            (false, false) => body,
        };
        Self { inner }
    }

    /// Canonical form: the resolved filesystem path when it exists,
    /// otherwise the lexically cleaned path.
    pub fn canonical(&self) -> Self {
        match dunce::canonicalize(self.to_native()) {
            Ok(path) => Self::new(path),
            Err(_) => self.clean(),
        }
    }

    /// The containing directory; `None` for a bare name.
    pub fn parent(&self) -> Option<Self> {
        let trimmed = self.inner.trim_end_matches('/');
        match trimmed.rfind('/') {
            Some(idx) if idx > 0 => Some(Self {
                inner: trimmed[..idx].to_string(),
            }),
            Some(0) => Some(Self {
                inner: "/".to_string(),
            }),
            _ => None,
        }
    }

    pub fn file_name(&self) -> Option<&str> {
        let trimmed = self.inner.trim_end_matches('/');
        trimmed.rsplit('/').next().filter(|name| !name.is_empty())
    }

    pub fn exists(&self) -> bool {
        self.to_native().exists()
    }

    pub fn is_dir(&self) -> bool {
        self.to_native().is_dir()
    }

    pub fn is_file(&self) -> bool {
        self.to_native().is_file()
    }

    /// Extension of the file name. Dotfiles such as `.editorconfig` have
    /// none.
    pub fn extension(&self) -> Option<&str> {
        let name = self.file_name()?;
        match name.rfind('.') {
            Some(0) | None => None,
            Some(idx) => Some(&name[idx + 1..]),
        }
    }

    /// Append `.{ext}` unless the file name already ends with it.
    pub fn with_default_extension(&self, ext: &str) -> Self {
        let suffix = format!(".{ext}");
        if self.inner.ends_with(&suffix) {
            self.clone()
        } else {
            Self {
                inner: format!("{}{}", self.inner, suffix),
            }
        }
    }
}

impl AsRef<Path> for NormalizedPath {
    fn as_ref(&self) -> &Path {
        Path::new(&self.inner)
    }
}

impl std::fmt::Display for NormalizedPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.inner)
    }
}

impl From<&str> for NormalizedPath {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<PathBuf> for NormalizedPath {
    fn from(path: PathBuf) -> Self {
        Self::new(path)
    }
}
