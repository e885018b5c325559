//! Styles compiled into the binary
//!
//! Addressed as `pkg://stylist/<path>`; see [`StyleRef::Package`](super::StyleRef::Package).

/// Namespace every bundled style lives under
pub const NAMESPACE: &str = "stylist";

const BUNDLED: &[(&str, &str)] = &[
    ("default.toml", include_str!("../../resources/default.toml")),
    ("editorconfig.toml", include_str!("../../resources/editorconfig.toml")),
    ("python/black.toml", include_str!("../../resources/python/black.toml")),
    ("python/flake8.toml", include_str!("../../resources/python/flake8.toml")),
    ("pre-commit/python.toml", include_str!("../../resources/pre-commit/python.toml")),
];

/// Reference of the style used when a project configures none
pub const DEFAULT_STYLE: &str = "pkg://stylist/default";

/// Content of a bundled style given its `<namespace>/<path>.toml` path.
pub fn lookup(path: &str) -> Option<&'static str> {
    let relative = path.strip_prefix(NAMESPACE)?.strip_prefix('/')?;
    BUNDLED
        .iter()
        .find(|(name, _)| *name == relative)
        .map(|(_, content)| *content)
}

/// Package references of every bundled style
pub fn available() -> impl Iterator<Item = String> {
    BUNDLED
        .iter()
        .map(|(name, _)| format!("pkg://{NAMESPACE}/{name}"))
}
