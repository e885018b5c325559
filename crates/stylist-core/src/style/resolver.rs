//! Walks the style include graph into one desired-state tree

use std::collections::HashSet;

use semver::Version;
use serde_json::{Map, Value};
use stylist_content::{CompareOptions, DictBlender, Format, adapter};
use stylist_fs::{NormalizedPath, RobustnessConfig, StylistPath, io};

use super::cache::StyleCache;
use super::fetcher::StyleFetcher;
use super::reference::StyleRef;
use super::resources::DEFAULT_STYLE;
use super::schema::{self, SECTION, StylistSection};
use crate::config::Context;
use crate::violation::{Violation, ViolationCode};
use crate::{Error, Result};

/// The merged style of one run.
#[derive(Debug, Clone)]
pub struct ResolvedStyle {
    /// Target file name -> desired content, in merge order
    pub files: Map<String, Value>,
    /// The merged reserved section
    pub settings: StylistSection,
    /// Canonical references of every style used, in resolution order
    pub sources: Vec<String>,
    pub violations: Vec<Violation>,
    /// A style could not be fetched or parsed, so nothing may be enforced
    pub aborted: bool,
    merged: Value,
}

impl ResolvedStyle {
    fn aborted(sources: Vec<String>, violations: Vec<Violation>) -> Self {
        Self {
            files: Map::new(),
            settings: StylistSection::default(),
            sources,
            violations,
            aborted: true,
            merged: Value::Object(Map::new()),
        }
    }

    /// Comparison options the style declares for `file_name`
    pub fn options_for(&self, file_name: &str) -> CompareOptions {
        self.settings
            .files
            .options
            .get(file_name)
            .map(|options| options.compare_options())
            .unwrap_or_default()
    }

    /// The full merged tree, reserved section included
    pub fn merged(&self) -> &Value {
        &self.merged
    }

    /// Write the merged tree as TOML into the cache directory.
    pub fn materialize(&self, cache_dir: &NormalizedPath) -> Result<NormalizedPath> {
        let path = cache_dir.join(StylistPath::MergedStyle.as_str());
        let text = adapter(Format::Toml).serialize(&self.merged)?;
        io::write_atomic_with_retry(&path, text.as_bytes(), RobustnessConfig::default())?;
        tracing::debug!(%path, "Materialized merged style");
        Ok(path)
    }
}

/// Accumulated state of one walk
struct Walk {
    seen: HashSet<String>,
    blender: DictBlender,
    sources: Vec<String>,
    violations: Vec<Violation>,
    version_reported: bool,
}

impl Walk {
    fn new() -> Self {
        Self {
            seen: HashSet::new(),
            blender: DictBlender::new(),
            sources: Vec::new(),
            violations: Vec::new(),
            version_reported: false,
        }
    }

    fn fatal(&mut self, reference: &str, error: &Error) {
        tracing::warn!(%reference, %error, "Style unavailable, aborting");
        self.violations.push(Violation::new(
            reference,
            ViolationCode::StyleUnavailable,
            error.to_string(),
        ));
    }
}

/// Resolves the configured styles of a [`Context`].
pub struct StyleResolver<'a> {
    context: &'a Context,
    fetcher: StyleFetcher,
}

impl<'a> StyleResolver<'a> {
    pub fn new(context: &'a Context) -> Self {
        let cache = StyleCache::new(context.cache_dir(), context.cache_policy());
        let fetcher = StyleFetcher::new(cache, context.transport(), context.offline());
        Self { context, fetcher }
    }

    /// Styles to start from: the configured ones, else `stylist-style.toml`
    /// in the project root, else the bundled default.
    pub fn initial_references(&self) -> Vec<String> {
        if !self.context.styles().is_empty() {
            return self.context.styles().to_vec();
        }

        let convention = self
            .context
            .root()
            .join(StylistPath::ConventionStyle.as_str());
        if convention.is_file() {
            tracing::debug!(path = %convention, "Using conventional style file");
            vec![convention.as_str().to_string()]
        } else {
            tracing::debug!("No style configured, using the bundled default");
            vec![DEFAULT_STYLE.to_string()]
        }
    }

    /// Resolve the initial references and everything they include.
    pub fn resolve(&mut self) -> ResolvedStyle {
        let initial = self.initial_references();
        self.resolve_references(&initial)
    }

    /// Resolve `references` (relative to the project root) depth-first in
    /// declaration order. Each style is merged before the styles it
    /// includes, so included styles override their includer.
    pub fn resolve_references(&mut self, references: &[String]) -> ResolvedStyle {
        let mut walk = Walk::new();

        for raw in references {
            let reference = match StyleRef::parse(raw, None, self.context.root()) {
                Ok(reference) => reference,
                Err(e) => {
                    walk.fatal(raw, &e);
                    return ResolvedStyle::aborted(walk.sources, walk.violations);
                }
            };
            if !self.visit(reference, &mut walk) {
                return ResolvedStyle::aborted(walk.sources, walk.violations);
            }
        }

        let mut merged = walk.blender.mix();
        let mut violations = walk.violations;
        let mut files = match merged.as_object() {
            Some(map) => map.clone(),
            None => Map::new(),
        };

        let settings = match files.shift_remove(SECTION) {
            Some(section) => StylistSection::from_value(&section).unwrap_or_else(|message| {
                violations.push(Violation::new(
                    SECTION,
                    ViolationCode::InvalidStyle,
                    format!("Merged [{SECTION}] section is invalid: {message}"),
                ));
                if let Some(map) = merged.as_object_mut() {
                    map.shift_remove(SECTION);
                }
                StylistSection::default()
            }),
            None => StylistSection::default(),
        };

        tracing::info!(styles = walk.sources.len(), files = files.len(), "Resolved style");
        ResolvedStyle {
            files,
            settings,
            sources: walk.sources,
            violations,
            aborted: false,
            merged,
        }
    }

    /// Returns false when the walk must stop.
    fn visit(&mut self, reference: StyleRef, walk: &mut Walk) -> bool {
        let key = reference.to_string();
        if !walk.seen.insert(key.clone()) {
            tracing::debug!(reference = %key, "Style already resolved, skipping");
            return true;
        }
        tracing::debug!(reference = %key, "Resolving style");

        let text = match self.fetcher.fetch(&reference) {
            Ok(text) => text,
            Err(e) => {
                walk.fatal(&key, &e);
                return false;
            }
        };

        let mut tree = match adapter(Format::Toml).load(&text) {
            Ok(tree) => tree,
            Err(e) => {
                let error = Error::StyleParse {
                    reference: key.clone(),
                    message: e.to_string(),
                };
                walk.fatal(&key, &error);
                return false;
            }
        };

        let includes = self.prepare(&key, &mut tree, walk);

        if let Err(e) = walk.blender.add(&tree) {
            walk.violations.push(Violation::new(
                key.as_str(),
                ViolationCode::InvalidStyle,
                format!("Cannot merge style: {e}"),
            ));
        }
        walk.sources.push(key);

        for raw in includes {
            match StyleRef::parse(&raw, Some(&reference), self.context.root()) {
                Ok(child) => {
                    if !self.visit(child, walk) {
                        return false;
                    }
                }
                Err(e) => {
                    walk.fatal(&raw, &e);
                    return false;
                }
            }
        }
        true
    }

    /// Validate a freshly parsed style, drop the entries that failed, check
    /// the version gate and take out the include list.
    fn prepare(&self, key: &str, tree: &mut Value, walk: &mut Walk) -> Vec<String> {
        let Some(map) = tree.as_object_mut() else {
            walk.violations.extend(schema::validate(key, tree));
            *tree = Value::Object(Map::new());
            return Vec::new();
        };

        let mut rejected = Vec::new();
        for (entry, value) in map.iter() {
            let problems = schema::validate_entry(key, entry, value);
            if !problems.is_empty() {
                rejected.push(entry.clone());
                walk.violations.extend(problems);
            }
        }
        for entry in &rejected {
            map.shift_remove(entry);
        }

        let Some(section_value) = map.get_mut(SECTION) else {
            return Vec::new();
        };
        let section = match StylistSection::from_value(section_value) {
            Ok(section) => section,
            Err(_) => return Vec::new(),
        };

        if let Some(minimum) = &section.minimum_version {
            self.check_version(key, minimum, walk);
        }

        if let Some(styles) = section_value.get_mut("styles").and_then(Value::as_object_mut) {
            styles.shift_remove("include");
        }
        section.styles.include.to_vec()
    }

    fn check_version(&self, key: &str, minimum: &str, walk: &mut Walk) {
        let Ok(required) = Version::parse(minimum) else {
            return;
        };
        let running = self.context.version();
        if *running < required && !walk.version_reported {
            walk.version_reported = true;
            walk.violations.push(Violation::new(
                key,
                ViolationCode::MinimumVersion,
                format!("Style requires stylist {required} or newer, this is {running}"),
            ));
        }
    }
}
