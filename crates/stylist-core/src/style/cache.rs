//! On-disk cache of fetched style documents

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeDelta, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use stylist_fs::{ConfigStore, NormalizedPath, StylistPath};

use crate::{Error, Result};

/// How long a fetched style may be reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// Always refetch
    Never,
    /// Reuse the first successful fetch indefinitely
    Forever,
    /// Reuse until the entry is older than the given age
    ExpiresAfter(TimeDelta),
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self::ExpiresAfter(TimeDelta::hours(1))
    }
}

impl CachePolicy {
    /// Whether an entry fetched at `fetched_at` may still be used at `now`.
    pub fn is_fresh(&self, fetched_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        match self {
            Self::Never => false,
            Self::Forever => true,
            Self::ExpiresAfter(age) => now - fetched_at < *age,
        }
    }
}

impl FromStr for CachePolicy {
    type Err = Error;

    /// Parse `never`, `forever` or `<n> <unit>`
    fn from_str(s: &str) -> Result<Self> {
        let text = s.trim().to_lowercase();
        match text.as_str() {
            "never" => return Ok(Self::Never),
            "forever" => return Ok(Self::Forever),
            _ => {}
        }

        let invalid = || Error::InvalidCachePolicy(s.to_string());
        let pattern = Regex::new(r"^(\d+)\s*(second|minute|hour|day|week)s?$").map_err(|_| invalid())?;
        let captures = pattern.captures(&text).ok_or_else(invalid)?;
        let amount: i64 = captures[1].parse().map_err(|_| invalid())?;

        let age = match &captures[2] {
            "second" => TimeDelta::try_seconds(amount),
            "minute" => TimeDelta::try_minutes(amount),
            "hour" => TimeDelta::try_hours(amount),
            "day" => TimeDelta::try_days(amount),
            _ => TimeDelta::try_weeks(amount),
        };
        age.map(Self::ExpiresAfter).ok_or_else(invalid)
    }
}

impl fmt::Display for CachePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Never => write!(f, "never"),
            Self::Forever => write!(f, "forever"),
            Self::ExpiresAfter(age) => write!(f, "{} seconds", age.num_seconds()),
        }
    }
}

/// One cached style document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Canonical reference the content was fetched from
    pub reference: String,
    pub content: String,
    pub fetched_at: DateTime<Utc>,
}

/// Fetched styles stored as one JSON file per canonical reference.
#[derive(Debug)]
pub struct StyleCache {
    dir: NormalizedPath,
    policy: CachePolicy,
    store: ConfigStore,
}

impl StyleCache {
    /// Cache rooted at the project's cache directory
    pub fn new(cache_dir: &NormalizedPath, policy: CachePolicy) -> Self {
        Self {
            dir: cache_dir.join(StylistPath::StyleCacheDir.as_str()),
            policy,
            store: ConfigStore::new(),
        }
    }

    pub fn policy(&self) -> CachePolicy {
        self.policy
    }

    fn entry_path(&self, reference: &str) -> NormalizedPath {
        let mut hasher = Sha256::new();
        hasher.update(reference.as_bytes());
        self.dir.join(&format!("{:x}.json", hasher.finalize()))
    }

    /// Content for `reference` if a fresh entry exists.
    ///
    /// Unreadable or stale entries count as misses.
    pub fn get(&self, reference: &str) -> Option<String> {
        if self.policy == CachePolicy::Never {
            return None;
        }

        let path = self.entry_path(reference);
        let entry: CacheEntry = match self.store.load_if_exists(&path) {
            Ok(Some(entry)) => entry,
            Ok(None) => return None,
            Err(e) => {
                tracing::debug!(%path, error = %e, "Ignoring unreadable cache entry");
                return None;
            }
        };

        if entry.reference != reference || !self.policy.is_fresh(entry.fetched_at, Utc::now()) {
            return None;
        }
        Some(entry.content)
    }

    /// Store freshly fetched content, replacing any previous entry.
    pub fn put(&self, reference: &str, content: &str) -> Result<()> {
        if self.policy == CachePolicy::Never {
            return Ok(());
        }

        let entry = CacheEntry {
            reference: reference.to_string(),
            content: content.to_string(),
            fetched_at: Utc::now(),
        };
        self.store.save(&self.entry_path(reference), &entry)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    #[rstest]
    #[case("never", CachePolicy::Never)]
    #[case("Forever", CachePolicy::Forever)]
    #[case("1 hour", CachePolicy::ExpiresAfter(TimeDelta::hours(1)))]
    #[case("30 minutes", CachePolicy::ExpiresAfter(TimeDelta::minutes(30)))]
    #[case("2 weeks", CachePolicy::ExpiresAfter(TimeDelta::weeks(2)))]
    #[case(" 10 seconds ", CachePolicy::ExpiresAfter(TimeDelta::seconds(10)))]
    fn test_parse_policy(#[case] raw: &str, #[case] expected: CachePolicy) {
        assert_eq!(raw.parse::<CachePolicy>().unwrap(), expected);
    }

    #[rstest]
    #[case("sometimes")]
    #[case("1 fortnight")]
    #[case("hour")]
    fn test_invalid_policy(#[case] raw: &str) {
        assert!(matches!(raw.parse::<CachePolicy>(), Err(Error::InvalidCachePolicy(_))));
    }

    #[test]
    fn test_default_is_one_hour() {
        assert_eq!(CachePolicy::default(), CachePolicy::ExpiresAfter(TimeDelta::hours(1)));
    }

    #[test]
    fn test_freshness() {
        let now = Utc::now();
        let old = now - TimeDelta::hours(2);
        assert!(!CachePolicy::default().is_fresh(old, now));
        assert!(CachePolicy::default().is_fresh(now, now));
        assert!(CachePolicy::Forever.is_fresh(old, now));
        assert!(!CachePolicy::Never.is_fresh(now, now));
    }

    #[test]
    fn test_put_then_get() {
        let temp = TempDir::new().unwrap();
        let cache = StyleCache::new(&NormalizedPath::new(temp.path()), CachePolicy::default());
        let key = "https://example.com/a.toml";

        assert_eq!(cache.get(key), None);
        cache.put(key, "[x]\n").unwrap();
        assert_eq!(cache.get(key).as_deref(), Some("[x]\n"));
        assert_eq!(cache.get("https://example.com/b.toml"), None);
    }

    #[test]
    fn test_never_policy_stores_nothing() {
        let temp = TempDir::new().unwrap();
        let cache = StyleCache::new(&NormalizedPath::new(temp.path()), CachePolicy::Never);
        cache.put("k", "v").unwrap();
        assert_eq!(cache.get("k"), None);
        assert!(!temp.path().join("styles").exists());
    }

    #[test]
    fn test_corrupt_entry_is_a_miss() {
        let temp = TempDir::new().unwrap();
        let cache = StyleCache::new(&NormalizedPath::new(temp.path()), CachePolicy::Forever);
        cache.put("k", "v").unwrap();
        std::fs::write(cache.entry_path("k").to_native(), "not json").unwrap();
        assert_eq!(cache.get("k"), None);
    }
}
