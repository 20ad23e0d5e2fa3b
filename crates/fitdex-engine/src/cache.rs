//! Persistent fitment cache.
//!
//! Keys are normalized source URLs (or a content hash when no URL exists),
//! values are finished merges. The cache is disposable by contract: a file
//! that cannot be read back starts the run cold instead of failing it, and
//! individual corrupt entries load as misses rather than poisoning the
//! rest of the file.

use std::collections::HashMap;
use std::path::Path;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use fitdex_core::MergedFitment;

use crate::error::CacheError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub fitment: MergedFitment,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub invalidated: bool,
}

/// In-memory cache with JSON persistence. Shared by reference across
/// product workers; the lock is held only for individual map operations.
#[derive(Debug, Default)]
pub struct FitmentCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

/// Cache key for one product page: the normalized URL, or a hash of the
/// content when no URL is known. Normalization strips the fragment and any
/// trailing slash and folds scheme and host to lowercase; path and query
/// stay case-sensitive.
#[must_use]
pub fn source_key(source_url: &str, content: &str) -> String {
    let trimmed = source_url.trim();
    if trimmed.is_empty() {
        return format!("sha256:{:x}", Sha256::digest(content.as_bytes()));
    }
    let without_fragment = trimmed.split('#').next().unwrap_or(trimmed);
    let without_slash = without_fragment.trim_end_matches('/');
    match without_slash.find("://") {
        Some(idx) => {
            let scheme = without_slash[..idx].to_lowercase();
            let rest = &without_slash[idx + 3..];
            match rest.find('/') {
                Some(path_idx) => format!(
                    "{scheme}://{}{}",
                    rest[..path_idx].to_lowercase(),
                    &rest[path_idx..]
                ),
                None => format!("{scheme}://{}", rest.to_lowercase()),
            }
        }
        None => without_slash.to_string(),
    }
}

impl FitmentCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached fitment for a key, skipping invalidated entries.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<MergedFitment> {
        let entries = self
            .entries
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        entries
            .get(key)
            .filter(|entry| !entry.invalidated)
            .map(|entry| entry.fitment.clone())
    }

    pub fn put(&self, key: String, fitment: MergedFitment) {
        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        entries.insert(
            key,
            CacheEntry {
                fitment,
                created_at: Utc::now(),
                invalidated: false,
            },
        );
    }

    /// Mark every entry stale. Entries stay on disk for inspection but no
    /// longer serve hits.
    pub fn invalidate_all(&self) {
        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        for entry in entries.values_mut() {
            entry.invalidated = true;
        }
    }

    /// Total entries, invalidated included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    /// Entries that still serve hits.
    #[must_use]
    pub fn live_len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .values()
            .filter(|entry| !entry.invalidated)
            .count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Load a cache file. A missing file or an unreadable whole file yields
    /// an empty cache; a corrupt individual entry is skipped with a warning
    /// and behaves as a miss.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Read`] only for I/O failures other than the
    /// file not existing.
    pub fn load(path: &Path) -> Result<Self, CacheError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no cache file, starting cold");
                return Ok(Self::new());
            }
            Err(e) => {
                return Err(CacheError::Read {
                    path: path.display().to_string(),
                    source: e,
                })
            }
        };

        let raw: HashMap<String, serde_json::Value> = match serde_json::from_str(&content) {
            Ok(raw) => raw,
            Err(error) => {
                tracing::warn!(path = %path.display(), %error, "cache file unreadable, starting cold");
                return Ok(Self::new());
            }
        };

        let mut entries = HashMap::with_capacity(raw.len());
        for (key, value) in raw {
            match serde_json::from_value::<CacheEntry>(value) {
                Ok(entry) => {
                    entries.insert(key, entry);
                }
                Err(error) => {
                    tracing::warn!(key, %error, "skipping corrupt cache entry");
                }
            }
        }
        tracing::debug!(path = %path.display(), entries = entries.len(), "cache loaded");
        Ok(Self {
            entries: RwLock::new(entries),
        })
    }

    /// Write the cache to disk as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Encode`] if serialization fails and
    /// [`CacheError::Write`] for I/O failures.
    pub fn persist(&self, path: &Path) -> Result<(), CacheError> {
        let entries = self
            .entries
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let encoded = serde_json::to_string_pretty(&*entries)?;
        std::fs::write(path, encoded).map_err(|e| CacheError::Write {
            path: path.display().to_string(),
            source: e,
        })?;
        tracing::debug!(path = %path.display(), entries = entries.len(), "cache persisted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fitdex_core::{Origin, VehicleApplication};

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("fitdex-cache-{name}-{}.json", std::process::id()))
    }

    fn sample_fitment() -> MergedFitment {
        MergedFitment {
            applications: vec![
                VehicleApplication {
                    make: "Toyota".to_string(),
                    model: "Tacoma".to_string(),
                    year_start: 2005,
                    year_end: 2023,
                    trim: Some("TRD".to_string()),
                    engine: Some("4.0L V6".to_string()),
                    origin: Origin::Official,
                    confidence: 0.82,
                },
                VehicleApplication {
                    make: "Ford".to_string(),
                    model: "F150".to_string(),
                    year_start: 2010,
                    year_end: 2015,
                    trim: None,
                    engine: None,
                    origin: Origin::Fallback,
                    confidence: 0.35,
                },
            ],
            winning_strategy: Some(fitdex_core::StrategyId::Table),
            confidence: 0.82,
        }
    }

    #[test]
    fn put_then_get_returns_the_fitment() {
        let cache = FitmentCache::new();
        cache.put("k".to_string(), sample_fitment());
        let fitment = cache.get("k").unwrap();
        assert_eq!(fitment.applications.len(), 2);
        assert!(cache.get("missing").is_none());
    }

    #[test]
    fn invalidated_entries_stop_serving_hits() {
        let cache = FitmentCache::new();
        cache.put("k".to_string(), sample_fitment());
        cache.invalidate_all();
        assert!(cache.get("k").is_none());
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.live_len(), 0);
    }

    #[test]
    fn persist_and_load_round_trip_preserves_origin() {
        let path = temp_path("roundtrip");
        let cache = FitmentCache::new();
        cache.put("https://example.com/p/1".to_string(), sample_fitment());
        cache.persist(&path).unwrap();

        let reloaded = FitmentCache::load(&path).unwrap();
        let fitment = reloaded.get("https://example.com/p/1").unwrap();
        assert_eq!(fitment.applications.len(), 2);
        assert_eq!(fitment.applications[0].origin, Origin::Official);
        assert_eq!(fitment.applications[0].trim.as_deref(), Some("TRD"));
        assert_eq!(fitment.applications[1].origin, Origin::Fallback);
        assert_eq!(
            fitment.winning_strategy,
            Some(fitdex_core::StrategyId::Table)
        );
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn missing_cache_file_loads_empty() {
        let cache = FitmentCache::load(Path::new("/nonexistent/fitdex-cache.json")).unwrap();
        assert!(cache.is_empty());
    }

    #[test]
    fn unreadable_cache_file_loads_empty() {
        let path = temp_path("garbage");
        std::fs::write(&path, "not json at all {").unwrap();
        let cache = FitmentCache::load(&path).unwrap();
        assert!(cache.is_empty());
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn corrupt_entry_is_skipped_not_fatal() {
        let path = temp_path("partial");
        let good = serde_json::json!({
            "fitment": {
                "applications": [],
                "winning_strategy": null,
                "confidence": 0.0
            },
            "created_at": "2026-01-01T00:00:00Z",
            "invalidated": false
        });
        let file = serde_json::json!({
            "https://example.com/good": good,
            "https://example.com/bad": {"fitment": "nope"}
        });
        std::fs::write(&path, serde_json::to_string(&file).unwrap()).unwrap();

        let cache = FitmentCache::load(&path).unwrap();
        assert_eq!(cache.len(), 1);
        assert!(cache.get("https://example.com/good").is_some());
        assert!(cache.get("https://example.com/bad").is_none());
        let _ = std::fs::remove_file(&path);
    }

    // ----- source keys -----

    #[test]
    fn source_key_normalizes_equivalent_urls() {
        let a = source_key("HTTPS://Example.com/Product/1/", "");
        let b = source_key("https://example.com/Product/1#reviews", "");
        assert_eq!(a, b);
        assert_eq!(a, "https://example.com/Product/1");
    }

    #[test]
    fn source_key_keeps_path_case_and_query() {
        let upper = source_key("https://example.com/Product?id=A", "x");
        let lower = source_key("https://example.com/product?id=a", "x");
        assert_ne!(upper, lower);
    }

    #[test]
    fn source_key_without_url_hashes_the_content() {
        let a = source_key("", "page one");
        let b = source_key("", "page two");
        assert!(a.starts_with("sha256:"));
        assert_ne!(a, b);
        assert_eq!(a, source_key("  ", "page one"));
    }
}
