//! Persistent cached-response store.
//!
//! Each cache generation lives in its own JSON file named
//! `<generation>.json` under the cache directory, mapping request keys
//! (`"METHOD url"`) to cached responses. Bumping the generation name
//! starts a fresh file; stale generations are swept during activation.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

// ============================================================================
// Constants
// ============================================================================

/// Current cache generation. Bump this to invalidate every previously
/// cached response on the next activation.
pub const CACHE_GENERATION: &str = "walletcare-v1";

// ============================================================================
// Types
// ============================================================================

/// A response snapshot held by the cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
    /// URL the response actually came from; differs from the request URL
    /// when the server redirected.
    pub final_url: String,
    pub cached_at: DateTime<Utc>,
}

/// One generation's worth of cached responses, persisted as a single
/// JSON file.
#[derive(Debug)]
pub struct CacheStore {
    dir: PathBuf,
    name: String,
    entries: HashMap<String, CachedResponse>,
}

impl CacheStore {
    /// Open (or create) the store for the given generation, loading any
    /// previously persisted entries.
    pub fn open(dir: &Path, name: &str) -> Result<Self> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create cache directory: {}", dir.display()))?;

        let path = Self::generation_path(dir, name);
        let entries = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read cache file: {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse cache file: {}", path.display()))?
        } else {
            HashMap::new()
        };

        debug!(generation = name, entries = entries.len(), "Cache store opened");
        Ok(Self {
            dir: dir.to_path_buf(),
            name: name.to_string(),
            entries,
        })
    }

    fn generation_path(dir: &Path, name: &str) -> PathBuf {
        dir.join(format!("{}.json", name))
    }

    /// Key a request is cached under. Method and full URL together, so
    /// the same URL fetched with different methods never collides.
    pub fn request_key(method: &str, url: &str) -> String {
        format!("{} {}", method.to_uppercase(), url)
    }

    pub fn get(&self, key: &str) -> Option<&CachedResponse> {
        self.entries.get(key)
    }

    /// Insert one entry and persist immediately.
    pub fn put(&mut self, key: String, response: CachedResponse) -> Result<()> {
        self.entries.insert(key, response);
        self.persist()
    }

    /// Insert a batch of entries with a single persist, so a multi-entry
    /// install either lands whole or not at all.
    pub fn put_all(&mut self, entries: HashMap<String, CachedResponse>) -> Result<()> {
        self.entries.extend(entries);
        self.persist()
    }

    fn persist(&self) -> Result<()> {
        let path = Self::generation_path(&self.dir, &self.name);
        let json = serde_json::to_string(&self.entries).context("Failed to serialize cache")?;
        fs::write(&path, json)
            .with_context(|| format!("Failed to write cache file: {}", path.display()))?;
        debug!(generation = %self.name, entries = self.entries.len(), "Cache persisted");
        Ok(())
    }

    /// Names of every generation present on disk, current included.
    pub fn list_generations(dir: &Path) -> Result<Vec<String>> {
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        for entry in fs::read_dir(dir)
            .with_context(|| format!("Failed to read cache directory: {}", dir.display()))?
        {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    names.push(stem.to_string());
                }
            }
        }
        Ok(names)
    }

    /// Delete a generation's file from disk.
    pub fn delete_generation(dir: &Path, name: &str) -> Result<()> {
        let path = Self::generation_path(dir, name);
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to delete cache file: {}", path.display()))?;
            debug!(generation = name, "Stale cache generation deleted");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    static TEST_DIR_COUNTER: AtomicU32 = AtomicU32::new(0);

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "walletcare-store-test-{}-{}",
            std::process::id(),
            TEST_DIR_COUNTER.fetch_add(1, Ordering::SeqCst)
        ));
        fs::create_dir_all(&dir).expect("failed to create temp dir");
        dir
    }

    fn response(body: &str) -> CachedResponse {
        CachedResponse {
            status: 200,
            content_type: Some("text/html".to_string()),
            body: body.as_bytes().to_vec(),
            final_url: "http://localhost:5000/".to_string(),
            cached_at: Utc::now(),
        }
    }

    #[test]
    fn test_put_get_roundtrip_across_instances() {
        let dir = temp_dir();
        let key = CacheStore::request_key("GET", "http://localhost:5000/");

        let mut store = CacheStore::open(&dir, CACHE_GENERATION).unwrap();
        store.put(key.clone(), response("<html>")).unwrap();

        // A fresh instance sees the persisted entry
        let reopened = CacheStore::open(&dir, CACHE_GENERATION).unwrap();
        let cached = reopened.get(&key).expect("entry should survive reopen");
        assert_eq!(cached.status, 200);
        assert_eq!(cached.body, b"<html>");

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_request_key_distinguishes_method() {
        let get = CacheStore::request_key("get", "http://x/a");
        let post = CacheStore::request_key("POST", "http://x/a");
        assert_eq!(get, "GET http://x/a");
        assert_ne!(get, post);
    }

    #[test]
    fn test_list_and_delete_generations() {
        let dir = temp_dir();

        let mut old = CacheStore::open(&dir, "walletcare-v0").unwrap();
        old.put("GET http://x/".to_string(), response("old")).unwrap();
        let mut current = CacheStore::open(&dir, CACHE_GENERATION).unwrap();
        current.put("GET http://x/".to_string(), response("new")).unwrap();

        let mut names = CacheStore::list_generations(&dir).unwrap();
        names.sort();
        assert_eq!(names, vec!["walletcare-v0", CACHE_GENERATION]);

        CacheStore::delete_generation(&dir, "walletcare-v0").unwrap();
        assert_eq!(
            CacheStore::list_generations(&dir).unwrap(),
            vec![CACHE_GENERATION]
        );

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_missing_directory_lists_empty() {
        let dir = std::env::temp_dir().join("walletcare-store-test-nonexistent");
        assert!(CacheStore::list_generations(&dir).unwrap().is_empty());
    }
}
