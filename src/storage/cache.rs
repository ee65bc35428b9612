//! Persistent key-value cache for normalized records.
//!
//! Entries are stored as a JSON envelope `{ "data": <record>, "timestamp":
//! <epoch ms> }` under a stable per-source, per-identity key. The store
//! itself is a plain string key-value map behind [`KeyValueStore`], so the
//! controller never touches the filesystem directly.
//!
//! # Features
//! - Atomic writes using temp file + rename (prevents torn entries)
//! - Reversible key escaping, so arbitrary identities map to safe filenames
//! - Graceful degradation on missing or corrupt entries

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::error::{Result, StatError};

const ENTRY_EXTENSION: &str = "json";

// =============================================================================
// Store trait
// =============================================================================

/// Minimal persistent string store.
///
/// Implementations must make a completed `set` visible to later `get`s,
/// including from other processes when backed by shared storage.
pub trait KeyValueStore: Send + Sync {
    /// Read a value. `Ok(None)` when the key is absent.
    fn get(&self, key: &str) -> Result<Option<String>>;
    /// Write a value, replacing any previous one.
    fn set(&self, key: &str, value: &str) -> Result<()>;
    /// Remove a key. Returns whether it existed.
    fn remove(&self, key: &str) -> Result<bool>;
    /// All keys, sorted.
    fn keys(&self) -> Result<Vec<String>>;
}

// =============================================================================
// Cache entry
// =============================================================================

/// Envelope persisted for every cached record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheEntry<R> {
    pub data: R,
    /// Epoch milliseconds of the successful normalization.
    pub timestamp: i64,
}

impl<R> CacheEntry<R> {
    #[must_use]
    pub const fn new(data: R, timestamp: i64) -> Self {
        Self { data, timestamp }
    }

    /// Milliseconds elapsed since the entry was written. Negative if the
    /// entry claims to come from the future.
    #[must_use]
    pub const fn age_ms(&self, now_ms: i64) -> i64 {
        now_ms - self.timestamp
    }

    /// Fresh when strictly younger than `ttl`.
    #[must_use]
    pub fn is_fresh_at(&self, now_ms: i64, ttl: Duration) -> bool {
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        self.age_ms(now_ms) < ttl_ms
    }
}

/// Read and decode an entry.
///
/// Missing keys, unreadable stores and corrupt JSON all yield `None`; the
/// latter two are logged.
pub fn read_entry<R: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<CacheEntry<R>> {
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            tracing::warn!(key, error = %e, "Cache read failed");
            return None;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(entry) => Some(entry),
        Err(e) => {
            tracing::warn!(key, error = %e, "Ignoring corrupt cache entry");
            None
        }
    }
}

/// Encode and write an entry.
///
/// # Errors
///
/// Returns the store error or a serialization error.
pub fn write_entry<R: Serialize>(
    store: &dyn KeyValueStore,
    key: &str,
    entry: &CacheEntry<R>,
) -> Result<()> {
    let content = serde_json::to_string(entry)?;
    store.set(key, &content)
}

// =============================================================================
// Key escaping
// =============================================================================

fn is_safe_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-')
}

/// Percent-escape a key into a filename stem.
#[must_use]
pub fn escape_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for b in key.bytes() {
        if is_safe_byte(b) {
            out.push(char::from(b));
        } else {
            out.push_str(&format!("%{b:02X}"));
        }
    }
    out
}

/// Inverse of [`escape_key`]. `None` for stems that were not produced by it.
#[must_use]
pub fn unescape_key(stem: &str) -> Option<String> {
    let bytes = stem.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = stem.get(i + 1..i + 3)?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}

// =============================================================================
// File store
// =============================================================================

/// One JSON file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Store rooted at `dir`. The directory is created on first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Root directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing a key.
    #[must_use]
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir
            .join(format!("{}.{ENTRY_EXTENSION}", escape_key(key)))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        write_atomic(&self.path_for(key), value.as_bytes())?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool> {
        match std::fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn keys(&self) -> Result<Vec<String>> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut keys: Vec<String> = entries
            .filter_map(std::result::Result::ok)
            .map(|e| e.path())
            .filter(|p| p.extension() == Some(ENTRY_EXTENSION.as_ref()))
            .filter_map(|p| {
                p.file_stem()
                    .and_then(|s| s.to_str())
                    .filter(|s| !s.starts_with('.'))
                    .and_then(unescape_key)
            })
            .collect();
        keys.sort();
        Ok(keys)
    }
}

/// Write bytes atomically using temp file + rename.
/// Readers never observe a partially written entry.
fn write_atomic(path: &Path, content: &[u8]) -> std::io::Result<()> {
    // Temp file must share the directory for rename to be atomic
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let temp_path = parent.join(format!(
        ".{}.tmp.{}",
        path.file_name().and_then(|n| n.to_str()).unwrap_or("entry"),
        std::process::id()
    ));

    {
        let mut file = std::fs::File::create(&temp_path)?;
        file.write_all(content)?;
        file.sync_all()?;
    }

    std::fs::rename(&temp_path, path)
}

// =============================================================================
// Memory store
// =============================================================================

/// In-process store, for tests and ephemeral runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| StatError::Cache("memory store lock poisoned".to_string()))
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool> {
        Ok(self.lock()?.remove(key).is_some())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.lock()?.keys().cloned().collect())
    }
}

// =============================================================================
// Listing
// =============================================================================

/// Summary of one stored entry, for `cache list`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheListing {
    pub key: String,
    /// `None` when the entry could not be decoded.
    pub timestamp: Option<i64>,
    pub bytes: usize,
}

/// Describe every entry in a store.
///
/// # Errors
///
/// Returns error if the key list cannot be read.
pub fn list_entries(store: &dyn KeyValueStore) -> Result<Vec<CacheListing>> {
    let mut listings = Vec::new();
    for key in store.keys()? {
        let Some(raw) = store.get(&key)? else {
            continue;
        };
        let timestamp = serde_json::from_str::<CacheEntry<serde_json::Value>>(&raw)
            .ok()
            .map(|e| e.timestamp);
        listings.push(CacheListing {
            bytes: raw.len(),
            key,
            timestamp,
        });
    }
    Ok(listings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn freshness_boundary_is_exclusive() {
        let entry = CacheEntry::new((), 1_000);
        let ttl = Duration::from_millis(500);
        assert!(entry.is_fresh_at(1_499, ttl));
        assert!(!entry.is_fresh_at(1_500, ttl));
        assert!(!entry.is_fresh_at(1_501, ttl));
    }

    #[test]
    fn future_timestamp_counts_as_fresh() {
        let entry = CacheEntry::new((), 10_000);
        assert!(entry.is_fresh_at(5_000, Duration::from_secs(1)));
    }

    #[test]
    fn key_escaping_round_trips() {
        for key in [
            "codechef_data_alice",
            "wakatime_data_https://wakatime.com/share/@u/abc.json",
            "leetcode_data_名前 %41",
            "",
        ] {
            let escaped = escape_key(key);
            assert!(escaped.bytes().all(|b| is_safe_byte(b) || b == b'%'));
            assert_eq!(unescape_key(&escaped).as_deref(), Some(key));
        }
    }

    #[test]
    fn unescape_rejects_truncated_sequence() {
        assert!(unescape_key("abc%4").is_none());
        assert!(unescape_key("abc%zz").is_none());
    }

    #[test]
    fn file_store_set_get_remove() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path().join("cache"));

        assert_eq!(store.get("k").unwrap(), None);
        assert!(store.keys().unwrap().is_empty());

        store.set("k", "{\"a\":1}").unwrap();
        store.set("k/2", "x").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("{\"a\":1}"));
        assert_eq!(store.keys().unwrap(), vec!["k".to_string(), "k/2".to_string()]);

        assert!(store.remove("k").unwrap());
        assert!(!store.remove("k").unwrap());
        assert_eq!(store.keys().unwrap(), vec!["k/2".to_string()]);
    }

    #[test]
    fn file_store_leaves_no_temp_files() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());
        store.set("a", "1").unwrap();
        store.set("a", "2").unwrap();
        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["a.json".to_string()]);
    }

    #[test]
    fn corrupt_entry_reads_as_missing() {
        let store = MemoryStore::new();
        store.set("k", "{not json").unwrap();
        assert!(read_entry::<u32>(&store, "k").is_none());

        store.set("k", "{\"data\":\"text\",\"timestamp\":1}").unwrap();
        assert!(read_entry::<u32>(&store, "k").is_none());
    }

    #[test]
    fn entry_round_trip_through_store() {
        let store = MemoryStore::new();
        write_entry(&store, "k", &CacheEntry::new(vec![1, 2], 42)).unwrap();
        let entry: CacheEntry<Vec<u8>> = read_entry(&store, "k").unwrap();
        assert_eq!(entry.data, vec![1, 2]);
        assert_eq!(entry.timestamp, 42);
        assert_eq!(
            store.get("k").unwrap().as_deref(),
            Some("{\"data\":[1,2],\"timestamp\":42}")
        );
    }

    #[test]
    fn listing_reports_timestamps() {
        let store = MemoryStore::new();
        write_entry(&store, "a", &CacheEntry::new("x", 7)).unwrap();
        store.set("b", "garbage").unwrap();
        let list = list_entries(&store).unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].timestamp, Some(7));
        assert_eq!(list[1].timestamp, None);
    }
}
