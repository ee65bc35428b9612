//! Test utilities for statcard.
//!
//! Shared fakes (clock, sink, failing store), payload fixtures and a
//! temporary directory helper for unit and integration tests.
//!
//! # Usage
//!
//! ```rust,ignore
//! use statcard::test_utils::*;
//!
//! let clock = FixedClock::new(1_000);
//! let sink = RecordingSink::default();
//! let payload = make_test_codechef_profile_json();
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicI64, Ordering};

use serde_json::{Value, json};

use crate::core::pipeline::{StateSink, WidgetState};
use crate::error::{Result, StatError};
use crate::storage::cache::{KeyValueStore, MemoryStore};
use crate::util::time::Clock;

// =============================================================================
// Fakes
// =============================================================================

/// Settable clock.
#[derive(Debug, Default)]
pub struct FixedClock {
    now_ms: AtomicI64,
}

impl FixedClock {
    #[must_use]
    pub const fn new(now_ms: i64) -> Self {
        Self {
            now_ms: AtomicI64::new(now_ms),
        }
    }

    pub fn set(&self, now_ms: i64) {
        self.now_ms.store(now_ms, Ordering::SeqCst);
    }

    pub fn advance(&self, by_ms: i64) {
        self.now_ms.fetch_add(by_ms, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now_ms(&self) -> i64 {
        self.now_ms.load(Ordering::SeqCst)
    }
}

/// Records every published state in order.
#[derive(Debug)]
pub struct RecordingSink<R> {
    states: Mutex<Vec<WidgetState<R>>>,
}

impl<R> Default for RecordingSink<R> {
    fn default() -> Self {
        Self {
            states: Mutex::new(Vec::new()),
        }
    }
}

impl<R: Clone> RecordingSink<R> {
    /// Snapshot of the states published so far.
    ///
    /// # Panics
    ///
    /// Panics if a publisher panicked while holding the lock.
    #[must_use]
    pub fn states(&self) -> Vec<WidgetState<R>> {
        self.states.lock().expect("sink lock poisoned").clone()
    }
}

impl<R: Send> StateSink<R> for RecordingSink<R> {
    fn publish(&self, state: WidgetState<R>) {
        self.states.lock().expect("sink lock poisoned").push(state);
    }
}

/// Store whose writes always fail; reads see whatever was seeded.
#[derive(Debug, Default)]
pub struct FailingStore {
    inner: MemoryStore,
}

impl FailingStore {
    /// Seed an entry, bypassing the failing write path.
    ///
    /// # Panics
    ///
    /// Panics if the inner store rejects the value.
    #[must_use]
    pub fn with_entry(self, key: &str, raw: &str) -> Self {
        self.inner.set(key, raw).expect("seed entry");
        self
    }
}

impl KeyValueStore for FailingStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.inner.get(key)
    }

    fn set(&self, _key: &str, _value: &str) -> Result<()> {
        Err(StatError::Cache("store is read-only".to_string()))
    }

    fn remove(&self, key: &str) -> Result<bool> {
        self.inner.remove(key)
    }

    fn keys(&self) -> Result<Vec<String>> {
        self.inner.keys()
    }
}

// =============================================================================
// Payload fixtures
// =============================================================================

/// WakaTime share payload in the `data[]` layout.
#[must_use]
pub fn make_test_wakatime_json() -> Value {
    json!({
        "data": [
            { "range": { "date": "2026-01-01" }, "grand_total": { "total_seconds": 3600 } },
            { "range": { "date": "2026-01-02" }, "grand_total": { "total_seconds": 7200.5 } }
        ]
    })
}

/// CodeChef profile payload with string numerics.
#[must_use]
pub fn make_test_codechef_profile_json() -> Value {
    json!({
        "success": true,
        "name": "Test Chef",
        "username": "chef",
        "currentRating": "1650",
        "highestRating": 1702,
        "stars": "3★",
        "globalRank": "12345",
        "countryRank": 678,
        "fully_solved": { "count": 150 }
    })
}

/// CodeChef recent-activity payload.
#[must_use]
pub fn make_test_codechef_recent_json() -> Value {
    json!([
        { "problemCode": "FLOW001", "problemName": "Add Two Numbers", "result": "AC", "time": "2026-01-03 10:00:00" },
        { "problemCode": "START01", "result": "WA" }
    ])
}

/// LeetCode profile payload.
#[must_use]
pub fn make_test_leetcode_profile_json() -> Value {
    json!({
        "username": "coder",
        "ranking": 5000,
        "totalSolved": 321,
        "contestRating": 1850.4
    })
}

/// Sample config file.
#[must_use]
pub fn make_test_config_toml(codechef_identity: &str) -> String {
    format!(
        r#"[general]
timeout_seconds = 10

[output]
format = "human"
color = false

[sources.codechef]
identity = "{codechef_identity}"
ttl_seconds = 600

[sources.codechef.overrides]
total_solved = 1193
"#
    )
}

// =============================================================================
// Temp directories
// =============================================================================

/// Temporary directory removed on drop.
pub struct TestDir {
    inner: tempfile::TempDir,
}

impl TestDir {
    /// # Panics
    ///
    /// Panics if the temporary directory cannot be created.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: tempfile::tempdir().expect("Failed to create temp directory"),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        self.inner.path()
    }

    /// Write a file, creating parent directories.
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be written.
    pub fn create_file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.inner.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        fs::write(&path, content).expect("Failed to write test file");
        path
    }

    #[must_use]
    pub fn file_path(&self, name: &str) -> PathBuf {
        self.inner.path().join(name)
    }
}

impl Default for TestDir {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether text contains ANSI escapes.
#[must_use]
pub fn has_ansi_codes(text: &str) -> bool {
    text.contains('\x1b')
}
