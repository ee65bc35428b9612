//! Cache command implementation.

use serde_json::Value;

use crate::cli::args::{CacheCommand, Cli, OutputFormat};
use crate::core::source::Source;
use crate::error::{Result, StatError};
use crate::render::{human, robot};
use crate::storage::cache::{CacheEntry, FileStore, KeyValueStore, list_entries};
use crate::storage::config::ResolvedConfig;
use crate::util::time::{Clock, SystemClock, format_age};

/// Execute a cache subcommand against the configured cache directory.
///
/// # Errors
///
/// Returns an error if the store cannot be read or the source is unknown.
pub fn execute(cli: &Cli, cmd: &CacheCommand) -> Result<()> {
    let cfg = ResolvedConfig::resolve(cli, None)?;
    let store = FileStore::new(cfg.records_dir());
    let now_ms = SystemClock.now_ms();

    match cmd {
        CacheCommand::List => {
            let entries = list_entries(&store)?;
            match cfg.format {
                OutputFormat::Json => {
                    println!("{}", robot::render_envelope("cache list", &entries, Vec::new(), cfg.pretty)?);
                }
                OutputFormat::Human | OutputFormat::Md => {
                    print!("{}", human::render_cache_list(&entries, now_ms, cfg.no_color));
                }
            }
        }
        CacheCommand::Show { source, identity } => {
            let source = Source::from_cli_name(source)?;
            let identity = match identity {
                Some(id) => id.trim().to_string(),
                None => cfg
                    .source(source)?
                    .identity
                    .clone()
                    .ok_or_else(|| StatError::MissingIdentity(source.cli_name().to_string()))?,
            };
            let key = source.cache_key(&identity);
            let Some(entry) = show(&store, &key)? else {
                eprintln!("No cached entry for {key}");
                return Ok(());
            };
            match cfg.format {
                OutputFormat::Json => {
                    println!("{}", robot::render_envelope("cache show", &entry, Vec::new(), cfg.pretty)?);
                }
                OutputFormat::Human | OutputFormat::Md => {
                    println!("{key} ({} old)", format_age(entry.age_ms(now_ms)));
                    println!("{}", robot::render_json(&entry.data, true)?);
                }
            }
        }
        CacheCommand::Clear { source } => {
            let source = source.as_deref().map(Source::from_cli_name).transpose()?;
            let removed = clear(&store, source)?;
            println!("Removed {removed} cached entr{}", if removed == 1 { "y" } else { "ies" });
        }
    }
    Ok(())
}

/// Decode one stored entry without assuming its record type.
///
/// # Errors
///
/// Returns `Cache` when the stored text is not an entry.
pub fn show(store: &dyn KeyValueStore, key: &str) -> Result<Option<CacheEntry<Value>>> {
    let Some(raw) = store.get(key)? else {
        return Ok(None);
    };
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|e| StatError::Cache(format!("{key}: {e}")))
}

/// Remove every entry, or every entry belonging to one source.
///
/// # Errors
///
/// Returns an error if the store cannot be listed or an entry removed.
pub fn clear(store: &dyn KeyValueStore, source: Option<Source>) -> Result<usize> {
    let prefix = source.map(|s| s.cache_key(""));
    let mut removed = 0;
    for key in store.keys()? {
        if prefix.as_deref().is_some_and(|p| !key.starts_with(p)) {
            continue;
        }
        if store.remove(&key)? {
            tracing::debug!(key, "Removed cache entry");
            removed += 1;
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::cache::MemoryStore;

    fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        store
            .set("codechef_data_a", r#"{"data":{"stars":"3★"},"timestamp":5}"#)
            .unwrap();
        store
            .set("leetcode_data_a", r#"{"data":{},"timestamp":6}"#)
            .unwrap();
        store.set("leetcode_data_b", "garbage").unwrap();
        store
    }

    #[test]
    fn clear_one_source_keeps_others() {
        let store = seeded();
        assert_eq!(clear(&store, Some(Source::LeetCode)).unwrap(), 2);
        assert_eq!(store.keys().unwrap(), vec!["codechef_data_a"]);
    }

    #[test]
    fn clear_everything() {
        let store = seeded();
        assert_eq!(clear(&store, None).unwrap(), 3);
        assert!(store.keys().unwrap().is_empty());
    }

    #[test]
    fn show_decodes_or_reports_corruption() {
        let store = seeded();
        let entry = show(&store, "codechef_data_a").unwrap().unwrap();
        assert_eq!(entry.timestamp, 5);
        assert_eq!(entry.data["stars"], "3★");
        assert!(show(&store, "missing").unwrap().is_none());
        assert!(matches!(show(&store, "leetcode_data_b"), Err(StatError::Cache(_))));
    }
}
