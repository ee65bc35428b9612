//! Storage for configuration and cached records.

pub mod cache;
pub mod config;
pub mod paths;

pub use cache::{CacheEntry, CacheListing, FileStore, KeyValueStore, MemoryStore};
pub use config::{
    Config, ConfigSource, ConfigSources, ENV_CACHE_DIR, ENV_CONFIG, ENV_FORMAT, ENV_NO_COLOR,
    ENV_NO_COLOR_STD, ENV_PRETTY, ENV_TIMEOUT, ResolvedConfig, SourceConfig,
};
pub use paths::AppPaths;
