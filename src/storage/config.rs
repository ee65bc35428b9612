//! Configuration file loading and resolution.
//!
//! Loads configuration from `<config dir>/config.toml` (see
//! [`AppPaths`]), or from the path in `STATCARD_CONFIG`.
//!
//! ## Precedence
//!
//! Settings are resolved with the following precedence (highest first):
//! 1. CLI flags
//! 2. Environment variables
//! 3. Config file
//! 4. Built-in defaults
//!
//! ## Environment Variables
//!
//! - `STATCARD_FORMAT`: Output format (human, json, md)
//! - `STATCARD_TIMEOUT`: Request timeout in seconds
//! - `STATCARD_NO_COLOR` or `NO_COLOR`: Disable colors
//! - `STATCARD_PRETTY`: Pretty-print JSON output (1, true, yes)
//! - `STATCARD_CACHE_DIR`: Override the cache directory
//! - `STATCARD_<SOURCE>_IDENTITY`: Identity for one source
//! - `STATCARD_CONFIG`: Override config file path
//!
//! ## Example
//!
//! ```toml
//! [general]
//! timeout_seconds = 20
//!
//! [sources.codechef]
//! identity = "devanshkhandor"
//! ttl_seconds = 21600
//!
//! [sources.codechef.overrides]
//! stars = "★"
//! total_solved = 1193
//!
//! [sources.codechef.endpoints.profile]
//! fallback = "https://competeapi.vercel.app/user/codechef/{identity}"
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::paths::{AppPaths, RECORDS_DIR};
use crate::cli::args::{Cli, FetchArgs, OutputFormat};
use crate::core::fetch_plan::EndpointTemplates;
use crate::core::source::Source;
use crate::error::{Result, StatError};

// =============================================================================
// Environment Variable Names
// =============================================================================

/// Environment variable for output format.
pub const ENV_FORMAT: &str = "STATCARD_FORMAT";
/// Environment variable for timeout in seconds.
pub const ENV_TIMEOUT: &str = "STATCARD_TIMEOUT";
/// Environment variable to disable colors.
pub const ENV_NO_COLOR: &str = "STATCARD_NO_COLOR";
/// Standard environment variable to disable colors.
pub const ENV_NO_COLOR_STD: &str = "NO_COLOR";
/// Environment variable for pretty JSON output.
pub const ENV_PRETTY: &str = "STATCARD_PRETTY";
/// Environment variable overriding the cache directory.
pub const ENV_CACHE_DIR: &str = "STATCARD_CACHE_DIR";
/// Environment variable to override config file path.
pub const ENV_CONFIG: &str = "STATCARD_CONFIG";

/// Per-source identity variable, e.g. `STATCARD_CODECHEF_IDENTITY`.
#[must_use]
pub fn identity_env_var(source: Source) -> String {
    format!("STATCARD_{}_IDENTITY", source.cli_name().to_uppercase())
}

/// Upper bound for request timeouts.
pub const MAX_TIMEOUT_SECS: u64 = 300;

// =============================================================================
// Resolved Configuration
// =============================================================================

/// Fully resolved configuration after merging CLI, env vars, and config file.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Output format.
    pub format: OutputFormat,
    /// Request timeout.
    pub timeout: Duration,
    /// Whether to disable colored output.
    pub no_color: bool,
    /// Whether to pretty-print JSON output.
    pub pretty: bool,
    /// Directory holding the cache store.
    pub cache_dir: PathBuf,
    /// Config file that was consulted (it may not exist).
    pub config_path: PathBuf,
    /// Per-source settings, one entry for every known source.
    pub sources: BTreeMap<Source, SourceConfig>,
    /// Source of each global setting for debugging.
    pub origins: ConfigSources,
}

/// Resolved settings for one source.
#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub identity: Option<String>,
    pub identity_origin: ConfigSource,
    pub ttl: Duration,
    pub endpoints: BTreeMap<String, EndpointTemplates>,
    /// Raw override table; decoded into the source's record type later.
    pub overrides: Option<serde_json::Value>,
}

/// Tracks the source of each configuration value.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    pub format: ConfigSource,
    pub timeout: ConfigSource,
    pub no_color: ConfigSource,
    pub pretty: ConfigSource,
    pub cache_dir: ConfigSource,
}

/// Where a configuration value came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConfigSource {
    /// Value from CLI flag.
    Cli,
    /// Value from environment variable.
    Env,
    /// Value from config file.
    ConfigFile,
    /// Built-in default.
    #[default]
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI flag"),
            Self::Env => write!(f, "environment variable"),
            Self::ConfigFile => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

/// Environment lookup, injectable for tests.
pub type EnvLookup<'a> = &'a dyn Fn(&str) -> Option<String>;

/// Lookup against the process environment.
#[must_use]
pub fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

impl ResolvedConfig {
    /// Resolve final configuration from CLI args, environment variables, and
    /// config file.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but is invalid, or any
    /// resolved value is invalid.
    pub fn resolve(cli: &Cli, fetch: Option<&FetchArgs>) -> Result<Self> {
        let config_path = Self::config_path_with(&process_env);
        let config = Config::load_from(&config_path)?;
        Self::resolve_with(cli, fetch, &config, config_path, &process_env)
    }

    /// Config file path, respecting `STATCARD_CONFIG`.
    #[must_use]
    pub fn config_path_with(env: EnvLookup<'_>) -> PathBuf {
        env(ENV_CONFIG)
            .filter(|p| !p.is_empty())
            .map_or_else(|| AppPaths::new().config_file(), PathBuf::from)
    }

    /// Resolve against an already loaded config and an explicit environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the config or any override is invalid.
    pub fn resolve_with(
        cli: &Cli,
        fetch: Option<&FetchArgs>,
        config: &Config,
        config_path: PathBuf,
        env: EnvLookup<'_>,
    ) -> Result<Self> {
        config.validate()?;

        let mut origins = ConfigSources::default();

        let format = Self::resolve_format(cli, config, env, &mut origins.format)?;
        let timeout = Self::resolve_timeout(fetch, config, env, &mut origins.timeout)?;
        let no_color = Self::resolve_no_color(cli, config, env, &mut origins.no_color);
        let pretty = Self::resolve_pretty(cli, config, env, &mut origins.pretty);
        let cache_dir = Self::resolve_cache_dir(config, env, &mut origins.cache_dir);

        let sources = Source::ALL
            .iter()
            .map(|&source| (source, Self::resolve_source(source, fetch, config, env)))
            .collect();

        Ok(Self {
            format,
            timeout,
            no_color,
            pretty,
            cache_dir,
            config_path,
            sources,
            origins,
        })
    }

    /// Settings for a source.
    ///
    /// # Errors
    ///
    /// Returns `Config` if the source is missing from the resolved map,
    /// which only happens for hand-built configs.
    pub fn source(&self, source: Source) -> Result<&SourceConfig> {
        self.sources
            .get(&source)
            .ok_or_else(|| StatError::Config(format!("no settings for {source}")))
    }

    /// Directory holding one file per cached record.
    #[must_use]
    pub fn records_dir(&self) -> PathBuf {
        self.cache_dir.join(RECORDS_DIR)
    }

    fn resolve_format(
        cli: &Cli,
        config: &Config,
        env: EnvLookup<'_>,
        source: &mut ConfigSource,
    ) -> Result<OutputFormat> {
        // 1. CLI --json or --format
        if cli.json || cli.format.is_some() {
            *source = ConfigSource::Cli;
            return Ok(cli.effective_format());
        }

        // 2. Environment variable
        if let Some(format_env) = env(ENV_FORMAT) {
            *source = ConfigSource::Env;
            return Self::parse_format(&format_env);
        }

        // 3. Config file
        if let Some(ref format_str) = config.output.format {
            *source = ConfigSource::ConfigFile;
            return Self::parse_format(format_str);
        }

        // 4. Default
        *source = ConfigSource::Default;
        Ok(OutputFormat::Human)
    }

    /// Parse a format string into `OutputFormat`.
    fn parse_format(s: &str) -> Result<OutputFormat> {
        match s.trim().to_lowercase().as_str() {
            "human" => Ok(OutputFormat::Human),
            "json" => Ok(OutputFormat::Json),
            "md" | "markdown" => Ok(OutputFormat::Md),
            _ => Err(StatError::Config(format!(
                "Invalid format '{s}'. Valid formats: human, json, md"
            ))),
        }
    }

    fn resolve_timeout(
        fetch: Option<&FetchArgs>,
        config: &Config,
        env: EnvLookup<'_>,
        source: &mut ConfigSource,
    ) -> Result<Duration> {
        // 1. CLI --timeout
        if let Some(timeout) = fetch.and_then(|args| args.timeout) {
            *source = ConfigSource::Cli;
            return Ok(Duration::from_secs(timeout));
        }

        // 2. Environment variable
        if let Some(timeout_env) = env(ENV_TIMEOUT) {
            let secs = timeout_env
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|s| (1..=MAX_TIMEOUT_SECS).contains(s))
                .ok_or_else(|| {
                    StatError::Config(format!(
                        "{ENV_TIMEOUT} must be between 1 and {MAX_TIMEOUT_SECS}, got '{timeout_env}'"
                    ))
                })?;
            *source = ConfigSource::Env;
            return Ok(Duration::from_secs(secs));
        }

        // 3. Config file (always populated, defaults to 30s)
        *source = if config.general.timeout_seconds == GeneralConfig::default().timeout_seconds {
            ConfigSource::Default
        } else {
            ConfigSource::ConfigFile
        };
        Ok(Duration::from_secs(config.general.timeout_seconds))
    }

    fn resolve_no_color(
        cli: &Cli,
        config: &Config,
        env: EnvLookup<'_>,
        source: &mut ConfigSource,
    ) -> bool {
        if cli.no_color {
            *source = ConfigSource::Cli;
            return true;
        }

        if env(ENV_NO_COLOR).is_some_and(|v| is_truthy(&v)) || env(ENV_NO_COLOR_STD).is_some() {
            *source = ConfigSource::Env;
            return true;
        }

        // config.output.color = false means no_color = true
        if !config.output.color {
            *source = ConfigSource::ConfigFile;
            return true;
        }

        *source = ConfigSource::Default;
        false
    }

    fn resolve_pretty(
        cli: &Cli,
        config: &Config,
        env: EnvLookup<'_>,
        source: &mut ConfigSource,
    ) -> bool {
        if cli.pretty {
            *source = ConfigSource::Cli;
            return true;
        }

        if env(ENV_PRETTY).is_some_and(|v| is_truthy(&v)) {
            *source = ConfigSource::Env;
            return true;
        }

        if config.output.pretty {
            *source = ConfigSource::ConfigFile;
            return true;
        }

        *source = ConfigSource::Default;
        false
    }

    fn resolve_cache_dir(config: &Config, env: EnvLookup<'_>, source: &mut ConfigSource) -> PathBuf {
        if let Some(dir) = env(ENV_CACHE_DIR).filter(|d| !d.is_empty()) {
            *source = ConfigSource::Env;
            return PathBuf::from(dir);
        }

        if let Some(dir) = &config.general.cache_dir {
            *source = ConfigSource::ConfigFile;
            return dir.clone();
        }

        *source = ConfigSource::Default;
        AppPaths::new().cache
    }

    fn resolve_source(
        source: Source,
        fetch: Option<&FetchArgs>,
        config: &Config,
        env: EnvLookup<'_>,
    ) -> SourceConfig {
        let settings = config.sources.get(source.cli_name());

        let cli_identity = fetch
            .and_then(|args| args.identity.clone())
            .filter(|_| {
                fetch.is_some_and(|args| {
                    args.sources
                        .iter()
                        .any(|s| Source::from_cli_name(s).ok() == Some(source))
                })
            });

        let (identity, identity_origin) = if let Some(id) = cli_identity {
            (Some(id), ConfigSource::Cli)
        } else if let Some(id) = env(&identity_env_var(source)).filter(|v| !v.trim().is_empty()) {
            (Some(id), ConfigSource::Env)
        } else if let Some(id) = settings.and_then(|s| s.identity.clone()) {
            (Some(id), ConfigSource::ConfigFile)
        } else {
            (None, ConfigSource::Default)
        };

        let ttl = settings
            .and_then(|s| s.ttl_seconds)
            .map_or_else(|| source.default_ttl(), Duration::from_secs);

        SourceConfig {
            identity: identity.map(|id| id.trim().to_string()),
            identity_origin,
            ttl,
            endpoints: settings.map(|s| s.endpoints.clone()).unwrap_or_default(),
            overrides: settings.and_then(|s| s.overrides.clone()),
        }
    }
}

/// Whether a flag-like value is truthy.
fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

// =============================================================================
// File Schema
// =============================================================================

/// Application configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings.
    pub general: GeneralConfig,
    /// Output settings.
    pub output: OutputConfig,
    /// Per-source settings keyed by source name.
    pub sources: BTreeMap<String, SourceSettings>,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Timeout for network requests in seconds.
    pub timeout_seconds: u64,
    /// Cache directory override.
    pub cache_dir: Option<PathBuf>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            cache_dir: None,
        }
    }
}

/// Output formatting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Default output format (human, json, md).
    pub format: Option<String>,
    /// Whether to use colors in output.
    pub color: bool,
    /// Whether to pretty-print JSON output.
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: None,
            color: true,
            pretty: false,
        }
    }
}

/// Settings for a single source.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    /// Username, handle or share URL.
    pub identity: Option<String>,
    /// Freshness window in seconds.
    pub ttl_seconds: Option<u64>,
    /// URL templates keyed by resource name.
    pub endpoints: BTreeMap<String, EndpointTemplates>,
    /// Static values filling absent record fields.
    pub overrides: Option<serde_json::Value>,
}

impl Config {
    /// Load configuration from a specific path.
    ///
    /// Returns default config if the file doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns `ConfigParse` if the file exists but is not valid TOML for
    /// this schema, or an I/O error if it cannot be read.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(?path, "Config file not found, using defaults");
            return Ok(Self::default());
        }

        tracing::debug!(?path, "Loading config file");
        let content = fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| StatError::ConfigParse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `Config` for unknown source names, invalid formats, an out of
    /// range timeout, a zero TTL, or a non-table override.
    pub fn validate(&self) -> Result<()> {
        if let Some(format) = &self.output.format {
            if !["human", "json", "md"].contains(&format.as_str()) {
                return Err(StatError::Config(format!(
                    "Invalid format \"{format}\". Valid formats: human, json, md"
                )));
            }
        }

        if self.general.timeout_seconds == 0 || self.general.timeout_seconds > MAX_TIMEOUT_SECS {
            return Err(StatError::Config(format!(
                "Timeout must be between 1 and {MAX_TIMEOUT_SECS} seconds"
            )));
        }

        for (name, settings) in &self.sources {
            let source = Source::from_cli_name(name).map_err(|_| {
                StatError::Config(format!(
                    "Unknown source \"{name}\" in [sources]. Valid sources: {}",
                    Source::ALL
                        .iter()
                        .map(|s| s.cli_name())
                        .collect::<Vec<_>>()
                        .join(", ")
                ))
            })?;

            if settings.ttl_seconds == Some(0) {
                return Err(StatError::Config(format!(
                    "sources.{source}.ttl_seconds must be greater than 0"
                )));
            }

            if let Some(overrides) = &settings.overrides {
                if !overrides.is_object() {
                    return Err(StatError::Config(format!(
                        "sources.{source}.overrides must be a table"
                    )));
                }
            }
        }

        Ok(())
    }
}
