//! Diagnostic logging to stderr.
//!
//! Logs never share stdout with rendered output. `--json-output` (or
//! `STATCARD_LOG_FORMAT=json`) switches to one JSON event per line.

use std::fs::OpenOptions;
use std::path::PathBuf;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

use crate::storage::config::EnvLookup;

pub const LOG_LEVEL_ENV: &str = "STATCARD_LOG";
pub const LOG_FORMAT_ENV: &str = "STATCARD_LOG_FORMAT";
pub const LOG_FILE_ENV: &str = "STATCARD_LOG_FILE";

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Human,
    /// One event per line.
    Json,
    Compact,
}

impl LogFormat {
    /// Parse from string (case-insensitive).
    #[must_use]
    pub fn from_arg(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "human" => Some(Self::Human),
            "json" => Some(Self::Json),
            "compact" => Some(Self::Compact),
            _ => None,
        }
    }
}

/// Log level threshold.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    #[default]
    Warn,
    Error,
}

impl LogLevel {
    /// Parse from string (case-insensitive).
    #[must_use]
    pub fn from_arg(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "trace" => Some(Self::Trace),
            "verbose" | "debug" => Some(Self::Debug),
            "info" => Some(Self::Info),
            "warn" | "warning" => Some(Self::Warn),
            "error" | "critical" => Some(Self::Error),
            _ => None,
        }
    }

    /// Filter directive for this crate.
    #[must_use]
    pub const fn as_filter(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Resolved logging settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogSettings {
    pub level: LogLevel,
    pub format: LogFormat,
    pub file: Option<PathBuf>,
}

impl LogSettings {
    /// Combine CLI flags with `STATCARD_LOG*` variables.
    ///
    /// An explicit `--log-level` beats `STATCARD_LOG`; `--verbose` raises the
    /// default to debug. `--json-output` beats `STATCARD_LOG_FORMAT`.
    #[must_use]
    pub fn resolve(
        cli_level: Option<&str>,
        json_output: bool,
        verbose: bool,
        env: EnvLookup<'_>,
    ) -> Self {
        let non_empty = |key: &str| {
            env(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let level = cli_level
            .and_then(LogLevel::from_arg)
            .or_else(|| non_empty(LOG_LEVEL_ENV).as_deref().and_then(LogLevel::from_arg))
            .unwrap_or(if verbose {
                LogLevel::Debug
            } else {
                LogLevel::default()
            });

        let format = if json_output {
            LogFormat::Json
        } else {
            non_empty(LOG_FORMAT_ENV)
                .as_deref()
                .and_then(LogFormat::from_arg)
                .unwrap_or_default()
        };

        Self {
            level,
            format,
            file: non_empty(LOG_FILE_ENV).map(PathBuf::from),
        }
    }
}

/// Install the global subscriber. Later calls are no-ops.
pub fn init(settings: &LogSettings) {
    let file = settings.file.as_ref().and_then(|path| {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .ok()
    });

    let make_writer = || -> BoxMakeWriter {
        match file.as_ref().and_then(|f| f.try_clone().ok()) {
            Some(file) => BoxMakeWriter::new(file),
            None => BoxMakeWriter::new(std::io::stderr),
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("statcard={}", settings.level.as_filter())));

    match settings.format {
        LogFormat::Json => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .json()
                .with_writer(make_writer())
                .with_span_events(FmtSpan::CLOSE)
                .try_init()
                .ok();
        }
        LogFormat::Compact => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .compact()
                .with_writer(make_writer())
                .with_target(true)
                .try_init()
                .ok();
        }
        LogFormat::Human => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(make_writer())
                .with_target(false)
                .without_time()
                .try_init()
                .ok();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_to_warn_human_stderr() {
        let env = env_of(&[]);
        assert_eq!(LogSettings::resolve(None, false, false, &env), LogSettings::default());
    }

    #[test]
    fn env_level_and_format() {
        let env = env_of(&[(LOG_LEVEL_ENV, "trace"), (LOG_FORMAT_ENV, "compact")]);
        let settings = LogSettings::resolve(None, false, false, &env);
        assert_eq!(settings.level, LogLevel::Trace);
        assert_eq!(settings.format, LogFormat::Compact);
    }

    #[test]
    fn cli_flags_beat_env() {
        let env = env_of(&[(LOG_LEVEL_ENV, "trace"), (LOG_FORMAT_ENV, "human")]);
        let settings = LogSettings::resolve(Some("error"), true, false, &env);
        assert_eq!(settings.level, LogLevel::Error);
        assert_eq!(settings.format, LogFormat::Json);
    }

    #[test]
    fn verbose_raises_default_only() {
        let env = env_of(&[]);
        assert_eq!(LogSettings::resolve(None, false, true, &env).level, LogLevel::Debug);

        let env = env_of(&[(LOG_LEVEL_ENV, "info")]);
        assert_eq!(LogSettings::resolve(None, false, true, &env).level, LogLevel::Info);
    }

    #[test]
    fn blank_and_unknown_values_are_ignored() {
        let env = env_of(&[
            (LOG_LEVEL_ENV, "  "),
            (LOG_FORMAT_ENV, "xml"),
            (LOG_FILE_ENV, ""),
        ]);
        assert_eq!(LogSettings::resolve(None, false, false, &env), LogSettings::default());
    }

    #[test]
    fn log_file_path_from_env() {
        let env = env_of(&[(LOG_FILE_ENV, "/tmp/statcard.log")]);
        assert_eq!(
            LogSettings::resolve(None, false, false, &env).file,
            Some(PathBuf::from("/tmp/statcard.log"))
        );
    }
}
