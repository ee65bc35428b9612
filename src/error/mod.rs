//! Error types for statcard.
//!
//! Uses `thiserror` for structured error types that map to exit codes.
//!
//! ## Error Taxonomy
//!
//! Errors are categorized into five main categories:
//! - **Network**: Unreachable endpoints, non-success statuses, timeouts
//! - **Source**: Payloads that cannot be interpreted, total source failure
//! - **Configuration**: Config file parsing, validation, or missing values
//! - **Cache**: Local cache store failures
//! - **Internal**: Unexpected errors, bugs, or unclassified issues
//!
//! Each error has a stable error code (e.g., `STAT-N001`) for programmatic handling.
//!
//! Transport errors and unsupported payload shapes are both "this endpoint is
//! unusable" signals: the fetch pipeline moves on to the next endpoint in the
//! chain when [`StatError::is_fallback_eligible`] returns true.

pub mod suggestions;

use thiserror::Error;

pub use suggestions::FixSuggestion;

// =============================================================================
// Error Categories
// =============================================================================

/// High-level error categories for classification and routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Network issues (timeout, unreachable host, non-success status).
    Network,
    /// Source issues (unrecognized payload shape, all endpoints failed).
    Source,
    /// Configuration issues (parse errors, invalid values, missing identity).
    Configuration,
    /// Local cache store issues.
    Cache,
    /// Internal errors (bugs, unexpected state, unclassified).
    Internal,
}

impl ErrorCategory {
    /// Returns a human-readable description of the category.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::Network => "Network error",
            Self::Source => "Source error",
            Self::Configuration => "Configuration error",
            Self::Cache => "Cache error",
            Self::Internal => "Internal error",
        }
    }

    /// Returns a short code prefix for this category.
    #[must_use]
    pub const fn code_prefix(&self) -> &'static str {
        match self {
            Self::Network => "N",
            Self::Source => "S",
            Self::Configuration => "C",
            Self::Cache => "K",
            Self::Internal => "X",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

// =============================================================================
// Exit Codes
// =============================================================================

/// Process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    /// Success
    Success = 0,
    /// Unexpected failure, source unavailable, partial failure
    GeneralError = 1,
    /// Parse/format errors, unknown source, invalid configuration
    ParseError = 3,
    /// Timeout
    Timeout = 4,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

/// Main error type for statcard operations.
#[derive(Error, Debug)]
pub enum StatError {
    // ==========================================================================
    // Network errors (Category: Network)
    // ==========================================================================
    /// Transport-level failure (connection refused, DNS, TLS, reset).
    #[error("network error: {0}")]
    Network(String),

    /// Endpoint answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    HttpStatus { url: String, status: u16 },

    /// Request timed out.
    #[error("request timeout after {0} seconds")]
    Timeout(u64),

    // ==========================================================================
    // Source errors (Category: Source)
    // ==========================================================================
    /// Response body could not be parsed as JSON.
    #[error("failed to parse response: {0}")]
    ParseResponse(String),

    /// Payload parsed but carries none of the structural markers for the source.
    #[error("unsupported {source_name} payload shape: {reason}")]
    UnsupportedShape { source_name: String, reason: String },

    /// Every endpoint for the primary resource failed and no cache exists.
    #[error("Unable to load {display} stats")]
    SourceUnavailable { display: String, attempts: usize },

    /// Some sources succeeded, some failed.
    #[error("partial failure: {failed} source(s) failed")]
    PartialFailure { failed: usize },

    /// The run was cancelled before it could publish a result.
    #[error("fetch cancelled for {0}")]
    Cancelled(String),

    // ==========================================================================
    // Configuration errors (Category: Configuration)
    // ==========================================================================
    /// Generic configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Error parsing configuration file.
    #[error("config parse error at {path}: {message}")]
    ConfigParse { path: String, message: String },

    /// Unknown source name.
    #[error("invalid source: {0}")]
    InvalidSource(String),

    /// No identity configured for a source that needs one.
    #[error("no identity configured for {0}")]
    MissingIdentity(String),

    // ==========================================================================
    // Cache errors (Category: Cache)
    // ==========================================================================
    /// Cache store failure that is not a plain I/O error.
    #[error("cache error: {0}")]
    Cache(String),

    // ==========================================================================
    // I/O errors (Category: Internal)
    // ==========================================================================
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Catch-all for other errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StatError {
    /// Map error to process exit code.
    #[must_use]
    pub const fn exit_code(&self) -> ExitCode {
        match self {
            Self::Config(_)
            | Self::ConfigParse { .. }
            | Self::InvalidSource(_)
            | Self::MissingIdentity(_)
            | Self::ParseResponse(_)
            | Self::UnsupportedShape { .. } => ExitCode::ParseError,

            Self::Timeout(_) => ExitCode::Timeout,

            Self::Network(_)
            | Self::HttpStatus { .. }
            | Self::SourceUnavailable { .. }
            | Self::PartialFailure { .. }
            | Self::Cancelled(_)
            | Self::Cache(_)
            | Self::Io(_)
            | Self::Json(_)
            | Self::Other(_) => ExitCode::GeneralError,
        }
    }

    /// Returns the error category for classification and routing.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::Network(_) | Self::HttpStatus { .. } | Self::Timeout(_) => ErrorCategory::Network,

            Self::ParseResponse(_)
            | Self::UnsupportedShape { .. }
            | Self::SourceUnavailable { .. }
            | Self::PartialFailure { .. }
            | Self::Cancelled(_) => ErrorCategory::Source,

            Self::Config(_)
            | Self::ConfigParse { .. }
            | Self::InvalidSource(_)
            | Self::MissingIdentity(_) => ErrorCategory::Configuration,

            Self::Cache(_) => ErrorCategory::Cache,

            Self::Io(_) | Self::Json(_) | Self::Other(_) => ErrorCategory::Internal,
        }
    }

    /// Returns a stable error code for programmatic handling.
    ///
    /// Format: `STAT-{category}{number}`.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            // Network errors (N001-N099)
            Self::Timeout(_) => "STAT-N001",
            Self::HttpStatus { .. } => "STAT-N002",
            Self::Network(_) => "STAT-N099",

            // Source errors (S001-S099)
            Self::ParseResponse(_) => "STAT-S001",
            Self::UnsupportedShape { .. } => "STAT-S002",
            Self::SourceUnavailable { .. } => "STAT-S010",
            Self::PartialFailure { .. } => "STAT-S020",
            Self::Cancelled(_) => "STAT-S030",

            // Configuration errors (C001-C099)
            Self::Config(_) => "STAT-C001",
            Self::ConfigParse { .. } => "STAT-C002",
            Self::InvalidSource(_) => "STAT-C010",
            Self::MissingIdentity(_) => "STAT-C011",

            // Cache errors (K001-K099)
            Self::Cache(_) => "STAT-K001",

            // Internal errors (X001-X099)
            Self::Io(_) => "STAT-X001",
            Self::Json(_) => "STAT-X002",
            Self::Other(_) => "STAT-X099",
        }
    }

    /// Whether the next endpoint in a fallback chain should be tried.
    ///
    /// Transport failures and uninterpretable payloads both mark the current
    /// endpoint as unusable.
    #[must_use]
    pub const fn is_fallback_eligible(&self) -> bool {
        matches!(
            self,
            Self::Network(_)
                | Self::HttpStatus { .. }
                | Self::Timeout(_)
                | Self::ParseResponse(_)
                | Self::UnsupportedShape { .. }
        )
    }

    /// Returns actionable fix suggestions for this error.
    #[must_use]
    pub fn fix_suggestions(&self) -> Vec<FixSuggestion> {
        match self {
            Self::Timeout(seconds) => suggestions::timeout_suggestions(*seconds),
            Self::Network(msg) => suggestions::network_suggestions(msg),
            Self::HttpStatus { url, status } => suggestions::http_status_suggestions(url, *status),
            Self::UnsupportedShape { source_name, .. } => {
                suggestions::unsupported_shape_suggestions(source_name)
            }
            Self::SourceUnavailable { display, .. } => {
                suggestions::source_unavailable_suggestions(display)
            }
            Self::InvalidSource(name) => suggestions::invalid_source_suggestions(name),
            Self::MissingIdentity(source) => suggestions::missing_identity_suggestions(source),
            Self::ConfigParse { path, message } => {
                suggestions::config_parse_suggestions(path, message)
            }
            Self::Config(msg) => vec![FixSuggestion::new(
                vec!["statcard config show".to_string()],
                format!("Configuration error: {msg}"),
            )],
            Self::Cache(_) | Self::Io(_) => vec![FixSuggestion::new(
                vec!["statcard cache clear".to_string()],
                "The local cache could not be read or written. Check permissions and disk space.",
            )],
            Self::PartialFailure { failed } => vec![FixSuggestion::new(
                vec!["statcard fetch <source> --verbose".to_string()],
                format!("{failed} source(s) failed. Re-run a single source with --verbose for details."),
            )],
            Self::ParseResponse(_) | Self::Json(_) | Self::Cancelled(_) | Self::Other(_) => {
                Vec::new()
            }
        }
    }
}

/// Result type alias for statcard operations.
pub type Result<T> = std::result::Result<T, StatError>;

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn sample_errors() -> Vec<StatError> {
        vec![
            StatError::Network("refused".to_string()),
            StatError::HttpStatus {
                url: "https://example.com".to_string(),
                status: 503,
            },
            StatError::Timeout(30),
            StatError::ParseResponse("eof".to_string()),
            StatError::UnsupportedShape {
                source_name: "wakatime".to_string(),
                reason: "no day list".to_string(),
            },
            StatError::SourceUnavailable {
                display: "CodeChef".to_string(),
                attempts: 2,
            },
            StatError::PartialFailure { failed: 1 },
            StatError::Cancelled("codechef".to_string()),
            StatError::Config("bad".to_string()),
            StatError::ConfigParse {
                path: "/tmp/config.toml".to_string(),
                message: "expected table".to_string(),
            },
            StatError::InvalidSource("github".to_string()),
            StatError::MissingIdentity("codechef".to_string()),
            StatError::Cache("escaped key".to_string()),
            StatError::Io(std::io::Error::other("disk")),
            StatError::Other(anyhow::anyhow!("boom")),
        ]
    }

    #[test]
    fn error_codes_follow_format() {
        for err in sample_errors() {
            let code = err.error_code();
            assert!(code.starts_with("STAT-"), "bad code {code}");
            let prefix = err.category().code_prefix();
            assert_eq!(&code[5..6], prefix, "{code} does not match {prefix}");
        }
    }

    #[test]
    fn error_codes_are_unique() {
        let codes: Vec<_> = sample_errors().iter().map(StatError::error_code).collect();
        let unique: HashSet<_> = codes.iter().collect();
        assert_eq!(codes.len(), unique.len());
    }

    #[test]
    fn transport_and_shape_errors_allow_fallback() {
        assert!(StatError::Network("x".into()).is_fallback_eligible());
        assert!(StatError::Timeout(5).is_fallback_eligible());
        assert!(
            StatError::HttpStatus {
                url: "u".into(),
                status: 404
            }
            .is_fallback_eligible()
        );
        assert!(
            StatError::UnsupportedShape {
                source_name: "wakatime".into(),
                reason: "r".into()
            }
            .is_fallback_eligible()
        );
        assert!(!StatError::Cancelled("x".into()).is_fallback_eligible());
        assert!(!StatError::Config("x".into()).is_fallback_eligible());
    }

    #[test]
    fn source_unavailable_message_is_user_facing() {
        let err = StatError::SourceUnavailable {
            display: "CodeChef".to_string(),
            attempts: 2,
        };
        assert_eq!(err.to_string(), "Unable to load CodeChef stats");
    }

    #[test]
    fn exit_codes_are_correct() {
        assert_eq!(StatError::Timeout(1).exit_code(), ExitCode::Timeout);
        assert_eq!(
            StatError::InvalidSource("x".into()).exit_code(),
            ExitCode::ParseError
        );
        assert_eq!(
            StatError::PartialFailure { failed: 2 }.exit_code(),
            ExitCode::GeneralError
        );
        assert_eq!(i32::from(ExitCode::ParseError), 3);
    }

    #[test]
    fn invalid_source_suggests_valid_names() {
        let suggestions = StatError::InvalidSource("github".into()).fix_suggestions();
        assert!(!suggestions.is_empty());
        assert!(suggestions[0].context.contains("codechef"));
    }
}
