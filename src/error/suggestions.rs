//! Fix suggestions for statcard errors.
//!
//! Maps error variants to commands and context a user can act on.

use crate::core::source::Source;

/// A fix suggestion for an error.
#[derive(Debug, Clone)]
pub struct FixSuggestion {
    /// Fix commands in order of preference, copy-paste ready.
    pub commands: Vec<String>,

    /// Explanation of why this error occurred.
    pub context: String,

    /// Tips to prevent this error in the future.
    pub prevention: Option<String>,
}

impl FixSuggestion {
    /// Creates a new fix suggestion with required fields.
    #[must_use]
    pub fn new(commands: Vec<String>, context: impl Into<String>) -> Self {
        Self {
            commands,
            context: context.into(),
            prevention: None,
        }
    }

    /// Builder: adds prevention tips.
    #[must_use]
    pub fn with_prevention(mut self, prevention: impl Into<String>) -> Self {
        self.prevention = Some(prevention.into());
        self
    }
}

fn valid_source_names() -> String {
    Source::ALL
        .iter()
        .map(|s| s.cli_name())
        .collect::<Vec<_>>()
        .join(", ")
}

#[must_use]
pub fn timeout_suggestions(seconds: u64) -> Vec<FixSuggestion> {
    vec![
        FixSuggestion::new(
            vec!["statcard fetch <source> --timeout 60".to_string()],
            format!("The endpoint did not answer within {seconds}s."),
        )
        .with_prevention("Raise general.timeout_seconds in config.toml for slow scrapers."),
    ]
}

#[must_use]
pub fn network_suggestions(message: &str) -> Vec<FixSuggestion> {
    vec![FixSuggestion::new(
        vec!["statcard fetch <source> --verbose".to_string()],
        format!("Network error: {message}. Check your internet connection."),
    )]
}

#[must_use]
pub fn http_status_suggestions(url: &str, status: u16) -> Vec<FixSuggestion> {
    let context = match status {
        404 => format!("{url} returned 404. The identity may be misspelled."),
        429 => format!("{url} is rate limiting requests. Cached data is used when available."),
        500..=599 => format!("{url} is having server trouble ({status})."),
        _ => format!("{url} returned HTTP {status}."),
    };
    vec![FixSuggestion::new(
        vec!["statcard config show".to_string()],
        context,
    )]
}

#[must_use]
pub fn unsupported_shape_suggestions(source: &str) -> Vec<FixSuggestion> {
    vec![FixSuggestion::new(
        vec![format!("statcard fetch {source} --verbose")],
        "The endpoint answered with JSON that does not look like profile data. \
         The upstream API may have changed.",
    )]
}

#[must_use]
pub fn source_unavailable_suggestions(display: &str) -> Vec<FixSuggestion> {
    vec![
        FixSuggestion::new(
            vec!["statcard fetch <source> --verbose".to_string()],
            format!("Every endpoint for {display} failed and nothing is cached yet."),
        )
        .with_prevention("Once one fetch succeeds, later outages fall back to the cached copy."),
    ]
}

#[must_use]
pub fn invalid_source_suggestions(name: &str) -> Vec<FixSuggestion> {
    vec![FixSuggestion::new(
        vec!["statcard fetch codechef".to_string()],
        format!(
            "Unknown source '{name}'. Valid sources: {}",
            valid_source_names()
        ),
    )]
}

#[must_use]
pub fn missing_identity_suggestions(source: &str) -> Vec<FixSuggestion> {
    vec![
        FixSuggestion::new(
            vec![format!("statcard fetch {source} --identity <id>")],
            format!("{source} needs an identity (username or share URL)."),
        )
        .with_prevention(format!(
            "Set sources.{source}.identity in config.toml to avoid passing it every time."
        )),
    ]
}

#[must_use]
pub fn config_parse_suggestions(path: &str, message: &str) -> Vec<FixSuggestion> {
    vec![FixSuggestion::new(
        vec![format!("$EDITOR {path}")],
        format!("The config file could not be parsed: {message}"),
    )]
}
