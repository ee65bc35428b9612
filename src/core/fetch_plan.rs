//! Endpoint chains and fetch outcomes.
//!
//! A resource (a profile, a recent-submissions list) is reachable through an
//! ordered chain of endpoints: a primary and at most one fallback. The chain
//! is walked once; there are no retries within a run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::models::Resolved;
use super::source::Source;
use crate::error::Result;

/// Placeholder substituted with the identity in URL templates.
pub const IDENTITY_PLACEHOLDER: &str = "{identity}";

// =============================================================================
// Endpoint Templates
// =============================================================================

/// Configurable URL templates for one resource.
///
/// A template is either a full URL or contains `{identity}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointTemplates {
    pub primary: Option<String>,
    pub fallback: Option<String>,
}

fn render(template: &str, identity: &str) -> String {
    template.replace(IDENTITY_PLACEHOLDER, identity)
}

// =============================================================================
// Endpoint Chain
// =============================================================================

/// A concrete endpoint in a chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// `primary` or `fallback`.
    pub label: &'static str,
    pub url: String,
}

/// Ordered endpoints for one resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointChain {
    /// Resource name (`profile`, `days`, `recent`, `badges`).
    pub resource: &'static str,
    pub endpoints: Vec<Endpoint>,
}

impl EndpointChain {
    /// Build a chain from built-in defaults and optional overrides.
    ///
    /// An override replaces the matching default; an empty override string
    /// disables that endpoint.
    #[must_use]
    pub fn resolve(
        resource: &'static str,
        identity: &str,
        default_primary: &str,
        default_fallback: Option<&str>,
        overrides: Option<&EndpointTemplates>,
    ) -> Self {
        let primary = overrides
            .and_then(|o| o.primary.as_deref())
            .unwrap_or(default_primary);
        let fallback = overrides
            .and_then(|o| o.fallback.as_deref())
            .or(default_fallback);

        let endpoints = [("primary", Some(primary)), ("fallback", fallback)]
            .into_iter()
            .filter_map(|(label, template)| {
                let template = template?.trim();
                (!template.is_empty()).then(|| Endpoint {
                    label,
                    url: render(template, identity),
                })
            })
            .collect();

        Self {
            resource,
            endpoints,
        }
    }

    /// Whether the chain has anything to try.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}

// =============================================================================
// Fetch Attempt
// =============================================================================

/// Record of a single endpoint attempt.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchAttempt {
    pub resource: String,
    pub endpoint: String,
    pub url: String,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// =============================================================================
// Fetch Outcome
// =============================================================================

/// Result of one controller run.
#[derive(Debug)]
pub struct FetchOutcome<R> {
    pub source: Source,
    pub key: String,
    pub result: Result<Resolved<R>>,
    pub attempts: Vec<FetchAttempt>,
}

impl<R> FetchOutcome<R> {
    /// Whether the run produced a record.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// Convert the record type.
    pub fn map<T>(self, f: impl FnOnce(R) -> T) -> FetchOutcome<T> {
        FetchOutcome {
            source: self.source,
            key: self.key,
            result: self.result.map(|r| Resolved {
                record: f(r.record),
                origin: r.origin,
                fetched_at: r.fetched_at,
            }),
            attempts: self.attempts,
        }
    }
}
