//! Normalized record types.
//!
//! These are the fixed internal schemas every source is normalized into.
//! Scalar fields are optional because the upstream APIs are uncontrolled;
//! renderers substitute a placeholder for anything absent.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::source::Source;

// =============================================================================
// Fill-absent merge
// =============================================================================

/// Combine a record with a lower-precedence partial record.
///
/// Implementations only populate fields that are absent on `self`; a present
/// value is never replaced.
pub trait FillAbsent {
    fn fill_absent(&mut self, overrides: &Self);
}

fn fill<T: Clone>(slot: &mut Option<T>, fallback: &Option<T>) {
    if slot.is_none() {
        slot.clone_from(fallback);
    }
}

// =============================================================================
// Activity (WakaTime)
// =============================================================================

/// Coding time for one calendar day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DayTotal {
    /// `YYYY-MM-DD`.
    pub date: String,
    /// Total seconds of activity.
    pub total: f64,
}

/// Daily activity history from a coding-time tracker.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ActivityRecord {
    pub days: Vec<DayTotal>,
}

impl FillAbsent for ActivityRecord {
    fn fill_absent(&mut self, overrides: &Self) {
        if self.days.is_empty() && !overrides.days.is_empty() {
            self.days.clone_from(&overrides.days);
        }
    }
}

/// Hours logged in one calendar month.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MonthTotal {
    /// `YYYY-MM`.
    pub month: String,
    pub hours: u64,
}

/// Derived totals for an [`ActivityRecord`].
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActivitySummary {
    pub day_count: usize,
    pub total_hours: u64,
    pub avg_hours_per_day: f64,
    pub best_day_hours: f64,
    /// Up to twelve most recent months, oldest first.
    pub months: Vec<MonthTotal>,
    /// Seconds per day for the trailing thirty days, oldest first.
    pub recent: Vec<f64>,
}

impl ActivityRecord {
    /// Compute headline totals. Returns `None` when there are no days.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    pub fn summary(&self) -> Option<ActivitySummary> {
        if self.days.is_empty() {
            return None;
        }

        let total_seconds: f64 = self.days.iter().map(|d| d.total).sum();
        let total_hours = (total_seconds / 3600.0).floor().max(0.0) as u64;
        let avg = total_hours as f64 / self.days.len() as f64;
        let best = self.days.iter().map(|d| d.total).fold(0.0_f64, f64::max) / 3600.0;

        let mut by_month: BTreeMap<&str, f64> = BTreeMap::new();
        for day in &self.days {
            let key = day.date.get(..7).unwrap_or(&day.date);
            *by_month.entry(key).or_insert(0.0) += day.total;
        }
        let skip = by_month.len().saturating_sub(12);
        let months = by_month
            .into_iter()
            .skip(skip)
            .map(|(month, seconds)| MonthTotal {
                month: month.to_string(),
                hours: (seconds / 3600.0).round().max(0.0) as u64,
            })
            .collect();

        let recent_start = self.days.len().saturating_sub(30);
        let recent = self.days[recent_start..].iter().map(|d| d.total).collect();

        Some(ActivitySummary {
            day_count: self.days.len(),
            total_hours,
            avg_hours_per_day: (avg * 10.0).round() / 10.0,
            best_day_hours: (best * 10.0).round() / 10.0,
            months,
            recent,
        })
    }
}

// =============================================================================
// Competitive-programming profile (CodeChef, LeetCode)
// =============================================================================

/// An achievement badge.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Badge {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

/// A recent problem submission.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none", alias = "problem_code")]
    pub problem_code: Option<String>,

    /// e.g. `AC`, `WA`, `TLE`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verdict: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub contest: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

/// Public profile summary from a competitive-programming site.
///
/// Serialized camelCase; snake_case keys are accepted on input so TOML
/// overrides read naturally.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ProfileRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none", alias = "rating_text")]
    pub rating_text: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none", alias = "highest_rating")]
    pub highest_rating: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub stars: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none", alias = "global_rank")]
    pub global_rank: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none", alias = "country_rank")]
    pub country_rank: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none", alias = "total_solved")]
    pub total_solved: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub badges: Option<Vec<Badge>>,

    #[serde(skip_serializing_if = "Option::is_none", alias = "recent_submissions")]
    pub recent_submissions: Option<Vec<Submission>>,
}

impl FillAbsent for ProfileRecord {
    fn fill_absent(&mut self, overrides: &Self) {
        fill(&mut self.name, &overrides.name);
        fill(&mut self.username, &overrides.username);
        fill(&mut self.rating, &overrides.rating);
        fill(&mut self.rating_text, &overrides.rating_text);
        fill(&mut self.highest_rating, &overrides.highest_rating);
        fill(&mut self.stars, &overrides.stars);
        fill(&mut self.global_rank, &overrides.global_rank);
        fill(&mut self.country_rank, &overrides.country_rank);
        fill(&mut self.total_solved, &overrides.total_solved);
        fill(&mut self.badges, &overrides.badges);
        fill(&mut self.recent_submissions, &overrides.recent_submissions);
    }
}

impl ProfileRecord {
    /// Rating for display: numeric when known, else the raw text.
    #[must_use]
    pub fn rating_display(&self) -> Option<String> {
        self.rating
            .map(|r| format!("{r}"))
            .or_else(|| self.rating_text.clone())
    }
}

// =============================================================================
// Resolution
// =============================================================================

/// Where a resolved record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Origin {
    /// Cache entry within its TTL; no network call was made.
    FreshCache,
    /// Fetched and normalized during this run.
    Network,
    /// Refresh failed; an expired cache entry was used instead.
    StaleCache,
}

impl Origin {
    /// Source label for output.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::FreshCache => "fresh-cache",
            Self::Network => "network",
            Self::StaleCache => "stale-cache",
        }
    }
}

/// A record ready for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<R> {
    pub record: R,
    pub origin: Origin,
    /// Epoch milliseconds of the normalization that produced `record`.
    pub fetched_at: i64,
}

// =============================================================================
// Output payloads
// =============================================================================

/// Record of any source, for rendering.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum AnyRecord {
    Activity(ActivityRecord),
    Profile(ProfileRecord),
}

/// One source's result as handed to renderers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourcePayload {
    pub source: Source,
    pub identity: String,
    pub origin: Origin,
    pub fetched_at: DateTime<Utc>,
    pub data: AnyRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<ActivitySummary>,
}

/// Top-level JSON envelope for machine output.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RobotOutput<T: Serialize> {
    pub schema_version: String,
    pub generated_at: DateTime<Utc>,
    pub command: String,
    pub data: T,
    pub errors: Vec<String>,
}

impl<T: Serialize> RobotOutput<T> {
    /// Create a new envelope.
    pub fn new(command: &str, data: T, errors: Vec<String>) -> Self {
        Self {
            schema_version: "statcard.v1".to_string(),
            generated_at: Utc::now(),
            command: command.to_string(),
            data,
            errors,
        }
    }
}
