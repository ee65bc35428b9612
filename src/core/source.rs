//! Source descriptors.
//!
//! Defines the supported public-profile sources and their metadata.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Result, StatError};

// =============================================================================
// Source Enum
// =============================================================================

/// Supported external profile/activity sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    WakaTime,
    CodeChef,
    LeetCode,
}

impl Source {
    /// All sources in display order.
    pub const ALL: &'static [Self] = &[Self::WakaTime, Self::CodeChef, Self::LeetCode];

    /// CLI name for this source.
    #[must_use]
    pub const fn cli_name(self) -> &'static str {
        match self {
            Self::WakaTime => "wakatime",
            Self::CodeChef => "codechef",
            Self::LeetCode => "leetcode",
        }
    }

    /// Display name for human output.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::WakaTime => "WakaTime",
            Self::CodeChef => "CodeChef",
            Self::LeetCode => "LeetCode",
        }
    }

    /// Label used in loading/error text ("coding" for the activity tracker).
    #[must_use]
    pub const fn stats_label(self) -> &'static str {
        match self {
            Self::WakaTime => "coding",
            Self::CodeChef => "CodeChef",
            Self::LeetCode => "LeetCode",
        }
    }

    /// Parse from CLI argument.
    pub fn from_cli_name(name: &str) -> Result<Self> {
        let lower = name.trim().to_lowercase();
        Self::ALL
            .iter()
            .find(|s| s.cli_name() == lower)
            .copied()
            .ok_or_else(|| StatError::InvalidSource(name.to_string()))
    }

    /// Default freshness window for cached records.
    #[must_use]
    pub const fn default_ttl(self) -> Duration {
        match self {
            Self::WakaTime => Duration::from_secs(60 * 60),
            Self::CodeChef | Self::LeetCode => Duration::from_secs(6 * 60 * 60),
        }
    }

    /// Cache key for a given identity.
    ///
    /// Stable per source and identity so independent runs share one entry.
    #[must_use]
    pub fn cache_key(self, identity: &str) -> String {
        format!("{}_data_{}", self.cli_name(), identity)
    }

    /// Public profile page for an identity, when the source has one.
    #[must_use]
    pub fn profile_url(self, identity: &str) -> Option<String> {
        match self {
            Self::WakaTime => None,
            Self::CodeChef => Some(format!("https://www.codechef.com/users/{identity}")),
            Self::LeetCode => Some(format!("https://leetcode.com/u/{identity}/")),
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.cli_name())
    }
}

// =============================================================================
// Source Selection
// =============================================================================

/// Source selection from CLI arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceSelection {
    /// Every configured source.
    All,
    /// Explicit list, in the order given.
    Custom(Vec<Source>),
}

impl SourceSelection {
    /// Parse positional source arguments ("all" or names).
    pub fn from_args(args: &[String]) -> Result<Self> {
        if args.is_empty() || args.iter().any(|a| a.eq_ignore_ascii_case("all")) {
            return Ok(Self::All);
        }
        let mut sources = Vec::with_capacity(args.len());
        for arg in args {
            let source = Source::from_cli_name(arg)?;
            if !sources.contains(&source) {
                sources.push(source);
            }
        }
        Ok(Self::Custom(sources))
    }

    /// Sources in this selection.
    #[must_use]
    pub fn sources(&self) -> Vec<Source> {
        match self {
            Self::All => Source::ALL.to_vec(),
            Self::Custom(list) => list.clone(),
        }
    }
}

impl Default for SourceSelection {
    fn default() -> Self {
        Self::All
    }
}
