//! Machine output (JSON and Markdown).

use std::fmt::Write as _;

use serde::Serialize;

use crate::core::models::{AnyRecord, ProfileRecord, RobotOutput, SourcePayload};
use crate::error::Result;

/// Serialize compactly or pretty-printed.
pub fn render_json<T: Serialize>(output: &T, pretty: bool) -> Result<String> {
    Ok(if pretty {
        serde_json::to_string_pretty(output)?
    } else {
        serde_json::to_string(output)?
    })
}

/// Wrap data in the versioned envelope and serialize it.
pub fn render_envelope<T: Serialize>(
    command: &str,
    data: T,
    errors: Vec<String>,
    pretty: bool,
) -> Result<String> {
    render_json(&RobotOutput::new(command, data, errors), pretty)
}

/// Markdown for `fetch`: one section per source, `- key: value` lines.
#[must_use]
pub fn render_fetch_md(payloads: &[SourcePayload], errors: &[String]) -> String {
    let mut out = String::new();

    for payload in payloads {
        let _ = writeln!(
            out,
            "## {} {} ({})",
            payload.source.display_name(),
            payload.identity,
            payload.origin.label()
        );
        let _ = writeln!(out, "- fetched_at: {}", payload.fetched_at.to_rfc3339());

        match &payload.data {
            AnyRecord::Activity(_) => {
                if let Some(summary) = &payload.summary {
                    let _ = writeln!(out, "- days: {}", summary.day_count);
                    let _ = writeln!(out, "- total_hours: {}", summary.total_hours);
                    let _ = writeln!(out, "- avg_hours_per_day: {:.1}", summary.avg_hours_per_day);
                    let _ = writeln!(out, "- best_day_hours: {:.1}", summary.best_day_hours);
                } else {
                    out.push_str("- days: 0\n");
                }
            }
            AnyRecord::Profile(record) => profile_md(&mut out, record),
        }
        out.push('\n');
    }

    if !errors.is_empty() {
        out.push_str("## Errors\n\n");
        for error in errors {
            let _ = writeln!(out, "- {error}");
        }
    }

    out
}

fn profile_md(out: &mut String, record: &ProfileRecord) {
    let fields: [(&str, Option<String>); 8] = [
        ("name", record.name.clone()),
        ("username", record.username.clone()),
        ("rating", record.rating_display()),
        ("highest_rating", record.highest_rating.map(|r| format!("{r}"))),
        ("stars", record.stars.clone()),
        ("global_rank", record.global_rank.map(|r| r.to_string())),
        ("country_rank", record.country_rank.map(|r| r.to_string())),
        ("total_solved", record.total_solved.map(|n| n.to_string())),
    ];
    for (key, value) in fields {
        if let Some(value) = value {
            let _ = writeln!(out, "- {key}: {value}");
        }
    }
    if let Some(badges) = &record.badges {
        let _ = writeln!(out, "- badges: {}", badges.len());
    }
    if let Some(submissions) = &record.recent_submissions {
        let _ = writeln!(out, "- recent_submissions: {}", submissions.len());
    }
}
