//! Human-readable output.
//!
//! One block per source: a header naming the source and identity, followed
//! by the record's fields. Absent fields render as a placeholder rather than
//! being hidden. Cache origin is left to JSON output and logs.

use colored::{ColoredString, Colorize};

use crate::core::models::{
    ActivityRecord, ActivitySummary, AnyRecord, ProfileRecord, SourcePayload,
};
use crate::storage::cache::CacheListing;
use crate::util::time::format_age;

/// Shown for fields the source did not provide.
pub const PLACEHOLDER: &str = "—";

const RECENT_SUBMISSIONS_SHOWN: usize = 5;
const BAR_WIDTH: usize = 20;

fn paint(text: &str, no_color: bool, style: impl Fn(&str) -> ColoredString) -> String {
    if no_color {
        text.to_string()
    } else {
        style(text).to_string()
    }
}

fn or_placeholder(value: Option<String>) -> String {
    value.unwrap_or_else(|| PLACEHOLDER.to_string())
}

fn row(label: &str, value: String, no_color: bool) -> String {
    format!("  {} {value}", paint(&format!("{label:<14}"), no_color, |s| s.dimmed()))
}

/// Render fetch results.
#[must_use]
pub fn render_fetch(payloads: &[SourcePayload], no_color: bool) -> String {
    payloads
        .iter()
        .map(|payload| render_payload(payload, no_color))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_payload(payload: &SourcePayload, no_color: bool) -> String {
    let title = paint(payload.source.display_name(), no_color, |s| s.cyan().bold());
    let mut lines = vec![format!("{title} {}", payload.identity)];

    match &payload.data {
        AnyRecord::Activity(record) => {
            lines.extend(activity_lines(record, payload.summary.as_ref(), no_color));
        }
        AnyRecord::Profile(record) => lines.extend(profile_lines(record, no_color)),
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

fn activity_lines(
    record: &ActivityRecord,
    summary: Option<&ActivitySummary>,
    no_color: bool,
) -> Vec<String> {
    let Some(summary) = summary else {
        return vec![row("Activity", "no days recorded".to_string(), no_color)];
    };

    let mut lines = vec![
        row("Days", summary.day_count.to_string(), no_color),
        row("Total", format!("{} hrs", summary.total_hours), no_color),
        row("Daily avg", format!("{:.1} hrs", summary.avg_hours_per_day), no_color),
        row("Best day", format!("{:.1} hrs", summary.best_day_hours), no_color),
    ];
    if let (Some(first), Some(last)) = (record.days.first(), record.days.last()) {
        lines.push(row("Range", format!("{} .. {}", first.date, last.date), no_color));
    }

    let peak = summary.months.iter().map(|m| m.hours).max().unwrap_or(0);
    for month in &summary.months {
        lines.push(format!(
            "    {} {} {}",
            month.month,
            paint(&bar(month.hours, peak), no_color, |s| s.green()),
            month.hours
        ));
    }
    lines
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss, clippy::cast_sign_loss)]
fn bar(value: u64, peak: u64) -> String {
    if peak == 0 {
        return String::new();
    }
    let filled = ((value as f64 / peak as f64) * BAR_WIDTH as f64).round() as usize;
    "█".repeat(filled.min(BAR_WIDTH))
}

fn profile_lines(record: &ProfileRecord, no_color: bool) -> Vec<String> {
    let mut lines = vec![
        row("Name", or_placeholder(record.name.clone()), no_color),
        row("Username", or_placeholder(record.username.clone()), no_color),
        row("Rating", or_placeholder(record.rating_display()), no_color),
        row(
            "Highest",
            or_placeholder(record.highest_rating.map(|r| format!("{r}"))),
            no_color,
        ),
        row("Stars", or_placeholder(record.stars.clone()), no_color),
        row(
            "Global rank",
            or_placeholder(record.global_rank.map(|r| r.to_string())),
            no_color,
        ),
        row(
            "Country rank",
            or_placeholder(record.country_rank.map(|r| r.to_string())),
            no_color,
        ),
        row(
            "Solved",
            or_placeholder(record.total_solved.map(|n| n.to_string())),
            no_color,
        ),
    ];

    if let Some(badges) = record.badges.as_ref().filter(|b| !b.is_empty()) {
        let names: Vec<&str> = badges.iter().map(|b| b.name.as_str()).collect();
        lines.push(row("Badges", names.join(", "), no_color));
    }

    if let Some(submissions) = record.recent_submissions.as_ref().filter(|s| !s.is_empty()) {
        lines.push(row("Recent", String::new(), no_color).trim_end().to_string());
        for submission in submissions.iter().take(RECENT_SUBMISSIONS_SHOWN) {
            let title = submission
                .title
                .as_deref()
                .or(submission.problem_code.as_deref())
                .unwrap_or(PLACEHOLDER);
            let verdict = submission.verdict.as_deref().unwrap_or(PLACEHOLDER);
            let verdict = if verdict.eq_ignore_ascii_case("accepted") || verdict == "AC" {
                paint(verdict, no_color, |s| s.green())
            } else {
                paint(verdict, no_color, |s| s.red())
            };
            let when = submission.time.as_deref().unwrap_or("");
            lines.push(format!("    {title} {verdict} {when}").trim_end().to_string());
        }
    }

    lines
}

/// Render `cache list` output.
#[must_use]
pub fn render_cache_list(entries: &[CacheListing], now_ms: i64, no_color: bool) -> String {
    if entries.is_empty() {
        return "No cached entries.\n".to_string();
    }
    let mut out = String::new();
    for entry in entries {
        let age = entry.timestamp.map_or_else(
            || paint("unreadable", no_color, |s| s.red()),
            |ts| format!("{} old", format_age(now_ms - ts)),
        );
        out.push_str(&format!("{:<48} {age:>12} {:>8} B\n", entry.key, entry.bytes));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::{DayTotal, Origin, Submission};
    use crate::core::source::Source;
    use chrono::{DateTime, TimeZone, Utc};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn payload(source: Source, data: AnyRecord) -> SourcePayload {
        let summary = match &data {
            AnyRecord::Activity(a) => a.summary(),
            AnyRecord::Profile(_) => None,
        };
        SourcePayload {
            source,
            identity: "chef".to_string(),
            origin: Origin::StaleCache,
            fetched_at: now() - chrono::Duration::hours(2),
            data,
            summary,
        }
    }

    #[test]
    fn absent_profile_fields_use_placeholder() {
        let record = ProfileRecord {
            username: Some("chef".into()),
            total_solved: Some(12),
            ..ProfileRecord::default()
        };
        let out = render_fetch(&[payload(Source::CodeChef, AnyRecord::Profile(record))], true);
        assert!(out.starts_with("CodeChef chef\n"));
        assert!(out.contains(&format!("Rating         {PLACEHOLDER}")));
        assert!(out.contains("Solved         12"));
        assert!(!out.contains('\x1b'));
    }

    #[test]
    fn stale_and_fresh_records_render_identically() {
        let record = ProfileRecord {
            username: Some("chef".into()),
            rating: Some(1650.0),
            ..ProfileRecord::default()
        };
        let stale = payload(Source::CodeChef, AnyRecord::Profile(record));
        let fresh = SourcePayload {
            origin: Origin::FreshCache,
            fetched_at: now(),
            ..stale.clone()
        };
        let stale_out = render_fetch(&[stale], true);
        assert_eq!(stale_out, render_fetch(&[fresh], true));
        assert!(!stale_out.contains("stale"));
        assert!(!stale_out.contains("ago"));
    }

    #[test]
    fn recent_submissions_are_capped() {
        let submissions = (0..8)
            .map(|i| Submission {
                title: Some(format!("P{i}")),
                verdict: Some("Accepted".into()),
                ..Submission::default()
            })
            .collect();
        let record = ProfileRecord {
            recent_submissions: Some(submissions),
            ..ProfileRecord::default()
        };
        let out = render_fetch(&[payload(Source::LeetCode, AnyRecord::Profile(record))], true);
        assert!(out.contains("P4 Accepted"));
        assert!(!out.contains("P5"));
    }

    #[test]
    fn activity_shows_totals_and_months() {
        let record = ActivityRecord {
            days: vec![
                DayTotal { date: "2026-01-31".into(), total: 7200.0 },
                DayTotal { date: "2026-02-01".into(), total: 3600.0 },
            ],
        };
        let out = render_fetch(&[payload(Source::WakaTime, AnyRecord::Activity(record))], true);
        assert!(out.contains("Total          3 hrs"));
        assert!(out.contains("Range          2026-01-31 .. 2026-02-01"));
        assert!(out.contains("2026-01"));
        assert!(out.contains(&"█".repeat(BAR_WIDTH)));
    }

    #[test]
    fn empty_activity_is_stated() {
        let out = render_fetch(
            &[payload(Source::WakaTime, AnyRecord::Activity(ActivityRecord::default()))],
            true,
        );
        assert!(out.contains("no days recorded"));
    }

    #[test]
    fn cache_list_shows_age() {
        let entries = vec![
            CacheListing { key: "codechef_data_chef".into(), timestamp: Some(0), bytes: 120 },
            CacheListing { key: "broken".into(), timestamp: None, bytes: 3 },
        ];
        let out = render_cache_list(&entries, 90_000, true);
        assert!(out.contains("codechef_data_chef"));
        assert!(out.contains("1m old"));
        assert!(out.contains("unreadable"));
        assert_eq!(render_cache_list(&[], 0, true), "No cached entries.\n");
    }
}
