//! LeetCode public profile via community APIs.

use chrono::{SecondsFormat, TimeZone, Utc};
use serde_json::Value;

use super::{SourceContext, StatSource, require_identity};
use crate::core::fetch_plan::EndpointChain;
use crate::core::models::{Badge, ProfileRecord, Submission};
use crate::core::normalize::{
    CollectionRule, Coercion, FieldRule, Fields, locate_entity, lookup, resolve,
    resolve_collection,
};
use crate::core::source::Source;
use crate::error::{Result, StatError};

pub const PROFILE_PRIMARY: &str = "https://alfa-leetcode-api.onrender.com/userProfile/{identity}";
pub const PROFILE_FALLBACK: &str = "https://leetcode-stats-api.herokuapp.com/{identity}";
pub const RECENT_PRIMARY: &str = "https://alfa-leetcode-api.onrender.com/{identity}/submission";
pub const RECENT_FALLBACK: &str = "https://alfa-leetcode-api.onrender.com/{identity}/acSubmission";
pub const BADGES_PRIMARY: &str = "https://alfa-leetcode-api.onrender.com/{identity}/badges";

const SITE: &str = "https://leetcode.com";

const ENTITY_MARKERS: &[&str] = &["totalSolved", "solvedProblem", "ranking", "username"];

const PROFILE_FIELDS: &[FieldRule] = &[
    FieldRule::new(
        "name",
        &[&["name"], &["realName"], &["profile", "realName"]],
        Coercion::Text,
    ),
    FieldRule::new("username", &[&["username"], &["handle"]], Coercion::Text),
    FieldRule::new(
        "rating",
        &[
            &["contestRating"],
            &["rating"],
            &["userContestRanking", "rating"],
        ],
        Coercion::Number,
    ),
    FieldRule::new(
        "highest_rating",
        &[&["highestRating"], &["maxRating"]],
        Coercion::Number,
    ),
    FieldRule::new(
        "global_rank",
        &[&["ranking"], &["rank"], &["profile", "ranking"]],
        Coercion::Rank,
    ),
    FieldRule::new(
        "total_solved",
        &[&["solvedProblem"], &["totalSolved"], &["solved"]],
        Coercion::Count,
    ),
];

const BADGE_FIELDS: &[FieldRule] = &[
    FieldRule::new(
        "name",
        &[&["displayName"], &["name"], &["title"]],
        Coercion::Text,
    ),
    FieldRule::new("icon", &[&["icon"], &["image"]], Coercion::Text),
    FieldRule::new(
        "description",
        &[&["description"], &["hoverText"]],
        Coercion::Text,
    ),
    FieldRule::new("link", &[&["link"], &["url"]], Coercion::Text),
];

const BADGES: CollectionRule = CollectionRule {
    paths: &[&["badges"], &["data", "badges"]],
    element: BADGE_FIELDS,
    require_any: &["name"],
};

const SUBMISSION_FIELDS: &[FieldRule] = &[
    FieldRule::new(
        "problem_code",
        &[&["titleSlug"], &["problemCode"], &["slug"]],
        Coercion::Text,
    ),
    FieldRule::new("title", &[&["title"], &["problemName"]], Coercion::Text),
    FieldRule::new(
        "verdict",
        &[&["statusDisplay"], &["status"], &["verdict"]],
        Coercion::Text,
    ),
    FieldRule::new(
        "time",
        &[&["timestamp"], &["time"], &["date"]],
        Coercion::Text,
    ),
    FieldRule::new("contest", &[&["contest"]], Coercion::Text),
    FieldRule::new("link", &[&["link"], &["url"]], Coercion::Text),
];

const SUBMISSIONS: CollectionRule = CollectionRule {
    paths: &[
        &["recentSubmissions"],
        &["submission"],
        &["submissions"],
        &["recent_submissions"],
        &["data", "submission"],
    ],
    element: SUBMISSION_FIELDS,
    require_any: &["title", "problem_code", "link"],
};

/// Problem page for a slug.
#[must_use]
pub fn problem_url(slug: &str) -> String {
    format!("{SITE}/problems/{slug}/")
}

/// Epoch-second strings become RFC 3339; anything else is kept.
fn normalize_time(raw: String) -> String {
    if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) {
        if let Some(ts) = raw
            .parse::<i64>()
            .ok()
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
        {
            return ts.to_rfc3339_opts(SecondsFormat::Secs, true);
        }
    }
    raw
}

/// Site-relative asset paths are made absolute.
fn absolute_url(raw: String) -> String {
    if raw.starts_with('/') {
        format!("{SITE}{raw}")
    } else {
        raw
    }
}

fn badge_from(fields: &Fields) -> Option<Badge> {
    Some(Badge {
        name: fields.text("name")?,
        icon: fields.text("icon").map(absolute_url),
        description: fields.text("description"),
        link: fields.text("link").map(absolute_url),
    })
}

fn submission_from(fields: &Fields) -> Submission {
    let problem_code = fields.text("problem_code");
    Submission {
        title: fields.text("title").or_else(|| problem_code.clone()),
        link: fields
            .text("link")
            .or_else(|| problem_code.as_deref().map(problem_url)),
        verdict: fields.text("verdict"),
        time: fields.text("time").map(normalize_time),
        contest: fields.text("contest"),
        problem_code,
    }
}

fn badges_in(value: &Value) -> Option<Vec<Badge>> {
    resolve_collection(value, &BADGES).map(|items| items.iter().filter_map(badge_from).collect())
}

fn submissions_in(value: &Value) -> Option<Vec<Submission>> {
    resolve_collection(value, &SUBMISSIONS).map(|items| items.iter().map(submission_from).collect())
}

/// Error envelopes some endpoints return with a 200 status.
fn error_message(payload: &Value) -> Option<String> {
    let status_error = lookup(payload, &["status"])
        .and_then(Value::as_str)
        .is_some_and(|s| s.eq_ignore_ascii_case("error"));
    let has_errors = lookup(payload, &["errors"]).is_some();
    if !(status_error || has_errors) {
        return None;
    }
    let entity = locate_entity(payload, ENTITY_MARKERS);
    let marked = entity
        .as_object()
        .is_some_and(|obj| ENTITY_MARKERS.iter().any(|m| obj.contains_key(*m)));
    if marked {
        return None;
    }
    Some(
        lookup(payload, &["message"])
            .and_then(Value::as_str)
            .unwrap_or("error envelope")
            .to_string(),
    )
}

/// Normalize a profile payload.
///
/// # Errors
///
/// `UnsupportedShape` for error envelopes (unknown user and similar).
pub fn normalize(payload: &Value, identity: &str) -> Result<ProfileRecord> {
    if let Some(message) = error_message(payload) {
        return Err(StatError::UnsupportedShape {
            source_name: Source::LeetCode.cli_name().to_string(),
            reason: message,
        });
    }

    let entity = locate_entity(payload, ENTITY_MARKERS);
    let fields = resolve(entity, PROFILE_FIELDS);

    Ok(ProfileRecord {
        name: fields.text("name"),
        username: fields.text("username").or_else(|| Some(identity.to_string())),
        rating: fields.number("rating"),
        rating_text: None,
        highest_rating: fields.number("highest_rating"),
        stars: None,
        global_rank: fields.integer("global_rank"),
        country_rank: None,
        total_solved: fields.integer("total_solved"),
        badges: badges_in(entity),
        recent_submissions: submissions_in(entity),
    })
}

/// LeetCode profile source.
#[derive(Debug, Clone)]
pub struct LeetCode {
    ctx: SourceContext,
}

impl LeetCode {
    /// # Errors
    ///
    /// `MissingIdentity` for a blank username.
    pub fn new(mut ctx: SourceContext) -> Result<Self> {
        ctx.identity = require_identity(Source::LeetCode, &ctx.identity)?;
        Ok(Self { ctx })
    }
}

impl StatSource for LeetCode {
    type Record = ProfileRecord;

    fn kind(&self) -> Source {
        Source::LeetCode
    }

    fn identity(&self) -> &str {
        &self.ctx.identity
    }

    fn primary(&self) -> EndpointChain {
        self.ctx
            .chain("profile", PROFILE_PRIMARY, Some(PROFILE_FALLBACK))
    }

    fn sub_resources(&self) -> Vec<EndpointChain> {
        vec![
            self.ctx
                .chain("recent", RECENT_PRIMARY, Some(RECENT_FALLBACK)),
            self.ctx.chain("badges", BADGES_PRIMARY, None),
        ]
    }

    fn normalize(&self, payload: &Value) -> Result<ProfileRecord> {
        normalize(payload, &self.ctx.identity)
    }

    fn apply_sub_resource(
        &self,
        record: &mut ProfileRecord,
        resource: &str,
        payload: &Value,
    ) -> Result<bool> {
        match resource {
            "recent" => match submissions_in(payload).filter(|s| !s.is_empty()) {
                Some(subs) => {
                    record.recent_submissions = Some(subs);
                    Ok(true)
                }
                None => Ok(false),
            },
            "badges" => match badges_in(payload).filter(|b| !b.is_empty()) {
                Some(badges) => {
                    record.badges = Some(badges);
                    Ok(true)
                }
                None => Ok(false),
            },
            _ => Ok(false),
        }
    }

    fn default_overrides(&self) -> ProfileRecord {
        ProfileRecord::default()
    }
}
