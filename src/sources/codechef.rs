//! CodeChef public profile via community scraper APIs.
//!
//! Neither scraper has a stable schema, so every field is resolved through
//! an alias table. The profile may sit at the top level, under `data`, or
//! inside an array of candidate objects.

use serde_json::Value;

use super::{SourceContext, StatSource, require_identity};
use crate::core::fetch_plan::EndpointChain;
use crate::core::models::{Badge, ProfileRecord, Submission};
use crate::core::normalize::{
    AliasPath, CollectionRule, Coercion, FieldRule, Fields, first_accepted, locate_entity,
    resolve, resolve_collection,
};
use crate::core::source::Source;
use crate::error::Result;

pub const PROFILE_PRIMARY: &str = "https://codechef-api.vercel.app/handle/{identity}";
pub const PROFILE_FALLBACK: &str = "https://competeapi.vercel.app/user/codechef/{identity}";
pub const RECENT_PRIMARY: &str = "https://codechef-api.vercel.app/handle/{identity}/recent";
pub const RECENT_FALLBACK: &str = "https://competeapi.vercel.app/user/codechef/{identity}/recent";

/// Fields whose truthiness marks an array element as the profile.
const ENTITY_MARKERS: &[&str] = &[
    "rating",
    "stars",
    "global_rank",
    "handle",
    "username",
    "country_rank",
];

const PROFILE_FIELDS: &[FieldRule] = &[
    FieldRule::new("name", &[&["name"], &["fullname"]], Coercion::Text),
    FieldRule::new("username", &[&["handle"], &["username"]], Coercion::Text),
    FieldRule::new(
        "rating",
        &[
            &["rating"],
            &["currentRating"],
            &["current_rating"],
            &["codechef_rating"],
        ],
        Coercion::Number,
    ),
    FieldRule::new(
        "rating_text",
        &[
            &["rating"],
            &["currentRating"],
            &["current_rating"],
            &["codechef_rating"],
        ],
        Coercion::Text,
    ),
    FieldRule::new(
        "highest_rating",
        &[&["highest_rating"], &["highestRating"], &["max_rating"]],
        Coercion::Number,
    ),
    FieldRule::new(
        "stars",
        &[&["stars"], &["star"], &["rating_stars"]],
        Coercion::Text,
    ),
    FieldRule::new(
        "global_rank",
        &[
            &["global_rank"],
            &["globalRank"],
            &["rank_global"],
            &["global"],
        ],
        Coercion::Rank,
    ),
    FieldRule::new(
        "country_rank",
        &[
            &["country_rank"],
            &["countryRank"],
            &["rank_country"],
            &["country"],
        ],
        Coercion::Rank,
    ),
    FieldRule::new("total_solved", SOLVED_PATHS, Coercion::Count),
    FieldRule::new(
        "total_problems_solved",
        &[&["total_problems_solved"]],
        Coercion::Count,
    ),
];

const SOLVED_PATHS: &[AliasPath] = &[
    &["solved"],
    &["fully_solved"],
    &["Fully Solved"],
    &["solved_count"],
];

const BADGE_FIELDS: &[FieldRule] = &[
    FieldRule::new(
        "name",
        &[&["name"], &["title"], &["badge_name"], &["label"]],
        Coercion::Text,
    ),
    FieldRule::new(
        "icon",
        &[&["icon"], &["image"], &["badge_icon"]],
        Coercion::Text,
    ),
    FieldRule::new(
        "description",
        &[&["description"], &["desc"]],
        Coercion::Text,
    ),
    FieldRule::new("link", &[&["link"], &["url"]], Coercion::Text),
];

const BADGES: CollectionRule = CollectionRule {
    paths: &[
        &["badges"],
        &["achievements"],
        &["badges_list"],
        &["profile_badges"],
    ],
    element: BADGE_FIELDS,
    require_any: &["name"],
};

const SUBMISSION_FIELDS: &[FieldRule] = &[
    FieldRule::new(
        "problem_code",
        &[&["problemCode"], &["problem_code"], &["code"], &["problem"]],
        Coercion::Text,
    ),
    FieldRule::new(
        "title",
        &[&["title"], &["problemName"], &["problem_name"]],
        Coercion::Text,
    ),
    FieldRule::new(
        "verdict",
        &[&["verdict"], &["status"], &["result"]],
        Coercion::Text,
    ),
    FieldRule::new(
        "time",
        &[&["time"], &["date"], &["submitted_at"]],
        Coercion::Text,
    ),
    FieldRule::new(
        "contest",
        &[&["contest"], &["contest_code"]],
        Coercion::Text,
    ),
    FieldRule::new("link", &[&["link"]], Coercion::Text),
];

const SUBMISSION_LIST_PATHS: &[AliasPath] = &[
    &["recent_submissions"],
    &["recentSubmissions"],
    &["submissions"],
    &["recent"],
    &["latest_submissions"],
];

const SUBMISSIONS: CollectionRule = CollectionRule {
    paths: SUBMISSION_LIST_PATHS,
    element: SUBMISSION_FIELDS,
    require_any: &["title", "problem_code", "link"],
};

/// Problem page for a code.
#[must_use]
pub fn problem_url(code: &str) -> String {
    format!("https://www.codechef.com/problems/{code}")
}

fn badge_from(fields: &Fields) -> Option<Badge> {
    Some(Badge {
        name: fields.text("name")?,
        icon: fields.text("icon"),
        description: fields.text("description"),
        link: fields.text("link"),
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
        time: fields.text("time"),
        contest: fields.text("contest"),
        problem_code,
    }
}

fn submissions_in(entity: &Value) -> Option<Vec<Submission>> {
    resolve_collection(entity, &SUBMISSIONS)
        .map(|items| items.iter().map(submission_from).collect())
}

/// A plain solved count wins, then `total_problems_solved`, then the sum of
/// a per-difficulty breakdown.
fn solved_count(entity: &Value, fields: &Fields) -> Option<u64> {
    let breakdown = first_accepted(entity, SOLVED_PATHS, Coercion::Count).is_some_and(Value::is_object);
    if breakdown {
        fields
            .integer("total_problems_solved")
            .or_else(|| fields.integer("total_solved"))
    } else {
        fields
            .integer("total_solved")
            .or_else(|| fields.integer("total_problems_solved"))
    }
}

/// Normalize a profile payload. Never fails: the fallback username is
/// always known.
#[must_use]
pub fn normalize(payload: &Value, identity: &str) -> ProfileRecord {
    let entity = locate_entity(payload, ENTITY_MARKERS);
    let fields = resolve(entity, PROFILE_FIELDS);

    ProfileRecord {
        name: fields.text("name"),
        username: fields.text("username").or_else(|| Some(identity.to_string())),
        rating: fields.number("rating"),
        rating_text: fields.text("rating_text"),
        highest_rating: fields.number("highest_rating"),
        stars: fields.text("stars"),
        global_rank: fields.integer("global_rank"),
        country_rank: fields.integer("country_rank"),
        total_solved: solved_count(entity, &fields),
        badges: resolve_collection(entity, &BADGES)
            .map(|items| items.iter().filter_map(badge_from).collect()),
        recent_submissions: submissions_in(entity),
    }
}

/// Submissions from a recent-submissions payload.
///
/// Accepts a bare array, an array under `data`, or a profile-like object
/// carrying one of the submission list aliases.
#[must_use]
pub fn normalize_recent(payload: &Value) -> Vec<Submission> {
    let inner = crate::core::normalize::lookup(payload, &["data"]).unwrap_or(payload);
    if let Some(items) = inner.as_array() {
        let wrapped = serde_json::json!({ "submissions": items });
        if let Some(subs) = submissions_in(&wrapped).filter(|s| !s.is_empty()) {
            return subs;
        }
    }
    submissions_in(locate_entity(payload, ENTITY_MARKERS)).unwrap_or_default()
}

/// CodeChef profile source.
#[derive(Debug, Clone)]
pub struct CodeChef {
    ctx: SourceContext,
}

impl CodeChef {
    /// # Errors
    ///
    /// `MissingIdentity` for a blank handle.
    pub fn new(mut ctx: SourceContext) -> Result<Self> {
        ctx.identity = require_identity(Source::CodeChef, &ctx.identity)?;
        Ok(Self { ctx })
    }
}

impl StatSource for CodeChef {
    type Record = ProfileRecord;

    fn kind(&self) -> Source {
        Source::CodeChef
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
        ]
    }

    fn normalize(&self, payload: &Value) -> Result<ProfileRecord> {
        Ok(normalize(payload, &self.ctx.identity))
    }

    fn apply_sub_resource(
        &self,
        record: &mut ProfileRecord,
        resource: &str,
        payload: &Value,
    ) -> Result<bool> {
        if resource != "recent" {
            return Ok(false);
        }
        let submissions = normalize_recent(payload);
        if submissions.is_empty() {
            return Ok(false);
        }
        record.recent_submissions = Some(submissions);
        Ok(true)
    }

    fn default_overrides(&self) -> ProfileRecord {
        ProfileRecord {
            stars: Some("★".to_string()),
            total_solved: Some(1193),
            ..ProfileRecord::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn primary_scraper_layout() {
        let record = normalize(
            &json!({
                "success": true,
                "name": "Devansh Khandor",
                "currentRating": 1650,
                "highestRating": 1702,
                "stars": "3★",
                "globalRank": 12345,
                "countryRank": "6789"
            }),
            "devanshkhandor",
        );
        assert_eq!(record.name.as_deref(), Some("Devansh Khandor"));
        assert_eq!(record.username.as_deref(), Some("devanshkhandor"));
        assert_eq!(record.rating, Some(1650.0));
        assert_eq!(record.rating_text.as_deref(), Some("1650"));
        assert_eq!(record.highest_rating, Some(1702.0));
        assert_eq!(record.stars.as_deref(), Some("3★"));
        assert_eq!(record.global_rank, Some(12345));
        assert_eq!(record.country_rank, Some(6789));
        assert_eq!(record.total_solved, None);
    }

    #[test]
    fn plain_total_beats_breakdown() {
        let both = normalize(
            &json!({
                "handle": "chef",
                "solved": { "easy": 3, "hard": 2 },
                "total_problems_solved": 40
            }),
            "chef",
        );
        assert_eq!(both.total_solved, Some(40));

        let direct = normalize(
            &json!({ "handle": "chef", "fully_solved": 12, "total_problems_solved": 40 }),
            "chef",
        );
        assert_eq!(direct.total_solved, Some(12));

        let fallback_only = normalize(&json!({ "handle": "chef", "total_problems_solved": 7 }), "chef");
        assert_eq!(fallback_only.total_solved, Some(7));
    }

    #[test]
    fn entity_located_in_data_array() {
        let record = normalize(
            &json!({ "data": [
                { "meta": "noise" },
                { "handle": "chef_x", "rating": "1800 (Div 2)", "solved": { "easy": 3, "hard": "2" } }
            ]}),
            "fallback",
        );
        assert_eq!(record.username.as_deref(), Some("chef_x"));
        assert_eq!(record.rating, None);
        assert_eq!(record.rating_text.as_deref(), Some("1800 (Div 2)"));
        assert_eq!(record.total_solved, Some(5));
    }

    #[test]
    fn unexpected_json_still_yields_record() {
        let record = normalize(&json!({ "unexpected": [1, 2, 3] }), "me");
        assert_eq!(record.username.as_deref(), Some("me"));
        assert!(record.rating.is_none());
        assert!(record.badges.is_none());
        assert!(record.recent_submissions.is_none());
    }

    #[test]
    fn zero_rank_is_absent() {
        let record = normalize(&json!({ "global_rank": 0, "country_rank": "NA" }), "me");
        assert!(record.global_rank.is_none());
        assert!(record.country_rank.is_none());
    }

    #[test]
    fn badges_without_name_are_dropped() {
        let record = normalize(
            &json!({ "achievements": [
                { "title": "Contest Star", "image": "https://cdn/x.png", "desc": "Rated 5 times" },
                { "icon": "https://cdn/y.png" }
            ]}),
            "me",
        );
        let badges = record.badges.unwrap();
        assert_eq!(badges.len(), 1);
        assert_eq!(badges[0].name, "Contest Star");
        assert_eq!(badges[0].icon.as_deref(), Some("https://cdn/x.png"));
        assert_eq!(badges[0].description.as_deref(), Some("Rated 5 times"));
    }

    #[test]
    fn submission_defaults_title_and_link_from_code() {
        let record = normalize(
            &json!({ "recent": [
                { "code": "FLOW001", "status": "AC", "submitted_at": "2026-01-01" },
                { "verdict": "WA" }
            ]}),
            "me",
        );
        let subs = record.recent_submissions.unwrap();
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].title.as_deref(), Some("FLOW001"));
        assert_eq!(
            subs[0].link.as_deref(),
            Some("https://www.codechef.com/problems/FLOW001")
        );
        assert_eq!(subs[0].verdict.as_deref(), Some("AC"));
        assert_eq!(subs[0].time.as_deref(), Some("2026-01-01"));
    }

    #[test]
    fn recent_payload_as_bare_array() {
        let subs = normalize_recent(&json!([
            { "problemCode": "START01", "result": "AC" },
            { "problem_name": "Two Sum-ish" }
        ]));
        assert_eq!(subs.len(), 2);
        assert_eq!(subs[1].title.as_deref(), Some("Two Sum-ish"));
        assert!(subs[1].link.is_none());
    }

    #[test]
    fn recent_payload_in_profile_shape() {
        let subs = normalize_recent(&json!({ "data": { "recentSubmissions": [{ "title": "X" }] } }));
        assert_eq!(subs.len(), 1);
    }

    #[test]
    fn empty_recent_leaves_record_unchanged() {
        let source = CodeChef::new(SourceContext::new("me")).unwrap();
        let mut record = ProfileRecord {
            recent_submissions: Some(vec![Submission {
                title: Some("keep".to_string()),
                ..Submission::default()
            }]),
            ..ProfileRecord::default()
        };
        let changed = source
            .apply_sub_resource(&mut record, "recent", &json!({ "recent": [] }))
            .unwrap();
        assert!(!changed);
        assert_eq!(record.recent_submissions.unwrap()[0].title.as_deref(), Some("keep"));
    }

    #[test]
    fn chains_render_handle() {
        let source = CodeChef::new(SourceContext::new("devanshkhandor")).unwrap();
        let primary = source.primary();
        assert_eq!(
            primary.endpoints[0].url,
            "https://codechef-api.vercel.app/handle/devanshkhandor"
        );
        assert_eq!(
            primary.endpoints[1].url,
            "https://competeapi.vercel.app/user/codechef/devanshkhandor"
        );
        let subs = source.sub_resources();
        assert_eq!(subs[0].resource, "recent");
        assert!(subs[0].endpoints[0].url.ends_with("/devanshkhandor/recent"));
    }

    #[test]
    fn default_overrides() {
        let source = CodeChef::new(SourceContext::new("x")).unwrap();
        let overrides = source.default_overrides();
        assert_eq!(overrides.stars.as_deref(), Some("★"));
        assert_eq!(overrides.total_solved, Some(1193));
    }
}
