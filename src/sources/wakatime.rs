//! WakaTime share JSON.
//!
//! The identity is the full share URL (`https://wakatime.com/share/@user/<id>.json`).
//! Share endpoints answer in a few layouts:
//!
//! - `{ "days": [{ "date", "total" }] }`
//! - `{ "data": { "days": [...] } }`
//! - `{ "data": [{ "range": { "date" }, "grand_total": { "total_seconds" } }] }`

use serde_json::Value;

use super::{SourceContext, StatSource, require_identity};
use crate::core::fetch_plan::{EndpointChain, IDENTITY_PLACEHOLDER};
use crate::core::models::{ActivityRecord, DayTotal};
use crate::core::normalize::{AliasPath, Coercion, FieldRule, lookup, resolve};
use crate::core::source::Source;
use crate::error::{Result, StatError};

const DAY_FIELDS: &[FieldRule] = &[
    FieldRule::new(
        "date",
        &[&["date"], &["range"], &["range", "date"], &["start"]],
        Coercion::Text,
    ),
    FieldRule::new(
        "total",
        &[
            &["grand_total", "total_seconds"],
            &["total_seconds"],
            &["total"],
            &["duration"],
        ],
        Coercion::Number,
    ),
];

/// Layouts whose day list is accepted even when empty.
const DAY_LIST_PATHS: &[AliasPath] = &[&["days"], &["data", "days"]];

/// WakaTime coding activity.
#[derive(Debug, Clone)]
pub struct WakaTime {
    ctx: SourceContext,
}

impl WakaTime {
    /// # Errors
    ///
    /// `MissingIdentity` for a blank share URL.
    pub fn new(mut ctx: SourceContext) -> Result<Self> {
        ctx.identity = require_identity(Source::WakaTime, &ctx.identity)?;
        Ok(Self { ctx })
    }
}

fn day_from(entry: &Value) -> Option<DayTotal> {
    let fields = resolve(entry, DAY_FIELDS);
    let date: String = fields.text("date")?.chars().take(10).collect();
    let total = fields.number("total")?;
    (!date.is_empty()).then_some(DayTotal { date, total })
}

fn days_from(items: &[Value]) -> Vec<DayTotal> {
    items.iter().filter_map(day_from).collect()
}

/// Normalize a share payload.
///
/// # Errors
///
/// `UnsupportedShape` when no day list is recognizable.
pub fn normalize(payload: &Value) -> Result<ActivityRecord> {
    if let Some(items) = DAY_LIST_PATHS
        .iter()
        .find_map(|path| lookup(payload, path).and_then(Value::as_array))
    {
        return Ok(ActivityRecord {
            days: days_from(items),
        });
    }

    if let Some(items) = lookup(payload, &["data"]).and_then(Value::as_array) {
        let days = days_from(items);
        if !days.is_empty() {
            return Ok(ActivityRecord { days });
        }
    }

    Err(StatError::UnsupportedShape {
        source_name: Source::WakaTime.cli_name().to_string(),
        reason: "no day list in payload".to_string(),
    })
}

impl StatSource for WakaTime {
    type Record = ActivityRecord;

    fn kind(&self) -> Source {
        Source::WakaTime
    }

    fn identity(&self) -> &str {
        &self.ctx.identity
    }

    fn primary(&self) -> EndpointChain {
        self.ctx.chain("days", IDENTITY_PLACEHOLDER, None)
    }

    fn normalize(&self, payload: &Value) -> Result<ActivityRecord> {
        normalize(payload)
    }

    fn default_overrides(&self) -> ActivityRecord {
        ActivityRecord::default()
    }
}
