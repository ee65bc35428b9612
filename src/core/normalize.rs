//! Declarative alias resolution for loosely-typed JSON payloads.
//!
//! Each source describes its canonical fields as a table of [`FieldRule`]s:
//! an ordered list of alias paths plus a [`Coercion`]. The resolver walks the
//! paths in order and takes the first value that is present and of a JSON
//! type the coercion accepts. If that value then fails to coerce (a string
//! that is not a number, a zero rank) the field is absent; later aliases are
//! not consulted.
//!
//! Everything here is pure: no I/O, no clock, no hidden state.

use std::collections::BTreeMap;

use serde_json::Value;

/// A nested key path, outermost key first.
pub type AliasPath = &'static [&'static str];

static NULL: Value = Value::Null;

// =============================================================================
// Coercions
// =============================================================================

/// How a raw JSON value becomes a canonical field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coercion {
    /// Finite number, from a JSON number or a fully numeric string.
    Number,
    /// Positive integer from the leading digits of a number or string.
    /// Zero and unparseable values are absent.
    Rank,
    /// Trimmed non-empty string; numbers are rendered as text.
    Text,
    /// Non-negative integer from a number, or the sum of an object's
    /// numeric values (e.g. an easy/medium/hard breakdown).
    Count,
    /// Any non-null value, kept as is.
    Raw,
}

impl Coercion {
    /// Whether a value's JSON type is one this coercion consumes.
    fn accepts(self, value: &Value) -> bool {
        match self {
            Self::Number | Self::Rank | Self::Text => {
                matches!(value, Value::Number(_) | Value::String(_))
            }
            Self::Count => matches!(value, Value::Number(_) | Value::Object(_)),
            Self::Raw => !value.is_null(),
        }
    }

    /// Apply the coercion to an accepted value.
    #[must_use]
    pub fn apply(self, value: &Value) -> Option<FieldValue> {
        match self {
            Self::Number => as_number(value).map(FieldValue::Number),
            Self::Rank => as_rank(value).map(FieldValue::Integer),
            Self::Text => as_text(value).map(FieldValue::Text),
            Self::Count => as_count(value).map(FieldValue::Integer),
            Self::Raw => (!value.is_null()).then(|| FieldValue::Raw(value.clone())),
        }
    }
}

fn as_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            trimmed.parse::<f64>().ok()?
        }
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// Leading-integer parse: optional whitespace and sign, then digits.
fn leading_integer(s: &str) -> Option<i64> {
    let trimmed = s.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let digits: &str = &rest[..rest.bytes().take_while(u8::is_ascii_digit).count()];
    if digits.is_empty() {
        return None;
    }
    let magnitude: i64 = digits.parse().ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn as_rank(value: &Value) -> Option<u64> {
    let n = match value {
        Value::Number(n) => {
            let f = n.as_f64()?;
            if !f.is_finite() {
                return None;
            }
            f.trunc() as i64
        }
        Value::String(s) => leading_integer(s)?,
        _ => return None,
    };
    (n > 0).then_some(n as u64)
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn as_count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => {
            let f = n.as_f64()?;
            (f.is_finite() && f >= 0.0).then(|| f.round() as u64)
        }
        Value::Object(map) => {
            let sum: f64 = map.values().filter_map(as_number).sum();
            Some(sum.max(0.0).round() as u64)
        }
        _ => None,
    }
}

// =============================================================================
// Field values
// =============================================================================

/// A resolved canonical field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Number(f64),
    Integer(u64),
    Text(String),
    Raw(Value),
}

/// One declarative field mapping.
#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub field: &'static str,
    pub paths: &'static [AliasPath],
    pub coerce: Coercion,
}

impl FieldRule {
    #[must_use]
    pub const fn new(field: &'static str, paths: &'static [AliasPath], coerce: Coercion) -> Self {
        Self {
            field,
            paths,
            coerce,
        }
    }
}

/// Resolved fields for one entity, keyed by canonical name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fields {
    values: BTreeMap<&'static str, FieldValue>,
}

impl Fields {
    /// Whether a field resolved.
    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.values.contains_key(field)
    }

    /// Numeric field (integers widen to f64).
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn number(&self, field: &str) -> Option<f64> {
        match self.values.get(field)? {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Integer(n) => Some(*n as f64),
            FieldValue::Text(_) | FieldValue::Raw(_) => None,
        }
    }

    /// Integer field.
    #[must_use]
    pub fn integer(&self, field: &str) -> Option<u64> {
        match self.values.get(field)? {
            FieldValue::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Text field.
    #[must_use]
    pub fn text(&self, field: &str) -> Option<String> {
        match self.values.get(field)? {
            FieldValue::Text(s) => Some(s.clone()),
            _ => None,
        }
    }

    /// Raw field.
    #[must_use]
    pub fn raw(&self, field: &str) -> Option<&Value> {
        match self.values.get(field)? {
            FieldValue::Raw(v) => Some(v),
            _ => None,
        }
    }
}

// =============================================================================
// Resolution
// =============================================================================

/// Follow a key path; `null` counts as missing.
#[must_use]
pub fn lookup<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut current = value;
    for key in path {
        current = current.as_object()?.get(*key)?;
    }
    (!current.is_null()).then_some(current)
}

/// First alias whose value is present and accepted by `coerce`.
#[must_use]
pub fn first_accepted<'a>(
    value: &'a Value,
    paths: &[AliasPath],
    coerce: Coercion,
) -> Option<&'a Value> {
    paths
        .iter()
        .filter_map(|path| lookup(value, path))
        .find(|candidate| coerce.accepts(candidate))
}

/// Resolve a single rule against an entity.
#[must_use]
pub fn resolve_field(value: &Value, rule: &FieldRule) -> Option<FieldValue> {
    first_accepted(value, rule.paths, rule.coerce).and_then(|v| rule.coerce.apply(v))
}

/// Resolve a whole table against an entity.
#[must_use]
pub fn resolve(value: &Value, table: &[FieldRule]) -> Fields {
    let values = table
        .iter()
        .filter_map(|rule| resolve_field(value, rule).map(|v| (rule.field, v)))
        .collect();
    Fields { values }
}

/// Element-wise mapping for an array-valued field.
#[derive(Debug, Clone, Copy)]
pub struct CollectionRule {
    /// Aliases for the array itself.
    pub paths: &'static [AliasPath],
    /// Per-element table.
    pub element: &'static [FieldRule],
    /// An element is kept only if at least one of these fields resolved.
    pub require_any: &'static [&'static str],
}

/// Resolve a collection. `None` when no alias holds an array.
#[must_use]
pub fn resolve_collection(value: &Value, rule: &CollectionRule) -> Option<Vec<Fields>> {
    let items = rule
        .paths
        .iter()
        .filter_map(|path| lookup(value, path))
        .find_map(Value::as_array)?;

    Some(
        items
            .iter()
            .map(|item| resolve(item, rule.element))
            .filter(|fields| rule.require_any.iter().any(|f| fields.contains(f)))
            .collect(),
    )
}

/// JavaScript-style truthiness, used for entity markers.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Find the entity a payload describes.
///
/// Unwraps a `data` envelope when present. If the result is an array, the
/// first element carrying any truthy marker field wins, else the first
/// element. An empty array yields `null`.
#[must_use]
pub fn locate_entity<'a>(payload: &'a Value, markers: &[&str]) -> &'a Value {
    let inner = lookup(payload, &["data"]).unwrap_or(payload);
    match inner {
        Value::Array(items) => items
            .iter()
            .find(|item| {
                item.as_object().is_some_and(|obj| {
                    markers
                        .iter()
                        .any(|m| obj.get(*m).is_some_and(is_truthy))
                })
            })
            .or_else(|| items.first())
            .unwrap_or(&NULL),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const RATING: FieldRule = FieldRule::new(
        "rating",
        &[&["rating"], &["currentRating"], &["stats", "rating"]],
        Coercion::Number,
    );

    #[test]
    fn first_present_alias_wins() {
        let v = json!({ "currentRating": 1700, "stats": { "rating": 1500 } });
        assert_eq!(resolve_field(&v, &RATING), Some(FieldValue::Number(1700.0)));
    }

    #[test]
    fn nested_alias_path() {
        let v = json!({ "stats": { "rating": "1500" } });
        assert_eq!(resolve_field(&v, &RATING), Some(FieldValue::Number(1500.0)));
    }

    #[test]
    fn null_counts_as_missing() {
        let v = json!({ "rating": null, "currentRating": 1600 });
        assert_eq!(resolve_field(&v, &RATING), Some(FieldValue::Number(1600.0)));
    }

    #[test]
    fn failed_coercion_leaves_field_absent() {
        let v = json!({ "rating": "n/a", "currentRating": 1600 });
        assert_eq!(resolve_field(&v, &RATING), None);
    }

    #[test]
    fn wrong_type_falls_through_to_next_alias() {
        const DATE: FieldRule =
            FieldRule::new("date", &[&["range"], &["range", "date"]], Coercion::Text);
        let v = json!({ "range": { "date": "2026-01-02" } });
        assert_eq!(
            resolve_field(&v, &DATE),
            Some(FieldValue::Text("2026-01-02".to_string()))
        );
    }

    #[test]
    fn rank_parses_leading_digits() {
        assert_eq!(as_rank(&json!("1234 (India)")), Some(1234));
        assert_eq!(as_rank(&json!(42.9)), Some(42));
        assert_eq!(as_rank(&json!(0)), None);
        assert_eq!(as_rank(&json!("NA")), None);
        assert_eq!(as_rank(&json!("-3")), None);
    }

    #[test]
    fn count_accepts_number_or_breakdown() {
        assert_eq!(as_count(&json!(1193)), Some(1193));
        assert_eq!(
            as_count(&json!({ "easy": 400, "medium": 500, "hard": 293 })),
            Some(1193)
        );
        assert_eq!(
            as_count(&json!({ "easy": "10", "label": "x", "hard": 5 })),
            Some(15)
        );
        assert_eq!(as_count(&json!([1, 2])), None);
    }

    #[test]
    fn text_trims_and_renders_numbers() {
        assert_eq!(as_text(&json!("  4★ ")), Some("4★".to_string()));
        assert_eq!(as_text(&json!("   ")), None);
        assert_eq!(as_text(&json!(1800)), Some("1800".to_string()));
    }

    #[test]
    fn collection_filters_elements_missing_required_fields() {
        const NAME: &[FieldRule] = &[
            FieldRule::new("name", &[&["name"], &["title"]], Coercion::Text),
            FieldRule::new("icon", &[&["icon"]], Coercion::Text),
        ];
        const BADGES: CollectionRule = CollectionRule {
            paths: &[&["badges"], &["achievements"]],
            element: NAME,
            require_any: &["name"],
        };
        let v = json!({ "achievements": [
            { "title": "Streak" },
            { "icon": "https://x/y.png" },
            { "name": "Contest" }
        ]});
        let items = resolve_collection(&v, &BADGES).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].text("name").as_deref(), Some("Streak"));
        assert!(resolve_collection(&json!({}), &BADGES).is_none());
    }

    #[test]
    fn locate_entity_unwraps_data_and_searches_arrays() {
        let direct = json!({ "rating": 1 });
        assert_eq!(locate_entity(&direct, &["rating"]), &direct);

        let nested = json!({ "data": { "rating": 2 } });
        assert_eq!(locate_entity(&nested, &["rating"]), &json!({ "rating": 2 }));

        let array = json!([{ "noise": true }, { "handle": "abc", "rating": 0 }]);
        assert_eq!(
            locate_entity(&array, &["rating", "handle"]),
            &json!({ "handle": "abc", "rating": 0 })
        );

        let unmarked = json!({ "data": [{ "a": 1 }, { "b": 2 }] });
        assert_eq!(locate_entity(&unmarked, &["rating"]), &json!({ "a": 1 }));

        assert!(locate_entity(&json!([]), &["rating"]).is_null());
    }

    #[test]
    fn resolution_is_deterministic() {
        let v = json!({ "rating": "1500", "stats": { "rating": 3 } });
        let table = [RATING];
        assert_eq!(resolve(&v, &table), resolve(&v, &table));
    }
}
