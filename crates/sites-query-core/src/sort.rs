//! `orderBy` parsing and result ordering.
//!
//! Supported keys:
//!
//! | `orderBy` | Comparison |
//! |-----------|------------|
//! | `name:asc` / `name:des` | lexicographic on `name` |
//! | `updateddate:asc` / `updateddate:des` | date on `updatedDate.value` |
//! | `fields.<field>:asc` / `fields.<field>:des` | date for rich values, otherwise scalar |
//!
//! Anything else leaves the input order untouched. All sorts are stable.
//! Values that cannot be compared (missing fields, unparseable dates) are
//! placed after comparable ones regardless of direction.

use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;
use tracing::{debug, warn};

use crate::models::{ContentItem, FieldValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Direction::Asc => ordering,
            Direction::Desc => ordering.reverse(),
        }
    }
}

/// A parsed `orderBy` value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderBy {
    Name(Direction),
    UpdatedDate(Direction),
    /// Field name with any `fields.` prefix removed.
    Field(String, Direction),
    /// Unrecognized key or direction; sorting is a no-op.
    Unsupported(String),
}

impl OrderBy {
    pub fn parse(raw: &str) -> Self {
        let unsupported = || OrderBy::Unsupported(raw.to_string());
        let Some((key, dir)) = raw.trim().rsplit_once(':') else {
            return unsupported();
        };
        let direction = match dir.to_ascii_lowercase().as_str() {
            "asc" => Direction::Asc,
            "des" | "desc" => Direction::Desc,
            _ => return unsupported(),
        };

        let lower = key.to_ascii_lowercase();
        if lower == "name" {
            OrderBy::Name(direction)
        } else if lower == "updateddate" {
            OrderBy::UpdatedDate(direction)
        } else if lower.starts_with("fields.") && key.len() > "fields.".len() {
            OrderBy::Field(key["fields.".len()..].to_string(), direction)
        } else {
            unsupported()
        }
    }
}

/// Sort `items` in place according to `order`.
pub fn sort_items(items: &mut [ContentItem], order: &OrderBy) {
    match order {
        OrderBy::Name(dir) => items.sort_by(|a, b| dir.apply(a.name.cmp(&b.name))),
        OrderBy::UpdatedDate(dir) => {
            items.sort_by(|a, b| compare_missing_last(updated_date(a), updated_date(b), *dir))
        }
        OrderBy::Field(field, dir) => sort_by_field(items, field, *dir),
        OrderBy::Unsupported(raw) => debug!(order_by = %raw, "unsupported orderBy, keeping input order"),
    }
}

/// The first item's field decides how the whole list is compared.
fn sort_by_field(items: &mut [ContentItem], field: &str, dir: Direction) {
    let Some(first) = items.first() else { return };
    match first.field(field) {
        None => {
            warn!(field, "sort field missing on first result, keeping input order");
        }
        Some(FieldValue::Scalar(_)) => items.sort_by(|a, b| {
            compare_missing_last(scalar_key(a, field), scalar_key(b, field), dir)
        }),
        Some(FieldValue::Rich(_)) => items.sort_by(|a, b| {
            compare_missing_last(rich_date(a, field), rich_date(b, field), dir)
        }),
        Some(FieldValue::Multi(_)) => {
            warn!(field, "sort field has no orderable value on first result, keeping input order");
        }
    }
}

/// Compare two optional keys in `dir`, with `None` always last.
fn compare_missing_last<T: Ord>(a: Option<T>, b: Option<T>, dir: Direction) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => dir.apply(a.cmp(&b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn updated_date(item: &ContentItem) -> Option<i64> {
    ["updatedDate", "updateddate"]
        .iter()
        .filter_map(|key| item.top_level(key))
        .find_map(|v| v.get("value"))
        .and_then(parse_date_millis)
}

fn rich_date(item: &ContentItem, field: &str) -> Option<i64> {
    item.field(field)
        .and_then(FieldValue::rich_value)
        .and_then(parse_date_millis)
}

/// Milliseconds since the epoch for a date string or a numeric timestamp.
pub fn parse_date_millis(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => parse_date_str(s.trim()),
        _ => None,
    }
}

fn parse_date_str(s: &str) -> Option<i64> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp_millis());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc().timestamp_millis());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp_millis())
}

/// Orderable view of a scalar field: booleans, then numbers, then strings.
#[derive(Debug, PartialEq)]
enum ScalarKey<'a> {
    Bool(bool),
    Number(f64),
    Text(&'a str),
}

impl Eq for ScalarKey<'_> {}

impl PartialOrd for ScalarKey<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScalarKey<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (ScalarKey::Bool(a), ScalarKey::Bool(b)) => a.cmp(b),
            (ScalarKey::Number(a), ScalarKey::Number(b)) => a.total_cmp(b),
            (ScalarKey::Text(a), ScalarKey::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl ScalarKey<'_> {
    fn rank(&self) -> u8 {
        match self {
            ScalarKey::Bool(_) => 0,
            ScalarKey::Number(_) => 1,
            ScalarKey::Text(_) => 2,
        }
    }
}

fn scalar_key<'a>(item: &'a ContentItem, field: &str) -> Option<ScalarKey<'a>> {
    match item.field(field)? {
        FieldValue::Scalar(Value::Bool(b)) => Some(ScalarKey::Bool(*b)),
        FieldValue::Scalar(Value::Number(n)) => n.as_f64().map(ScalarKey::Number),
        FieldValue::Scalar(Value::String(s)) => Some(ScalarKey::Text(s)),
        _ => None,
    }
}
