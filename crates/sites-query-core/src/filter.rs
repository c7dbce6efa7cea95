//! Predicate evaluation for collection queries.
//!
//! Every check short-circuits; an item is kept only when all of them pass:
//!
//! 1. language (items without a language always pass)
//! 2. `type eq` from `q`
//! 3. generic `field eq "value"` conditions
//! 4. the single `field:<name>` filter, combined with the free-text
//!    `default` search on the matched value, or, with no field filter, the
//!    free-text search over the whole serialized item

use serde_json::Value;

use crate::models::{ContentItem, FieldValue};
use crate::query::{Condition, ItemQuery};

/// Keep the items that satisfy `query`, preserving input order.
pub fn filter_items(items: Vec<ContentItem>, query: &ItemQuery) -> Vec<ContentItem> {
    items
        .into_iter()
        .filter(|item| matches(item, query))
        .collect()
}

/// Evaluate every predicate of `query` against one item.
pub fn matches(item: &ContentItem, query: &ItemQuery) -> bool {
    if let (Some(wanted), Some(actual)) = (&query.filter.language, &item.language) {
        if wanted != actual {
            return false;
        }
    }

    if let Some(ref wanted_type) = query.filter.item_type {
        if &item.item_type != wanted_type {
            return false;
        }
    }

    if !query
        .filter
        .conditions
        .iter()
        .all(|c| condition_holds(item, c))
    {
        return false;
    }

    let needle = query.default_text.as_deref().map(str::to_lowercase);

    match query.field_filter {
        Some(ref filter) => {
            let Some(value) = item.field(&filter.field).and_then(FieldValue::as_str) else {
                return false;
            };
            if value != filter.value {
                return false;
            }
            match needle {
                Some(n) => value.to_lowercase().contains(&n),
                None => true,
            }
        }
        None => match needle {
            Some(n) => serialized_contains(item, &n),
            None => true,
        },
    }
}

/// A generic condition holds when the field is truthy and either one of its
/// nested values deep-equals the expected string, or the scalar itself does.
fn condition_holds(item: &ContentItem, condition: &Condition) -> bool {
    let Some(value) = item.field(&condition.field) else {
        return false;
    };
    if !value.is_truthy() {
        return false;
    }
    let expected = Value::String(condition.value.clone());
    match value {
        FieldValue::Scalar(v) => *v == expected,
        nested => nested.own_values().into_iter().any(|v| *v == expected),
    }
}

fn serialized_contains(item: &ContentItem, needle_lower: &str) -> bool {
    item.to_json()
        .to_string()
        .to_lowercase()
        .contains(needle_lower)
}
