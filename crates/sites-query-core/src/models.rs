//! Content data models.
//!
//! These types represent the documents read from a content export: content
//! items, their field values, variation sets, and the `metadata.json`
//! id → type index.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors raised when a JSON document does not have the shape of a content item.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// The document root is not a JSON object.
    #[error("content item must be a JSON object, found {0}")]
    NotAnObject(&'static str),
}

/// A single field value, classified once when the item is loaded.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Plain JSON scalar: string, number, boolean, or null.
    Scalar(Value),
    /// Object carrying a `value` key, e.g. `{ "value": "2024-01-01T00:00:00Z", "timezone": "UTC" }`.
    Rich(Map<String, Value>),
    /// Any other object or array (references, multi-valued lists).
    Multi(Value),
}

impl FieldValue {
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Object(map) if map.contains_key("value") => FieldValue::Rich(map),
            Value::Object(_) | Value::Array(_) => FieldValue::Multi(value),
            scalar => FieldValue::Scalar(scalar),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Scalar(v) | FieldValue::Multi(v) => v.clone(),
            FieldValue::Rich(map) => Value::Object(map.clone()),
        }
    }

    /// The nested `value` of a rich field.
    pub fn rich_value(&self) -> Option<&Value> {
        match self {
            FieldValue::Rich(map) => map.get("value"),
            _ => None,
        }
    }

    /// The object's own values (or array elements) for nested fields.
    ///
    /// Scalars have no own values.
    pub fn own_values(&self) -> Vec<&Value> {
        match self {
            FieldValue::Scalar(_) => Vec::new(),
            FieldValue::Rich(map) => map.values().collect(),
            FieldValue::Multi(Value::Object(map)) => map.values().collect(),
            FieldValue::Multi(Value::Array(list)) => list.iter().collect(),
            FieldValue::Multi(_) => Vec::new(),
        }
    }

    /// JavaScript-style truthiness: objects and arrays are always truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            FieldValue::Scalar(v) => is_truthy(v),
            FieldValue::Rich(_) | FieldValue::Multi(_) => true,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Scalar(Value::String(s)) => Some(s),
            _ => None,
        }
    }
}

/// JavaScript truthiness for a JSON value.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// A content item loaded from `ContentItems/<type>/<id>.json`.
///
/// `fields` and `data` are synonyms on disk. They are folded into the single
/// [`fields`](ContentItem::fields) map here and written back out under both
/// names by [`to_json`](ContentItem::to_json).
#[derive(Debug, Clone, PartialEq)]
pub struct ContentItem {
    pub id: String,
    pub item_type: String,
    pub name: String,
    pub language: Option<String>,
    pub translatable: Option<bool>,
    pub slug: Option<String>,
    pub fields: BTreeMap<String, FieldValue>,
    /// Every other top-level key (`description`, `updatedDate`, ...), kept verbatim.
    pub extra: Map<String, Value>,
}

impl ContentItem {
    /// Build an item from a parsed JSON document.
    ///
    /// When both `fields` and `data` are present, `fields` wins.
    pub fn from_json(value: Value) -> Result<Self, ModelError> {
        let mut map = match value {
            Value::Object(map) => map,
            other => return Err(ModelError::NotAnObject(json_kind(&other))),
        };

        let id = take_string(&mut map, "id").unwrap_or_default();
        let item_type = take_string(&mut map, "type").unwrap_or_default();
        let name = take_string(&mut map, "name").unwrap_or_default();
        let language = take_string(&mut map, "language").filter(|l| !l.is_empty());
        let slug = take_string(&mut map, "slug").filter(|s| !s.is_empty());
        let translatable = match map.remove("translatable") {
            Some(Value::Bool(b)) => Some(b),
            Some(other) => {
                map.insert("translatable".to_string(), other);
                None
            }
            None => None,
        };

        let fields = match (map.remove("fields"), map.remove("data")) {
            (Some(Value::Object(obj)), _) | (_, Some(Value::Object(obj))) => obj
                .into_iter()
                .map(|(k, v)| (k, FieldValue::from_json(v)))
                .collect(),
            _ => BTreeMap::new(),
        };

        Ok(Self {
            id,
            item_type,
            name,
            language,
            translatable,
            slug,
            fields,
            extra: map,
        })
    }

    /// Look up a field, accepting an optional leading `fields.` prefix.
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(strip_fields_prefix(name))
    }

    /// A top-level value that is not one of the modelled keys.
    pub fn top_level(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }

    /// Keep only the named fields. `ALL` keeps everything.
    pub fn project_fields(&mut self, names: &[String]) {
        if names.is_empty() || names.iter().any(|n| n.eq_ignore_ascii_case("all")) {
            return;
        }
        self.fields
            .retain(|k, _| names.iter().any(|n| strip_fields_prefix(n) == k));
    }

    /// Wire form of the item, with both `fields` and `data` populated.
    pub fn to_json(&self) -> Value {
        let mut out = self.extra.clone();
        out.insert("id".to_string(), Value::String(self.id.clone()));
        out.insert("type".to_string(), Value::String(self.item_type.clone()));
        out.insert("name".to_string(), Value::String(self.name.clone()));
        if let Some(ref language) = self.language {
            out.insert("language".to_string(), Value::String(language.clone()));
        }
        if let Some(translatable) = self.translatable {
            out.insert("translatable".to_string(), Value::Bool(translatable));
        }
        if let Some(ref slug) = self.slug {
            out.insert("slug".to_string(), Value::String(slug.clone()));
        }
        let fields: Map<String, Value> = self
            .fields
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect();
        out.insert("fields".to_string(), Value::Object(fields.clone()));
        out.insert("data".to_string(), Value::Object(fields));
        Value::Object(out)
    }
}

impl Serialize for ContentItem {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

/// Strip an optional leading `fields.` from a field reference.
pub fn strip_fields_prefix(name: &str) -> &str {
    name.strip_prefix("fields.").unwrap_or(name)
}

fn take_string(map: &mut Map<String, Value>, key: &str) -> Option<String> {
    match map.remove(key) {
        Some(Value::String(s)) => Some(s),
        Some(other) => {
            map.insert(key.to_string(), other);
            None
        }
        None => None,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ============ Variation sets ============

/// One member of a variation group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariationEntry {
    pub id: String,
    #[serde(default)]
    pub var_type: String,
    #[serde(default)]
    pub value: Value,
}

impl VariationEntry {
    fn is_language(&self, language: &str) -> bool {
        self.var_type == "language" && self.value.as_str() == Some(language)
    }
}

/// A group of items that vary along one axis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VariationGroup {
    #[serde(default)]
    pub items: Vec<VariationEntry>,
}

/// Contents of one `ContentItems/VariationSets/<id>.json` file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariationSet(pub Vec<VariationGroup>);

impl VariationSet {
    /// Whether `id` appears in any group of this file.
    pub fn contains(&self, id: &str) -> bool {
        self.entries().any(|e| e.id == id)
    }

    /// First entry for `language` whose id is not `exclude_id`.
    pub fn language_peer(&self, language: &str, exclude_id: &str) -> Option<&VariationEntry> {
        self.entries()
            .find(|e| e.is_language(language) && e.id != exclude_id)
    }

    /// First entry for `language`, whichever item it names.
    pub fn language_entry(&self, language: &str) -> Option<&VariationEntry> {
        self.entries().find(|e| e.is_language(language))
    }

    fn entries(&self) -> impl Iterator<Item = &VariationEntry> {
        self.0.iter().flat_map(|g| g.items.iter())
    }
}

// ============ metadata.json ============

/// The `metadata.json` id → type lookup.
///
/// On disk the index is a set of `group0`, `group1`, ... arrays of
/// `"<type>:<id>"` strings. Entries are kept in scan order and looked up
/// linearly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentTypeIndex {
    entries: Vec<(String, String)>,
}

impl ContentTypeIndex {
    pub fn from_json(metadata: &Value) -> Self {
        let mut entries = Vec::new();
        if let Value::Object(map) = metadata {
            for (key, group) in map {
                if !key.starts_with("group") {
                    continue;
                }
                let Value::Array(list) = group else { continue };
                for entry in list.iter().filter_map(Value::as_str) {
                    if let Some((item_type, id)) = entry.split_once(':') {
                        entries.push((item_type.to_string(), id.to_string()));
                    }
                }
            }
        }
        Self { entries }
    }

    /// Type name for `id`, or `None` if the index has no entry.
    pub fn type_of(&self, id: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, entry_id)| entry_id == id)
            .map(|(item_type, _)| item_type.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
