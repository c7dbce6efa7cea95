//! Query-string and filter-expression parsing.
//!
//! # Filter grammar
//!
//! The `q` parameter is a conjunction of clauses joined by the literal
//! token `" and "`. Each clause is either one comparison
//! `<field> eq "<value>"` or a disjunction of `id eq` comparisons joined by
//! `" or "`:
//!
//! ```text
//! type eq "News" and (id eq "n1" or id eq "n2") and language eq "fr-FR"
//! ```
//!
//! Parentheses are removed before splitting, so grouping has no effect:
//! the expression is always read as a flat AND of clauses. Nested boolean
//! groups are not supported. Only `eq` is understood.
//!
//! Malformed clauses are logged and skipped; parsing never fails.

use tracing::warn;

/// Page size used when the request does not specify `limit`.
pub const DEFAULT_LIMIT: usize = 10;

/// A generic `field eq "value"` comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    pub field: String,
    pub value: String,
}

/// Structured form of the `q` filter expression.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedFilter {
    /// `id eq` values in left-to-right order, duplicates kept.
    pub ids: Vec<String>,
    pub item_type: Option<String>,
    pub language: Option<String>,
    pub slug: Option<String>,
    /// Every other `field eq "value"` clause.
    pub conditions: Vec<Condition>,
}

/// Parse a URL-decoded `q` expression.
pub fn parse_filter(q: &str) -> ParsedFilter {
    let mut parsed = ParsedFilter::default();
    let flattened: String = q.chars().filter(|c| *c != '(' && *c != ')').collect();

    for clause in flattened.split(" and ") {
        let clause = clause.trim();
        if clause.is_empty() {
            continue;
        }

        if clause.contains(" or ") {
            for part in clause.split(" or ") {
                match split_comparison(part) {
                    Some((field, value)) if field == "id" => parsed.ids.push(value),
                    Some((field, _)) => {
                        warn!(clause = part, field = %field, "skipping non-id comparison inside 'or' clause")
                    }
                    None => warn!(clause = part, "skipping malformed 'or' comparison"),
                }
            }
            continue;
        }

        let Some((field, value)) = split_comparison(clause) else {
            warn!(clause, "skipping malformed filter clause");
            continue;
        };

        match field.as_str() {
            "id" => parsed.ids.push(value),
            "type" => parsed.item_type = Some(value),
            "language" => parsed.language = Some(value),
            "slug" => parsed.slug = Some(value),
            _ => parsed.conditions.push(Condition { field, value }),
        }
    }

    parsed
}

/// Split `field eq "value"` into its two non-empty tokens.
fn split_comparison(clause: &str) -> Option<(String, String)> {
    let tokens: Vec<&str> = clause.split(" eq ").collect();
    if tokens.len() != 2 {
        return None;
    }
    let field = tokens[0].trim();
    let value = unquote(tokens[1].trim());
    if field.is_empty() || value.is_empty() {
        return None;
    }
    Some((field.to_string(), value.to_string()))
}

/// Remove one pair of surrounding double quotes, if present.
pub fn unquote(value: &str) -> &str {
    let value = value.strip_prefix('"').unwrap_or(value);
    value.strip_suffix('"').unwrap_or(value)
}

/// A fully parsed collection query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemQuery {
    /// `contentType` or `field:type:equals`.
    pub content_type: Option<String>,
    /// Field projection from `fields` (comma-separated, `ALL` for everything).
    pub fields: Vec<String>,
    pub filter: ParsedFilter,
    /// The single `field:<name>` exact-match filter (last one wins).
    pub field_filter: Option<Condition>,
    pub order_by: Option<String>,
    pub limit: usize,
    pub offset: usize,
    /// Free-text `default` search with `*` removed.
    pub default_text: Option<String>,
}

impl Default for ItemQuery {
    fn default() -> Self {
        Self {
            content_type: None,
            fields: Vec::new(),
            filter: ParsedFilter::default(),
            field_filter: None,
            order_by: None,
            limit: DEFAULT_LIMIT,
            offset: 0,
            default_text: None,
        }
    }
}

impl ItemQuery {
    /// Parse a raw (percent-encoded) query string such as
    /// `q=type%20eq%20%22News%22&limit=5`.
    pub fn parse(raw: &str, default_limit: usize) -> Self {
        Self::from_pairs(decode_pairs(raw), default_limit)
    }

    /// Build a query from already-decoded `(key, value)` parameters.
    pub fn from_pairs<I, K, V>(pairs: I, default_limit: usize) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut query = ItemQuery {
            limit: default_limit,
            ..Default::default()
        };

        for (key, value) in pairs {
            let (key, value) = (key.as_ref(), value.as_ref());
            match key {
                "q" => query.filter = parse_filter(value),
                "contentType" | "field:type:equals" => {
                    query.content_type = non_empty(value).map(str::to_string)
                }
                "fields" => query.fields = parse_id_list(value),
                "orderBy" => query.order_by = non_empty(value).map(str::to_string),
                "limit" => query.limit = value.trim().parse().unwrap_or(default_limit),
                "offset" => query.offset = value.trim().parse().unwrap_or(0),
                "default" => {
                    let text: String = value.chars().filter(|c| *c != '*').collect();
                    query.default_text = non_empty(text.trim()).map(str::to_string);
                }
                _ => {
                    if let Some(field) = key.strip_prefix("field:") {
                        if !field.is_empty() {
                            query.field_filter = Some(Condition {
                                field: field.to_string(),
                                value: value.to_string(),
                            });
                        }
                    }
                }
            }
        }

        query
    }

    /// The type folder to scan: `contentType`, else `type eq` from `q`.
    pub fn folder_type(&self) -> Option<&str> {
        self.content_type
            .as_deref()
            .or(self.filter.item_type.as_deref())
    }
}

/// Split a comma-separated list, dropping empty entries.
pub fn parse_id_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Decode `a=b&c=d` into key/value pairs. `+` is read as a space.
pub fn decode_pairs(raw: &str) -> Vec<(String, String)> {
    raw.trim_start_matches('?')
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (decode_component(key), decode_component(value))
        })
        .collect()
}

fn decode_component(component: &str) -> String {
    let spaced = component.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => spaced,
    }
}

fn non_empty(value: &str) -> Option<&str> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_clause_each_kind() {
        let p = parse_filter(r#"type eq "News""#);
        assert_eq!(p.item_type.as_deref(), Some("News"));
        assert!(p.conditions.is_empty() && p.ids.is_empty());

        let p = parse_filter(r#"id eq "123""#);
        assert_eq!(p.ids, vec!["123"]);

        let p = parse_filter(r#"language eq "fr-FR""#);
        assert_eq!(p.language.as_deref(), Some("fr-FR"));

        let p = parse_filter(r#"slug eq "my-post""#);
        assert_eq!(p.slug.as_deref(), Some("my-post"));

        let p = parse_filter(r#"fields.category eq "sports""#);
        assert_eq!(
            p.conditions,
            vec![Condition {
                field: "fields.category".to_string(),
                value: "sports".to_string()
            }]
        );
    }

    #[test]
    fn test_or_ids_in_order() {
        let p = parse_filter(r#"id eq "123" or id eq "456" or id eq "123""#);
        assert_eq!(p.ids, vec!["123", "456", "123"]);
    }

    #[test]
    fn test_parentheses_are_flattened() {
        let p = parse_filter(r#"(type eq "News") and (id eq "a" or id eq "b")"#);
        assert_eq!(p.item_type.as_deref(), Some("News"));
        assert_eq!(p.ids, vec!["a", "b"]);
    }

    #[test]
    fn test_conjunction_of_mixed_clauses() {
        let p = parse_filter(r#"type eq "News" and language eq "en-US" and author eq "Ann""#);
        assert_eq!(p.item_type.as_deref(), Some("News"));
        assert_eq!(p.language.as_deref(), Some("en-US"));
        assert_eq!(p.conditions.len(), 1);
        assert_eq!(p.conditions[0].field, "author");
        assert_eq!(p.conditions[0].value, "Ann");
    }

    #[test]
    fn test_malformed_clauses_skipped() {
        let p = parse_filter(r#"type ne "News" and id eq "1" and foo eq and x eq "a" eq "b""#);
        assert_eq!(p.ids, vec!["1"]);
        assert!(p.item_type.is_none());
        assert!(p.conditions.is_empty());

        let p = parse_filter(r#"id eq "1" or id eq """#);
        assert_eq!(p.ids, vec!["1"]);
    }

    #[test]
    fn test_non_id_or_parts_skipped() {
        let p = parse_filter(r#"name eq "a" or id eq "2""#);
        assert_eq!(p.ids, vec!["2"]);
        assert!(p.conditions.is_empty());
    }

    #[test]
    fn test_unquote() {
        assert_eq!(unquote(r#""abc""#), "abc");
        assert_eq!(unquote("abc"), "abc");
        assert_eq!(unquote(r#""abc"#), "abc");
    }

    #[test]
    fn test_query_defaults() {
        let q = ItemQuery::parse("", DEFAULT_LIMIT);
        assert_eq!(q.limit, 10);
        assert_eq!(q.offset, 0);
        assert!(q.order_by.is_none());
        assert!(q.folder_type().is_none());
    }

    #[test]
    fn test_query_string_decoding() {
        let q = ItemQuery::parse(
            "q=type%20eq%20%22News%22&orderBy=name%3Ades&limit=5&offset=2&default=*rust*",
            DEFAULT_LIMIT,
        );
        assert_eq!(q.filter.item_type.as_deref(), Some("News"));
        assert_eq!(q.order_by.as_deref(), Some("name:des"));
        assert_eq!(q.limit, 5);
        assert_eq!(q.offset, 2);
        assert_eq!(q.default_text.as_deref(), Some("rust"));
        assert_eq!(q.folder_type(), Some("News"));
    }

    #[test]
    fn test_content_type_sources() {
        let q = ItemQuery::from_pairs([("field:type:equals", "Blog")], DEFAULT_LIMIT);
        assert_eq!(q.content_type.as_deref(), Some("Blog"));
        assert!(q.field_filter.is_none());

        let q = ItemQuery::from_pairs(
            [("contentType", "Blog"), ("q", r#"type eq "News""#)],
            DEFAULT_LIMIT,
        );
        assert_eq!(q.folder_type(), Some("Blog"));
    }

    #[test]
    fn test_field_filter_last_wins() {
        let q = ItemQuery::from_pairs(
            [("field:category", "a"), ("field:author", "b")],
            DEFAULT_LIMIT,
        );
        assert_eq!(
            q.field_filter,
            Some(Condition {
                field: "author".to_string(),
                value: "b".to_string()
            })
        );
    }

    #[test]
    fn test_invalid_numbers_fall_back() {
        let q = ItemQuery::from_pairs([("limit", "abc"), ("offset", "-3")], 25);
        assert_eq!(q.limit, 25);
        assert_eq!(q.offset, 0);
    }

    #[test]
    fn test_wildcard_only_default_is_absent() {
        let q = ItemQuery::from_pairs([("default", "**")], DEFAULT_LIMIT);
        assert!(q.default_text.is_none());
    }

    #[test]
    fn test_plus_decodes_to_space() {
        let pairs = decode_pairs("q=name+eq+%22A+B%22");
        assert_eq!(pairs, vec![("q".to_string(), r#"name eq "A B""#.to_string())]);
    }

    #[test]
    fn test_id_list() {
        assert_eq!(parse_id_list("a, b,,c"), vec!["a", "b", "c"]);
    }
}
