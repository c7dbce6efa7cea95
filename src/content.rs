//! Content query execution and item retrieval.
//!
//! Ties the store, the variation resolver, and the query core together.
//! Used by both the `scs-dev query` / `scs-dev get` CLI commands and the
//! HTTP content endpoints.
//!
//! ```text
//! ItemQuery ──▶ candidates (slug scan | id list | type folder | all types)
//!                    │
//!                    ▼
//!            filter_items ──▶ sort_items ──▶ paginate ──▶ envelope
//! ```

use serde::Serialize;
use serde_json::{Map, Value};
use sites_query_core::filter::filter_items;
use sites_query_core::models::ContentItem;
use sites_query_core::page::{paginate, slug_envelope, Envelope, SlugEnvelope};
use sites_query_core::query::ItemQuery;
use sites_query_core::sort::{sort_items, OrderBy};
use tracing::{debug, info};

use crate::context::RequestContext;
use crate::error::ContentResult;
use crate::store::ContentSet;
use crate::variation::resolve_variant;

/// Body of a collection query.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QueryResponse {
    Page(Envelope<Value>),
    Slug(SlugEnvelope<Value>),
}

impl QueryResponse {
    pub fn items(&self) -> &[Value] {
        match self {
            QueryResponse::Page(page) => &page.items,
            QueryResponse::Slug(env) => &env.items,
        }
    }
}

/// Outcome of a single or bulk item fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemLookup {
    Single(Value),
    /// Requested id → item. Keys are ordered by id, not by request.
    Bulk(Map<String, Value>),
    NotFound,
}

impl ItemLookup {
    /// Wire body: the item itself, or `{ "items": { <id>: <item> } }`.
    pub fn into_json(self) -> Option<Value> {
        match self {
            ItemLookup::Single(item) => Some(item),
            ItemLookup::Bulk(items) => {
                let mut body = Map::new();
                body.insert("items".to_string(), Value::Object(items));
                Some(Value::Object(body))
            }
            ItemLookup::NotFound => None,
        }
    }
}

/// Run a collection query.
///
/// With no content set in `ctx`, an empty page is returned.
pub async fn query_items(ctx: &RequestContext, query: &ItemQuery) -> ContentResult<QueryResponse> {
    let Some(ref set) = ctx.content_set else {
        info!("no content set selected, returning an empty result");
        return Ok(QueryResponse::Page(Envelope::empty(query.offset)));
    };
    debug!(
        content_set = set.name(),
        channel_token = ctx.channel_token.is_some(),
        ?query,
        "running content query"
    );

    if let Some(ref slug) = query.filter.slug {
        let matches = filter_items(set.find_by_slug(slug).await?, query);
        let items = matches.into_iter().map(|item| project(item, query)).collect();
        return Ok(QueryResponse::Slug(slug_envelope(items)));
    }

    let candidates = {
        let (set, query) = (set.clone(), query.clone());
        tokio::task::spawn_blocking(move || candidate_items(&set, &query)).await??
    };
    let mut items = filter_items(candidates, query);
    if let Some(ref order_by) = query.order_by {
        sort_items(&mut items, &OrderBy::parse(order_by));
    }

    let page = paginate(items, query.offset, query.limit).map(|item| project(item, query));
    Ok(QueryResponse::Page(page))
}

/// Items the filter runs over: explicit ids, one type folder, or everything.
fn candidate_items(set: &ContentSet, query: &ItemQuery) -> ContentResult<Vec<ContentItem>> {
    if !query.filter.ids.is_empty() {
        let index = set.type_index()?;
        let mut items = Vec::new();
        for id in &query.filter.ids {
            let Some(item_type) = index.type_of(id) else {
                debug!(id = %id, "id not in metadata index, omitted");
                continue;
            };
            if let Some(item) = set.load_item(item_type, id)? {
                items.push(item);
            }
        }
        return Ok(items);
    }

    match query.folder_type() {
        Some(item_type) => set.list_type(item_type),
        None => set.list_all(),
    }
}

fn project(mut item: ContentItem, query: &ItemQuery) -> Value {
    item.project_fields(&query.fields);
    item.to_json()
}

/// Fetch items by id, with slug fallback and language variants.
///
/// For each id the type comes from `metadata.json`; ids the index does not
/// know are treated as slugs. When `language` is set, each hit is replaced
/// by its variant in that language, and hits without one are dropped.
/// Non-bulk lookups stop at the first resolved item.
pub async fn get_items(
    ctx: &RequestContext,
    ids: &[String],
    language: Option<&str>,
    bulk: bool,
) -> ContentResult<ItemLookup> {
    let Some(ref set) = ctx.content_set else {
        info!("no content set selected, item lookup skipped");
        return Ok(ItemLookup::NotFound);
    };
    let language = language.filter(|l| !l.is_empty());

    let index = set.type_index()?;
    let mut found: Vec<(String, ContentItem)> = Vec::new();

    for id in ids {
        let indexed = match index.type_of(id) {
            Some(item_type) => set.load_item(item_type, id)?,
            None => None,
        };
        let item = match indexed {
            Some(item) => item,
            None => match set.find_by_slug(id).await?.into_iter().next() {
                Some(item) => {
                    debug!(id = %id, resolved = %item.id, "resolved id through slug scan");
                    item
                }
                None => continue,
            },
        };

        let item = match language {
            Some(lang) => {
                let (scan_set, lang) = (set.clone(), lang.to_string());
                let limit = ctx.variation_scan_limit;
                let variant = tokio::task::spawn_blocking(move || {
                    resolve_variant(&scan_set, item, &lang, limit)
                })
                .await??;
                match variant {
                    Some(variant) => variant,
                    None => continue,
                }
            }
            None => item,
        };

        found.push((id.clone(), item));
        if !bulk {
            break;
        }
    }

    if found.is_empty() {
        info!(?ids, language, "no item found");
        return Ok(ItemLookup::NotFound);
    }

    if bulk {
        let items = found
            .into_iter()
            .map(|(id, item)| (id, item.to_json()))
            .collect();
        Ok(ItemLookup::Bulk(items))
    } else {
        let (_, item) = found.remove(0);
        Ok(ItemLookup::Single(item.to_json()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::fixtures::SetBuilder;
    use serde_json::json;
    use sites_query_core::query::DEFAULT_LIMIT;
    use tempfile::TempDir;

    fn news_ctx(tmp: &TempDir) -> RequestContext {
        let root = SetBuilder::new(tmp.path())
            .item("News", "123", json!({ "name": "Banana", "language": "en-US",
                "updatedDate": { "value": "2020-01-01T00:00:00Z" },
                "fields": { "category": "fruit", "rank": 2 } }))
            .item("News", "456", json!({ "name": "Apple", "language": "en-US",
                "updatedDate": { "value": "2022-01-01T00:00:00Z" },
                "fields": { "category": "fruit", "rank": 1 } }))
            .item("News", "789", json!({ "name": "Cherry", "language": "fr-FR",
                "fields": { "category": "berry", "rank": 3 } }))
            .item("Author", "a1", json!({ "name": "Ann", "fields": { "bio": "Writes about fruit" } }))
            .unindexed_item("News", "999", json!({ "name": "Hidden", "slug": "hidden-news" }))
            .variation("123", json!([{ "items": [
                { "id": "123", "varType": "language", "value": "en-US" },
                { "id": "789", "varType": "language", "value": "fr-FR" }
            ] }]))
            .build();
        RequestContext::with_set(ContentSet::at("Site", root))
    }

    fn q(raw: &str) -> ItemQuery {
        ItemQuery::parse(raw, DEFAULT_LIMIT)
    }

    fn ids(resp: &QueryResponse) -> Vec<&str> {
        resp.items().iter().map(|i| i["id"].as_str().unwrap()).collect()
    }

    #[tokio::test]
    async fn test_type_query_defaults() {
        let tmp = TempDir::new().unwrap();
        let ctx = news_ctx(&tmp);
        let resp = query_items(&ctx, &q("q=type%20eq%20%22News%22")).await.unwrap();
        let QueryResponse::Page(ref page) = resp else { panic!("expected a page") };
        assert_eq!(ids(&resp), vec!["123", "456", "789", "999"]);
        assert_eq!(page.offset, 0);
        assert_eq!(page.total_results, 4);
        assert!(!page.has_more);
    }

    #[tokio::test]
    async fn test_or_ids_keep_request_order() {
        let tmp = TempDir::new().unwrap();
        let ctx = news_ctx(&tmp);
        let resp = query_items(&ctx, &q(r#"q=id eq "456" or id eq "nope" or id eq "123""#))
            .await
            .unwrap();
        assert_eq!(ids(&resp), vec!["456", "123"]);
    }

    #[tokio::test]
    async fn test_order_by_name_des() {
        let tmp = TempDir::new().unwrap();
        let ctx = news_ctx(&tmp);
        let resp = query_items(&ctx, &q(r#"q=id eq "456" or id eq "123"&orderBy=name:des"#))
            .await
            .unwrap();
        assert_eq!(ids(&resp), vec!["123", "456"]);
    }

    #[tokio::test]
    async fn test_offset_beyond_results() {
        let tmp = TempDir::new().unwrap();
        let ctx = news_ctx(&tmp);
        let resp = query_items(&ctx, &q("contentType=Author&offset=5&limit=10"))
            .await
            .unwrap();
        let QueryResponse::Page(page) = resp else { panic!("expected a page") };
        assert!(page.items.is_empty());
        assert_eq!(page.count, 0);
        assert!(!page.has_more);
        assert_eq!(page.total_results, 1);
    }

    #[tokio::test]
    async fn test_language_and_condition_filters() {
        let tmp = TempDir::new().unwrap();
        let ctx = news_ctx(&tmp);
        let resp = query_items(
            &ctx,
            &q(r#"q=type eq "News" and language eq "en-US" and fields.category eq "fruit""#),
        )
        .await
        .unwrap();
        assert_eq!(ids(&resp), vec!["123", "456"]);
    }

    #[tokio::test]
    async fn test_numeric_sort_and_paging() {
        let tmp = TempDir::new().unwrap();
        let ctx = news_ctx(&tmp);
        let resp = query_items(
            &ctx,
            &q("contentType=News&q=fields.category%20eq%20%22fruit%22%20or%20x&orderBy=fields.rank:des&limit=1"),
        )
        .await
        .unwrap();
        let QueryResponse::Page(page) = resp else { panic!("expected a page") };
        // the malformed 'or' clause is skipped; rank 3 (789) is first
        assert_eq!(page.items[0]["id"], "789");
        assert_eq!(page.count, 1);
        assert!(page.has_more);
        assert_eq!(page.limit, 4);
    }

    #[tokio::test]
    async fn test_unscoped_free_text() {
        let tmp = TempDir::new().unwrap();
        let ctx = news_ctx(&tmp);
        let resp = query_items(&ctx, &q("default=*FRUIT*")).await.unwrap();
        assert_eq!(ids(&resp), vec!["a1", "123", "456"]);
    }

    #[tokio::test]
    async fn test_slug_query_envelope() {
        let tmp = TempDir::new().unwrap();
        let ctx = news_ctx(&tmp);
        let resp = query_items(&ctx, &q(r#"q=slug eq "hidden-news""#)).await.unwrap();
        let QueryResponse::Slug(env) = resp else { panic!("expected a slug envelope") };
        assert_eq!(env.total_results, 1);
        assert_eq!(env.count, 0);
        assert!(!env.has_more);
        assert_eq!(env.items[0]["id"], "999");
    }

    #[tokio::test]
    async fn test_fields_projection() {
        let tmp = TempDir::new().unwrap();
        let ctx = news_ctx(&tmp);
        let resp = query_items(&ctx, &q(r#"q=id eq "123"&fields=rank"#)).await.unwrap();
        let item = &resp.items()[0];
        assert_eq!(item["fields"], json!({ "rank": 2 }));
        assert_eq!(item["data"], json!({ "rank": 2 }));
    }

    #[tokio::test]
    async fn test_no_content_set_is_empty() {
        let ctx = RequestContext {
            content_set: None,
            channel_token: None,
            default_limit: DEFAULT_LIMIT,
            variation_scan_limit: None,
        };
        let resp = query_items(&ctx, &q("contentType=News")).await.unwrap();
        assert!(resp.items().is_empty());
        let lookup = get_items(&ctx, &["123".to_string()], None, false).await.unwrap();
        assert_eq!(lookup, ItemLookup::NotFound);
    }

    #[tokio::test]
    async fn test_single_fetch_by_id() {
        let tmp = TempDir::new().unwrap();
        let ctx = news_ctx(&tmp);
        let lookup = get_items(&ctx, &["456".to_string()], None, false).await.unwrap();
        let ItemLookup::Single(item) = lookup else { panic!("expected one item") };
        assert_eq!(item["name"], "Apple");
        assert_eq!(item["fields"], item["data"]);
    }

    #[tokio::test]
    async fn test_single_fetch_falls_back_to_slug() {
        let tmp = TempDir::new().unwrap();
        let ctx = news_ctx(&tmp);
        let lookup = get_items(&ctx, &["hidden-news".to_string()], None, false)
            .await
            .unwrap();
        let ItemLookup::Single(item) = lookup else { panic!("expected one item") };
        assert_eq!(item["id"], "999");
    }

    #[tokio::test]
    async fn test_single_fetch_with_language() {
        let tmp = TempDir::new().unwrap();
        let ctx = news_ctx(&tmp);
        let lookup = get_items(&ctx, &["123".to_string()], Some("fr-FR"), false)
            .await
            .unwrap();
        let ItemLookup::Single(item) = lookup else { panic!("expected one item") };
        assert_eq!(item["id"], "789");

        let missing = get_items(&ctx, &["123".to_string()], Some("ja-JP"), false)
            .await
            .unwrap();
        assert_eq!(missing, ItemLookup::NotFound);
    }

    #[tokio::test]
    async fn test_bulk_fetch() {
        let tmp = TempDir::new().unwrap();
        let ctx = news_ctx(&tmp);
        let ids = vec!["a1".to_string(), "missing".to_string(), "456".to_string()];
        let lookup = get_items(&ctx, &ids, None, true).await.unwrap();
        let body = lookup.into_json().unwrap();
        let items = body["items"].as_object().unwrap();
        let keys: Vec<&str> = items.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["456", "a1"]);
        assert_eq!(items["456"]["name"], "Apple");
        assert_eq!(items["a1"]["type"], "Author");
    }

    #[tokio::test]
    async fn test_nothing_found() {
        let tmp = TempDir::new().unwrap();
        let ctx = news_ctx(&tmp);
        let lookup = get_items(&ctx, &["zzz".to_string()], None, true).await.unwrap();
        assert_eq!(lookup, ItemLookup::NotFound);
        assert!(lookup.into_json().is_none());
    }
}
