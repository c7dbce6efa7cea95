//! Pagination and response envelopes.

use serde::Serialize;

/// The collection-query response body.
///
/// `limit` carries the number of results *before* pagination, not the
/// requested page size. Existing clients read it that way, so it is kept.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
    pub has_more: bool,
    pub limit: usize,
    pub count: usize,
    pub items: Vec<T>,
    pub total_results: usize,
    pub offset: usize,
}

/// Response body for `slug eq` queries: every match, no paging.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlugEnvelope<T> {
    pub has_more: bool,
    pub count: usize,
    pub items: Vec<T>,
    pub total_results: usize,
}

/// Slice `items` to the page `[offset, offset + limit)`.
pub fn paginate<T>(items: Vec<T>, offset: usize, limit: usize) -> Envelope<T> {
    let total = items.len();
    let count = total.saturating_sub(offset).min(limit);
    let page: Vec<T> = if offset < total {
        items.into_iter().skip(offset).take(count).collect()
    } else {
        Vec::new()
    };

    Envelope {
        has_more: offset + count < total,
        limit: total,
        count,
        items: page,
        total_results: total,
        offset,
    }
}

impl<T> Envelope<T> {
    pub fn empty(offset: usize) -> Self {
        paginate(Vec::new(), offset, 0)
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Envelope<U> {
        Envelope {
            has_more: self.has_more,
            limit: self.limit,
            count: self.count,
            items: self.items.into_iter().map(f).collect(),
            total_results: self.total_results,
            offset: self.offset,
        }
    }
}

pub fn slug_envelope<T>(items: Vec<T>) -> SlugEnvelope<T> {
    SlugEnvelope {
        has_more: false,
        count: 0,
        total_results: items.len(),
        items,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_page() {
        let page = paginate((0..25).collect::<Vec<_>>(), 0, 10);
        assert_eq!(page.items, (0..10).collect::<Vec<_>>());
        assert_eq!(page.count, 10);
        assert!(page.has_more);
        assert_eq!(page.total_results, 25);
    }

    #[test]
    fn test_last_partial_page() {
        let page = paginate((0..25).collect::<Vec<_>>(), 20, 10);
        assert_eq!(page.items, vec![20, 21, 22, 23, 24]);
        assert_eq!(page.count, 5);
        assert!(!page.has_more);
    }

    #[test]
    fn test_offset_past_end() {
        let page = paginate(vec!["a", "b", "c"], 5, 10);
        assert!(page.items.is_empty());
        assert_eq!(page.count, 0);
        assert!(!page.has_more);
        assert_eq!(page.total_results, 3);
        assert_eq!(page.offset, 5);
    }

    #[test]
    fn test_limit_reports_total_not_page_size() {
        let page = paginate(vec![1, 2, 3, 4], 0, 2);
        assert_eq!(page.count, 2);
        assert_eq!(page.limit, 4, "limit carries the pre-pagination size");
    }

    #[test]
    fn test_count_and_has_more_invariants() {
        for n in 0..8usize {
            for offset in 0..10usize {
                for limit in 0..10usize {
                    let page = paginate(vec![(); n], offset, limit);
                    let expected = (n as i64 - offset as i64).clamp(0, limit as i64) as usize;
                    assert_eq!(page.count, expected, "n={} offset={} limit={}", n, offset, limit);
                    assert_eq!(page.items.len(), expected);
                    assert_eq!(page.has_more, offset + page.count < n);
                }
            }
        }
    }

    #[test]
    fn test_wire_shape() {
        let page = paginate(vec!["x"], 0, 10);
        let json = serde_json::to_string(&page).unwrap();
        assert_eq!(
            json,
            r#"{"hasMore":false,"limit":1,"count":1,"items":["x"],"totalResults":1,"offset":0}"#
        );
    }

    #[test]
    fn test_slug_envelope() {
        let env = slug_envelope(vec!["a", "b"]);
        assert!(!env.has_more);
        assert_eq!(env.count, 0);
        assert_eq!(env.total_results, 2);
        let json = serde_json::to_string(&env).unwrap();
        assert_eq!(json, r#"{"hasMore":false,"count":0,"items":["a","b"],"totalResults":2}"#);
    }
}
