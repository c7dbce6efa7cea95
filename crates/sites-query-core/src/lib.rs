//! # Sites Query Core
//!
//! Pure query logic for the Sites local server: the content item model,
//! the filter-expression parser, predicate evaluation, sorting, and the
//! pagination envelope.
//!
//! This crate performs no filesystem or network I/O and has no async
//! runtime dependency. Callers load [`models::ContentItem`]s from wherever
//! they live and hand them to [`filter`], [`sort`], and [`page`].
//!
//! ```text
//! raw query string ──▶ query::ItemQuery ──▶ filter::filter_items
//!                                                  │
//!                          page::paginate ◀── sort::sort_items
//! ```

pub mod filter;
pub mod models;
pub mod page;
pub mod query;
pub mod sort;
