//! # Sites Dev Server
//!
//! A local development server that emulates the Sites content delivery
//! REST API over content exported to disk, so templates and components can
//! be previewed without a live instance.
//!
//! Query parsing, filtering, sorting, and paging live in the I/O-free
//! `sites-query-core` crate. This crate adds the on-disk store, language
//! variation resolution, the HTTP surface, and the `scs-dev` CLI.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   ┌──────────────┐   ┌───────────────────┐
//! │ HTTP / CLI │──▶│ RequestCtx   │──▶│ content / asset   │
//! │ (axum)     │   │ (snapshot)   │   │ query + fetch     │
//! └────────────┘   └──────────────┘   └─────────┬─────────┘
//!                                               │
//!                       ┌───────────────────────┤
//!                       ▼                       ▼
//!                 ┌────────────┐         ┌─────────────┐
//!                 │   store    │◀────────│  variation  │
//!                 │ (JSON fs)  │         │  resolver   │
//!                 └────────────┘         └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! scs-dev sets                                   # list content sets
//! scs-dev query Blog --q 'type eq "News"'        # run a query
//! scs-dev get Blog n1 --language fr-FR           # fetch a variant
//! scs-dev serve                                  # start the HTTP server
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`store`] | Content set location and item file access |
//! | [`variation`] | Language variant lookup |
//! | [`content`] | Collection queries and item fetch |
//! | [`asset`] | Digital asset binaries |
//! | [`context`] | Session and per-request context |
//! | [`sets`] | Content set discovery |
//! | [`server`] | HTTP server |
//! | [`error`] | Content error type |

pub mod asset;
pub mod config;
pub mod content;
pub mod context;
pub mod error;
pub mod server;
pub mod sets;
pub mod store;
pub mod variation;
