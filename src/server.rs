//! Local content delivery HTTP server.
//!
//! Emulates the Sites content REST API over the content sets on disk, so
//! templates and components can be previewed without a live instance.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/content/{api}/api/{version}/items` | Collection query |
//! | `GET`  | `/content/{api}/api/{version}/items/{id}` | Single item, or `bulk?ids=a,b` |
//! | `GET`  | `/content/{api}/api/{version}/items/{id}/variations/language/{lang}` | Item in another language |
//! | `GET`  | `/content/{api}/api/{version}/assets/{id}/native[/{file}]` | Digital asset bytes |
//! | `GET`  | `/session` | Current session |
//! | `POST` | `/session` | Replace the session |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! `{api}` is `published` or `management`; both read the same content.
//!
//! # Missing content
//!
//! A missing content set, item, or asset is answered with `200` and an empty
//! body (or an empty envelope for collection queries). Only unreadable or
//! corrupt content yields an error:
//!
//! ```json
//! { "error": { "code": "corrupt_content", "message": "malformed JSON in ..." } }
//! ```
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so pages served from
//! other local ports can call the API.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, RawQuery, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use sites_query_core::query::{parse_id_list, ItemQuery};
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, error, info};

use crate::asset::read_asset;
use crate::config::Config;
use crate::content::{get_items, query_items};
use crate::context::{RequestContext, Session};
use crate::error::ContentError;

/// Path segment that switches item fetch into bulk mode.
const BULK_SENTINEL: &str = "bulk";

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
    /// Cross-request session; handlers only read it through [`AppState::snapshot`].
    session: Arc<RwLock<Session>>,
}

impl AppState {
    async fn snapshot(&self) -> RequestContext {
        let session = self.session.read().await.clone();
        RequestContext::from_session(&self.config, &session)
    }
}

/// Build the router with a fresh session taken from `config`.
pub fn router(config: &Config) -> Router {
    let state = AppState {
        session: Arc::new(RwLock::new(Session::from_config(config))),
        config: Arc::new(config.clone()),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/content/{api}/api/{version}/items", get(handle_query))
        .route("/content/{api}/api/{version}/items/{id}", get(handle_item))
        .route(
            "/content/{api}/api/{version}/items/{id}/variations/language/{lang}",
            get(handle_item_variation),
        )
        .route(
            "/content/{api}/api/{version}/assets/{id}/native",
            get(handle_asset),
        )
        .route(
            "/content/{api}/api/{version}/assets/{id}/native/{file}",
            get(handle_asset),
        )
        .route("/session", get(handle_get_session).post(handle_set_session))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state)
}

/// Starts the content server.
///
/// Binds to `[server].bind` and serves until the process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let app = router(config);

    match config.server.default_template.as_deref() {
        Some(name) => println!("Serving content for template '{}'", name),
        None => println!("No default template; select one with POST /session"),
    }
    println!("Content server listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<ContentError> for AppError {
    fn from(err: ContentError) -> Self {
        error!(error = %err, "content request failed");
        let code = if err.is_corrupt_content() {
            "corrupt_content"
        } else {
            "content_error"
        };
        AppError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code: code.to_string(),
            message: err.to_string(),
        }
    }
}

/// `200` with no body, the answer for anything that is not there.
fn empty_ok() -> Response {
    StatusCode::OK.into_response()
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ /session ============

async fn handle_get_session(State(state): State<AppState>) -> Json<Session> {
    Json(state.session.read().await.clone())
}

async fn handle_set_session(
    State(state): State<AppState>,
    Json(session): Json<Session>,
) -> Json<Session> {
    info!(template = ?session.template, "session updated");
    *state.session.write().await = session.clone();
    Json(session)
}

// ============ GET .../items ============

/// Collection query. The raw query string is decoded by the query parser
/// so that repeated and `field:*` keys keep their order.
async fn handle_query(
    State(state): State<AppState>,
    RawQuery(raw): RawQuery,
) -> Result<Response, AppError> {
    let ctx = state.snapshot().await;
    let query = ItemQuery::parse(raw.as_deref().unwrap_or_default(), ctx.default_limit);
    let body = query_items(&ctx, &query).await?;
    Ok(Json(body).into_response())
}

// ============ GET .../items/{id} ============

/// `{api}` and `{version}` are accepted but not used.
#[derive(Deserialize)]
struct ItemPath {
    id: String,
}

#[derive(Deserialize)]
struct VariationPath {
    id: String,
    lang: String,
}

async fn handle_item(
    State(state): State<AppState>,
    Path(path): Path<ItemPath>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, AppError> {
    fetch_items(&state, &path.id, None, &params).await
}

async fn handle_item_variation(
    State(state): State<AppState>,
    Path(path): Path<VariationPath>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, AppError> {
    fetch_items(&state, &path.id, Some(&path.lang), &params).await
}

async fn fetch_items(
    state: &AppState,
    id: &str,
    language: Option<&str>,
    params: &HashMap<String, String>,
) -> Result<Response, AppError> {
    let ctx = state.snapshot().await;
    let bulk = id == BULK_SENTINEL;
    let ids = if bulk {
        params
            .get("ids")
            .map(|ids| parse_id_list(ids))
            .unwrap_or_default()
    } else {
        vec![id.to_string()]
    };
    debug!(?ids, language, bulk, "item fetch");

    match get_items(&ctx, &ids, language, bulk).await?.into_json() {
        Some(body) => Ok(Json(body).into_response()),
        None => Ok(empty_ok()),
    }
}

// ============ GET .../assets/{id}/native ============

#[derive(Deserialize)]
struct AssetPath {
    id: String,
}

/// Any trailing file name is informational; the binary is chosen by id.
async fn handle_asset(
    State(state): State<AppState>,
    Path(path): Path<AssetPath>,
) -> Result<Response, AppError> {
    serve_asset(&state, &path.id).await
}

async fn serve_asset(state: &AppState, id: &str) -> Result<Response, AppError> {
    let ctx = state.snapshot().await;
    let Some(asset) = read_asset(&ctx, id).await? else {
        return Ok(empty_ok());
    };
    let content_type = asset.content_type();
    Ok(([(header::CONTENT_TYPE, content_type)], asset.bytes).into_response())
}
