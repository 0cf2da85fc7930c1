//! HTTP query service.
//!
//! A thin layer over the read-only [`Collection`] API. Every handler
//! translates a path or query string into one collection call.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/article/{title}` | Article metadata as JSON, body and markup omitted |
//! | `GET`  | `/article/wiki_text/{title}` | Wiki markup as plain text |
//! | `GET`  | `/article/text/{title}` | Body text as plain text |
//! | `GET`  | `/find?q=<prefix>` | First article whose title starts with the prefix |
//! | `GET`  | `/redirect/{title}` | Destination of a redirect |
//! | `GET`  | `/action?q=<text>` | Echo `q` back as `textToSpeech` |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! JSON bodies are pretty-printed with non-ASCII characters left
//! unescaped.
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "not_found", "message": "article not found: Tokyo" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404), `internal` (500).

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use wpsearch_core::collection::Collection;
use wpsearch_core::models::Article;

use crate::collection::WikipediaCollection;
use crate::config::Config;
use crate::db;

/// Placeholder for fields left out of the JSON article view.
pub const OMITTED: &str = "<<<Omitted>>>";

/// Shared application state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    collection: Arc<dyn Collection>,
}

/// Build the router over any collection.
pub fn router(collection: Arc<dyn Collection>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/article/{title}", get(handle_article))
        .route("/article/wiki_text/{title}", get(handle_article_wiki_text))
        .route("/article/text/{title}", get(handle_article_text))
        .route("/find", get(handle_find))
        .route("/redirect/{title}", get(handle_redirect))
        .route("/action", get(handle_action))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(AppState { collection })
}

/// Starts the HTTP server.
///
/// Binds to `[server].bind` (port overridable with `WPSEARCH_PORT`) and
/// serves until the process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let bind_addr = config.server.bind_addr()?;
    let pool = db::connect(config).await?;
    let collection = WikipediaCollection::new(pool);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(addr = %bind_addr, "server listening");
    println!("wpsearch server listening on http://{}", bind_addr);

    axum::serve(listener, router(Arc::new(collection))).await?;
    Ok(())
}

// ============ Responses ============

/// JSON error response body.
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

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        error!(error = %format!("{:#}", err), "request failed");
        AppError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code: "internal".to_string(),
            message: err.to_string(),
        }
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found".to_string(),
        message: message.into(),
    }
}

/// Pretty-printed JSON with non-ASCII characters kept verbatim.
fn pretty_json<T: Serialize>(value: &T) -> Result<Response, AppError> {
    let body = serde_json::to_string_pretty(value).map_err(anyhow::Error::from)?;
    Ok((
        [(header::CONTENT_TYPE, "application/json; charset=utf-8")],
        body,
    )
        .into_response())
}

fn plain_text(body: String) -> Response {
    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        body,
    )
        .into_response()
}

/// Article view served as JSON. Body text and markup are replaced by
/// [`OMITTED`]; they have their own plain-text endpoints.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ArticleView {
    pub title: String,
    pub text: String,
    pub opening_text: String,
    pub auxiliary_text: Vec<String>,
    pub categories: Vec<String>,
    pub headings: Vec<String>,
    pub wiki_text: String,
    pub popularity_score: f64,
    pub num_incoming_links: u32,
}

impl From<Article> for ArticleView {
    fn from(article: Article) -> Self {
        Self {
            title: article.title,
            text: OMITTED.to_string(),
            opening_text: article.opening_text,
            auxiliary_text: article.auxiliary_text,
            categories: article.categories,
            headings: article.headings,
            wiki_text: OMITTED.to_string(),
            popularity_score: article.popularity_score,
            num_incoming_links: article.num_incoming_links,
        }
    }
}

async fn lookup(state: &AppState, title: &str) -> Result<Article, AppError> {
    state
        .collection
        .get_by_id(title)
        .await?
        .ok_or_else(|| not_found(format!("article not found: {}", title)))
}

// ============ GET /article/* ============

async fn handle_article(
    State(state): State<AppState>,
    Path(title): Path<String>,
) -> Result<Response, AppError> {
    let article = lookup(&state, &title).await?;
    pretty_json(&ArticleView::from(article))
}

async fn handle_article_wiki_text(
    State(state): State<AppState>,
    Path(title): Path<String>,
) -> Result<Response, AppError> {
    let article = lookup(&state, &title).await?;
    Ok(plain_text(article.wiki_text))
}

async fn handle_article_text(
    State(state): State<AppState>,
    Path(title): Path<String>,
) -> Result<Response, AppError> {
    let article = lookup(&state, &title).await?;
    Ok(plain_text(article.text))
}

// ============ GET /find ============

#[derive(Deserialize)]
struct QueryParams {
    #[serde(default)]
    q: String,
}

async fn handle_find(
    State(state): State<AppState>,
    Query(params): Query<QueryParams>,
) -> Result<Response, AppError> {
    if params.q.is_empty() {
        return Err(bad_request("q must not be empty"));
    }
    let article = state
        .collection
        .find_by_prefix(&params.q)
        .await?
        .ok_or_else(|| not_found(format!("no article title starts with: {}", params.q)))?;
    pretty_json(&ArticleView::from(article))
}

// ============ GET /redirect/{title} ============

#[derive(Serialize)]
struct RedirectResponse {
    src: String,
    dst: String,
}

async fn handle_redirect(
    State(state): State<AppState>,
    Path(title): Path<String>,
) -> Result<Response, AppError> {
    let dst = state
        .collection
        .resolve_redirect(&title)
        .await?
        .ok_or_else(|| not_found(format!("redirect not found: {}", title)))?;
    pretty_json(&RedirectResponse { src: title, dst })
}

// ============ GET /action ============

#[derive(Serialize)]
struct ActionResponse {
    #[serde(rename = "textToSpeech")]
    text_to_speech: String,
}

async fn handle_action(Query(params): Query<QueryParams>) -> Result<Response, AppError> {
    pretty_json(&ActionResponse {
        text_to_speech: params.q,
    })
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
