//! JSON HTTP API over the search engine.
//!
//! Exposes the ranking and comparison operations to the recommendation
//! front end. The engine is built once at startup; the vector index itself
//! is still lazy, so the first search request pays the embedding cost.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/search` | Rank the catalog against a query with facets |
//! | `POST` | `/neighbors` | Nearest neighbors + note comparison for an entry |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! All error responses share one schema:
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "empty search request" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404),
//! `embedding_uninitialized` (400), `internal` (500). A successful search
//! with no surviving candidates returns `200` with an empty `results`
//! array — only failures use the error schema.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so the browser front end
//! can call the API directly.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::catalog::load_catalog;
use crate::config::Config;
use crate::embedding::{create_embedder, EmbedError};
use crate::index::{PerfumeNotFound, SearchEngine};
use crate::models::{SearchQuery, SearchResult};
use crate::notes::{compare_notes, NoteComparison};
use crate::reason::recommendation_reason;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    engine: Arc<SearchEngine>,
    config: Arc<Config>,
}

/// Starts the HTTP server on the configured bind address.
///
/// Loads the catalog and embedding backend, then serves until the process
/// is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let catalog = load_catalog(&config.catalog.path)?;
    let embedder = create_embedder(&config.embedding)?;
    let engine = Arc::new(SearchEngine::new(
        catalog,
        embedder,
        config.weights.clone(),
    ));

    let state = AppState {
        engine,
        config: Arc::new(config.clone()),
    };
    let app = router(state);

    let bind_addr = &config.server.bind;
    tracing::info!(%bind_addr, "search API listening");

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/search", post(handle_search))
        .route("/neighbors", post(handle_neighbors))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state)
}

// ============ Error response ============

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    /// Machine-readable error code (e.g., `"bad_request"`, `"not_found"`).
    code: String,
    /// Human-readable error message.
    message: String,
}

/// Internal error type that converts into an HTTP response.
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

/// Map an engine failure to the most fitting HTTP error.
///
/// An uninitialized embedding provider is a configuration problem the
/// client can report precisely; a missing catalog id is the client's
/// mistake; everything else is an internal failure. Classification works
/// by downcast on the typed errors, never on message text.
fn classify_error(err: anyhow::Error) -> AppError {
    if matches!(err.downcast_ref::<EmbedError>(), Some(EmbedError::Uninitialized)) {
        return AppError {
            status: StatusCode::BAD_REQUEST,
            code: "embedding_uninitialized".to_string(),
            message: err.to_string(),
        };
    }

    if let Some(missing) = err.downcast_ref::<PerfumeNotFound>() {
        return not_found(missing.to_string());
    }

    let msg = err.to_string();
    tracing::error!(error = %msg, "request failed");
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal".to_string(),
        message: msg,
    }
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

// ============ POST /search ============

#[derive(Serialize)]
struct SearchResponse {
    results: Vec<SearchResult>,
}

/// Handler for `POST /search`.
///
/// Accepts a [`SearchQuery`] body. A request with neither text nor any
/// facet is rejected here, before it reaches the engine.
async fn handle_search(
    State(state): State<AppState>,
    Json(query): Json<SearchQuery>,
) -> Result<Json<SearchResponse>, AppError> {
    if query.is_empty() {
        return Err(bad_request("empty search request: provide text or a facet"));
    }

    let results = state
        .engine
        .search(&query, state.config.search.top_k)
        .await
        .map_err(classify_error)?;

    Ok(Json(SearchResponse { results }))
}

// ============ POST /neighbors ============

#[derive(Deserialize)]
struct NeighborsRequest {
    id: String,
    #[serde(default)]
    limit: Option<usize>,
    /// Optional original query text, used for the per-neighbor reason.
    #[serde(default)]
    query: Option<String>,
}

#[derive(Serialize)]
struct NeighborSummary {
    name: String,
    brand: String,
    similarity: f32,
    reason: String,
}

#[derive(Serialize)]
struct NeighborsResponse {
    id: String,
    neighbors: Vec<NeighborSummary>,
    notes: NoteComparison,
}

/// Handler for `POST /neighbors`.
///
/// Returns the target's nearest neighbors with similarity scores and the
/// note-overlap comparison the text-generation collaborator consumes.
async fn handle_neighbors(
    State(state): State<AppState>,
    Json(req): Json<NeighborsRequest>,
) -> Result<Json<NeighborsResponse>, AppError> {
    let target = state
        .engine
        .find(&req.id)
        .ok_or_else(|| not_found(format!("perfume not found: {}", req.id)))?
        .clone();

    let limit = req.limit.unwrap_or(state.config.search.neighbor_limit);
    let neighbors = state
        .engine
        .neighbors(&req.id, limit)
        .await
        .map_err(classify_error)?;

    let neighbor_texts: Vec<&str> = neighbors.iter().map(|n| n.text.as_str()).collect();
    let notes = compare_notes(&target.text, &neighbor_texts);

    let query_text = req.query.unwrap_or_default();
    let summaries = neighbors
        .iter()
        .map(|n| NeighborSummary {
            name: n.metadata.name_jp.clone(),
            brand: n.metadata.brand.clone(),
            similarity: n.score,
            reason: recommendation_reason(
                &query_text,
                &crate::models::Perfume {
                    text: n.text.clone(),
                    metadata: n.metadata.clone(),
                },
                n.score,
            ),
        })
        .collect();

    Ok(Json(NeighborsResponse {
        id: req.id,
        neighbors: summaries,
        notes,
    }))
}
