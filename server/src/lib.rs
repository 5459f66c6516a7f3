use axum::{
    extract::{Query, State},
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use engine::{SearchEngine, SearchResponse};
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub const SERVICE_NAME: &str = "News Search";

#[derive(Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default)]
    pub max_results: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct AppOptions {
    /// Allowed CORS origins; empty allows any origin.
    pub cors_allow_origins: Vec<String>,
}

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<SearchEngine>,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("max_results must be between 1 and {max}, got {got}")]
    InvalidMaxResults { got: i64, max: usize },
    #[error("Search failed: {0}")]
    SearchFailed(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::InvalidMaxResults { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::SearchFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(serde_json::json!({ "detail": self.to_string() }))).into_response()
    }
}

/// Router over an already built engine. The engine must be fully fitted
/// before this is called; handlers only read it.
pub fn build_app(engine: Arc<SearchEngine>, options: AppOptions) -> Router {
    let cors = CorsLayer::new().allow_origin(allowed_origins(&options.cors_allow_origins)).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/", get(root_handler))
        .route("/api/health", get(health_handler))
        .route("/api/search", get(search_query_handler).post(search_handler))
        .with_state(AppState { engine })
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Parsed origin list, or any origin when nothing usable was configured.
fn allowed_origins(configured: &[String]) -> AllowOrigin {
    let origins: Vec<HeaderValue> = configured.iter().filter_map(|s| s.trim().parse().ok()).collect();
    if origins.is_empty() {
        if !configured.is_empty() {
            tracing::warn!(?configured, "no valid CORS origin configured, allowing any origin");
        }
        AllowOrigin::any()
    } else {
        AllowOrigin::list(origins)
    }
}

async fn root_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
        "endpoints": {
            "search": "/api/search",
            "health": "/api/health",
        },
    }))
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "healthy", "message": "Search service is running" }))
}

pub async fn search_handler(
    State(state): State<AppState>,
    Json(req): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
    run_search(state, req).await
}

pub async fn search_query_handler(
    State(state): State<AppState>,
    Query(req): Query<SearchRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
    run_search(state, req).await
}

async fn run_search(state: AppState, req: SearchRequest) -> Result<Json<SearchResponse>, ApiError> {
    let limit = state.engine.config().ranking.max_results;
    let max_results = match req.max_results {
        Some(k) if k < 1 || k as u64 > limit as u64 => return Err(ApiError::InvalidMaxResults { got: k, max: limit }),
        Some(k) => Some(k as usize),
        None => None,
    };
    let engine = state.engine.clone();
    let query = req.query;
    // Ranking is CPU-bound; keep it off the async workers
    let resp = tokio::task::spawn_blocking(move || engine.search(&query, max_results))
        .await
        .map_err(|err| {
            tracing::error!(error = %err, "search task failed");
            ApiError::SearchFailed(err.to_string())
        })?;
    Ok(Json(resp))
}
