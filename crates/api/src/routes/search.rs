//! Full-text search routes.

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::AppState;
use deciframe_core::search::{clamp_limit, SearchScope};
use deciframe_db::SearchRepository;

/// Creates the search router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/search", get(search))
        .route("/search/suggestions", get(suggestions))
        .route("/search/stats", get(stats))
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    q: String,
    scope: Option<String>,
    limit: Option<u64>,
}

/// GET /search - Ranked full-text search over problems, cases, and projects.
///
/// An empty or stopword-only query returns no hits rather than an error.
async fn search(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let scope = query
        .scope
        .as_deref()
        .map_or(SearchScope::All, SearchScope::parse);
    let limit = clamp_limit(query.limit);

    let hits = SearchRepository::new(state.db.clone())
        .search(auth.organization_id(), &query.q, scope, limit)
        .await;
    Ok(Json(json!({ "query": query.q, "results": hits })))
}

/// GET /search/suggestions - Title prefix completions.
async fn suggestions(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = clamp_limit(query.limit).min(10);
    let suggestions = SearchRepository::new(state.db.clone())
        .suggestions(auth.organization_id(), &query.q, limit)
        .await;
    Ok(Json(json!({ "suggestions": suggestions })))
}

/// GET /search/stats - Indexed row counts per entity type.
async fn stats(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let stats = SearchRepository::new(state.db.clone())
        .stats(auth.organization_id())
        .await?;
    Ok(Json(stats))
}
