//! Per-endpoint request counting.

use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::Response,
};

use crate::AppState;

/// Counts one request against its matched route pattern.
///
/// Unmatched requests (404s) are counted under the raw path's method only,
/// so counter cardinality stays bounded by the route table.
pub async fn track_requests(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let endpoint = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(
            || format!("{} <unmatched>", request.method()),
            |path| format!("{} {}", request.method(), path.as_str()),
        );
    state.metrics.record(&endpoint);
    next.run(request).await
}
