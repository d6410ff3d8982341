//! API route definitions.

use axum::{middleware, Router};

use crate::middleware::auth::auth_middleware;
use crate::middleware::metrics::track_requests;
use crate::AppState;

pub mod auth;
pub mod cases;
pub mod departments;
pub mod health;
pub mod metrics;
pub mod notifications;
pub mod organizations;
pub mod problems;
pub mod projects;
pub mod reports;
pub mod search;
pub mod workflows;

/// Creates the API router, wiring the auth middleware around everything
/// except health and the auth endpoints themselves.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    let protected_routes = Router::new()
        .merge(organizations::routes())
        .merge(departments::routes())
        .merge(problems::routes())
        .merge(cases::routes())
        .merge(projects::routes())
        .merge(search::routes())
        .merge(notifications::routes())
        .merge(workflows::routes())
        .merge(reports::routes())
        .merge(metrics::routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(health::routes())
        .merge(auth::routes())
        .merge(protected_routes)
        .layer(middleware::from_fn_with_state(state, track_requests))
}

#[cfg(test)]
mod integration_tests {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use sea_orm::DatabaseConnection;
    use tower::ServiceExt;

    use deciframe_core::workflow::ActionRegistry;
    use deciframe_db::repositories::{ReportDataRepository, ReportRepository, UserRepository};
    use deciframe_engine::{EventQueue, ReportPipeline, Triggers};
    use deciframe_shared::{AppSettings, JwtConfig, JwtService};

    use crate::{AppState, RequestMetrics};

    /// State over a disconnected handle; only routes that never touch the
    /// database respond successfully.
    fn test_state() -> AppState {
        let db = DatabaseConnection::Disconnected;
        let (queue, _worker) = EventQueue::bounded(8);
        AppState {
            db: db.clone(),
            jwt: Arc::new(JwtService::new(JwtConfig {
                secret: "router-test-secret".to_string(),
                session_hours: 1,
            })),
            settings: AppSettings::default(),
            triggers: Triggers::new(Arc::new(queue.clone())),
            queue,
            registry: Arc::new(ActionRegistry::new()),
            pipeline: ReportPipeline::new(
                ReportRepository::new(db.clone()),
                ReportDataRepository::new(db.clone()),
                UserRepository::new(db),
                None,
                "reports",
            ),
            metrics: RequestMetrics::default(),
        }
    }

    fn app() -> (axum::Router, AppState) {
        let state = test_state();
        let router = super::api_routes_with_state(state.clone()).with_state(state.clone());
        (router, state)
    }

    async fn body_string(body: Body) -> String {
        let bytes = to_bytes(body, usize::MAX).await.expect("body read");
        String::from_utf8(bytes.to_vec()).expect("utf8 body")
    }

    #[tokio::test]
    async fn test_protected_route_rejects_missing_token() {
        let (app, _) = app();
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/metrics")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(body_string(response.into_body()).await.contains("missing_token"));
    }

    #[tokio::test]
    async fn test_protected_route_rejects_garbage_token() {
        let (app, _) = app();
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/metrics")
                    .header("Authorization", "Bearer not-a-token")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(body_string(response.into_body()).await.contains("invalid_token"));
    }

    #[tokio::test]
    async fn test_valid_token_reaches_protected_route() {
        let (app, state) = app();
        let token = state.jwt.generate_token(1, 1, "Admin").unwrap();
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/metrics")
                    .header("Authorization", format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_string(response.into_body()).await;
        assert!(body.contains("event_queue"));
    }

    #[tokio::test]
    async fn test_requests_are_counted_per_endpoint() {
        let (app, state) = app();
        let token = state.jwt.generate_token(1, 1, "Admin").unwrap();
        app.oneshot(
            Request::builder()
                .uri("/metrics")
                .header("Authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
        assert_eq!(state.metrics.snapshot().get("GET /metrics"), Some(&1));
    }
}
