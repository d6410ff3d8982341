//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes under `/api/v1`
//! - Authentication middleware and the `AuthUser` extractor
//! - Request metrics
//! - Error-to-response mapping

pub mod de;
pub mod error;
pub mod middleware;
pub mod routes;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::Router;
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use deciframe_core::workflow::ActionRegistry;
use deciframe_engine::{EventQueue, ReportPipeline, Triggers};
use deciframe_shared::{AppSettings, JwtService};

/// Per-endpoint request counters, keyed by `METHOD matched-path`.
#[derive(Debug, Clone, Default)]
pub struct RequestMetrics {
    counters: Arc<Mutex<HashMap<String, u64>>>,
}

impl RequestMetrics {
    /// Increments the counter for one endpoint.
    pub fn record(&self, endpoint: &str) {
        if let Ok(mut counters) = self.counters.lock() {
            *counters.entry(endpoint.to_string()).or_insert(0) += 1;
        }
    }

    /// Snapshot of all counters.
    #[must_use]
    pub fn snapshot(&self) -> HashMap<String, u64> {
        self.counters.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

/// Application state shared across handlers.
///
/// Handlers construct repositories from `db` per request; everything else
/// here is a cheap clone of a shared service.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: DatabaseConnection,
    /// JWT service for session tokens.
    pub jwt: Arc<JwtService>,
    /// Tenant defaults and feature gates.
    pub settings: AppSettings,
    /// Typed event raise methods over the publish port.
    pub triggers: Triggers,
    /// Producer handle of the workflow event queue, for metrics.
    pub queue: EventQueue,
    /// The action vocabulary, used to validate workflow definitions at save.
    pub registry: Arc<ActionRegistry>,
    /// Report pipeline, for manual runs.
    pub pipeline: ReportPipeline,
    /// Request counters served by `/metrics`.
    pub metrics: RequestMetrics,
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes_with_state(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
