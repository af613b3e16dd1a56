//! HTTP API server with observability for the student roster system.
//!
//! Provides REST endpoints for registering students and managing their
//! enrollments, with structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod extract;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post, put};
use document_store::DocumentStore;
use domain::{
    Course, DispatcherConfig, ServiceError, TracingAuditSink, default_dispatcher, seed_courses,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::students::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::render))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route(
            "/api/students",
            get(routes::students::list).post(routes::students::register),
        )
        .route(
            "/api/students/{id}",
            put(routes::students::edit_personal_info).delete(routes::students::unregister),
        )
        .route(
            "/api/students/{id}/enrollments",
            post(routes::students::enroll),
        )
        .route(
            "/api/students/{id}/enrollments/{number}",
            put(routes::students::transfer),
        )
        .route(
            "/api/students/{id}/enrollments/{number}/deletion",
            post(routes::students::disenroll),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the default application state over a store.
///
/// Seeds the default course catalog and wires the reference dispatcher with
/// audit records going to `tracing`.
pub async fn create_default_state<S>(
    store: S,
    config: DispatcherConfig,
) -> Result<Arc<AppState>, ServiceError>
where
    S: DocumentStore + Clone + 'static,
{
    seed_courses(store.clone(), &Course::default_catalog()).await?;

    let dispatcher = default_dispatcher(store, config, Arc::new(TracingAuditSink));
    Ok(Arc::new(AppState::new(dispatcher)))
}
