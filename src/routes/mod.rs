use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    middleware::{make_span_with_request_id, request_id_middleware},
    state::AppState,
};

pub mod accounts;
pub mod catalog;
pub mod profile;
pub mod quiz;
pub mod recommendations;

/// Catalog feeds are much larger than any other request body
const CATALOG_IMPORT_BODY_LIMIT: usize = 64 * 1024 * 1024;

/// Creates the application router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
        // Outermost, so the trace span already sees the request id
        .layer(middleware::from_fn(request_id_middleware))
        .layer(CorsLayer::permissive())
}

/// API routes under /api/v1
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/accounts", post(accounts::create))
        .route("/quiz/submit", post(quiz::submit))
        .route("/profile", get(profile::get))
        .route("/recommendations", get(recommendations::recommend))
        .route(
            "/catalog/import",
            post(catalog::import).layer(DefaultBodyLimit::max(CATALOG_IMPORT_BODY_LIMIT)),
        )
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
