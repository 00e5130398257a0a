//! API routes.

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::limit::RequestBodyLimitLayer;

use crate::handlers::assemble::{assemble_clips, assembly_progress};
use crate::handlers::clips::get_clips;
use crate::handlers::download::download_clip;
use crate::handlers::export::export_clips;
use crate::handlers::health::{health, ready};
use crate::middleware::{cors_layer, request_id, request_logging};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Ranked clip listing
        .route("/clips", get(get_clips))
        // Single-clip download proxy
        .route("/download", get(download_clip))
        // Compilation assembly
        .route("/assemble", post(assemble_clips))
        .route("/assemble/progress", get(assembly_progress))
        // Bulk export to disk
        .route("/export", post(export_clips));

    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/ready", get(ready));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(middleware::from_fn(request_id))
        .layer(middleware::from_fn(request_logging))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}
