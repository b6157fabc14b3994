//! Router assembly

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::api::handlers;
use crate::middleware::rate_limit::RateLimitLayer;
use crate::AppState;

/// Whole-request body cap; individual files are limited separately
const MAX_BODY_BYTES: usize = 40 * 1024 * 1024;

pub fn create_router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/health", get(handlers::health))
        .route("/generate", post(handlers::generate))
        .route("/generation/:id", get(handlers::generation_status))
        .route("/images/:filename", get(handlers::serve_image))
        .route("/download/:filename", get(handlers::download_image));

    let mut router = Router::new()
        .nest("/api", api)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    if state.settings.rate_limit.enabled {
        router = router.layer(RateLimitLayer::new(
            state.settings.rate_limit.requests_per_second,
            state.settings.rate_limit.burst_size,
        ));
    }

    router.with_state(state)
}
