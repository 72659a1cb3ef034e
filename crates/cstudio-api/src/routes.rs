//! API routes.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post, put};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::limit::RequestBodyLimitLayer;

use crate::handlers::images::{edit_image, get_images, start_batch, suggest, update_source};
use crate::handlers::video::{
    analyze_source, get_video, set_product_image, set_prompt, start_generation,
};
use crate::handlers::{create_session, delete_session, get_session, health, ready};
use crate::metrics::metrics_middleware;
use crate::middleware::{
    cors_layer, rate_limit_middleware, request_id, request_logging, security_headers,
    RateLimiterCache,
};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let session_routes = Router::new()
        .route("/sessions", post(create_session))
        .route("/sessions/:session_id", get(get_session).delete(delete_session));

    let image_routes = Router::new()
        .route("/sessions/:session_id/images", get(get_images))
        .route("/sessions/:session_id/images/source", put(update_source))
        .route("/sessions/:session_id/images/scenes", post(suggest))
        .route("/sessions/:session_id/images/batch", post(start_batch))
        .route("/sessions/:session_id/images/:slot_id/edit", post(edit_image));

    let video_routes = Router::new()
        .route("/sessions/:session_id/video", get(get_video))
        .route("/sessions/:session_id/video/product", put(set_product_image))
        .route("/sessions/:session_id/video/analyze", post(analyze_source))
        .route("/sessions/:session_id/video/prompt", put(set_prompt))
        .route("/sessions/:session_id/video/generate", post(start_generation));

    let rate_limiter = Arc::new(RateLimiterCache::new(state.config.rate_limit_rps));

    let api_routes = Router::new()
        .merge(session_routes)
        .merge(image_routes)
        .merge(video_routes)
        .layer(middleware::from_fn_with_state(
            rate_limiter,
            rate_limit_middleware,
        ));

    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/ready", get(ready));

    let metrics_routes = match metrics_handle {
        Some(handle) => Router::new().route("/metrics", get(move || async move { handle.render() })),
        None => Router::new(),
    };

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .merge(metrics_routes)
        // Size cap comes from MAX_BODY_SIZE, not the extractor default
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(security_headers))
        .layer(middleware::from_fn(request_logging))
        .layer(middleware::from_fn(request_id))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}
