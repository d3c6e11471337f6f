use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::research::ResearchClient;

pub mod handlers;
pub mod models;

pub fn create_router(research: Arc<ResearchClient>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let static_dir = research.config().static_dir.clone();
    let upload_limit = research.config().max_upload_bytes;

    Router::new()
        .route("/api/page", post(handlers::page_handler))
        .route("/api/search", post(handlers::search_handler))
        .route(
            "/api/image",
            post(handlers::image_handler).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/health", get(handlers::health_handler))
        .with_state(research)
        // single-page UI
        .fallback_service(ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
