//! Router assembly: HTTP endpoints, WebSocket upgrade, static files, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod http;
pub mod ws;

/// Build the application router with:
/// - WebSocket at `/ws`
/// - JSON API under `/api/v1/...`
/// - Static authoring frontend from `./static` with index fallback
/// - CORS (allow any origin/method/headers)
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
    let static_service = ServeDir::new("./static")
        .append_index_html_on_directories(true)
        .not_found_service(ServeFile::new("./static/index.html"));

    Router::new()
        // WebSocket
        .route("/ws", get(ws::ws_upgrade))
        // Sections
        .route("/api/v1/health", get(http::http_health))
        .route("/api/v1/sections/sectionize", post(http::http_post_sectionize))
        .route("/api/v1/sections/recombine", post(http::http_post_recombine))
        .route("/api/v1/lessons/generate", post(http::http_post_generate_lesson))
        // Courses and lessons
        .route("/api/v1/courses", get(http::http_list_courses))
        .route(
            "/api/v1/courses/:course_id/lessons",
            get(http::http_list_lessons).post(http::http_create_lesson),
        )
        .route("/api/v1/courses/:course_id/lessons/reorder", put(http::http_reorder_lessons))
        .route("/api/v1/courses/:course_id/lessons/:lesson_id", get(http::http_get_lesson))
        .route(
            "/api/v1/courses/:course_id/lessons/:lesson_id/sections",
            put(http::http_put_lesson_sections),
        )
        .route("/api/v1/courses/:course_id/assignments", post(http::http_create_assignment))
        // Flow
        .route("/api/v1/courses/:course_id/flow", get(http::http_get_flow))
        .route("/api/v1/courses/:course_id/flow/move", post(http::http_post_flow_move))
        // Progress
        .route("/api/v1/courses/:course_id/progress", get(http::http_get_progress))
        .route("/api/v1/courses/:course_id/progress/sync", post(http::http_post_progress_sync))
        // State + CORS + HTTP tracing
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Frontend fallback
        .fallback_service(static_service)
}
