//! Axum router configuration with middleware.
//!
//! All routes are under `/api/v1/`.
//! Middleware: CORS, request tracing.

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // Chats
        .route(
            "/chats",
            get(handlers::chat::list_my_chats).post(handlers::chat::create_chat),
        )
        .route("/chats/summaries", get(handlers::chat::list_my_summaries))
        .route("/chats/all", get(handlers::chat::list_all_chats))
        .route("/chats/count", get(handlers::chat::count_chats))
        .route("/chats/exists", get(handlers::chat::title_exists))
        .route("/chats/find", get(handlers::chat::find_by_participants))
        .route("/chats/{id}", get(handlers::chat::get_chat))
        .route("/chats/{id}/view", get(handlers::chat::view_chat))
        // Messages
        .route("/chats/{id}/messages", post(handlers::chat::post_message))
        .route(
            "/chats/{id}/messages/{message_id}/read",
            post(handlers::chat::mark_read),
        )
        // User directory
        .route(
            "/users",
            get(handlers::user::list_users).post(handlers::user::register_user),
        )
        .route("/users/{id}", get(handlers::user::get_user));

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health - Liveness plus a reader-pool round trip.
async fn health_check(
    State(state): State<AppState>,
) -> (StatusCode, axum::Json<serde_json::Value>) {
    let (status, database) = match state.db_pool.ping().await {
        Ok(()) => (StatusCode::OK, "ok"),
        Err(e) => {
            tracing::warn!(error = %e, "Health check could not reach the database");
            (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
        }
    };

    (
        status,
        axum::Json(serde_json::json!({
            "status": if status.is_success() { "ok" } else { "degraded" },
            "version": env!("CARGO_PKG_VERSION"),
            "database": database,
            "data_dir": state.data_dir.display().to_string(),
            "search_order": state.config.search.order,
        })),
    )
}
