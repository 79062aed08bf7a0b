//! API Routes
//!
//! Configures the Axum router with all admin endpoints.

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    close_db_handler, flush_complete_handler, health_handler, list_tasks_handler, open_db_handler,
    pause_task_handler, reload_config_handler, replace_entities_handler, resume_task_handler,
    run_task_handler, visibility_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /health` - Health check endpoint
/// - `GET /tasks` - Status of every background task
/// - `POST /tasks/:name/run` - Force one execution
/// - `POST /tasks/:name/pause`, `POST /tasks/:name/resume`
/// - `POST /db/open`, `POST /db/close` - Shared database connection
/// - `PUT /entities` - Replace the tracked player set
/// - `PUT /entities/:name/visibility` - Hide or show one player
/// - `POST /host/flush-complete` - Game server finished saving
/// - `POST /config/reload` - Re-read configuration sources
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/tasks", get(list_tasks_handler))
        .route("/tasks/:name/run", post(run_task_handler))
        .route("/tasks/:name/pause", post(pause_task_handler))
        .route("/tasks/:name/resume", post(resume_task_handler))
        .route("/db/open", post(open_db_handler))
        .route("/db/close", post(close_db_handler))
        .route("/entities", put(replace_entities_handler))
        .route("/entities/:name/visibility", put(visibility_handler))
        .route("/host/flush-complete", post(flush_complete_handler))
        .route("/config/reload", post(reload_config_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
