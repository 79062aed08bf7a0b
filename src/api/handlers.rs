//! API Handlers
//!
//! HTTP request handlers for the admin operations: task control, the shared
//! database connection, the entity directory and configuration reload.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    Json,
};
use tracing::info;

use crate::config::{Config, ConfigHandle};
use crate::database::ConnectionRegistry;
use crate::error::{ApiError, Result};
use crate::host::{ConsoleHost, EntityDirectory, ServerHost};
use crate::models::{
    DatabaseResponse, EntitiesResponse, HealthResponse, MessageResponse, ReplaceEntitiesRequest,
    TaskActionResponse, VisibilityRequest, VisibilityResponse,
};
use crate::tasks::{TaskControl, TaskSet, TaskStatus};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: ConfigHandle,
    pub tasks: TaskSet,
    pub registry: Arc<ConnectionRegistry>,
    pub entities: Arc<EntityDirectory>,
    pub console: Arc<ConsoleHost>,
}

impl AppState {
    pub fn new(
        config: ConfigHandle,
        tasks: TaskSet,
        registry: Arc<ConnectionRegistry>,
        entities: Arc<EntityDirectory>,
        console: Arc<ConsoleHost>,
    ) -> Self {
        Self {
            config,
            tasks,
            registry,
            entities,
            console,
        }
    }

    /// Wires the console host, database registry and entity directory, and
    /// starts the background tasks on the current runtime.
    pub fn start(config: Config, poll_interval: Duration) -> Self {
        let config = ConfigHandle::new(config);
        let entities = Arc::new(EntityDirectory::new());
        let console = Arc::new(ConsoleHost::new(Arc::clone(&entities)));
        let registry = Arc::new(ConnectionRegistry::new(config.clone()));

        let tasks = TaskSet::spawn(
            config.clone(),
            Arc::clone(&console) as Arc<dyn ServerHost>,
            Arc::clone(&registry),
            poll_interval,
        );

        Self::new(config, tasks, registry, entities, console)
    }

    fn task(&self, name: &str) -> Result<&Arc<dyn TaskControl>> {
        self.tasks
            .find(name)
            .ok_or_else(|| ApiError::NotFound(format!("task '{}'", name)))
    }
}

// == Tasks ==
/// Handler for GET /tasks
pub async fn list_tasks_handler(State(state): State<AppState>) -> Json<Vec<TaskStatus>> {
    Json(state.tasks.statuses())
}

/// Handler for POST /tasks/:name/run
///
/// Requests one execution on the task's next poll, bypassing its schedule.
pub async fn run_task_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<TaskActionResponse>> {
    let task = state.task(&name)?;
    task.force_run();
    info!(task = %name, "Forced run requested");

    Ok(Json(TaskActionResponse::new("run", task.status())))
}

/// Handler for POST /tasks/:name/pause
pub async fn pause_task_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<TaskActionResponse>> {
    let task = state.task(&name)?;
    task.set_paused(true);
    info!(task = %name, "Task paused");

    Ok(Json(TaskActionResponse::new("pause", task.status())))
}

/// Handler for POST /tasks/:name/resume
pub async fn resume_task_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<TaskActionResponse>> {
    let task = state.task(&name)?;
    task.set_paused(false);
    info!(task = %name, "Task resumed");

    Ok(Json(TaskActionResponse::new("resume", task.status())))
}

// == Database ==
/// Handler for POST /db/open
///
/// Opens the shared connection, or validates and reuses the current one.
pub async fn open_db_handler(State(state): State<AppState>) -> Result<Json<DatabaseResponse>> {
    let connection = state.registry.open().await?;
    Ok(Json(DatabaseResponse::new(
        connection.backend().name(),
        connection.is_open().await,
    )))
}

/// Handler for POST /db/close
pub async fn close_db_handler(State(state): State<AppState>) -> Result<Json<MessageResponse>> {
    state.registry.close().await?;
    Ok(Json(MessageResponse::new("Database connection closed")))
}

// == Entities ==
/// Handler for PUT /entities
pub async fn replace_entities_handler(
    State(state): State<AppState>,
    Json(req): Json<ReplaceEntitiesRequest>,
) -> Result<Json<EntitiesResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(ApiError::InvalidRequest(error_msg));
    }

    state.entities.replace_all(req.entities);
    Ok(Json(EntitiesResponse {
        count: state.entities.len(),
    }))
}

/// Handler for PUT /entities/:name/visibility
///
/// Hides or shows one player in the tracked snapshot.
pub async fn visibility_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(req): Json<VisibilityRequest>,
) -> Result<Json<VisibilityResponse>> {
    if !state.entities.set_hidden(&name, req.hidden) {
        return Err(ApiError::NotFound(format!("entity '{}'", name)));
    }

    Ok(Json(VisibilityResponse {
        name,
        hidden: req.hidden,
    }))
}

// == Host ==
/// Handler for POST /host/flush-complete
///
/// Reports that the game server finished the save it was asked for.
pub async fn flush_complete_handler(State(state): State<AppState>) -> Json<MessageResponse> {
    state.console.mark_flush_complete();
    Json(MessageResponse::new("Flush marked complete"))
}

/// Handler for POST /config/reload
pub async fn reload_config_handler(State(state): State<AppState>) -> Result<Json<MessageResponse>> {
    let config = Config::load()?;
    state.config.reload(config);
    info!("Configuration reloaded");

    Ok(Json(MessageResponse::new("Configuration reloaded")))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{Dimension, Position, TrackedEntity};

    fn test_state(config: Config) -> AppState {
        let config = ConfigHandle::new(config);
        let entities = Arc::new(EntityDirectory::new());
        let console = Arc::new(ConsoleHost::with_writer(std::io::sink(), Arc::clone(&entities)));
        let registry = Arc::new(ConnectionRegistry::new(config.clone()));
        let tasks = TaskSet::spawn(
            config.clone(),
            Arc::clone(&console) as Arc<dyn ServerHost>,
            Arc::clone(&registry),
            Duration::from_millis(10),
        );
        AppState::new(config, tasks, registry, entities, console)
    }

    fn player(name: &str) -> TrackedEntity {
        TrackedEntity {
            name: name.to_string(),
            group: "default".to_string(),
            dimension: Dimension::End,
            position: Position { x: 3, y: 70, z: 9 },
            hidden: false,
        }
    }

    #[tokio::test]
    async fn test_pause_and_resume_handlers() {
        let state = test_state(Config::default());

        let Json(paused) = pause_task_handler(State(state.clone()), Path("autoMap".to_string()))
            .await
            .unwrap();
        assert!(paused.task.paused);

        let Json(resumed) = resume_task_handler(State(state.clone()), Path("autoMap".to_string()))
            .await
            .unwrap();
        assert!(!resumed.task.paused);

        state.tasks.shutdown().await;
    }

    #[tokio::test]
    async fn test_unknown_task_not_found() {
        let state = test_state(Config::default());

        let result = run_task_handler(State(state.clone()), Path("autoRestart".to_string())).await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));

        state.tasks.shutdown().await;
    }

    #[tokio::test]
    async fn test_entity_handlers() {
        let state = test_state(Config::default());

        let req = ReplaceEntitiesRequest {
            entities: vec![player("alex"), player("steve")],
        };
        let Json(replaced) = replace_entities_handler(State(state.clone()), Json(req))
            .await
            .unwrap();
        assert_eq!(replaced.count, 2);

        let Json(hidden) = visibility_handler(
            State(state.clone()),
            Path("steve".to_string()),
            Json(VisibilityRequest { hidden: true }),
        )
        .await
        .unwrap();
        assert!(hidden.hidden);
        assert!(state.console.tracked_entities().iter().any(|e| e.name == "steve" && e.hidden));

        let missing = visibility_handler(
            State(state.clone()),
            Path("herobrine".to_string()),
            Json(VisibilityRequest { hidden: true }),
        )
        .await;
        assert!(matches!(missing, Err(ApiError::NotFound(_))));

        state.tasks.shutdown().await;
    }

    #[tokio::test]
    async fn test_open_db_when_disabled() {
        let state = test_state(Config::default());

        let result = open_db_handler(State(state.clone())).await;
        assert!(matches!(
            result,
            Err(ApiError::Connection(crate::error::ConnectionError::Disabled))
        ));

        state.tasks.shutdown().await;
    }

    #[tokio::test]
    async fn test_flush_complete_clears_flag() {
        let state = test_state(Config::default());

        state.console.trigger_full_flush();
        assert!(state.console.is_flush_in_progress());

        let Json(resp) = flush_complete_handler(State(state.clone())).await;
        assert_eq!(resp.message, "Flush marked complete");
        assert!(!state.console.is_flush_in_progress());

        state.tasks.shutdown().await;
    }
}
