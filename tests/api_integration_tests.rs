//! Integration Tests for API Endpoints
//!
//! Tests full request/response cycles against the router, with real task
//! drivers running behind it.

use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;
use warden::api::create_router;
use warden::database::ConnectionRegistry;
use warden::host::{ConsoleHost, EntityDirectory, ServerHost};
use warden::{AppState, Config, ConfigHandle, TaskSet};

// == Helper Functions ==

/// Console output captured for inspection.
#[derive(Clone, Default)]
struct Console(Arc<Mutex<Vec<u8>>>);

impl Write for Console {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl Console {
    fn lines(&self) -> Vec<String> {
        String::from_utf8(self.0.lock().unwrap().clone())
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }
}

struct TestApp {
    router: Router,
    tasks: TaskSet,
    console: Console,
}

impl TestApp {
    fn new(config: Config) -> Self {
        let config = ConfigHandle::new(config);
        let console = Console::default();
        let entities = Arc::new(EntityDirectory::new());
        let host = Arc::new(ConsoleHost::with_writer(console.clone(), Arc::clone(&entities)));
        let registry = Arc::new(ConnectionRegistry::new(config.clone()));
        let tasks = TaskSet::spawn(
            config.clone(),
            Arc::clone(&host) as Arc<dyn ServerHost>,
            Arc::clone(&registry),
            Duration::from_millis(10),
        );
        let state = AppState::new(config, tasks.clone(), registry, entities, host);

        Self {
            router: create_router(state),
            tasks,
            console,
        }
    }

    async fn send(&self, method: &str, uri: &str, body: Option<&str>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                request = request.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }
}

// == Health ==

#[tokio::test]
async fn test_health_endpoint() {
    let app = TestApp::new(Config::default());

    let (status, json) = app.send("GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    assert!(json.get("timestamp").is_some());
    app.tasks.shutdown().await;
}

// == Task Control ==

#[tokio::test]
async fn test_list_tasks() {
    let app = TestApp::new(Config::default());

    let (status, json) = app.send("GET", "/tasks", None).await;

    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|task| task["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["autoBackup", "autoMap", "autoRun", "playerTracker"]);
    app.tasks.shutdown().await;
}

#[tokio::test]
async fn test_pause_and_resume_task() {
    let app = TestApp::new(Config::default());

    let (status, json) = app.send("POST", "/tasks/autoBackup/pause", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["action"], "pause");
    assert_eq!(json["task"]["paused"], true);

    let (status, json) = app.send("POST", "/tasks/autoBackup/resume", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["task"]["paused"], false);
    app.tasks.shutdown().await;
}

#[tokio::test]
async fn test_unknown_task_returns_404() {
    let app = TestApp::new(Config::default());

    let (status, json) = app.send("POST", "/tasks/autoRestart/run", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json["error"].as_str().unwrap().contains("autoRestart"));
    app.tasks.shutdown().await;
}

#[cfg(unix)]
#[tokio::test]
async fn test_forced_run_drives_console() {
    let app = TestApp::new(
        Config::default()
            .with("autoRunCommand", "true")
            .with("autoRunAnnounce", "true")
            .with("flushTimeoutSeconds", "0"),
    );

    let (status, _) = app.send("POST", "/tasks/autoRun/run", None).await;
    assert_eq!(status, StatusCode::OK);

    for _ in 0..300 {
        if app.console.lines().iter().any(|line| line == "save-on") {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    assert_eq!(
        app.console.lines(),
        vec!["say Cron started!", "save-all", "save-off", "say Cron complete!", "save-on"]
    );

    let (_, json) = app.send("GET", "/tasks", None).await;
    let cron = json
        .as_array()
        .unwrap()
        .iter()
        .find(|task| task["name"] == "autoRun")
        .unwrap();
    assert_eq!(cron["force_requested"], false);
    assert!(cron["last_run"].is_string());
    app.tasks.shutdown().await;
}

// == Entities ==

#[tokio::test]
async fn test_entity_visibility() {
    let app = TestApp::new(Config::default());

    let (status, json) = app
        .send(
            "PUT",
            "/entities",
            Some(
                r#"{"entities":[
                    {"name":"alex","group":"default","dimension":"overworld","position":{"x":1,"y":64,"z":2}},
                    {"name":"steve","group":"admins","dimension":"nether","position":{"x":-8,"y":40,"z":5}}
                ]}"#,
            ),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["count"], 2);

    let (status, json) = app
        .send("PUT", "/entities/steve/visibility", Some(r#"{"hidden":true}"#))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["hidden"], true);

    let (status, _) = app
        .send("PUT", "/entities/herobrine/visibility", Some(r#"{"hidden":true}"#))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    app.tasks.shutdown().await;
}

#[tokio::test]
async fn test_duplicate_entities_rejected() {
    let app = TestApp::new(Config::default());

    let (status, json) = app
        .send(
            "PUT",
            "/entities",
            Some(
                r#"{"entities":[
                    {"name":"alex","group":"g","dimension":"end","position":{"x":0,"y":0,"z":0}},
                    {"name":"alex","group":"g","dimension":"end","position":{"x":0,"y":0,"z":0}}
                ]}"#,
            ),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("Duplicate"));
    app.tasks.shutdown().await;
}

// == Database ==

#[tokio::test]
async fn test_db_open_disabled() {
    let app = TestApp::new(Config::default());

    let (status, json) = app.send("POST", "/db/open", None).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["error"], "Database access is disabled");
    app.tasks.shutdown().await;
}

#[tokio::test]
async fn test_db_open_unknown_connector() {
    let app = TestApp::new(
        Config::default()
            .with("dbEnabled", "true")
            .with("dbConnector", "oracle"),
    );

    let (status, json) = app.send("POST", "/db/open", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("oracle"));
    app.tasks.shutdown().await;
}

#[cfg(feature = "sqlite")]
#[tokio::test]
async fn test_db_open_and_close_sqlite() {
    let dir = tempfile::tempdir().unwrap();
    let app = TestApp::new(
        Config::default()
            .with("dbEnabled", "true")
            .with("dbConnector", "sqlite")
            .with("dbSQLitePath", dir.path().join("admin.db").display().to_string()),
    );

    let (status, json) = app.send("POST", "/db/open", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["backend"], "sqlite");
    assert_eq!(json["open"], true);

    let (status, _) = app.send("POST", "/db/open", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.send("POST", "/db/close", None).await;
    assert_eq!(status, StatusCode::OK);
    app.tasks.shutdown().await;
}

// == Host ==

#[tokio::test]
async fn test_flush_complete() {
    let app = TestApp::new(Config::default());

    let (status, json) = app.send("POST", "/host/flush-complete", None).await;

    assert_eq!(status, StatusCode::OK);
    assert!(json["message"].as_str().is_some());
    app.tasks.shutdown().await;
}
