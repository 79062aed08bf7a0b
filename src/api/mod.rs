//! API Module
//!
//! HTTP handlers and routing for the admin REST API.
//!
//! # Endpoints
//! - `GET /health` - Health check endpoint
//! - `GET /tasks` - Background task status
//! - `POST /tasks/:name/{run,pause,resume}` - Task control
//! - `POST /db/{open,close}` - Shared database connection
//! - `PUT /entities`, `PUT /entities/:name/visibility` - Tracked players
//! - `POST /host/flush-complete` - Save completion from the game server
//! - `POST /config/reload` - Configuration reload

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
