//! Axum HTTP API server for the creative studio.
//!
//! This crate provides:
//! - In-memory studio sessions with idle expiry
//! - Image suite endpoints (scene ideas, batch generation, per-image edits)
//! - Video suite endpoints (script/video analysis, background video generation)
//! - Rate limiting, security headers and Prometheus metrics

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod session;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use services::SessionSweeper;
pub use session::{Session, SessionStore};
pub use state::AppState;
