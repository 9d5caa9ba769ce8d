//! Fire Weather Index prediction API
//!
//! Wraps the inference pipeline in a small axum service:
//! `POST /api/predict` (and `/predict`), `GET /` and `GET /api/health`.

pub mod config;
pub mod server;

pub use config::{ApiConfig, ConfigError};
pub use server::{build_router, load_state, start_server, AppState, SharedState, WELCOME_MESSAGE};
