//! Drawing analysis backend.
//!
//! Accepts technical drawings (PDF or image), validates them, asks a
//! chat-completion model for a structured reading and returns the model's
//! JSON report enriched with request metadata.

pub mod api;
pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod middleware;
pub mod routes;
pub mod services;

pub use app::{create_app, AppState};
pub use config::Settings;
