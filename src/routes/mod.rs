pub mod analyze;
pub mod health;
pub mod symbols;

use axum::{routing::get, routing::post, Router};
use std::sync::Arc;

use crate::app::AppState;

/// Build the API router with all routes
pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health::health_check))
        // Analysis
        .route("/api/analyze", post(analyze::analyze_drawing))
        .route("/api/analyze/limits", get(analyze::upload_limits))
        // Symbol catalog
        .route("/api/symbols", get(symbols::list_symbols))
        .route("/api/symbols/:symbol_id", get(symbols::get_symbol))
}
