use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::app::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub services: ServiceHealth,
}

#[derive(Serialize)]
pub struct ServiceHealth {
    pub llm: String,
}

/// Health check endpoint. Never calls the provider.
///
/// A missing credential only degrades the service: uploads can still be
/// validated, analyses fail with a configuration error.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let configured = state.gateway.is_configured();

    let (status, llm) = if configured {
        ("healthy", "configured")
    } else {
        ("degraded", "missing_credential")
    };

    Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        services: ServiceHealth {
            llm: llm.to_string(),
        },
    })
}
