use axum::{extract::DefaultBodyLimit, http::HeaderValue, Router};
use std::sync::Arc;
use tower_http::{
    cors::{AllowHeaders, AllowMethods, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::config::Settings;
use crate::domain::UploadPolicy;
use crate::middleware::request_id_layer;
use crate::routes;
use crate::services::{AnalysisGateway, PromptBuilder};

/// Shared application state. Immutable after startup.
#[derive(Clone)]
pub struct AppState {
    pub settings: Settings,
    pub upload_policy: UploadPolicy,
    pub prompt_builder: PromptBuilder,
    /// Injected so tests can substitute the model provider.
    pub gateway: Arc<dyn AnalysisGateway>,
}

impl AppState {
    pub fn new(settings: Settings, gateway: Arc<dyn AnalysisGateway>) -> Arc<Self> {
        Arc::new(Self {
            upload_policy: UploadPolicy::new(settings.max_upload_bytes),
            prompt_builder: PromptBuilder::new(settings.pdf_text_char_budget),
            settings,
            gateway,
        })
    }

    /// Hard cap on request bodies. Larger than the upload ceiling so an
    /// oversized file can still be measured and reported.
    pub fn body_limit_bytes(&self) -> usize {
        usize::try_from(self.settings.max_upload_bytes.saturating_mul(2)).unwrap_or(usize::MAX)
    }
}

/// Build the complete application with all middleware
pub fn create_app(state: Arc<AppState>) -> Router {
    let cors = build_cors_layer(&state.settings);

    // DEBUG spans keep INFO output quiet
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::DEBUG))
        .on_request(DefaultOnRequest::new().level(Level::DEBUG))
        .on_response(DefaultOnResponse::new().level(Level::DEBUG));

    let (set_request_id, propagate_request_id) = request_id_layer();
    let body_limit = state.body_limit_bytes();

    Router::new()
        .merge(routes::api_router())
        // Middleware stack (applied bottom-up)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(propagate_request_id)
        .layer(trace_layer)
        .layer(set_request_id)
        .layer(cors)
        .with_state(state)
}

fn build_cors_layer(settings: &Settings) -> CorsLayer {
    let origins: Vec<HeaderValue> = settings
        .cors_allow_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let max_age = if settings.env.is_dev() {
        std::time::Duration::from_secs(86400)
    } else {
        std::time::Duration::from_secs(3600)
    };

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(AllowMethods::list([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::ACCEPT,
            axum::http::HeaderName::from_static("x-request-id"),
        ]))
        .expose_headers([
            axum::http::header::CONTENT_DISPOSITION,
            axum::http::HeaderName::from_static("x-request-id"),
        ])
        .max_age(max_age)
}
