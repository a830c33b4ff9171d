use anyhow::Result;
use std::sync::Arc;

use drawing_analyzer::{config, create_app, logging, services::OpenAiGateway, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let settings = config::Settings::from_env()?;

    // Initialize logging
    logging::init_logging(&settings.env)?;

    tracing::info!(
        env = ?settings.env,
        server_addr = %settings.server_addr,
        max_upload_bytes = settings.max_upload_bytes,
        "Starting drawing analyzer"
    );

    if settings.llm.api_key.is_none() {
        tracing::warn!("OPENAI_API_KEY is not set - analysis requests will fail until it is configured");
    }

    // Create model gateway
    let gateway = OpenAiGateway::new(&settings.llm)?;

    // Create application state
    let state = AppState::new(settings.clone(), Arc::new(gateway));

    // Build application
    let app = create_app(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&settings.server_addr).await?;
    tracing::info!("Listening on {}", settings.server_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
