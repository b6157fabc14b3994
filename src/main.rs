//! Main entry point for the Nano Banana API

use std::sync::Arc;
use std::time::Duration;

use nano_banana_api::{
    api,
    blob::FileStore,
    config::Settings,
    generation::Orchestrator,
    model::{GeminiClient, ImageModel},
    store::{MemStore, Store},
    AppState,
};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Load configuration
    let settings = Settings::load()?;
    settings.validate()?;

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.logging.level.clone()));

    if settings.logging.format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .init();
    }

    info!("Starting Nano Banana API");

    if settings.gemini.api_key.is_empty() {
        warn!("No Gemini API key configured; generation requests will fail");
    }

    // Wire up the store, blob area, model client and orchestrator
    let store: Arc<dyn Store> = Arc::new(MemStore::new());

    let files = Arc::new(FileStore::new(&settings.storage.upload_dir));
    files.ensure_dir().await?;

    let model: Arc<dyn ImageModel> = Arc::new(GeminiClient::new(&settings.gemini)?);

    let orchestrator = Arc::new(Orchestrator::new(
        store.clone(),
        model,
        files.clone(),
        Duration::from_millis(settings.gemini.variation_delay_ms),
    ));

    let state = Arc::new(AppState {
        settings: settings.clone(),
        store,
        files,
        orchestrator,
    });

    // Build the router
    let app = api::routes::create_router(state);

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
