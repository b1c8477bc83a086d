//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{
        provider_client, DbAdapter, InMemoryKvStore, OpenAiContentAdapter, OpenAiSpeechAdapter,
    },
    config::Config,
    error::ApiError,
    orchestrator::MoodOrchestrator,
    web::{self, rest::ApiDoc, state::AppState},
};
use axum::http::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    HeaderValue, Method,
};
use axum::{extract::DefaultBodyLimit, Router};
use qalbu_core::ports::{AccountService, KeyValueStore};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Database & Run Migrations, or fall back to demo mode ---
    let (kv, accounts): (Arc<dyn KeyValueStore>, Option<Arc<dyn AccountService>>) =
        match config.database_url.as_deref() {
            Some(database_url) => {
                info!("Connecting to database...");
                let db_pool = PgPoolOptions::new()
                    .max_connections(5)
                    .connect(database_url)
                    .await?;
                let db_adapter = Arc::new(DbAdapter::new(db_pool));
                info!("Running database migrations...");
                db_adapter.run_migrations().await?;
                info!("Database migrations complete.");
                let kv: Arc<dyn KeyValueStore> = db_adapter.clone();
                let accounts: Arc<dyn AccountService> = db_adapter;
                (kv, Some(accounts))
            }
            None => {
                warn!("DATABASE_URL is not set. Running in demo mode: in-memory storage, no accounts.");
                let kv: Arc<dyn KeyValueStore> = Arc::new(InMemoryKvStore::new());
                (kv, None)
            }
        };

    // --- 3. Initialize Provider Adapters ---
    let client = provider_client(config.provider_api_key.as_deref(), &config.provider_api_base);
    if client.is_none() {
        warn!("No provider API key configured. Content and speech requests will fail until PROVIDER_API_KEY is set.");
    }
    let content_adapter = Arc::new(OpenAiContentAdapter::new(
        client.clone(),
        config.content_model.clone(),
        config.content_temperature,
    ));
    let speech_adapter = Arc::new(OpenAiSpeechAdapter::new(
        client,
        config.speech_model.clone(),
        config.speech_voice.clone(),
    ));

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        config: config.clone(),
        orchestrator: MoodOrchestrator::new(content_adapter, kv),
        speech: speech_adapter,
        accounts,
    });

    // --- 5. Create the Web Router ---
    let origin = config.cors_origin.parse::<HeaderValue>().map_err(|e| {
        ApiError::Internal(format!("Invalid CORS_ORIGIN '{}': {}", config.cors_origin, e))
    })?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    let api_router = web::router(app_state)
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(cors);

    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
