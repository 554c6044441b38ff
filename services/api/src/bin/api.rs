//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{DbAdapter, DbDnaAdapter},
    config::Config,
    error::ApiError,
    web::{
        cors_layer, get_dashboard_handler, get_recommendations_handler, rest::ApiDoc,
        state::AppState,
    },
};
use axum::{http::HeaderValue, routing::get, Router};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::info;
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

    // --- 2. Connect to Database & Run Migrations ---
    info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    let storage = Arc::new(DbAdapter::new(db_pool.clone()));
    info!("Running database migrations...");
    storage
        .run_migrations()
        .await
        .map_err(|e| ApiError::Internal(format!("Migration failure: {}", e)))?;
    info!("Database migrations complete.");

    // --- 3. Initialize Adapters & Shared State ---
    let dna = Arc::new(DbDnaAdapter::new(db_pool));
    let app_state = Arc::new(AppState::new(storage, dna, config.clone()));

    let cors_origin = config
        .cors_origin
        .parse::<HeaderValue>()
        .map_err(|e| ApiError::Internal(format!("Invalid CORS_ORIGIN: {}", e)))?;
    let cors = cors_layer(cors_origin);

    // --- 4. Create the Web Router ---
    let api_router = Router::new()
        .route("/dashboard", get(get_dashboard_handler))
        .route("/recommendations", get(get_recommendations_handler))
        .layer(cors)
        .with_state(app_state);

    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 5. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
