//! REST API server binary.
//!
//! Resolves configuration from the environment once at startup, then serves
//! the patient management REST API (with OpenAPI/Swagger UI) over a
//! file-backed store.

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{app, AppState};
use pms_core::{config::store_path_from_env_value, CoreConfig, JsonFileStore, RegistryService};

/// Main entry point for the PMS REST API server
///
/// # Environment Variables
/// - `PMS_REST_ADDR`: Server address (default: "0.0.0.0:3000")
/// - `PMS_STORE_PATH`: Patient store file (default: "patients.json")
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the patient store file does not exist,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("PMS_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    let store_path = store_path_from_env_value(std::env::var("PMS_STORE_PATH").ok());
    let cfg = CoreConfig::new(store_path)?;
    if !cfg.store_path().is_file() {
        anyhow::bail!(
            "patient store file does not exist: {} (create it with `pms init`)",
            cfg.store_path().display()
        );
    }

    tracing::info!("-- Starting PMS REST API on {}", addr);
    tracing::info!("-- Patient store: {}", cfg.store_path().display());

    let store = Arc::new(JsonFileStore::new(cfg.store_path()));
    let state = AppState::new(RegistryService::new(store));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app(state)).await?;

    Ok(())
}
