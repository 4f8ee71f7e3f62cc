use anyhow::{Context, Result};
use axum::Router;
use reqwest::Client;
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use carlist_rust::{catalog_api::Catalog, config::Settings, routes, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file first. Ignore errors (e.g., file not found)
    dotenv::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "carlist_rust=info,tower_http=info".into()))
        .with(fmt::layer())
        .init();

    tracing::info!("Initializing car listing server...");

    // Load configuration
    let settings = match Settings::new() {
        Ok(s) => {
            tracing::info!("Configuration loaded successfully.");
            s
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e);
        }
    };
    let shared_settings = Arc::new(settings);

    // Shared HTTP client for the catalog API
    let http_client = Arc::new(
        Client::builder()
            .user_agent(concat!("carlist_rust/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build shared reqwest client")?,
    );

    let source = shared_settings.catalog_source()?;
    let catalog = Catalog::load(&source, http_client)
        .await
        .context("Failed to initialise catalog")?;

    let app_state = AppState {
        settings: shared_settings.clone(),
        catalog,
    };
    let app: Router = routes::create_router(app_state);

    // Parse the server address from settings
    let addr: SocketAddr = shared_settings.server_address.parse().with_context(|| {
        format!(
            "Invalid server address format in configuration ('{}')",
            shared_settings.server_address
        )
    })?;

    let listener = match TcpListener::bind(&addr).await {
        Ok(l) => {
            tracing::info!("Server listening on {}", addr);
            l
        }
        Err(e) => {
            tracing::error!("Failed to bind to address {}: {}", addr, e);
            return Err(e.into());
        }
    };

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
