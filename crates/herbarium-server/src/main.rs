//! Herbarium Server
//!
//! Web service for medicinal plant identification: one classification
//! model resolved at startup, three routes, and a static upload page.

use anyhow::Result;
use clap::Parser;
use herbarium_core::catalog;
use herbarium_model::{Classifier, DeviceType, PlantClassifier};
use herbarium_server::{config::ServerConfig, routes, state::AppState, Cli};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    init_tracing(cli.verbose);

    info!("Starting Herbarium server");

    // Load configuration
    let config = ServerConfig::load(&cli.config, &cli)?;
    info!("Configuration loaded successfully");
    info!("Device: {}", config.device);

    let device_type: DeviceType = config
        .device
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid device setting: {}", e))?;

    // Resolve the model once; requests share the handle read-only.
    info!("Resolving classification model...");
    let classifier =
        PlantClassifier::from_source(&config.model_source(), catalog::label_set(), device_type)?;
    let provenance = classifier.provenance().clone();
    if provenance.trained {
        info!(
            "Model ready via strategy `{}` ({} missing parameters)",
            provenance.strategy, provenance.missing_parameters
        );
    } else {
        warn!("Model weights could not be matched; serving an UNTRAINED fallback network");
    }

    let state = AppState::new(Arc::new(classifier));
    let app = routes::create_router(state);

    let addr: SocketAddr = format!("{}:{}", cli.listen, cli.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", addr);

    // Graceful shutdown handler
    let shutdown = async {
        shutdown_signal().await;
        warn!("Shutdown signal received, stopping server...");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Listen for shutdown signals (SIGTERM, SIGINT)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Initialize tracing/logging
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("herbarium=debug,axum=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("herbarium=info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
