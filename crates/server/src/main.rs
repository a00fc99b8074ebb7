use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shiptrack_core::{
    load_config, validate_config, ChannelNotifier, DiscordNotifier, EmailNotifier,
    GenericHttpProvider, LogNotifier, Notifier, ProviderRegistry, Scheduler, ShipmentStore,
    ShipmentTracker, SqliteShipmentStore,
};
use shiptrack_server::{api::create_router, state::AppState};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = std::env::var("SHIPTRACK_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Database path: {:?}", config.database.path);

    let store: Arc<dyn ShipmentStore> = Arc::new(
        SqliteShipmentStore::new(&config.database.path)
            .context("Failed to open shipment store")?,
    );
    info!("Shipment store initialized");

    let generic = GenericHttpProvider::new(&config.provider)
        .context("Failed to create tracking provider")?;
    let providers = ProviderRegistry::new(Arc::new(generic));

    let notifier: Arc<dyn Notifier> = if config.notifications.log_only {
        info!("Notifications are logged only");
        Arc::new(LogNotifier::new())
    } else {
        let discord = DiscordNotifier::new(Arc::clone(&store), &config.notifications)
            .context("Failed to create Discord notifier")?;
        let email = EmailNotifier::new(Arc::clone(&store), &config.notifications);
        Arc::new(ChannelNotifier::new(Arc::new(email), Arc::new(discord)))
    };

    // One tracker, so scheduled batches and manual checks share a queue.
    let tracker = Arc::new(ShipmentTracker::new(
        Arc::clone(&store),
        providers,
        config.queue.clone(),
        notifier,
    ));

    let scheduler = Arc::new(Scheduler::new(
        config.scheduler.clone(),
        Arc::clone(&tracker),
    ));
    if config.scheduler.enabled {
        scheduler.start().await;
    } else {
        info!("Scheduler disabled in config");
    }

    let state = Arc::new(AppState::new(
        config.clone(),
        tracker,
        Arc::clone(&scheduler),
    ));
    let app = create_router(state);

    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutting down...");
    scheduler.stop().await;

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
