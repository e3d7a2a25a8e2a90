use anyhow::{Context, Result};
use api::{
    AppState, create_router,
    settings::{Cli, Settings},
    upload::MediaStorage,
};
use auth::{JwtService, SessionManager, repositories::UserRepository};
use clap::Parser;
use common::{
    assets::AssetUrl,
    database::{health_check, init_database},
};
use std::{future::IntoFuture, sync::Arc};
use tokio::{net::TcpListener, sync::Notify};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut settings = Settings::from_env()?;
    settings.apply(&cli);

    info!("Starting Booksland API");

    let db = init_database(&settings.database())
        .await
        .context("Failed to initialize database")?;

    // Check database connectivity
    match health_check(&db).await {
        Ok(true) => info!("Database connection successful"),
        Ok(false) => warn!("Database did not answer the ping, continuing"),
        Err(e) => warn!("Database is not reachable yet: {}", e),
    }

    let jwt_service = JwtService::new(settings.jwt()?)?;
    let sessions = SessionManager::new(UserRepository::new(&db), jwt_service);

    let storage = MediaStorage::new(settings.upload_dir.clone(), settings.max_upload_size);
    tokio::fs::create_dir_all(storage.dir())
        .await
        .with_context(|| format!("Failed to create {}", storage.dir().display()))?;

    let app_state = AppState::new(db, sessions, AssetUrl::new(&settings.assets_url), storage);
    let app = create_router(app_state);

    let address = settings.bind_address();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    info!("Booksland API listening on {}", address);

    let draining = Arc::new(Notify::new());
    let signalled = draining.clone();
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            signalled.notify_one();
        })
        .into_future();

    let grace = settings.grace_period();
    tokio::select! {
        result = server => result.context("Server error")?,
        _ = async {
            draining.notified().await;
            tokio::time::sleep(grace).await;
        } => warn!("Grace period of {:?} elapsed, dropping open connections", grace),
    }

    info!("Booksland API stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
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

    info!("Shutdown signal received, draining connections");
}
