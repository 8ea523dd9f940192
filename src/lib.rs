pub mod api;
pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod infra;

use api::{router, AppState};
use config::Config;
use infra::{init_db, MediaStore};

/// Open the database and media store, then serve the API until shutdown.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    log::info!("DB path: {:?}", config.db_path);
    let pool = init_db(&config.db_path).map_err(|e| {
        log::error!("DB init failed: {}", e);
        e
    })?;
    std::fs::create_dir_all(&config.media_root)?;
    let media = MediaStore::new(&config.media_root, &config.media_url);
    let state = AppState::new(pool, media, config.frontend_url.clone());

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    log::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    log::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::warn!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
