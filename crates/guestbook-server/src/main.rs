use std::net::SocketAddr;

use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use guestbook_api::config::Config;
use guestbook_api::notify::Notifier;
use guestbook_api::state::AppStateInner;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "guestbook=debug,guestbook_api=debug,guestbook_db=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let config = Config::from_env()?;
    if config.uses_placeholder_token() {
        warn!("GUESTBOOK_ADMIN_TOKEN is unset or still a placeholder; set it before exposing this server");
    }

    // Init database and notifier
    let db = guestbook_db::Database::open(&config.db_path)?;
    let notifier = Notifier::from_config(&config)?;

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let static_dir = config.static_dir.clone();
    let notify_timeout = config.notify_timeout;

    let state = AppStateInner::new(config, db, notifier.clone())?;

    let app = guestbook_api::router(state)
        .fallback_service(ServeDir::new(&static_dir))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    info!("Guestbook listening on {}", addr);
    info!("Serving static files from {}", static_dir.display());

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Emails queued just before the signal get one timeout period to finish
    notifier.shutdown(notify_timeout).await;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
