mod config;
mod health;

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::watch;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use gamenight_api::AppStateInner;
use gamenight_db::Database;
use gamenight_engine::catalog::BggClient;
use gamenight_engine::locale::Locales;
use gamenight_engine::{Coordinator, Settings};
use gamenight_telegram::{ChatHandler, TelegramClient, poller};

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gamenight=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;

    let db = Arc::new(Database::open(&config.db_path)?);
    let locales = match &config.locales_dir {
        Some(dir) => Locales::load_dir(dir)?,
        None => Locales::builtin()?,
    };
    let catalog = Arc::new(BggClient::new(config.catalog_timeout)?);
    let telegram = Arc::new(TelegramClient::new(&config.token)?);

    let coordinator = Coordinator::new(
        db,
        catalog,
        telegram.clone(),
        Arc::new(locales),
        Settings {
            base_url: config.base_url.clone(),
            bot_name: config.bot_name.clone(),
            catalog_timeout: config.catalog_timeout,
        },
    );

    if config.base_url.is_empty() || config.bot_name.is_empty() {
        warn!("BASE_URL or BOT_NAME is not set; web view buttons will not work");
    }

    // Stop both the poller and the HTTP server on ctrl-c.
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

    let handler = ChatHandler::new(coordinator.clone(), telegram.clone());
    let poller = tokio::spawn(poller::run(telegram, handler, async move {
        let _ = shutdown_rx.changed().await;
    }));

    if let Some(url) = config.health_check_url.clone() {
        tokio::spawn(health::run_ping_loop(url));
    }

    let app = gamenight_api::router(Arc::new(AppStateInner { coordinator }))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Game night server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
            let _ = shutdown_tx.send(true);
        })
        .await?;

    poller.await?;
    Ok(())
}
