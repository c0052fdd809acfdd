use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vaultd::config::Config;
use vaultd::db;
use vaultd::router::build_router;
use vaultd::state::AppState;
use vaultd::storage::PostgresStorage;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    tracing::info!("configuration loaded");

    let pool = db::create_pool(&config.database_url)?;
    let storage = PostgresStorage::new(pool);
    storage.migrate().await?;
    tracing::info!("database ready");

    let state = AppState::with_storage(config.clone(), Arc::new(storage));
    let app = build_router(state);

    let addr: SocketAddr = config.bind_addr.parse()?;
    tracing::info!("server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
