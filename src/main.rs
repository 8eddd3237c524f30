use std::net::SocketAddr;

use log::{info, warn};

use codequest::routes;
use codequest::{AppConfig, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::from_env();
    let state = AppState::new(config.clone())?;

    // The server comes up even when the store is down; /health reports the
    // live readiness and requests fail individually until it returns.
    match state.db.initialize().await {
        Ok(()) => info!("✅ Connected to PostgreSQL"),
        Err(e) => warn!("⚠️ Store unavailable at startup: {}", e),
    }

    let app = routes::create_router(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("🚀 Server running on port {}", config.port);

    axum::serve(listener, app).await?;
    Ok(())
}
