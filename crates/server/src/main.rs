//! Battle Noodles game server.

use tracing::info;
use tracing_subscriber::EnvFilter;

mod collision;
mod config;
mod discovery;
mod entity;
mod server;
mod world;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Battle Noodles Server v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = config::Config::load()?;
    info!("Loaded configuration");
    info!("  Game port: {}", config.server.port);
    info!("  Discovery port: {}", config.server.discovery_port);
    info!("  Arena: {}x{}", config.arena.width, config.arena.height);
    info!("  Max players: {}", config.server.max_players);

    // Start the game server
    server::run(config).await?;

    Ok(())
}
