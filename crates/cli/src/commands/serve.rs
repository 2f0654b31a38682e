//! `docchat serve` — Start the HTTP API server.

use docchat_config::AppConfig;
use tracing::debug;

pub async fn run(port_override: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    debug!(?config, "Configuration loaded");

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    println!("docchat gateway");
    println!(
        "   Listening: {}:{}",
        config.gateway.host, config.gateway.port
    );
    println!("   Store:     {}", config.store.backend);

    docchat_gateway::start(config).await?;

    Ok(())
}
