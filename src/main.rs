use anyhow::Context;
use rafka_lite::{BrokerConfig, KafkaServer};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("rafka_lite=info")),
        )
        .init();

    let config = BrokerConfig::load().context("failed to load broker configuration")?;
    let server = KafkaServer::bind(&config)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_address))?;

    server.run().await?;
    Ok(())
}
