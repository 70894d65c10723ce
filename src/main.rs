//! Tide publisher utility

use tracing::info;
use tracing_subscriber::EnvFilter;

use tide_publisher::cache::CacheStoreBuilder;
use tide_publisher::clock::SystemClock;
use tide_publisher::config::AppConfig;
use tide_publisher::errors::TidePublisherError;
use tide_publisher::fetch::HttpPageFetcher;
use tide_publisher::mqtt::MqttPublisher;
use tide_publisher::run_tide_publisher;

#[tokio::main]
async fn main() -> Result<(), TidePublisherError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Read .env into the process environment before configuration loads.
    dotenvy::dotenv().ok();

    // Load configuration, preferring environment variables and config files
    let config = AppConfig::load()?;
    info!(
        "Starting tide publisher: broker={}:{}, user={}, url={}",
        config.mqtt.broker,
        config.mqtt.port,
        config.mqtt.user.as_deref().unwrap_or("<none>"),
        config.url
    );

    let cache = CacheStoreBuilder::new()
        .path(config.cache.path.clone())
        .max_age(config.cache.ttl)
        .build()?;
    let fetcher = HttpPageFetcher::new()?;
    let publisher = MqttPublisher::new(config.mqtt.clone());

    run_tide_publisher(&config.url, &cache, &fetcher, &publisher, &SystemClock).await?;

    info!("All done");
    Ok(())
}
