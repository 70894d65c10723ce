//! Tide table publisher
//!
//! Scrapes the tide predictions table from a configured page, keeps the
//! assembled payload in a short-lived file cache and publishes it as JSON
//! over MQTT for Home Assistant to pick up.

pub mod cache;
pub mod clock;
pub mod config;
pub mod errors;
pub mod extract;
pub mod fetch;
pub mod models;
pub mod mqtt;

use tracing::{error, info};

use crate::cache::CacheStore;
use crate::clock::Clock;
use crate::errors::TidePublisherError;
use crate::fetch::PageFetcher;
use crate::models::TidePayload;
use crate::mqtt::StatePublisher;

/// Run one fetch, cache and publish cycle
///
/// A fresh cached payload skips the fetch entirely; otherwise the page is
/// scraped and the assembled payload cached for later runs. The payload is
/// published either way. A cache write failure is logged and does not stop
/// the publish.
pub async fn run_tide_publisher<F, P, C>(
    url: &str,
    cache: &CacheStore,
    fetcher: &F,
    publisher: &P,
    clock: &C,
) -> Result<TidePayload, TidePublisherError>
where
    F: PageFetcher,
    P: StatePublisher,
    C: Clock,
{
    let payload = match cache.load() {
        Some(payload) => {
            info!("Reusing cached payload from {}", payload.last_updated);
            payload
        }
        None => {
            let rows = fetcher.fetch(url).await?;
            let payload = TidePayload::from_rows(rows, clock.now_utc())?;
            if let Err(e) = cache.save(&payload) {
                error!("Could not cache tide payload: {}", e);
            }
            payload
        }
    };

    publisher.publish(&payload).await?;
    info!("Published {} tide records", payload.data.len());
    Ok(payload)
}
