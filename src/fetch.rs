//! Tide page retrieval

use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use crate::errors::TidePublisherError;
use crate::extract;

/// Upper bound on one page retrieval.
pub const PAGE_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = concat!("tide-publisher/", env!("CARGO_PKG_VERSION"));

/// Source of tide table rows
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Retrieve the page at `url` and extract its tide table rows.
    async fn fetch(&self, url: &str) -> Result<Vec<(String, String)>, TidePublisherError>;
}

/// Fetcher reading the live tide page over HTTP
pub struct HttpPageFetcher {
    client: reqwest::Client,
}

impl HttpPageFetcher {
    pub fn new() -> Result<Self, TidePublisherError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(PAGE_TIMEOUT)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<(String, String)>, TidePublisherError> {
        info!("Fetching tide page {}", url);
        let html = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let rows = extract::striped_table_rows(&html)?;
        info!("Tide table found, extracted {} rows", rows.len());
        Ok(rows)
    }
}
