//! Cached tide payloads
//!
//! Stores the most recent payload as a JSON file and hands it back while it
//! is younger than the configured freshness window. Any unreadable or
//! malformed cache counts as a miss so a fresh fetch can replace it.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::time::Duration;

use chrono::TimeDelta;
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::{CacheConfig, DEFAULT_CACHE_PATH, DEFAULT_CACHE_TTL_SECS};
use crate::errors::TidePublisherError;
use crate::models::TidePayload;

/// File-backed cache for tide payloads
pub struct CacheStore {
    path: PathBuf,
    max_age: TimeDelta,
    clock: Box<dyn Clock>,
}

impl CacheStore {
    /// Create a new cache store
    pub fn new(config: CacheConfig) -> Result<Self, TidePublisherError> {
        Self::with_clock(config, Box::new(SystemClock))
    }

    /// Create a cache store judging freshness against the given clock
    pub fn with_clock(
        config: CacheConfig,
        clock: Box<dyn Clock>,
    ) -> Result<Self, TidePublisherError> {
        // Validate configuration
        config.validate()?;

        let max_age =
            TimeDelta::from_std(config.ttl).map_err(|_| TidePublisherError::ConfigurationError {
                message: format!("Cache TTL out of range: {:?}", config.ttl),
            })?;

        info!(
            "Initializing CacheStore: path={}, ttl={:?}",
            config.path.display(),
            config.ttl
        );

        Ok(Self {
            path: config.path,
            max_age,
            clock,
        })
    }

    /// Stored payload, when one is present, readable and still fresh.
    ///
    /// Every failure mode short of a fresh hit is reported as `None`;
    /// callers fall back to fetching the page.
    pub fn load(&self) -> Option<TidePayload> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("No cache file at {}", self.path.display());
                return None;
            }
            Err(e) => {
                warn!("Could not read cache file {}: {}", self.path.display(), e);
                return None;
            }
        };

        let payload: TidePayload = match serde_json::from_str(&raw) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(
                    "Discarding malformed cache file {}: {}",
                    self.path.display(),
                    e
                );
                return None;
            }
        };

        let age = payload.age(self.clock.now_utc());
        if age < self.max_age {
            debug!("Cache hit: payload is {}s old", age.num_seconds());
            Some(payload)
        } else {
            info!("Cache expired: payload is {}s old", age.num_seconds());
            None
        }
    }

    /// Persist a payload for later runs
    pub fn save(&self, payload: &TidePayload) -> Result<(), TidePublisherError> {
        let body = serde_json::to_string_pretty(payload)?;
        fs::write(&self.path, body)?;
        debug!("Cached payload to {}", self.path.display());
        Ok(())
    }
}

/// Builder for CacheStore with simplified configuration
pub struct CacheStoreBuilder {
    path: Option<PathBuf>,
    max_age: Option<Duration>,
    clock: Option<Box<dyn Clock>>,
}

impl CacheStoreBuilder {
    pub fn new() -> Self {
        Self {
            path: None,
            max_age: None,
            clock: None,
        }
    }

    pub fn path(mut self, path: PathBuf) -> Self {
        self.path = Some(path);
        self
    }

    pub fn max_age(mut self, max_age: Duration) -> Self {
        self.max_age = Some(max_age);
        self
    }

    pub fn clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn build(self) -> Result<CacheStore, TidePublisherError> {
        let path = self
            .path
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CACHE_PATH));
        let max_age = self
            .max_age
            .unwrap_or(Duration::from_secs(DEFAULT_CACHE_TTL_SECS));

        let config = CacheConfig { path, ttl: max_age };

        match self.clock {
            Some(clock) => CacheStore::with_clock(config, clock),
            None => CacheStore::new(config),
        }
    }
}
