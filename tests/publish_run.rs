//! Full publish cycles driven through fake fetchers and publishers

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use tempfile::tempdir;

use tide_publisher::cache::{CacheStore, CacheStoreBuilder};
use tide_publisher::clock::Clock;
use tide_publisher::errors::TidePublisherError;
use tide_publisher::fetch::PageFetcher;
use tide_publisher::models::{TidePayload, TideRecord};
use tide_publisher::mqtt::StatePublisher;
use tide_publisher::run_tide_publisher;

const URL: &str = "https://tides.example.com/auckland";

struct FixedClock(DateTime<Utc>);

impl Clock for FixedClock {
    fn now_utc(&self) -> DateTime<Utc> {
        self.0
    }
}

struct FakeFetcher {
    rows: Vec<(String, String)>,
    calls: AtomicUsize,
}

impl FakeFetcher {
    fn new(rows: Vec<(String, String)>) -> Self {
        Self {
            rows,
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageFetcher for FakeFetcher {
    async fn fetch(&self, _url: &str) -> Result<Vec<(String, String)>, TidePublisherError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.rows.clone())
    }
}

#[derive(Default)]
struct RecordingPublisher {
    published: Mutex<Vec<TidePayload>>,
}

impl RecordingPublisher {
    fn published(&self) -> Vec<TidePayload> {
        self.published.lock().unwrap().clone()
    }
}

#[async_trait]
impl StatePublisher for RecordingPublisher {
    async fn publish(&self, payload: &TidePayload) -> Result<(), TidePublisherError> {
        self.published.lock().unwrap().push(payload.clone());
        Ok(())
    }
}

fn fixed_now() -> DateTime<Utc> {
    "2024-06-01T00:00:00Z".parse().unwrap()
}

fn rows() -> Vec<(String, String)> {
    vec![
        ("12:01 AM".to_string(), "1.8m".to_string()),
        ("6:12 AM".to_string(), "0.4m".to_string()),
    ]
}

fn cache_at(path: PathBuf, now: DateTime<Utc>) -> CacheStore {
    CacheStoreBuilder::new()
        .path(path)
        .max_age(Duration::from_secs(3600))
        .clock(Box::new(FixedClock(now)))
        .build()
        .unwrap()
}

#[tokio::test]
async fn a_cold_run_fetches_caches_and_publishes() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("tide_cache.json");
    let now = fixed_now();

    let cache = cache_at(path.clone(), now);
    let fetcher = FakeFetcher::new(rows());
    let publisher = RecordingPublisher::default();

    let payload = run_tide_publisher(URL, &cache, &fetcher, &publisher, &FixedClock(now))
        .await
        .unwrap();

    assert_eq!(fetcher.calls(), 1);
    assert_eq!(payload.last_updated.to_rfc3339(), "2024-06-01T12:00:00+12:00");
    assert_eq!(
        payload.data,
        vec![
            TideRecord {
                date: "12:01 AM".to_string(),
                value: 1.8
            },
            TideRecord {
                date: "6:12 AM".to_string(),
                value: 0.4
            },
        ]
    );
    assert_eq!(publisher.published(), vec![payload.clone()]);

    let on_disk: TidePayload =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(on_disk, payload);
}

#[tokio::test]
async fn a_fresh_cache_skips_the_fetch() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("tide_cache.json");
    let now = fixed_now();

    let fetcher = FakeFetcher::new(rows());
    let publisher = RecordingPublisher::default();

    let first = run_tide_publisher(
        URL,
        &cache_at(path.clone(), now),
        &fetcher,
        &publisher,
        &FixedClock(now),
    )
    .await
    .unwrap();

    let later = now + TimeDelta::minutes(30);
    let second = run_tide_publisher(
        URL,
        &cache_at(path.clone(), later),
        &fetcher,
        &publisher,
        &FixedClock(later),
    )
    .await
    .unwrap();

    assert_eq!(fetcher.calls(), 1);
    assert_eq!(second, first);
    assert_eq!(publisher.published().len(), 2);
}

#[tokio::test]
async fn an_expired_cache_triggers_a_refetch() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("tide_cache.json");
    let now = fixed_now();

    let fetcher = FakeFetcher::new(rows());
    let publisher = RecordingPublisher::default();

    run_tide_publisher(
        URL,
        &cache_at(path.clone(), now),
        &fetcher,
        &publisher,
        &FixedClock(now),
    )
    .await
    .unwrap();

    let later = now + TimeDelta::minutes(61);
    let second = run_tide_publisher(
        URL,
        &cache_at(path.clone(), later),
        &fetcher,
        &publisher,
        &FixedClock(later),
    )
    .await
    .unwrap();

    assert_eq!(fetcher.calls(), 2);
    assert_eq!(second.last_updated.to_rfc3339(), "2024-06-01T13:01:00+12:00");
    assert_eq!(publisher.published().len(), 2);
}

#[tokio::test]
async fn an_unparseable_height_aborts_the_run() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("tide_cache.json");
    let now = fixed_now();

    let cache = cache_at(path.clone(), now);
    let fetcher = FakeFetcher::new(vec![("12:01 AM".to_string(), "high".to_string())]);
    let publisher = RecordingPublisher::default();

    let result = run_tide_publisher(URL, &cache, &fetcher, &publisher, &FixedClock(now)).await;

    assert!(matches!(result, Err(TidePublisherError::InvalidHeight(_))));
    assert!(publisher.published().is_empty());
    assert!(!path.exists());
}

#[tokio::test]
async fn a_cache_write_failure_does_not_block_the_publish() {
    let temp_dir = tempdir().unwrap();
    let now = fixed_now();

    // The cache path is a directory, so every save fails.
    let cache = cache_at(temp_dir.path().to_path_buf(), now);
    let fetcher = FakeFetcher::new(rows());
    let publisher = RecordingPublisher::default();

    let payload = run_tide_publisher(URL, &cache, &fetcher, &publisher, &FixedClock(now))
        .await
        .unwrap();

    assert_eq!(fetcher.calls(), 1);
    assert_eq!(publisher.published(), vec![payload]);
}
