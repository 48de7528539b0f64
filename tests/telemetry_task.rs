//! Banner telemetry task against a recording storefront.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc::unbounded_channel;

use sokoni::api::StorefrontApi;
use sokoni::carousel::{TrackEvent, TrackKind};
use sokoni::net::ApiError;
use sokoni::telemetry::run_telemetry;
use sokoni::types::{Banner, Category, Product};

/// Records every call; the first `failures` calls answer with an error.
#[derive(Default)]
struct RecordingStore {
    failures: Mutex<usize>,
    calls: Mutex<Vec<(TrackKind, u64)>>,
}

impl RecordingStore {
    fn failing_first(n: usize) -> Self {
        Self {
            failures: Mutex::new(n),
            ..Default::default()
        }
    }

    fn record(&self, kind: TrackKind, banner_id: u64) -> Result<(), ApiError> {
        self.calls.lock().unwrap().push((kind, banner_id));
        let mut left = self.failures.lock().unwrap();
        if *left > 0 {
            *left -= 1;
            return Err(ApiError::Status(503));
        }
        Ok(())
    }
}

#[async_trait]
impl StorefrontApi for RecordingStore {
    async fn categories(&self) -> Result<Vec<Category>, ApiError> {
        Ok(Vec::new())
    }

    async fn products(&self, _category_id: u64, _per_page: u32) -> Result<Vec<Product>, ApiError> {
        Ok(Vec::new())
    }

    async fn homepage_banners(&self) -> Result<Vec<Banner>, ApiError> {
        Ok(Vec::new())
    }

    async fn record_impression(&self, banner_id: u64) -> Result<(), ApiError> {
        self.record(TrackKind::Impression, banner_id)
    }

    async fn record_click(&self, banner_id: u64) -> Result<(), ApiError> {
        self.record(TrackKind::Click, banner_id)
    }
}

#[tokio::test]
async fn failed_impression_does_not_stop_later_events() {
    let api = Arc::new(RecordingStore::failing_first(1));
    let (tx, rx) = unbounded_channel();
    let task = tokio::spawn(run_telemetry(api.clone(), rx));

    for (banner_id, kind) in [(3, TrackKind::Impression), (4, TrackKind::Impression), (4, TrackKind::Click)] {
        tx.send(TrackEvent { banner_id, kind }).unwrap();
    }
    drop(tx);

    // the task ends on its own once the carousel side hangs up
    task.await.unwrap().unwrap();
    assert_eq!(
        *api.calls.lock().unwrap(),
        vec![
            (TrackKind::Impression, 3),
            (TrackKind::Impression, 4),
            (TrackKind::Click, 4),
        ]
    );
}

#[tokio::test]
async fn closed_channel_with_nothing_sent_ends_cleanly() {
    let api = Arc::new(RecordingStore::default());
    let (tx, rx) = unbounded_channel::<TrackEvent>();
    drop(tx);
    run_telemetry(api.clone(), rx).await.unwrap();
    assert!(api.calls.lock().unwrap().is_empty());
}
