//! Category + products loader with rate-limit aware retry.
//!
//! A load resolves a category by slug or id, then fetches its products in a
//! nested step that may fail on its own. The caller gets exactly one
//! [`LoadOutcome`] per call. [`FetchAttempt`] keeps the per-key retry state and
//! discards results that belong to a superseded request; [`run_loader`] is the
//! background task that executes requests one at a time, newest wins.
//! [`run_list_loader`] fetches the category list alone with the same backoff.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

use crate::api::StorefrontApi;
use crate::net::{backoff_delay, ApiError};
use crate::types::{AppEvent, Category, Product};

pub const RATE_LIMITED_MESSAGE: &str = "Too many requests, please wait a moment and try again.";
pub const NETWORK_ERROR_MESSAGE: &str =
    "Could not load this category. Please check your connection and try again.";

#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// Terminal: show the not-found view, never retry.
    NotFound,
    /// Primary lookup answered 429. `retry_count` is the already incremented count.
    RateLimited { retry_count: u32 },
    /// Anything else. `status` is set when the server answered at all.
    NetworkError { message: String, status: Option<u16> },
    /// Category resolved. Products may be empty if their fetch failed.
    Ok {
        category: Category,
        products: Vec<Product>,
        dependents_rate_limited: bool,
    },
}

impl LoadOutcome {
    pub fn is_terminal(&self) -> bool {
        matches!(self, LoadOutcome::NotFound)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    Idle,
    Loading,
    Success,
    ErrorRetryable,
    ErrorTerminal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoaderSettings {
    pub backoff_base: Duration,
    pub per_page: u32,
}

impl Default for LoaderSettings {
    fn default() -> Self {
        Self {
            backoff_base: Duration::from_millis(1000),
            per_page: 24,
        }
    }
}

/// Match a key against category slugs (case-insensitive) or numeric ids.
pub fn resolve_category<'a>(categories: &'a [Category], key: &str) -> Option<&'a Category> {
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    if let Some(c) = categories.iter().find(|c| c.slug.eq_ignore_ascii_case(key)) {
        return Some(c);
    }
    let id = key.parse::<u64>().ok()?;
    categories.iter().find(|c| c.id == id)
}

/// Run one load. Sleeps `backoff_base * retry_count` first when retrying.
pub async fn load(
    api: &dyn StorefrontApi,
    key: &str,
    retry_count: u32,
    settings: &LoaderSettings,
) -> LoadOutcome {
    load_with_list(api, key, retry_count, settings).await.0
}

/// Fetch the category list alone, with the same backoff as [`load`].
pub async fn load_category_list(
    api: &dyn StorefrontApi,
    retry_count: u32,
    settings: &LoaderSettings,
) -> Result<Vec<Category>, ApiError> {
    back_off(retry_count, settings, "category list").await;
    api.categories().await
}

async fn back_off(retry_count: u32, settings: &LoaderSettings, what: &str) {
    if retry_count > 0 {
        let delay = backoff_delay(retry_count, settings.backoff_base);
        log::debug!("[loader] retry #{retry_count} for {what}, backing off {delay:?}");
        tokio::time::sleep(delay).await;
    }
}

/// [`load`], also handing back the category list the lookup fetched.
async fn load_with_list(
    api: &dyn StorefrontApi,
    key: &str,
    retry_count: u32,
    settings: &LoaderSettings,
) -> (LoadOutcome, Option<Vec<Category>>) {
    back_off(retry_count, settings, &format!("'{key}'")).await;

    let categories = match api.categories().await {
        Ok(c) => c,
        Err(ApiError::NotFound) => {
            log::info!("[loader] category lookup 404 for '{key}'");
            return (LoadOutcome::NotFound, None);
        }
        Err(ApiError::RateLimited) => {
            log::warn!("[loader] category lookup rate limited for '{key}'");
            let outcome = LoadOutcome::RateLimited {
                retry_count: retry_count.saturating_add(1),
            };
            return (outcome, None);
        }
        Err(e) => {
            log::warn!("[loader] category lookup failed for '{key}': {e}");
            let status = match e {
                ApiError::Status(code) => Some(code),
                _ => None,
            };
            let outcome = LoadOutcome::NetworkError {
                message: NETWORK_ERROR_MESSAGE.to_string(),
                status,
            };
            return (outcome, None);
        }
    };

    let category = match resolve_category(&categories, key) {
        Some(c) => c.clone(),
        None => {
            log::info!("[loader] no category matches '{key}'");
            return (LoadOutcome::NotFound, Some(categories));
        }
    };

    let (products, dependents_rate_limited) =
        match api.products(category.id, settings.per_page).await {
            Ok(p) => (p, false),
            Err(ApiError::RateLimited) => {
                log::warn!("[loader] products rate limited for category #{}", category.id);
                (Vec::new(), true)
            }
            Err(e) => {
                log::warn!("[loader] products failed for category #{}: {e}", category.id);
                (Vec::new(), false)
            }
        };

    let outcome = LoadOutcome::Ok {
        category,
        products,
        dependents_rate_limited,
    };
    (outcome, Some(categories))
}

/// Retry state for the currently displayed key.
#[derive(Debug, Clone)]
pub struct FetchAttempt {
    resource_key: Option<String>,
    retry_count: u32,
    status: LoadStatus,
    generation: u64,
    outcome: Option<LoadOutcome>,
}

impl Default for FetchAttempt {
    fn default() -> Self {
        Self::new()
    }
}

impl FetchAttempt {
    pub fn new() -> Self {
        Self {
            resource_key: None,
            retry_count: 0,
            status: LoadStatus::Idle,
            generation: 0,
            outcome: None,
        }
    }

    pub fn resource_key(&self) -> Option<&str> {
        self.resource_key.as_deref()
    }
    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }
    pub fn status(&self) -> LoadStatus {
        self.status
    }
    pub fn generation(&self) -> u64 {
        self.generation
    }
    pub fn outcome(&self) -> Option<&LoadOutcome> {
        self.outcome.as_ref()
    }

    /// Start loading `key`. A different key resets the retry count.
    pub fn request(&mut self, key: &str) -> u64 {
        if self.resource_key.as_deref() != Some(key) {
            self.resource_key = Some(key.to_string());
            self.retry_count = 0;
            self.outcome = None;
        }
        self.generation += 1;
        self.status = LoadStatus::Loading;
        self.generation
    }

    /// Re-issue the current key, keeping the retry count.
    pub fn retry(&mut self) -> Option<u64> {
        self.resource_key.as_ref()?;
        if self.status == LoadStatus::ErrorTerminal {
            return None;
        }
        self.generation += 1;
        self.status = LoadStatus::Loading;
        Some(self.generation)
    }

    /// Apply a finished load. Returns `false` when the result is stale.
    pub fn apply(&mut self, generation: u64, key: &str, outcome: LoadOutcome) -> bool {
        if generation != self.generation || self.resource_key.as_deref() != Some(key) {
            log::debug!(
                "[loader] dropping stale result for '{key}' (gen {generation}, current {})",
                self.generation
            );
            return false;
        }
        self.status = match &outcome {
            LoadOutcome::NotFound => LoadStatus::ErrorTerminal,
            LoadOutcome::RateLimited { retry_count } => {
                self.retry_count = *retry_count;
                LoadStatus::ErrorRetryable
            }
            LoadOutcome::NetworkError { .. } => LoadStatus::ErrorRetryable,
            LoadOutcome::Ok {
                dependents_rate_limited,
                ..
            } => {
                if *dependents_rate_limited {
                    self.retry_count = self.retry_count.saturating_add(1);
                }
                LoadStatus::Success
            }
        };
        self.outcome = Some(outcome);
        true
    }

    /// Forget everything, e.g. when returning to the category list.
    pub fn reset(&mut self) {
        let generation = self.generation;
        *self = Self::new();
        // keep counting so late results from before the reset stay stale
        self.generation = generation + 1;
    }
}

/// One queued load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    pub generation: u64,
    pub key: String,
    pub retry_count: u32,
}

/// Aborts the wrapped task when dropped, so cancelling the loader also
/// cancels the load it was running.
struct InFlight(Option<JoinHandle<()>>);

impl InFlight {
    fn replace(&mut self, next: JoinHandle<()>) {
        if let Some(prev) = self.0.replace(next) {
            if !prev.is_finished() {
                log::debug!("[loader] superseding in-flight load");
                prev.abort();
            }
        }
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        if let Some(h) = self.0.take() {
            h.abort();
        }
    }
}

/// Background task executing load requests. A new request aborts the one
/// in flight; the generation guard in [`FetchAttempt`] covers anything that
/// still slips through.
pub async fn run_loader(
    api: Arc<dyn StorefrontApi>,
    settings: LoaderSettings,
    mut req_rx: UnboundedReceiver<LoadRequest>,
    event_tx: UnboundedSender<AppEvent>,
) -> Result<()> {
    let mut inflight = InFlight(None);

    while let Some(req) = req_rx.recv().await {
        log::info!(
            "[loader] loading '{}' (gen {}, retry {})",
            req.key,
            req.generation,
            req.retry_count
        );
        let api = Arc::clone(&api);
        let tx = event_tx.clone();
        inflight.replace(tokio::spawn(async move {
            let (outcome, list) =
                load_with_list(api.as_ref(), &req.key, req.retry_count, &settings).await;
            if let Some(list) = list {
                let _ = tx.send(AppEvent::CategoriesLoaded(list));
            }
            let _ = tx.send(AppEvent::CategoryLoaded {
                generation: req.generation,
                key: req.key,
                outcome,
            });
        }));
    }

    log::debug!("[loader] request channel closed, shutting down");
    Ok(())
}

/// Background task for the category list itself. Each request carries the
/// retry count to back off with; a newer request replaces the pending one.
pub async fn run_list_loader(
    api: Arc<dyn StorefrontApi>,
    settings: LoaderSettings,
    mut req_rx: UnboundedReceiver<u32>,
    event_tx: UnboundedSender<AppEvent>,
) -> Result<()> {
    let mut inflight = InFlight(None);

    while let Some(retry_count) = req_rx.recv().await {
        log::info!("[loader] loading category list (retry {retry_count})");
        let api = Arc::clone(&api);
        let tx = event_tx.clone();
        inflight.replace(tokio::spawn(async move {
            let ev = match load_category_list(api.as_ref(), retry_count, &settings).await {
                Ok(list) => AppEvent::CategoriesLoaded(list),
                Err(e) => {
                    log::warn!("[loader] category list failed: {e}");
                    AppEvent::CategoriesFailed {
                        rate_limited: e == ApiError::RateLimited,
                        message: e.to_string(),
                    }
                }
            };
            let _ = tx.send(ev);
        }));
    }
    Ok(())
}

/// Owns the loader tasks. Dropping the handle stops them and any load in
/// flight.
pub struct LoaderHandle {
    tx: UnboundedSender<LoadRequest>,
    list_tx: UnboundedSender<u32>,
    tasks: [JoinHandle<Result<()>>; 2],
}

impl LoaderHandle {
    pub fn spawn(
        api: Arc<dyn StorefrontApi>,
        settings: LoaderSettings,
        event_tx: UnboundedSender<AppEvent>,
    ) -> Self {
        let (tx, rx) = unbounded_channel();
        let (list_tx, list_rx) = unbounded_channel();
        let tasks = [
            tokio::spawn(run_loader(Arc::clone(&api), settings, rx, event_tx.clone())),
            tokio::spawn(run_list_loader(api, settings, list_rx, event_tx)),
        ];
        Self { tx, list_tx, tasks }
    }

    /// Request side, handed to the app.
    pub fn sender(&self) -> UnboundedSender<LoadRequest> {
        self.tx.clone()
    }

    /// Category list requests, as retry counts.
    pub fn list_sender(&self) -> UnboundedSender<u32> {
        self.list_tx.clone()
    }
}

impl Drop for LoaderHandle {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}
