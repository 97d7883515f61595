//! Async wrapper around [`PriceTracker`] for use in async runtimes (Tokio, etc.).
//!
//! Storage work runs on the blocking thread pool via
//! [`tokio::task::spawn_blocking`] behind a mutex. Sweeps scrape every URL
//! concurrently and only take the lock for the read-classify-write step of
//! each product.
//!
//! # Example
//!
//! ```no_run
//! use price_tracker::{AsyncPriceTracker, PriceTracker};
//!
//! #[tokio::main]
//! async fn main() {
//!     let tracker = AsyncPriceTracker::build(PriceTracker::builder()).await.unwrap();
//!
//!     let products = tracker.run(|t| t.products().list()).await.unwrap();
//!     let report = tracker.sweep().await.unwrap();
//! }
//! ```

use std::sync::{Arc, Mutex};

use crate::error::{Result, TrackerError};
use crate::scrape::Scraper;
use crate::{PriceTracker, PriceTrackerBuilder, Product, RefreshOutcome, SweepReport};

/// Async wrapper around [`PriceTracker`].
///
/// The tracker is protected by a [`Mutex`] because its DuckDB connection is
/// not shareable across threads; the scraper is shared directly.
#[derive(Clone)]
pub struct AsyncPriceTracker {
    inner: Arc<Mutex<PriceTracker>>,
    scraper: Arc<dyn Scraper>,
}

impl AsyncPriceTracker {
    /// Wrap an already built tracker.
    pub fn new(tracker: PriceTracker) -> Self {
        let scraper = tracker.scraper();
        Self {
            inner: Arc::new(Mutex::new(tracker)),
            scraper,
        }
    }

    /// Build the tracker on the blocking thread pool.
    pub async fn build(builder: PriceTrackerBuilder) -> Result<Self> {
        tokio::task::spawn_blocking(move || builder.build().map(Self::new))
            .await
            .map_err(|e| TrackerError::InvalidArgument(format!("Task join error: {e}")))?
    }

    /// Run a sync tracker operation on the blocking thread pool.
    pub async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&PriceTracker) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let tracker = self.inner.clone();
        tokio::task::spawn_blocking(move || {
            let guard = tracker
                .lock()
                .map_err(|_| TrackerError::InvalidArgument("Tracker lock poisoned".into()))?;
            f(&guard)
        })
        .await
        .map_err(|e| TrackerError::InvalidArgument(format!("Task join error: {e}")))?
    }

    pub async fn track_product(&self, url: &str) -> Result<Option<Product>> {
        let url = url.to_string();
        self.run(move |t| t.track_product(&url)).await
    }

    pub async fn product(&self, id: i64) -> Result<Option<Product>> {
        self.run(move |t| t.product(id)).await
    }

    pub async fn products(&self) -> Result<Vec<Product>> {
        self.run(|t| t.products().list()).await
    }

    pub async fn subscribe(&self, product_id: i64, email: &str) -> Result<Option<Product>> {
        let email = email.to_string();
        self.run(move |t| t.subscribe(product_id, &email)).await
    }

    /// Re-scrape every tracked product concurrently.
    ///
    /// Each URL runs on its own blocking task. A failure for one URL is
    /// recorded in the report and does not affect the others.
    pub async fn sweep(&self) -> Result<SweepReport> {
        let urls = self.run(|t| t.products().urls()).await?;

        let mut handles = Vec::with_capacity(urls.len());
        for url in urls {
            let scraper = Arc::clone(&self.scraper);
            let tracker = Arc::clone(&self.inner);
            handles.push(tokio::task::spawn_blocking(move || {
                let outcome = refresh_one(scraper.as_ref(), &tracker, &url);
                (url, outcome)
            }));
        }

        let mut report = SweepReport::default();
        for handle in handles {
            match handle.await {
                Ok((url, outcome)) => report.record(url, outcome),
                Err(e) => log::error!("Sweep task failed to join: {}", e),
            }
        }
        log::info!(
            "Sweep done: {} updated, {} skipped, {} failed",
            report.updated.len(),
            report.skipped.len(),
            report.failed.len()
        );
        Ok(report)
    }
}

/// Scrape without the lock, then merge under it.
fn refresh_one(
    scraper: &dyn Scraper,
    tracker: &Mutex<PriceTracker>,
    url: &str,
) -> Result<Option<RefreshOutcome>> {
    let Some(scraped) = scraper.scrape(url)? else {
        log::info!("No product data for {}; skipping this cycle", url);
        return Ok(None);
    };
    let guard = tracker
        .lock()
        .map_err(|_| TrackerError::InvalidArgument("Tracker lock poisoned".into()))?;
    guard.process_snapshot(&scraped).map(Some)
}
