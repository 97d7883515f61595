//! Amazon price tracker.
//!
//! Scrapes product pages, keeps each product's price history in DuckDB, and
//! emails subscribers when a product hits its lowest price, comes back in
//! stock, or crosses the discount threshold.
//!
//! # Quick start
//!
//! ```no_run
//! use price_tracker::PriceTracker;
//!
//! let tracker = PriceTracker::builder().build().unwrap();
//!
//! // Start tracking a product
//! let product = tracker
//!     .track_product("https://www.amazon.com/dp/B0CHX1W1XY")
//!     .unwrap();
//!
//! // Subscribe to its alerts
//! if let Some(id) = product.and_then(|p| p.id) {
//!     tracker.subscribe(id, "me@example.com").unwrap();
//! }
//!
//! // Periodic re-scrape of everything
//! let report = tracker.sweep().unwrap();
//! ```

#[cfg(feature = "async")]
pub mod async_client;
pub mod classify;
pub mod config;
pub mod connection;
pub mod error;
pub mod models;
pub mod notify;
pub mod pricing;
pub mod queries;
pub mod reconcile;
pub mod scrape;

#[cfg(feature = "async")]
pub use async_client::AsyncPriceTracker;
pub use classify::classify;
pub use config::TrackerConfig;
pub use connection::Connection;
pub use error::{Result, TrackerError};
pub use models::{NotificationKind, PriceHistoryItem, Product, ScrapedProduct};
pub use notify::{LogMailer, Mailer, SmtpMailer};
pub use reconcile::reconcile;
pub use scrape::{AmazonScraper, Scraper};

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use config::{ProxyCredentials, SmtpSettings};
use models::EmailProductInfo;

// ---------------------------------------------------------------------------
// PriceTrackerBuilder
// ---------------------------------------------------------------------------

/// Builder for configuring and constructing a [`PriceTracker`].
///
/// Use [`PriceTracker::builder()`] to obtain one, or
/// [`PriceTrackerBuilder::from_config`] to start from environment settings.
pub struct PriceTrackerBuilder {
    db_path: Option<PathBuf>,
    in_memory: bool,
    timeout: Duration,
    proxy: Option<ProxyCredentials>,
    smtp: Option<SmtpSettings>,
    scraper: Option<Arc<dyn Scraper>>,
    mailer: Option<Box<dyn Mailer>>,
}

impl Default for PriceTrackerBuilder {
    fn default() -> Self {
        Self {
            db_path: None,
            in_memory: false,
            timeout: Duration::from_secs(30),
            proxy: None,
            smtp: None,
            scraper: None,
            mailer: None,
        }
    }
}

impl PriceTrackerBuilder {
    /// Start from settings read with [`TrackerConfig::from_env`].
    pub fn from_config(config: TrackerConfig) -> Self {
        Self {
            db_path: config.db_path,
            proxy: config.proxy,
            smtp: config.smtp,
            ..Self::default()
        }
    }

    /// Store products in the given DuckDB file.
    ///
    /// If not set, the platform data directory is used
    /// (e.g. `~/.local/share/price-tracker/products.duckdb` on Linux).
    pub fn db_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.db_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Keep everything in memory; nothing survives the process.
    pub fn in_memory(mut self, in_memory: bool) -> Self {
        self.in_memory = in_memory;
        self
    }

    /// HTTP timeout for product page requests. Defaults to 30 seconds.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Route scrapes through the rotating proxy with these credentials.
    pub fn proxy(mut self, proxy: ProxyCredentials) -> Self {
        self.proxy = Some(proxy);
        self
    }

    /// Send notifications through this SMTP relay.
    pub fn smtp(mut self, smtp: SmtpSettings) -> Self {
        self.smtp = Some(smtp);
        self
    }

    /// Use a custom scraper instead of [`AmazonScraper`].
    pub fn scraper<S: Scraper + 'static>(mut self, scraper: S) -> Self {
        self.scraper = Some(Arc::new(scraper));
        self
    }

    /// Use a custom mailer instead of SMTP / logging.
    pub fn mailer<M: Mailer + 'static>(mut self, mailer: M) -> Self {
        self.mailer = Some(Box::new(mailer));
        self
    }

    /// Open the database and wire up the scraper and mailer.
    pub fn build(self) -> Result<PriceTracker> {
        let (conn, location) = if self.in_memory {
            (Connection::open_in_memory()?, ":memory:".to_string())
        } else {
            let path = self.db_path.unwrap_or_else(config::default_db_path);
            (Connection::open(&path)?, path.display().to_string())
        };

        let scraper: Arc<dyn Scraper> = match self.scraper {
            Some(scraper) => scraper,
            None => Arc::new(AmazonScraper::new(self.proxy, self.timeout)?),
        };

        let mailer: Box<dyn Mailer> = match (self.mailer, self.smtp) {
            (Some(mailer), _) => mailer,
            (None, Some(smtp)) => Box::new(SmtpMailer::new(&smtp)?),
            (None, None) => {
                log::info!("No SMTP settings; notifications will only be logged");
                Box::new(LogMailer)
            }
        };

        log::info!("Price tracker ready (db={})", location);
        Ok(PriceTracker {
            conn,
            location,
            scraper,
            mailer,
        })
    }
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Result of merging one scrape into storage.
#[derive(Debug, Clone)]
pub struct RefreshOutcome {
    /// The record as stored after the merge.
    pub product: Product,
    /// The notification the scrape triggered, if any.
    pub notification: Option<NotificationKind>,
    /// How many subscribers the notification was addressed to.
    pub recipients: usize,
    /// Whether the mailer accepted the notification.
    pub delivered: bool,
}

#[derive(Debug, Clone)]
pub struct SweepFailure {
    pub url: String,
    pub error: String,
}

/// Per-URL results of a full re-scrape.
#[derive(Debug, Clone, Default)]
pub struct SweepReport {
    pub updated: Vec<RefreshOutcome>,
    /// URLs whose scrape produced no product this cycle.
    pub skipped: Vec<String>,
    pub failed: Vec<SweepFailure>,
}

impl SweepReport {
    /// File one URL's result under the right bucket.
    pub fn record(&mut self, url: String, outcome: Result<Option<RefreshOutcome>>) {
        match outcome {
            Ok(Some(outcome)) => self.updated.push(outcome),
            Ok(None) => self.skipped.push(url),
            Err(e) => {
                log::warn!("Refresh of {} failed: {}", url, e);
                self.failed.push(SweepFailure {
                    url,
                    error: e.to_string(),
                });
            }
        }
    }

    /// Number of notifications the mailer accepted (one per notified product).
    pub fn notifications(&self) -> usize {
        self.updated.iter().filter(|o| o.delivered).count()
    }

    /// Number of notifications that were addressed but failed to deliver.
    pub fn undelivered(&self) -> usize {
        self.updated
            .iter()
            .filter(|o| o.recipients > 0 && !o.delivered)
            .count()
    }
}

// ---------------------------------------------------------------------------
// PriceTracker
// ---------------------------------------------------------------------------

/// The main entry point.
///
/// Owns the storage [`Connection`] for its whole lifetime, plus the scraper
/// and mailer collaborators. Created via [`PriceTracker::builder()`].
pub struct PriceTracker {
    conn: Connection,
    location: String,
    scraper: Arc<dyn Scraper>,
    mailer: Box<dyn Mailer>,
}

impl PriceTracker {
    /// Create a new builder for configuring the tracker.
    pub fn builder() -> PriceTrackerBuilder {
        PriceTrackerBuilder::default()
    }

    /// Access the product storage interface.
    pub fn products(&self) -> queries::products::ProductQuery<'_> {
        queries::products::ProductQuery::new(&self.conn)
    }

    /// Look up a tracked product by id.
    pub fn product(&self, id: i64) -> Result<Option<Product>> {
        self.products().find_by_id(id)
    }

    /// A shared handle to the scraper, for callers that scrape off-thread.
    pub fn scraper(&self) -> Arc<dyn Scraper> {
        Arc::clone(&self.scraper)
    }

    // -- Pipeline ----------------------------------------------------------

    /// Scrape `url` and store the result, creating the record on first sight.
    ///
    /// No emails are sent. A failed or empty scrape leaves storage untouched
    /// and returns `Ok(None)`.
    pub fn track_product(&self, url: &str) -> Result<Option<Product>> {
        let url = url.trim();
        if !scrape::is_valid_amazon_url(url) {
            return Err(TrackerError::InvalidArgument(format!(
                "Not an Amazon product URL: {}",
                url
            )));
        }

        let scraped = match self.scraper.scrape(url) {
            Ok(Some(scraped)) => scraped,
            Ok(None) => return Ok(None),
            Err(e) => {
                log::warn!("Scrape of {} failed: {}", url, e);
                return Ok(None);
            }
        };

        let store = self.products();
        let existing = store.find_by_url(&scraped.url)?;
        let stored = store.upsert(&reconcile(&scraped, existing.as_ref()))?;
        log::info!("Tracking {} (id {:?})", stored.url, stored.id);
        Ok(Some(stored))
    }

    /// Merge a scrape into storage and notify subscribers if it warrants it.
    ///
    /// Classification runs against the record as it was before this scrape.
    pub fn process_snapshot(&self, scraped: &ScrapedProduct) -> Result<RefreshOutcome> {
        let store = self.products();
        let existing = store.find_by_url(&scraped.url)?;
        let notification = existing.as_ref().and_then(|prior| classify(scraped, prior));

        let stored = store.upsert(&reconcile(scraped, existing.as_ref()))?;

        let (recipients, delivered) = match notification {
            Some(kind) => {
                let emails = stored.subscriber_emails();
                (emails.len(), self.dispatch(kind, &stored, &emails))
            }
            None => (0, false),
        };

        Ok(RefreshOutcome {
            product: stored,
            notification,
            recipients,
            delivered,
        })
    }

    /// Re-scrape one URL and process the result.
    ///
    /// `Ok(None)` means the scraper found nothing this cycle.
    pub fn refresh(&self, url: &str) -> Result<Option<RefreshOutcome>> {
        match self.scraper.scrape(url)? {
            Some(scraped) => self.process_snapshot(&scraped).map(Some),
            None => {
                log::info!("No product data for {}; skipping this cycle", url);
                Ok(None)
            }
        }
    }

    /// Re-scrape every tracked product.
    ///
    /// A failure for one URL is recorded in the report and does not stop the
    /// others.
    pub fn sweep(&self) -> Result<SweepReport> {
        let urls = self.products().urls()?;
        let mut report = SweepReport::default();
        for url in urls {
            let outcome = self.refresh(&url);
            report.record(url, outcome);
        }
        log::info!(
            "Sweep done: {} updated, {} skipped, {} failed",
            report.updated.len(),
            report.skipped.len(),
            report.failed.len()
        );
        Ok(report)
    }

    /// Subscribe `email` to a product's alerts.
    ///
    /// A new subscriber gets a single WELCOME email; subscribing again is a
    /// no-op. Returns `Ok(None)` if no product has this id.
    pub fn subscribe(&self, product_id: i64, email: &str) -> Result<Option<Product>> {
        let email = email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(TrackerError::InvalidArgument(format!(
                "Invalid email address: {:?}",
                email
            )));
        }

        let store = self.products();
        let Some(mut product) = store.find_by_id(product_id)? else {
            return Ok(None);
        };
        if !reconcile::add_subscriber(&mut product, email) {
            return Ok(Some(product));
        }

        let stored = store.upsert(&product)?;
        self.dispatch(NotificationKind::Welcome, &stored, &[email.to_string()]);
        Ok(Some(stored))
    }

    /// Render and send one notification. Delivery errors are logged, not
    /// returned. Returns whether the mailer accepted it.
    fn dispatch(&self, kind: NotificationKind, product: &Product, recipients: &[String]) -> bool {
        if recipients.is_empty() {
            return false;
        }
        let info = EmailProductInfo {
            title: product.title.clone(),
            url: product.url.clone(),
        };
        let content = notify::render(kind, &info);
        match self.mailer.deliver(&content, recipients) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Failed to deliver {} email for {}: {}", kind, product.url, e);
                false
            }
        }
    }

    /// Consume the tracker and release the database.
    pub fn close(self) {
        drop(self);
    }

    /// Return a reference to the underlying [`Connection`] for advanced usage.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

impl fmt::Display for PriceTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self.products().count().unwrap_or(0);
        write!(f, "PriceTracker(db={}, products={})", self.location, count)
    }
}
