//! Shared test fixtures: scripted scraper, recording mailer, sample snapshots.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use price_tracker::models::EmailContent;
use price_tracker::{Mailer, PriceTracker, Result, ScrapedProduct, Scraper, TrackerError};

pub const URL_A: &str = "https://www.amazon.com/dp/A000000001";
pub const URL_B: &str = "https://www.amazon.com/dp/B000000002";
pub const URL_C: &str = "https://www.amazon.co.uk/dp/C000000003";

/// Build a snapshot with sensible defaults.
pub fn snapshot(url: &str, price: f64) -> ScrapedProduct {
    ScrapedProduct {
        url: url.to_string(),
        currency: "$".to_string(),
        image: "https://m.media-amazon.com/images/I/sample.jpg".to_string(),
        title: "Noise Cancelling Wireless Headphones".to_string(),
        current_price: price,
        original_price: price,
        discount_rate: 0.0,
        description: "Great sound".to_string(),
        category: "category".to_string(),
        reviews_count: 100,
        stars: 4.5,
        is_out_of_stock: false,
    }
}

// ---------------------------------------------------------------------------
// FakeScraper
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum Scripted {
    Page(ScrapedProduct),
    Missing,
    Fail,
}

/// Scraper answering from a script the test can change between calls.
#[derive(Clone, Default)]
pub struct FakeScraper {
    pages: Arc<Mutex<HashMap<String, Scripted>>>,
}

impl FakeScraper {
    pub fn set(&self, product: ScrapedProduct) {
        self.pages
            .lock()
            .unwrap()
            .insert(product.url.clone(), Scripted::Page(product));
    }

    pub fn set_missing(&self, url: &str) {
        self.pages
            .lock()
            .unwrap()
            .insert(url.to_string(), Scripted::Missing);
    }

    pub fn set_failing(&self, url: &str) {
        self.pages
            .lock()
            .unwrap()
            .insert(url.to_string(), Scripted::Fail);
    }
}

impl Scraper for FakeScraper {
    fn scrape(&self, url: &str) -> Result<Option<ScrapedProduct>> {
        match self.pages.lock().unwrap().get(url).cloned() {
            Some(Scripted::Page(p)) => Ok(Some(p)),
            Some(Scripted::Missing) | None => Ok(None),
            Some(Scripted::Fail) => Err(TrackerError::NotFound(format!(
                "scripted failure for {}",
                url
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// RecordingMailer / FailingMailer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct SentMail {
    pub content: EmailContent,
    pub recipients: Vec<String>,
}

#[derive(Clone, Default)]
pub struct RecordingMailer {
    sent: Arc<Mutex<Vec<SentMail>>>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().unwrap().clone()
    }
}

impl Mailer for RecordingMailer {
    fn deliver(&self, content: &EmailContent, recipients: &[String]) -> Result<()> {
        self.sent.lock().unwrap().push(SentMail {
            content: content.clone(),
            recipients: recipients.to_vec(),
        });
        Ok(())
    }
}

pub struct FailingMailer;

impl Mailer for FailingMailer {
    fn deliver(&self, _content: &EmailContent, _recipients: &[String]) -> Result<()> {
        Err(TrackerError::Mail("relay refused connection".into()))
    }
}

/// An in-memory tracker wired to a fresh scripted scraper and recording mailer.
pub fn setup_tracker() -> (PriceTracker, FakeScraper, RecordingMailer) {
    let scraper = FakeScraper::default();
    let mailer = RecordingMailer::default();
    let tracker = PriceTracker::builder()
        .in_memory(true)
        .scraper(scraper.clone())
        .mailer(mailer.clone())
        .build()
        .unwrap();
    (tracker, scraper, mailer)
}
