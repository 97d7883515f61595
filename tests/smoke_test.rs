//! Live smoke test against a real Amazon product page.
//!
//! Scrapes over the network (through the Bright Data proxy when its
//! credentials are set) and runs the tracker pipeline on an in-memory
//! database. Set `PRICE_TRACKER_SMOKE_URL` to try a different product.
//!
//! Run with:
//! ```sh
//! cargo test --test smoke_test -- --ignored --nocapture
//! ```

use std::time::Duration;

use price_tracker::scrape::is_valid_amazon_url;
use price_tracker::{AmazonScraper, PriceTrackerBuilder, Scraper, TrackerConfig};

const DEFAULT_URL: &str = "https://www.amazon.com/dp/B0BSHF7WHW";

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn section(name: &str) {
    eprintln!("\n{}", "=".repeat(60));
    eprintln!("  {}", name);
    eprintln!("{}", "=".repeat(60));
}

struct Counters {
    pass: usize,
    fail: usize,
    skip: usize,
}

impl Counters {
    fn new() -> Self {
        Self {
            pass: 0,
            fail: 0,
            skip: 0,
        }
    }

    fn check(&mut self, label: &str, condition: bool, detail: &str) {
        let status = if condition { "PASS" } else { "FAIL" };
        if condition {
            self.pass += 1;
        } else {
            self.fail += 1;
        }
        eprintln!("  [{}] {} -- {}", status, label, detail);
    }

    fn skip(&mut self, label: &str, reason: &str) {
        self.skip += 1;
        eprintln!("  [SKIP] {} -- {}", label, reason);
    }
}

// ---------------------------------------------------------------------------
// Main smoke test
// ---------------------------------------------------------------------------

#[test]
#[ignore]
fn smoke_test() {
    let url = std::env::var("PRICE_TRACKER_SMOKE_URL").unwrap_or_else(|_| DEFAULT_URL.into());
    let config = TrackerConfig::from_env();
    let mut c = Counters::new();

    section("SCRAPER");
    c.check("URL is an Amazon URL", is_valid_amazon_url(&url), &url);

    let scraper = AmazonScraper::new(config.proxy.clone(), Duration::from_secs(30)).unwrap();
    match scraper.scrape(&url) {
        Ok(Some(product)) => {
            c.check("title", !product.title.is_empty(), &product.title);
            c.check(
                "current price",
                product.current_price.is_finite() && product.current_price >= 0.0,
                &format!("{}{}", product.currency, product.current_price),
            );
            c.check(
                "discount rate",
                (0.0..=100.0).contains(&product.discount_rate),
                &format!("{}%", product.discount_rate),
            );
        }
        Ok(None) => c.skip("page fields", "no product title (blocked or captcha page)"),
        Err(e) => c.check("scrape", false, &e.to_string()),
    }

    section("PIPELINE");
    // No subscribers are added, so no mail is sent even with SMTP configured.
    let tracker = PriceTrackerBuilder::from_config(config)
        .in_memory(true)
        .build()
        .unwrap();
    match tracker.track_product(&url) {
        Ok(Some(product)) => {
            c.check(
                "track_product stores one price",
                product.price_history.len() == 1,
                &format!("id={:?}", product.id),
            );
            let report = tracker.sweep().unwrap();
            c.check(
                "sweep visits the product",
                report.updated.len() + report.skipped.len() + report.failed.len() == 1,
                &format!(
                    "updated={} skipped={} failed={}",
                    report.updated.len(),
                    report.skipped.len(),
                    report.failed.len()
                ),
            );
        }
        Ok(None) => c.skip("track_product", "scrape yielded no product"),
        Err(e) => c.check("track_product", false, &e.to_string()),
    }

    section("SMOKE TEST COMPLETE");
    eprintln!("  Passed:  {}", c.pass);
    eprintln!("  Failed:  {}", c.fail);
    eprintln!("  Skipped: {}", c.skip);
    assert_eq!(c.fail, 0, "{} smoke test checks failed", c.fail);
}
