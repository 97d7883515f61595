//! Amazon product page scraping.
//!
//! [`AmazonScraper`] fetches a product page (optionally through the Bright
//! Data rotating proxy) and hands the HTML to [`parse_product_page`], which is
//! pure and can be exercised against saved pages.

use std::time::Duration;

use rand::Rng;
use reqwest::blocking::Client;
use reqwest::Url;
use scraper::{Html, Selector};

use crate::config::{self, ProxyCredentials};
use crate::error::Result;
use crate::models::ScrapedProduct;

const CURRENT_PRICE_SELECTORS: &[&str] = &[
    ".priceToPay span.a-price-whole",
    ".a.size.base.a-color-price",
    ".a-button-selected .a-color-base",
];

const ORIGINAL_PRICE_SELECTORS: &[&str] = &[
    "#priceblock_ourprice",
    ".a-price.a-text-price span.a-offscreen",
    "#listPrice",
    "#priceblock_dealprice",
    ".a-size-base.a-color-price",
];

const DESCRIPTION_SELECTORS: &[&str] = &[
    ".a-unordered-list .a-list-item",
    ".a-expander-content p",
];

const IMAGE_SELECTORS: &[&str] = &["#imgBlkFront", "#landingImage"];

/// Fetches a product page and turns it into a snapshot.
///
/// `Ok(None)` means the page was fetched but held no usable product.
pub trait Scraper: Send + Sync {
    fn scrape(&self, url: &str) -> Result<Option<ScrapedProduct>>;
}

/// Whether `url` parses and points at an Amazon storefront.
pub fn is_valid_amazon_url(url: &str) -> bool {
    match Url::parse(url) {
        Ok(parsed) => parsed
            .host_str()
            .map(|host| host.contains("amazon.") || host.ends_with("amazon"))
            .unwrap_or(false),
        Err(_) => false,
    }
}

// ---------------------------------------------------------------------------
// AmazonScraper
// ---------------------------------------------------------------------------

pub struct AmazonScraper {
    client: Client,
    proxy: Option<ProxyCredentials>,
    timeout: Duration,
}

impl AmazonScraper {
    pub fn new(proxy: Option<ProxyCredentials>, timeout: Duration) -> Result<Self> {
        let client = Self::build_client(None, timeout)?;
        Ok(Self {
            client,
            proxy,
            timeout,
        })
    }

    fn build_client(proxy: Option<reqwest::Proxy>, timeout: Duration) -> Result<Client> {
        let mut builder = Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(10));
        if let Some(proxy) = proxy {
            // The proxy terminates TLS with its own certificate.
            builder = builder.proxy(proxy).danger_accept_invalid_certs(true);
        }
        Ok(builder.build()?)
    }

    /// A client routed through a fresh proxy session, or the shared direct client.
    fn client_for_request(&self) -> Result<Client> {
        let Some(creds) = &self.proxy else {
            return Ok(self.client.clone());
        };
        let session_id: u32 = rand::thread_rng().gen_range(0..1_000_000);
        let proxy = reqwest::Proxy::all(format!(
            "http://{}:{}",
            config::PROXY_HOST,
            config::PROXY_PORT
        ))?
        .basic_auth(
            &format!("{}-session-{}", creds.username, session_id),
            &creds.password,
        );
        Self::build_client(Some(proxy), self.timeout)
    }
}

impl Scraper for AmazonScraper {
    fn scrape(&self, url: &str) -> Result<Option<ScrapedProduct>> {
        if url.trim().is_empty() {
            return Ok(None);
        }
        let client = self.client_for_request()?;
        log::debug!("Fetching {}", url);
        let html = client.get(url).send()?.error_for_status()?.text()?;
        Ok(parse_product_page(url, &html))
    }
}

// ---------------------------------------------------------------------------
// Page parsing
// ---------------------------------------------------------------------------

/// Extract a snapshot from a product page.
///
/// Returns `None` when the page has no product title (robot checks, error
/// pages).
pub fn parse_product_page(url: &str, html: &str) -> Option<ScrapedProduct> {
    let doc = Html::parse_document(html);

    let title = first_text(&doc, "#productTitle");
    if title.is_empty() {
        log::warn!("No product title found at {}", url);
        return None;
    }

    let current_texts: Vec<String> = CURRENT_PRICE_SELECTORS
        .iter()
        .map(|sel| all_text(&doc, sel))
        .collect();
    let original_texts: Vec<String> = ORIGINAL_PRICE_SELECTORS
        .iter()
        .map(|sel| all_text(&doc, sel))
        .collect();
    let current = parse_number(&extract_price(&current_texts));
    let original = parse_number(&extract_price(&original_texts));

    let is_out_of_stock =
        all_text(&doc, "#availability span").to_lowercase() == "currently unavailable";

    let currency = extract_currency(&first_text(&doc, ".a-price-symbol"));
    let discount = first_text(&doc, ".savingsPercentage").replace(['-', '%'], "");

    Some(ScrapedProduct {
        url: url.to_string(),
        currency: if currency.is_empty() {
            "$".to_string()
        } else {
            currency
        },
        image: extract_image(&doc).unwrap_or_default(),
        title,
        current_price: current.or(original).unwrap_or(0.0),
        original_price: original.or(current).unwrap_or(0.0),
        discount_rate: discount.trim().parse().unwrap_or(0.0),
        description: extract_description(&doc),
        // Not scraped; fixed values keep the stored record shape stable.
        category: "category".to_string(),
        reviews_count: 100,
        stars: 4.5,
        is_out_of_stock,
    })
}

/// Pick the price out of the first non-empty candidate text.
///
/// Everything but digits and `.` is dropped, then the first `digits.dd` run
/// wins; without one the cleaned text is returned as-is.
pub fn extract_price<S: AsRef<str>>(texts: &[S]) -> String {
    for text in texts {
        let text = text.as_ref().trim();
        if text.is_empty() {
            continue;
        }
        let clean: String = text
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '.')
            .collect();
        return first_two_decimal_price(&clean).unwrap_or(clean);
    }
    String::new()
}

/// First character of a currency label, or empty.
pub fn extract_currency(text: &str) -> String {
    text.trim().chars().next().map(String::from).unwrap_or_default()
}

/// Find the first `\d+\.\d{2}` run in `s`.
fn first_two_decimal_price(s: &str) -> Option<String> {
    let bytes = s.as_bytes();
    let mut start = 0;
    while start < bytes.len() {
        if !bytes[start].is_ascii_digit() {
            start += 1;
            continue;
        }
        let mut end = start;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
        if end + 2 < bytes.len()
            && bytes[end] == b'.'
            && bytes[end + 1].is_ascii_digit()
            && bytes[end + 2].is_ascii_digit()
        {
            return Some(s[start..end + 3].to_string());
        }
        start = end;
    }
    None
}

/// Parse a cleaned price; empty, unparsable and zero all count as missing.
fn parse_number(s: &str) -> Option<f64> {
    s.parse::<f64>().ok().filter(|n| *n != 0.0 && n.is_finite())
}

fn extract_image(doc: &Html) -> Option<String> {
    for sel in IMAGE_SELECTORS {
        let Some(attr) = first_attr(doc, sel, "data-a-dynamic-image") else {
            continue;
        };
        if attr.trim().is_empty() {
            continue;
        }
        // The attribute maps image URL -> [width, height]; the first key is the
        // primary image.
        return serde_json::from_str::<serde_json::Map<String, serde_json::Value>>(&attr)
            .ok()
            .and_then(|map| map.keys().next().cloned());
    }
    None
}

fn extract_description(doc: &Html) -> String {
    for sel in DESCRIPTION_SELECTORS {
        let Ok(selector) = Selector::parse(sel) else {
            continue;
        };
        let lines: Vec<String> = doc
            .select(&selector)
            .map(|el| el.text().collect::<String>().trim().to_string())
            .collect();
        if !lines.is_empty() {
            return lines.join("\n");
        }
    }
    String::new()
}

/// Concatenated text of every match, trimmed.
fn all_text(doc: &Html, sel: &str) -> String {
    let Ok(selector) = Selector::parse(sel) else {
        return String::new();
    };
    doc.select(&selector)
        .flat_map(|el| el.text())
        .collect::<String>()
        .trim()
        .to_string()
}

/// Text of the first match, trimmed.
fn first_text(doc: &Html, sel: &str) -> String {
    let Ok(selector) = Selector::parse(sel) else {
        return String::new();
    };
    doc.select(&selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

fn first_attr(doc: &Html, sel: &str, attr: &str) -> Option<String> {
    let selector = Selector::parse(sel).ok()?;
    doc.select(&selector)
        .next()
        .and_then(|el| el.value().attr(attr))
        .map(str::to_string)
}
