use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// PriceHistoryItem: One observed price, in scrape order
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceHistoryItem {
    pub price: f64,
}

impl PriceHistoryItem {
    pub fn new(price: f64) -> Self {
        Self { price }
    }
}

// ---------------------------------------------------------------------------
// User: A subscriber to a product's notifications
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub email: String,
}

// ---------------------------------------------------------------------------
// ScrapedProduct: Fresh, not-yet-persisted product page data
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapedProduct {
    pub url: String,
    pub currency: String,
    pub image: String,
    pub title: String,
    pub current_price: f64,
    pub original_price: f64,
    pub discount_rate: f64,
    pub description: String,
    /// Placeholder; product pages are not mined for a category.
    pub category: String,
    /// Placeholder; always 100 from [`parse_product_page`](crate::scrape::parse_product_page).
    pub reviews_count: i64,
    /// Placeholder; always 4.5 from [`parse_product_page`](crate::scrape::parse_product_page).
    pub stars: f64,
    pub is_out_of_stock: bool,
}

// ---------------------------------------------------------------------------
// Product: Persisted record with price history and subscribers
// ---------------------------------------------------------------------------

/// A tracked product.
///
/// `lowest_price`, `highest_price` and `average_price` always describe
/// `price_history`; they are recomputed whenever the history changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Storage-assigned id, `None` until the record is first persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub url: String,
    pub currency: String,
    pub image: String,
    pub title: String,
    pub current_price: f64,
    pub original_price: f64,
    pub price_history: Vec<PriceHistoryItem>,
    pub highest_price: f64,
    pub lowest_price: f64,
    pub average_price: f64,
    pub discount_rate: f64,
    pub description: String,
    pub category: String,
    pub reviews_count: i64,
    pub stars: f64,
    pub is_out_of_stock: bool,
    #[serde(default)]
    pub users: Vec<User>,
}

impl Product {
    /// Whether `email` is already in the subscriber set.
    pub fn has_subscriber(&self, email: &str) -> bool {
        self.users.iter().any(|u| u.email == email)
    }

    /// Subscriber emails, in subscription order.
    pub fn subscriber_emails(&self) -> Vec<String> {
        self.users.iter().map(|u| u.email.clone()).collect()
    }
}
