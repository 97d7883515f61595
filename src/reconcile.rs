//! Merging a fresh scrape into a stored record, and subscriber bookkeeping.

use crate::models::{PriceHistoryItem, Product, ScrapedProduct, User};
use crate::pricing::PriceSummary;

/// Merge `scraped` into `existing`, or build a new record when there is none.
///
/// Only the price history (extended by the new price), the subscriber set and
/// the storage id survive from `existing`; every other field comes from the
/// scrape. The aggregates are recomputed over the extended history.
pub fn reconcile(scraped: &ScrapedProduct, existing: Option<&Product>) -> Product {
    let (id, mut price_history, users) = match existing {
        Some(prior) => (prior.id, prior.price_history.clone(), prior.users.clone()),
        None => (None, Vec::with_capacity(1), Vec::new()),
    };
    price_history.push(PriceHistoryItem::new(scraped.current_price));

    let summary = PriceSummary::of(&price_history).unwrap_or(PriceSummary {
        highest_price: scraped.current_price,
        lowest_price: scraped.current_price,
        average_price: scraped.current_price,
    });

    Product {
        id,
        url: scraped.url.clone(),
        currency: scraped.currency.clone(),
        image: scraped.image.clone(),
        title: scraped.title.clone(),
        current_price: scraped.current_price,
        original_price: scraped.original_price,
        price_history,
        highest_price: summary.highest_price,
        lowest_price: summary.lowest_price,
        average_price: summary.average_price,
        discount_rate: scraped.discount_rate,
        description: scraped.description.clone(),
        category: scraped.category.clone(),
        reviews_count: scraped.reviews_count,
        stars: scraped.stars,
        is_out_of_stock: scraped.is_out_of_stock,
        users,
    }
}

/// Add `email` to the product's subscribers.
///
/// Returns `true` if the email was new, `false` if it was already subscribed
/// (in which case the product is left untouched).
pub fn add_subscriber(product: &mut Product, email: &str) -> bool {
    if product.has_subscriber(email) {
        return false;
    }
    product.users.push(User {
        email: email.to_string(),
    });
    true
}
