//! Decides which email, if any, a fresh scrape should trigger.

use crate::config::THRESHOLD_PERCENTAGE;
use crate::models::{NotificationKind, Product, ScrapedProduct};
use crate::pricing;

/// Classify a scrape against the record as it was *before* this scrape.
///
/// Checks run in priority order and the first match wins:
/// 1. `LowestPrice` when the new price undercuts the stored historical low.
/// 2. `ChangeOfStock` when the product went from out of stock to in stock.
/// 3. `ThresholdMet` when the discount is at least [`THRESHOLD_PERCENTAGE`].
///
/// `Welcome` is never produced here; it belongs to subscription.
pub fn classify(scraped: &ScrapedProduct, current: &Product) -> Option<NotificationKind> {
    if let Some(lowest) = pricing::lowest_price(&current.price_history) {
        if scraped.current_price < lowest {
            return Some(NotificationKind::LowestPrice);
        }
    }

    if !scraped.is_out_of_stock && current.is_out_of_stock {
        return Some(NotificationKind::ChangeOfStock);
    }

    if scraped.discount_rate >= THRESHOLD_PERCENTAGE {
        return Some(NotificationKind::ThresholdMet);
    }

    None
}
