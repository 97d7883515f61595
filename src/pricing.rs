//! Min / max / mean over a product's price history.

use serde::{Deserialize, Serialize};

use crate::models::PriceHistoryItem;

/// Aggregated statistics for a price history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PriceSummary {
    pub highest_price: f64,
    pub lowest_price: f64,
    pub average_price: f64,
}

impl PriceSummary {
    /// Summarize a history. Returns `None` for an empty history.
    pub fn of(history: &[PriceHistoryItem]) -> Option<Self> {
        Some(Self {
            highest_price: highest(history)?.price,
            lowest_price: lowest(history)?.price,
            average_price: average_price(history),
        })
    }
}

/// The entry with the greatest price. Ties keep the earliest entry.
pub fn highest(history: &[PriceHistoryItem]) -> Option<&PriceHistoryItem> {
    let mut iter = history.iter();
    let mut best = iter.next()?;
    for item in iter {
        if item.price > best.price {
            best = item;
        }
    }
    Some(best)
}

/// The entry with the smallest price. Ties keep the earliest entry.
pub fn lowest(history: &[PriceHistoryItem]) -> Option<&PriceHistoryItem> {
    let mut iter = history.iter();
    let mut best = iter.next()?;
    for item in iter {
        if item.price < best.price {
            best = item;
        }
    }
    Some(best)
}

pub fn highest_price(history: &[PriceHistoryItem]) -> Option<f64> {
    highest(history).map(|item| item.price)
}

pub fn lowest_price(history: &[PriceHistoryItem]) -> Option<f64> {
    lowest(history).map(|item| item.price)
}

/// Arithmetic mean of all prices; `0.0` for an empty history.
pub fn average_price(history: &[PriceHistoryItem]) -> f64 {
    if history.is_empty() {
        return 0.0;
    }
    let sum: f64 = history.iter().map(|item| item.price).sum();
    sum / history.len() as f64
}
