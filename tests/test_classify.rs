//! Notification classification priority and boundaries.

mod common;

use common::{snapshot, URL_A};
use price_tracker::{classify, reconcile, NotificationKind, Product, ScrapedProduct};

/// A stored record whose history holds `prices`.
fn record(prices: &[f64], out_of_stock: bool) -> Product {
    let mut iter = prices.iter();
    let first = *iter.next().expect("at least one price");
    let mut product = reconcile(&snapshot(URL_A, first), None);
    for p in iter {
        product = reconcile(&snapshot(URL_A, *p), Some(&product));
    }
    product.is_out_of_stock = out_of_stock;
    product
}

fn scrape(price: f64, out_of_stock: bool, discount: f64) -> ScrapedProduct {
    let mut s = snapshot(URL_A, price);
    s.is_out_of_stock = out_of_stock;
    s.discount_rate = discount;
    s
}

#[test]
fn new_low_is_lowest_price() {
    let current = record(&[10.0, 8.0, 12.0], false);
    assert_eq!(
        classify(&scrape(7.0, false, 0.0), &current),
        Some(NotificationKind::LowestPrice)
    );
}

#[test]
fn lowest_price_beats_stock_change_and_threshold() {
    let current = record(&[10.0, 8.0], true);
    assert_eq!(
        classify(&scrape(5.0, false, 60.0), &current),
        Some(NotificationKind::LowestPrice)
    );
}

#[test]
fn matching_the_historical_low_is_not_a_new_low() {
    let current = record(&[10.0, 8.0], false);
    assert_eq!(classify(&scrape(8.0, false, 0.0), &current), None);
}

#[test]
fn back_in_stock_is_change_of_stock() {
    let current = record(&[10.0], true);
    assert_eq!(
        classify(&scrape(10.0, false, 50.0), &current),
        Some(NotificationKind::ChangeOfStock)
    );
}

#[test]
fn staying_in_stock_is_not_change_of_stock() {
    let current = record(&[10.0], false);
    assert_ne!(
        classify(&scrape(10.0, false, 0.0), &current),
        Some(NotificationKind::ChangeOfStock)
    );
}

#[test]
fn going_out_of_stock_notifies_nobody() {
    let current = record(&[10.0], false);
    assert_eq!(classify(&scrape(10.0, true, 0.0), &current), None);
}

#[test]
fn discount_threshold_is_inclusive() {
    let current = record(&[10.0], false);
    assert_eq!(
        classify(&scrape(10.0, false, 40.0), &current),
        Some(NotificationKind::ThresholdMet)
    );
    assert_eq!(classify(&scrape(10.0, false, 39.9), &current), None);
}

#[test]
fn empty_history_skips_the_lowest_price_check() {
    let mut current = record(&[10.0], false);
    current.price_history.clear();
    assert_eq!(classify(&scrape(1.0, false, 0.0), &current), None);
}

#[test]
fn classification_never_yields_welcome() {
    let current = record(&[10.0, 8.0], true);
    for (price, oos, discount) in [(1.0, false, 90.0), (10.0, false, 0.0), (10.0, true, 45.0)] {
        assert_ne!(
            classify(&scrape(price, oos, discount), &current),
            Some(NotificationKind::Welcome)
        );
    }
}
