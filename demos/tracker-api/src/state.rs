/// Shared application state available to all route handlers via Axum's
/// `State` extractor.
pub struct AppState {
    /// The async tracker. Storage work is dispatched to the blocking pool
    /// internally.
    pub tracker: price_tracker::AsyncPriceTracker,
}
