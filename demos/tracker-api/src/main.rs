mod error;
mod routes;
mod state;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use price_tracker::{AsyncPriceTracker, PriceTrackerBuilder, TrackerConfig};
use state::AppState;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Opening product database...");
    let builder = PriceTrackerBuilder::from_config(TrackerConfig::from_env());
    let tracker = AsyncPriceTracker::build(builder)
        .await
        .expect("Failed to initialize price tracker");

    let state = Arc::new(AppState { tracker });

    let app = Router::new()
        .route(
            "/api/products",
            get(routes::products::list_products).post(routes::products::track_product),
        )
        .route("/api/products/{id}", get(routes::products::get_product))
        .route(
            "/api/products/{id}/subscribers",
            post(routes::products::subscribe),
        )
        .route("/api/cron", get(routes::cron::run_sweep))
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = "0.0.0.0:3000";
    log::info!("Listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
