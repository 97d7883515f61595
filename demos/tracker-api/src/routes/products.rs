use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::AppError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct TrackProductBody {
    pub url: String,
}

#[derive(Deserialize)]
pub struct SubscribeBody {
    pub email: String,
}

/// GET /api/products
///
/// List every tracked product with its price history.
pub async fn list_products(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, AppError> {
    let products = state.tracker.products().await?;
    let count = products.len();
    Ok(Json(json!({ "data": products, "count": count })))
}

/// POST /api/products  {"url": "https://www.amazon.com/dp/..."}
///
/// Scrape a product page and start (or continue) tracking it.
pub async fn track_product(
    State(state): State<Arc<AppState>>,
    Json(body): Json<TrackProductBody>,
) -> Result<Json<Value>, AppError> {
    let product = state.tracker.track_product(&body.url).await?;

    match product {
        Some(p) => Ok(Json(json!({ "data": p }))),
        None => Err(AppError::unprocessable(format!(
            "Could not scrape a product from {}",
            body.url
        ))),
    }
}

/// GET /api/products/:id
pub async fn get_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    match state.tracker.product(id).await? {
        Some(p) => Ok(Json(json!({ "data": p }))),
        None => Err(AppError::not_found("Product not found")),
    }
}

/// POST /api/products/:id/subscribers  {"email": "me@example.com"}
///
/// Subscribe an email to the product's alerts. New subscribers get a
/// welcome email; repeats are accepted silently.
pub async fn subscribe(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(body): Json<SubscribeBody>,
) -> Result<Json<Value>, AppError> {
    match state.tracker.subscribe(id, &body.email).await? {
        Some(p) => Ok(Json(json!({ "data": p }))),
        None => Err(AppError::not_found("Product not found")),
    }
}
