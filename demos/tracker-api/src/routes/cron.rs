use std::sync::Arc;

use axum::extract::State;
use axum::response::Json;
use serde_json::{json, Value};

use crate::error::AppError;
use crate::state::AppState;

/// GET /api/cron
///
/// Re-scrape every tracked product, update price history and email
/// subscribers. Meant to be hit by an external scheduler.
pub async fn run_sweep(State(state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    let report = state.tracker.sweep().await?;

    let updated: Vec<Value> = report
        .updated
        .iter()
        .map(|o| {
            json!({
                "product": o.product,
                "notification": o.notification,
                "recipients": o.recipients,
                "delivered": o.delivered,
            })
        })
        .collect();
    let failed: Vec<Value> = report
        .failed
        .iter()
        .map(|f| json!({ "url": f.url, "error": f.error }))
        .collect();

    Ok(Json(json!({
        "message": "Ok",
        "data": updated,
        "skipped": report.skipped,
        "failed": failed,
        "notifications": report.notifications(),
        "undelivered": report.undelivered(),
    })))
}
