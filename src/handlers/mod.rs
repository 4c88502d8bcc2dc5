pub mod demo;
pub mod plaid;
pub mod reports;
pub mod transactions;

use axum::{Json, response::IntoResponse};
use serde_json::json;

pub async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "OK",
        "message": "Clarity Finance Backend is running",
    }))
}
