use axum::{Json, extract::State, response::IntoResponse};

use crate::AppState;

pub async fn transactions(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.demo.transactions().to_vec())
}

pub async fn accounts(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.demo.accounts())
}
