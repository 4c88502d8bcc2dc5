use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;

use crate::AppState;
use crate::aggregation::{self, TransactionFilter};
use crate::db::models::{NewTransaction, TransactionType};
use crate::db::queries::{self, TransactionUpdate};
use crate::error::AppError;
use crate::supabase::AuthUser;

/// Lists the caller's transactions, newest first, with the optional
/// conjunctive search/category/type filters applied.
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(filter): Query<TransactionFilter>,
) -> Result<impl IntoResponse, AppError> {
    let rows = queries::list_transactions(&state.db, &user.id).await?;

    Ok(Json(aggregation::filter_transactions(rows, &filter)))
}

#[derive(Debug, Deserialize)]
pub struct CreateTransactionRequest {
    pub date: NaiveDate,
    pub description: String,
    pub amount: f64,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub subcategory: String,
    pub account_id: String,
}

fn default_category() -> String {
    "Other".to_string()
}

pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<CreateTransactionRequest>,
) -> Result<impl IntoResponse, AppError> {
    if body.description.trim().is_empty() {
        return Err(AppError::Validation("Description is required".to_string()));
    }
    if !body.amount.is_finite() {
        return Err(AppError::Validation("Amount must be a number".to_string()));
    }

    let record = NewTransaction {
        date: body.date,
        description: body.description,
        // Stored amounts are magnitudes; direction lives in the type.
        amount: body.amount.abs(),
        kind: body.kind,
        category: body.category,
        subcategory: body.subcategory,
        account_id: body.account_id,
        user_id: Some(user.id),
    };

    let inserted = queries::insert_transaction(&state.db, &record).await?;

    Ok((StatusCode::CREATED, Json(inserted)))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(mut changes): Json<TransactionUpdate>,
) -> Result<impl IntoResponse, AppError> {
    changes.amount = changes.amount.map(f64::abs);

    let updated = queries::update_transaction(&state.db, id, &changes)
        .await
        .map_err(|err| match err {
            sqlx::Error::RowNotFound => AppError::NotFound(format!("Transaction {} not found", id)),
            other => AppError::Database(other),
        })?;

    Ok(Json(updated))
}

pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let deleted = queries::delete_transaction(&state.db, id).await?;

    if !deleted {
        return Err(AppError::NotFound(format!("Transaction {} not found", id)));
    }

    Ok(Json(json!({ "success": true })))
}
