use axum::{
    Extension, Json,
    extract::{Query, State},
    response::IntoResponse,
};
use serde::Deserialize;

use crate::AppState;
use crate::aggregation;
use crate::db::models::Transaction;
use crate::db::queries;
use crate::error::AppError;
use crate::supabase::AuthUser;

#[derive(Debug, Default, Deserialize)]
pub struct ReportParams {
    /// Compute over the bundled demo dataset instead of stored rows.
    #[serde(default)]
    pub demo: bool,
    /// Restrict the category breakdown to one `YYYY-MM` month.
    pub month: Option<String>,
}

/// The report routes are agnostic to where the rows came from: demo
/// mode and the live path feed the same aggregation functions.
async fn source_transactions(
    state: &AppState,
    user: &AuthUser,
    demo: bool,
) -> Result<Vec<Transaction>, AppError> {
    if demo {
        Ok(state.demo.transactions().to_vec())
    } else {
        Ok(queries::list_transactions(&state.db, &user.id).await?)
    }
}

pub async fn summary(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<ReportParams>,
) -> Result<impl IntoResponse, AppError> {
    let transactions = source_transactions(&state, &user, params.demo).await?;

    Ok(Json(aggregation::summarize(&transactions)))
}

pub async fn categories(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<ReportParams>,
) -> Result<impl IntoResponse, AppError> {
    let transactions = source_transactions(&state, &user, params.demo).await?;
    let breakdown = aggregation::category_breakdown(&transactions, params.month.as_deref());

    Ok(Json(breakdown))
}

pub async fn monthly(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<ReportParams>,
) -> Result<impl IntoResponse, AppError> {
    let transactions = source_transactions(&state, &user, params.demo).await?;

    Ok(Json(aggregation::monthly_trend(&transactions)))
}
