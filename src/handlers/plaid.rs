use axum::{Extension, Json, extract::State, response::IntoResponse};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::db::models::NewTransaction;
use crate::db::queries;
use crate::error::AppError;
use crate::plaid::{PlaidAccount, PlaidError, PlaidTransaction};
use crate::supabase::AuthUser;

/// Hard cap on records accepted by a single bulk save; larger payloads
/// are rejected outright, not chunked.
pub const MAX_SAVE_BATCH: usize = 1000;

fn provider_error(message: &str, err: PlaidError) -> AppError {
    tracing::error!(error = %err, "{}", message);
    AppError::Provider {
        message: message.to_string(),
        details: err.details(),
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateLinkTokenRequest {
    #[serde(rename = "userId", default)]
    user_id: Option<String>,
}

pub async fn create_link_token(
    State(state): State<AppState>,
    Json(body): Json<CreateLinkTokenRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = body
        .user_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::Validation("User ID is required".to_string()))?;

    let response = state
        .plaid
        .create_link_token(&user_id)
        .await
        .map_err(|err| provider_error("Unable to create link token", err))?;

    Ok(Json(response))
}

#[derive(Debug, Deserialize)]
pub struct ExchangeTokenRequest {
    #[serde(default)]
    public_token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ExchangedToken {
    #[serde(rename = "accessToken")]
    pub access_token: String,
    #[serde(rename = "itemId")]
    pub item_id: String,
}

pub async fn exchange_token(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<ExchangeTokenRequest>,
) -> Result<impl IntoResponse, AppError> {
    tracing::debug!(user_id = %user.id, "POST /api/plaid/exchange-token");

    let public_token = body
        .public_token
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::Validation("Public token is required".to_string()))?;

    let response = state
        .plaid
        .exchange_public_token(&public_token)
        .await
        .map_err(|err| provider_error("Unable to exchange token", err))?;

    tracing::debug!(item_id = %response.item_id, "Token exchange successful");

    Ok(Json(ExchangedToken {
        access_token: response.access_token,
        item_id: response.item_id,
    }))
}

#[derive(Debug, Deserialize)]
pub struct SyncTransactionsRequest {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    start_date: Option<NaiveDate>,
    #[serde(default)]
    end_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct SyncTransactionsResponse {
    pub transactions: Vec<PlaidTransaction>,
    pub accounts: Vec<PlaidAccount>,
    pub total_transactions: i64,
}

pub async fn sync_transactions(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<SyncTransactionsRequest>,
) -> Result<impl IntoResponse, AppError> {
    tracing::debug!(user_id = %user.id, "POST /api/plaid/sync-transactions");

    let (access_token, start_date, end_date) =
        match (body.access_token, body.start_date, body.end_date) {
            (Some(token), Some(start), Some(end)) if !token.is_empty() => (token, start, end),
            _ => {
                return Err(AppError::Validation(
                    "Access token, start date, and end date are required".to_string(),
                ));
            }
        };

    // Single page, no pagination loop.
    let response = state
        .plaid
        .get_transactions(&access_token, start_date, end_date)
        .await
        .map_err(|err| provider_error("Unable to sync transactions", err))?;

    tracing::debug!(
        count = response.transactions.len(),
        "Transactions fetched successfully"
    );

    Ok(Json(SyncTransactionsResponse {
        transactions: response.transactions,
        accounts: response.accounts,
        total_transactions: response.total_transactions,
    }))
}

#[derive(Debug, Deserialize)]
pub struct SaveTransactionsRequest {
    #[serde(default)]
    transactions: Option<Vec<PlaidTransaction>>,
    #[serde(rename = "userId", default)]
    user_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SaveTransactionsResponse {
    pub success: bool,
    pub count: u64,
}

pub async fn save_transactions(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<SaveTransactionsRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (records, user_id) = match (body.transactions, body.user_id) {
        (Some(records), Some(user_id)) if !user_id.is_empty() => (records, user_id),
        _ => {
            return Err(AppError::Validation(
                "Transactions and userId are required".to_string(),
            ));
        }
    };

    // Cap the batch before anything touches the database.
    if records.len() > MAX_SAVE_BATCH {
        tracing::warn!(
            count = records.len(),
            user_id = %user.id,
            "Excessive transaction count rejected"
        );
        return Err(AppError::RecordLimitExceeded {
            limit: MAX_SAVE_BATCH,
        });
    }

    let rows: Vec<NewTransaction> = records
        .iter()
        .map(|tx| NewTransaction::from_plaid(tx, Some(user_id.clone())))
        .collect();

    let count = queries::insert_transactions(&state.db, &rows)
        .await
        .map_err(|err| {
            tracing::error!(error = %err, "Error saving transactions");
            AppError::Provider {
                message: "Unable to save transactions".to_string(),
                details: serde_json::Value::String(err.to_string()),
            }
        })?;

    tracing::debug!(count, "Transactions saved");

    Ok(Json(SaveTransactionsResponse {
        success: true,
        count,
    }))
}

#[derive(Debug, Deserialize)]
pub struct AccountsRequest {
    #[serde(default)]
    access_token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AccountsResponse {
    pub accounts: Vec<PlaidAccount>,
}

pub async fn accounts(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<AccountsRequest>,
) -> Result<impl IntoResponse, AppError> {
    tracing::debug!(user_id = %user.id, "POST /api/plaid/accounts");

    let access_token = body
        .access_token
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::Validation("Access token is required".to_string()))?;

    let response = state
        .plaid
        .get_accounts(&access_token)
        .await
        .map_err(|err| provider_error("Unable to fetch accounts", err))?;

    Ok(Json(AccountsResponse {
        accounts: response.accounts,
    }))
}
