use chrono::NaiveDate;
use serde::Deserialize;
use sqlx::{PgPool, QueryBuilder, Result};

use crate::db::models::{NewTransaction, Transaction, TransactionType};

/// Bulk-inserts transactions as one statement; the whole batch lands or
/// nothing does. Returns the number of inserted rows.
pub async fn insert_transactions(pool: &PgPool, records: &[NewTransaction]) -> Result<u64> {
    if records.is_empty() {
        return Ok(0);
    }

    let mut builder: QueryBuilder<sqlx::Postgres> = QueryBuilder::new(
        "INSERT INTO transactions (date, description, amount, type, category, subcategory, account_id, user_id) ",
    );
    builder.push_values(records, |mut row, tx| {
        row.push_bind(tx.date)
            .push_bind(&tx.description)
            .push_bind(tx.amount)
            .push_bind(tx.kind)
            .push_bind(&tx.category)
            .push_bind(&tx.subcategory)
            .push_bind(&tx.account_id)
            .push_bind(&tx.user_id);
    });

    let result = builder.build().execute(pool).await?;
    Ok(result.rows_affected())
}

pub async fn insert_transaction(pool: &PgPool, tx: &NewTransaction) -> Result<Transaction> {
    sqlx::query_as::<_, Transaction>(
        r#"
        INSERT INTO transactions (
            date, description, amount, type, category, subcategory, account_id, user_id
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING id, date, description, amount, type, category, subcategory, account_id, user_id
        "#,
    )
    .bind(tx.date)
    .bind(&tx.description)
    .bind(tx.amount)
    .bind(tx.kind)
    .bind(&tx.category)
    .bind(&tx.subcategory)
    .bind(&tx.account_id)
    .bind(&tx.user_id)
    .fetch_one(pool)
    .await
}

pub async fn list_transactions(pool: &PgPool, user_id: &str) -> Result<Vec<Transaction>> {
    sqlx::query_as::<_, Transaction>(
        r#"
        SELECT id, date, description, amount, type, category, subcategory, account_id, user_id
        FROM transactions
        WHERE user_id = $1
        ORDER BY date DESC, id DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// Field-wise partial update; absent fields keep their stored values.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct TransactionUpdate {
    pub date: Option<NaiveDate>,
    pub description: Option<String>,
    pub amount: Option<f64>,
    #[serde(rename = "type")]
    pub kind: Option<TransactionType>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
}

pub async fn update_transaction(
    pool: &PgPool,
    id: i64,
    changes: &TransactionUpdate,
) -> Result<Transaction> {
    sqlx::query_as::<_, Transaction>(
        r#"
        UPDATE transactions SET
            date = COALESCE($2, date),
            description = COALESCE($3, description),
            amount = COALESCE($4, amount),
            type = COALESCE($5, type),
            category = COALESCE($6, category),
            subcategory = COALESCE($7, subcategory)
        WHERE id = $1
        RETURNING id, date, description, amount, type, category, subcategory, account_id, user_id
        "#,
    )
    .bind(id)
    .bind(changes.date)
    .bind(&changes.description)
    .bind(changes.amount)
    .bind(changes.kind)
    .bind(&changes.category)
    .bind(&changes.subcategory)
    .fetch_one(pool)
    .await
}

/// Deletes a row by id, returning whether anything was deleted.
pub async fn delete_transaction(pool: &PgPool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM transactions WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
