use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::plaid::PlaidTransaction;

/// Direction of a transaction: credits increase the balance, debits
/// decrease it. Stored amounts are always positive magnitudes; this is
/// the only place sign information lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "text", rename_all = "lowercase")]
pub enum TransactionType {
    Credit,
    Debit,
}

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub date: NaiveDate,
    pub description: String,
    pub amount: f64,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub kind: TransactionType,
    pub category: String,
    pub subcategory: String,
    pub account_id: String,
    #[serde(default)]
    pub user_id: Option<String>,
}

impl Transaction {
    /// Signed value: positive for credits, negative for debits.
    pub fn signed_amount(&self) -> f64 {
        match self.kind {
            TransactionType::Credit => self.amount.abs(),
            TransactionType::Debit => -self.amount.abs(),
        }
    }
}

/// A transaction row to be inserted; the id is assigned by Postgres.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTransaction {
    pub date: NaiveDate,
    pub description: String,
    pub amount: f64,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub category: String,
    pub subcategory: String,
    pub account_id: String,
    pub user_id: Option<String>,
}

impl NewTransaction {
    /// Maps a provider transaction record into the application shape:
    /// positive amounts become credits, negative become debits, and the
    /// stored amount is the absolute magnitude. The first two entries of
    /// the provider category taxonomy become category/subcategory.
    pub fn from_plaid(tx: &PlaidTransaction, user_id: Option<String>) -> Self {
        let kind = if tx.amount > 0.0 {
            TransactionType::Credit
        } else {
            TransactionType::Debit
        };

        let category = tx
            .category
            .as_ref()
            .and_then(|entries| entries.first())
            .cloned()
            .unwrap_or_else(|| "Other".to_string());
        let subcategory = tx
            .category
            .as_ref()
            .and_then(|entries| entries.get(1))
            .cloned()
            .unwrap_or_default();

        NewTransaction {
            date: tx.date,
            description: tx.name.clone(),
            amount: tx.amount.abs(),
            kind,
            category,
            subcategory,
            account_id: tx.account_id.clone(),
            user_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plaid_record(amount: f64, category: Option<Vec<&str>>) -> PlaidTransaction {
        PlaidTransaction {
            account_id: "acc-1".to_string(),
            name: "Whole Foods Market".to_string(),
            amount,
            date: NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            transaction_id: Some("tx-1".to_string()),
            category: category.map(|entries| entries.into_iter().map(String::from).collect()),
            merchant_name: None,
            pending: Some(false),
            iso_currency_code: Some("USD".to_string()),
        }
    }

    #[test]
    fn positive_provider_amount_becomes_credit() {
        let record = plaid_record(1250.0, None);
        let tx = NewTransaction::from_plaid(&record, Some("user-1".to_string()));

        assert_eq!(tx.kind, TransactionType::Credit);
        assert_eq!(tx.amount, 1250.0);
    }

    #[test]
    fn negative_provider_amount_becomes_debit_with_positive_magnitude() {
        let record = plaid_record(-86.42, Some(vec!["Food and Drink", "Groceries"]));
        let tx = NewTransaction::from_plaid(&record, Some("user-1".to_string()));

        assert_eq!(tx.kind, TransactionType::Debit);
        assert_eq!(tx.amount, 86.42);
        assert_eq!(tx.category, "Food and Drink");
        assert_eq!(tx.subcategory, "Groceries");
    }

    #[test]
    fn missing_category_defaults_to_other() {
        let record = plaid_record(-10.0, None);
        let tx = NewTransaction::from_plaid(&record, None);

        assert_eq!(tx.category, "Other");
        assert_eq!(tx.subcategory, "");
    }

    #[test]
    fn single_entry_category_leaves_subcategory_empty() {
        let record = plaid_record(-10.0, Some(vec!["Travel"]));
        let tx = NewTransaction::from_plaid(&record, None);

        assert_eq!(tx.category, "Travel");
        assert_eq!(tx.subcategory, "");
    }

    #[test]
    fn user_id_is_copied_through() {
        let record = plaid_record(-10.0, None);
        let tx = NewTransaction::from_plaid(&record, Some("user-9".to_string()));

        assert_eq!(tx.user_id.as_deref(), Some("user-9"));
    }

    #[test]
    fn signed_amount_recovers_direction() {
        let credit = Transaction {
            id: 1,
            date: NaiveDate::from_ymd_opt(2024, 1, 14).unwrap(),
            description: "Payroll".to_string(),
            amount: 5000.0,
            kind: TransactionType::Credit,
            category: "Income".to_string(),
            subcategory: String::new(),
            account_id: "acc-1".to_string(),
            user_id: None,
        };
        let debit = Transaction {
            kind: TransactionType::Debit,
            amount: 150.0,
            ..credit.clone()
        };

        assert_eq!(credit.signed_amount(), 5000.0);
        assert_eq!(debit.signed_amount(), -150.0);
    }

    #[test]
    fn transaction_type_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&TransactionType::Credit).unwrap(),
            r#""credit""#
        );
        assert_eq!(
            serde_json::to_string(&TransactionType::Debit).unwrap(),
            r#""debit""#
        );
    }
}
