//! Demo mode: a static bundled dataset standing in for real linked
//! accounts, served with the same shapes as the live-data path so the
//! aggregation layer cannot tell the two apart.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::aggregation::{self, CategoryBreakdown};
use crate::db::models::Transaction;

const DEMO_DATA: &str = include_str!("../data/demo_transactions.json");

/// The single synthetic account backing demo mode.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DemoAccount {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub balance: f64,
}

#[derive(Deserialize)]
struct DemoDataFile {
    transactions: Vec<Transaction>,
}

/// Serves the bundled transaction dataset. Parsed once at startup and
/// shared; the dataset itself is immutable.
#[derive(Clone)]
pub struct DemoDataService {
    transactions: Arc<Vec<Transaction>>,
}

impl DemoDataService {
    pub fn load() -> Result<Self, serde_json::Error> {
        let parsed: DemoDataFile = serde_json::from_str(DEMO_DATA)?;
        Ok(DemoDataService {
            transactions: Arc::new(parsed.transactions),
        })
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// The synthetic demo account; its balance is the signed sum of the
    /// whole dataset.
    pub fn accounts(&self) -> Vec<DemoAccount> {
        let balance = self
            .transactions
            .iter()
            .map(Transaction::signed_amount)
            .sum();

        vec![DemoAccount {
            id: "checking_001".to_string(),
            name: "Demo Checking Account".to_string(),
            kind: "depository".to_string(),
            balance,
        }]
    }

    pub fn net_worth(&self) -> f64 {
        self.accounts().iter().map(|account| account.balance).sum()
    }

    /// Transactions with a date in the inclusive range.
    pub fn transactions_between(&self, start: NaiveDate, end: NaiveDate) -> Vec<Transaction> {
        self.transactions
            .iter()
            .filter(|tx| tx.date >= start && tx.date <= end)
            .cloned()
            .collect()
    }

    /// Debit totals per category, in the same shape the live path
    /// produces.
    pub fn category_spending(&self) -> Vec<CategoryBreakdown> {
        aggregation::category_breakdown(&self.transactions, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::TransactionType;

    #[test]
    fn bundled_dataset_parses_and_is_non_empty() {
        let service = DemoDataService::load().unwrap();
        assert!(!service.transactions().is_empty());
    }

    #[test]
    fn amounts_are_stored_as_non_negative_magnitudes() {
        let service = DemoDataService::load().unwrap();
        assert!(service.transactions().iter().all(|tx| tx.amount >= 0.0));
    }

    #[test]
    fn account_balance_is_signed_sum_of_dataset() {
        let service = DemoDataService::load().unwrap();

        let expected: f64 = service
            .transactions()
            .iter()
            .map(Transaction::signed_amount)
            .sum();
        let accounts = service.accounts();

        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].id, "checking_001");
        assert_eq!(accounts[0].kind, "depository");
        assert_eq!(accounts[0].balance, expected);
    }

    #[test]
    fn net_worth_matches_account_balances() {
        let service = DemoDataService::load().unwrap();
        assert_eq!(service.net_worth(), service.accounts()[0].balance);
    }

    #[test]
    fn date_range_filter_is_inclusive() {
        let service = DemoDataService::load().unwrap();
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();

        let january = service.transactions_between(start, end);

        assert!(!january.is_empty());
        assert!(january.iter().all(|tx| tx.date >= start && tx.date <= end));

        let full_count = service.transactions().len();
        let wide = service.transactions_between(
            NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2100, 1, 1).unwrap(),
        );
        assert_eq!(wide.len(), full_count);
    }

    #[test]
    fn category_spending_matches_live_aggregation() {
        let service = DemoDataService::load().unwrap();

        // Same records through the demo helper and the shared
        // aggregation path must produce identical sums.
        let via_helper = service.category_spending();
        let via_aggregation = aggregation::category_breakdown(service.transactions(), None);

        assert_eq!(via_helper, via_aggregation);
        assert!(!via_helper.is_empty());
    }

    #[test]
    fn demo_and_live_summaries_agree_on_equivalent_input() {
        let service = DemoDataService::load().unwrap();

        // A copy of the dataset, as if it had been read back from the
        // database, aggregates identically.
        let copied: Vec<Transaction> = service.transactions().to_vec();

        let demo_summary = aggregation::summarize(service.transactions());
        let live_summary = aggregation::summarize(&copied);

        assert_eq!(demo_summary, live_summary);
        assert_eq!(
            demo_summary.net,
            demo_summary.total_income - demo_summary.total_expenses
        );
    }

    #[test]
    fn dataset_types_are_well_formed() {
        let service = DemoDataService::load().unwrap();
        let has_credit = service
            .transactions()
            .iter()
            .any(|tx| tx.kind == TransactionType::Credit);
        let has_debit = service
            .transactions()
            .iter()
            .any(|tx| tx.kind == TransactionType::Debit);

        assert!(has_credit);
        assert!(has_debit);
    }
}
