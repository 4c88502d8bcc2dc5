//! Pure aggregation over in-memory transaction lists: dashboard totals,
//! per-category spending breakdowns, monthly trend series, and the
//! conjunctive search/category/type filters. Everything here is
//! synchronous and deterministic, and works identically whether the
//! rows came from Postgres or the bundled demo dataset.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::db::models::{Transaction, TransactionType};

/// Income/expense totals over a transaction list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinancialSummary {
    pub total_income: f64,
    pub total_expenses: f64,
    pub net: f64,
    pub credit_count: usize,
    pub debit_count: usize,
}

pub fn summarize(transactions: &[Transaction]) -> FinancialSummary {
    let mut summary = FinancialSummary {
        total_income: 0.0,
        total_expenses: 0.0,
        net: 0.0,
        credit_count: 0,
        debit_count: 0,
    };

    for tx in transactions {
        match tx.kind {
            TransactionType::Credit => {
                summary.total_income += tx.amount.abs();
                summary.credit_count += 1;
            }
            TransactionType::Debit => {
                summary.total_expenses += tx.amount.abs();
                summary.debit_count += 1;
            }
        }
    }

    summary.net = summary.total_income - summary.total_expenses;
    summary
}

/// One category's share of spending.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryBreakdown {
    pub category: String,
    pub amount: f64,
    pub percentage: f64,
}

/// Groups debit transactions by category and sums them, with each
/// group's percentage of the expense total. When `month` is given
/// (`"YYYY-MM"`), only transactions in that month count. Sorted by
/// amount, largest first.
pub fn category_breakdown(
    transactions: &[Transaction],
    month: Option<&str>,
) -> Vec<CategoryBreakdown> {
    let mut totals: HashMap<&str, f64> = HashMap::new();
    let mut expense_total = 0.0;

    for tx in transactions {
        if tx.kind != TransactionType::Debit {
            continue;
        }
        if let Some(month) = month {
            if month_key(tx.date) != month {
                continue;
            }
        }

        *totals.entry(tx.category.as_str()).or_insert(0.0) += tx.amount.abs();
        expense_total += tx.amount.abs();
    }

    let mut breakdown: Vec<CategoryBreakdown> = totals
        .into_iter()
        .map(|(category, amount)| CategoryBreakdown {
            category: category.to_owned(),
            amount,
            percentage: if expense_total > 0.0 {
                amount / expense_total * 100.0
            } else {
                0.0
            },
        })
        .collect();

    breakdown.sort_by(|a, b| b.amount.total_cmp(&a.amount));
    breakdown
}

/// Income/expense sums for one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyTotals {
    pub month: String,
    pub income: f64,
    pub expenses: f64,
    pub net: f64,
}

/// Groups all transactions by `YYYY-MM` and accumulates income and
/// expense sums per month, chronologically ascending. Lexicographic
/// order on the month key is chronological order.
pub fn monthly_trend(transactions: &[Transaction]) -> Vec<MonthlyTotals> {
    let mut totals: HashMap<String, (f64, f64)> = HashMap::new();

    for tx in transactions {
        let entry = totals.entry(month_key(tx.date)).or_insert((0.0, 0.0));
        match tx.kind {
            TransactionType::Credit => entry.0 += tx.amount.abs(),
            TransactionType::Debit => entry.1 += tx.amount.abs(),
        }
    }

    let mut trend: Vec<MonthlyTotals> = totals
        .into_iter()
        .map(|(month, (income, expenses))| MonthlyTotals {
            month,
            income,
            expenses,
            net: income - expenses,
        })
        .collect();

    trend.sort_by(|a, b| a.month.cmp(&b.month));
    trend
}

/// `"YYYY-MM"` grouping key for a date.
pub fn month_key(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

/// Search/category/type filters. All present filters must match.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct TransactionFilter {
    pub search: Option<String>,
    pub category: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<TransactionType>,
}

/// Applies the filter conjunctively: the search term is a
/// case-insensitive substring match on description or category, the
/// category and type filters are exact matches.
pub fn filter_transactions(
    transactions: Vec<Transaction>,
    filter: &TransactionFilter,
) -> Vec<Transaction> {
    let search = filter
        .search
        .as_ref()
        .map(|term| term.to_lowercase())
        .filter(|term| !term.is_empty());

    transactions
        .into_iter()
        .filter(|tx| {
            if let Some(term) = &search {
                let matches = tx.description.to_lowercase().contains(term)
                    || tx.category.to_lowercase().contains(term);
                if !matches {
                    return false;
                }
            }

            if let Some(category) = &filter.category {
                if !category.is_empty() && &tx.category != category {
                    return false;
                }
            }

            if let Some(kind) = filter.kind {
                if tx.kind != kind {
                    return false;
                }
            }

            true
        })
        .collect()
}
