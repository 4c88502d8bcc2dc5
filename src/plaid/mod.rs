pub mod client;

pub use client::{
    AccountsGetResponse, ExchangeTokenResponse, LinkTokenResponse, PlaidAccount,
    PlaidAccountBalances, PlaidClient, PlaidError, PlaidTransaction, TransactionsGetResponse,
};
