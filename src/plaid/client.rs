use chrono::NaiveDate;
use reqwest::Client;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::time::Duration;
use thiserror::Error;

const CLIENT_NAME: &str = "Clarity Finance";
const PRODUCTS: &[&str] = &["transactions"];
const COUNTRY_CODES: &[&str] = &["US"];
const LANGUAGE: &str = "en";

#[derive(Error, Debug)]
pub enum PlaidError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Plaid returned status {status}")]
    Api {
        status: u16,
        details: serde_json::Value,
    },
}

impl PlaidError {
    /// The provider payload to attach to an HTTP 500 response body.
    pub fn details(&self) -> serde_json::Value {
        match self {
            PlaidError::Api { details, .. } => details.clone(),
            PlaidError::Request(err) => serde_json::Value::String(err.to_string()),
        }
    }
}

/// Response from /link/token/create
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkTokenResponse {
    pub link_token: String,
    pub expiration: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExchangeTokenResponse {
    pub access_token: String,
    pub item_id: String,
    #[serde(default)]
    pub request_id: Option<String>,
}

/// A transaction record as returned by the provider. The same shape is
/// accepted back on the bulk-save endpoint, so unknown provider fields
/// are tolerated and the commonly displayed ones are carried through.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaidTransaction {
    pub account_id: String,
    pub name: String,
    pub amount: f64,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merchant_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iso_currency_code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaidAccount {
    pub account_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub account_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub official_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mask: Option<String>,
    pub balances: PlaidAccountBalances,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaidAccountBalances {
    #[serde(default)]
    pub available: Option<f64>,
    #[serde(default)]
    pub current: Option<f64>,
    #[serde(default)]
    pub limit: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iso_currency_code: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransactionsGetResponse {
    pub transactions: Vec<PlaidTransaction>,
    pub accounts: Vec<PlaidAccount>,
    pub total_transactions: i64,
    #[serde(default)]
    pub request_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccountsGetResponse {
    pub accounts: Vec<PlaidAccount>,
    #[serde(default)]
    pub request_id: Option<String>,
}

#[derive(Serialize)]
struct LinkTokenUser<'a> {
    client_user_id: &'a str,
}

#[derive(Serialize)]
struct LinkTokenCreateRequest<'a> {
    user: LinkTokenUser<'a>,
    client_name: &'a str,
    products: &'a [&'a str],
    country_codes: &'a [&'a str],
    language: &'a str,
}

#[derive(Serialize)]
struct PublicTokenExchangeRequest<'a> {
    public_token: &'a str,
}

#[derive(Serialize)]
struct TransactionsGetRequest<'a> {
    access_token: &'a str,
    start_date: NaiveDate,
    end_date: NaiveDate,
}

#[derive(Serialize)]
struct AccountsGetRequest<'a> {
    access_token: &'a str,
}

/// HTTP client for the Plaid banking-data API
#[derive(Clone)]
pub struct PlaidClient {
    client: Client,
    base_url: String,
    client_id: String,
    secret: String,
}

impl PlaidClient {
    /// Creates a new PlaidClient against the given API base URL
    pub fn new(base_url: String, client_id: String, secret: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();

        PlaidClient {
            client,
            base_url,
            client_id,
            secret,
        }
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, PlaidError>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url.trim_end_matches('/'), path);

        let response = self
            .client
            .post(&url)
            .header("PLAID-CLIENT-ID", &self.client_id)
            .header("PLAID-SECRET", &self.secret)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let details = response
                .json::<serde_json::Value>()
                .await
                .unwrap_or(serde_json::Value::Null);
            return Err(PlaidError::Api {
                status: status.as_u16(),
                details,
            });
        }

        Ok(response.json::<T>().await?)
    }

    /// Issues a link token for the account-linking UI flow, with the
    /// application's fixed product/country/language configuration.
    pub async fn create_link_token(&self, user_id: &str) -> Result<LinkTokenResponse, PlaidError> {
        let request = LinkTokenCreateRequest {
            user: LinkTokenUser {
                client_user_id: user_id,
            },
            client_name: CLIENT_NAME,
            products: PRODUCTS,
            country_codes: COUNTRY_CODES,
            language: LANGUAGE,
        };

        self.post("/link/token/create", &request).await
    }

    /// Exchanges a one-time public token for a long-lived access token.
    pub async fn exchange_public_token(
        &self,
        public_token: &str,
    ) -> Result<ExchangeTokenResponse, PlaidError> {
        let request = PublicTokenExchangeRequest { public_token };

        self.post("/item/public_token/exchange", &request).await
    }

    /// Fetches a single page of transactions for the given date range.
    pub async fn get_transactions(
        &self,
        access_token: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<TransactionsGetResponse, PlaidError> {
        let request = TransactionsGetRequest {
            access_token,
            start_date,
            end_date,
        };

        self.post("/transactions/get", &request).await
    }

    /// Fetches the account list for a linked item.
    pub async fn get_accounts(&self, access_token: &str) -> Result<AccountsGetResponse, PlaidError> {
        let request = AccountsGetRequest { access_token };

        self.post("/accounts/get", &request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client(base_url: String) -> PlaidClient {
        PlaidClient::new(base_url, "client-id".to_string(), "secret".to_string())
    }

    #[tokio::test]
    async fn create_link_token_parses_response() {
        let mut server = mockito::Server::new_async().await;

        let _mock = server
            .mock("POST", "/link/token/create")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                    "link_token": "link-sandbox-abc123",
                    "expiration": "2024-01-15T18:00:00Z",
                    "request_id": "req-1"
                }"#,
            )
            .create_async()
            .await;

        let client = test_client(server.url());
        let response = client.create_link_token("user-1").await.unwrap();

        assert_eq!(response.link_token, "link-sandbox-abc123");
        assert_eq!(response.request_id.as_deref(), Some("req-1"));
    }

    #[tokio::test]
    async fn provider_error_payload_is_captured() {
        let mut server = mockito::Server::new_async().await;

        let _mock = server
            .mock("POST", "/item/public_token/exchange")
            .with_status(400)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                    "error_type": "INVALID_INPUT",
                    "error_code": "INVALID_PUBLIC_TOKEN",
                    "error_message": "provided public token is in an invalid format"
                }"#,
            )
            .create_async()
            .await;

        let client = test_client(server.url());
        let result = client.exchange_public_token("public-bogus").await;

        match result {
            Err(PlaidError::Api { status, details }) => {
                assert_eq!(status, 400);
                assert_eq!(details["error_code"], "INVALID_PUBLIC_TOKEN");
            }
            other => panic!("expected Api error, got {:?}", other.err()),
        }
    }

    #[tokio::test]
    async fn get_transactions_parses_accounts_and_totals() {
        let mut server = mockito::Server::new_async().await;

        let _mock = server
            .mock("POST", "/transactions/get")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                    "transactions": [
                        {
                            "transaction_id": "tx-1",
                            "account_id": "acc-1",
                            "name": "Whole Foods Market",
                            "amount": -86.42,
                            "date": "2024-01-05",
                            "category": ["Food and Drink", "Groceries"],
                            "pending": false
                        }
                    ],
                    "accounts": [
                        {
                            "account_id": "acc-1",
                            "name": "Checking",
                            "type": "depository",
                            "subtype": "checking",
                            "mask": "0000",
                            "balances": {"available": 1200.5, "current": 1250.0, "limit": null}
                        }
                    ],
                    "total_transactions": 1,
                    "request_id": "req-2"
                }"#,
            )
            .create_async()
            .await;

        let client = test_client(server.url());
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        let response = client.get_transactions("access-token", start, end).await.unwrap();

        assert_eq!(response.total_transactions, 1);
        assert_eq!(response.transactions.len(), 1);
        assert_eq!(response.transactions[0].name, "Whole Foods Market");
        assert_eq!(
            response.transactions[0].category.as_deref(),
            Some(&["Food and Drink".to_string(), "Groceries".to_string()][..])
        );
        assert_eq!(response.accounts[0].account_type, "depository");
        assert_eq!(response.accounts[0].balances.current, Some(1250.0));
    }

    #[tokio::test]
    async fn get_accounts_parses_response() {
        let mut server = mockito::Server::new_async().await;

        let _mock = server
            .mock("POST", "/accounts/get")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                    "accounts": [
                        {
                            "account_id": "acc-9",
                            "name": "Savings",
                            "type": "depository",
                            "balances": {"available": null, "current": 980.25}
                        }
                    ],
                    "request_id": "req-3"
                }"#,
            )
            .create_async()
            .await;

        let client = test_client(server.url());
        let response = client.get_accounts("access-token").await.unwrap();

        assert_eq!(response.accounts.len(), 1);
        assert_eq!(response.accounts[0].name, "Savings");
        assert_eq!(response.accounts[0].balances.available, None);
    }
}
