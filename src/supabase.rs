use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SupabaseError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Invalid or expired access token")]
    InvalidToken,
    #[error("Unexpected response from auth provider: {0}")]
    InvalidResponse(String),
}

/// The authenticated identity attached to a request after token validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// HTTP client for the Supabase auth API, used only to resolve bearer
/// tokens into user identities. Persistence goes straight to Postgres.
#[derive(Clone)]
pub struct SupabaseAuthClient {
    client: Client,
    base_url: String,
    anon_key: String,
}

impl SupabaseAuthClient {
    pub fn new(base_url: String, anon_key: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();

        SupabaseAuthClient {
            client,
            base_url,
            anon_key,
        }
    }

    /// Resolves an access token to the user it belongs to.
    pub async fn get_user(&self, access_token: &str) -> Result<AuthUser, SupabaseError> {
        let url = format!("{}/auth/v1/user", self.base_url.trim_end_matches('/'));

        let response = self
            .client
            .get(&url)
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(SupabaseError::InvalidToken);
        }
        if !status.is_success() {
            return Err(SupabaseError::InvalidResponse(format!("status {}", status)));
        }

        Ok(response.json::<AuthUser>().await?)
    }
}
