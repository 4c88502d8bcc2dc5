use std::env;
use std::fmt;
use std::str::FromStr;

use anyhow::Context;
use dotenvy::dotenv;
use serde::Deserialize;

/// Default allowed browser origins for local development.
const DEV_ORIGINS: &[&str] = &[
    "http://localhost:5173",
    "http://localhost:5174",
    "http://localhost:5175",
    "http://localhost:5176",
];

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server_port: u16,
    pub database_url: String,
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub plaid_client_id: String,
    pub plaid_secret: String,
    pub plaid_env: PlaidEnvironment,
    pub allowed_origins: Vec<String>,
    pub test_mode: bool,
    pub test_user_id: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok(); // Load .env file if present

        let config = Config {
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "3001".to_string())
                .parse()?,
            database_url: env::var("DATABASE_URL")?,
            supabase_url: env::var("SUPABASE_URL")?,
            supabase_anon_key: env::var("SUPABASE_ANON_KEY")?,
            plaid_client_id: env::var("PLAID_CLIENT_ID")?,
            plaid_secret: env::var("PLAID_SECRET")?,
            plaid_env: env::var("PLAID_ENV")
                .unwrap_or_else(|_| "sandbox".to_string())
                .parse()?,
            allowed_origins: parse_allowed_origins(env::var("FRONTEND_URL").ok().as_deref()),
            test_mode: env::var("TEST_MODE")
                .map(|value| value == "true")
                .unwrap_or(false),
            test_user_id: env::var("TEST_USER_ID").unwrap_or_else(|_| "test-user".to_string()),
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.database_url.is_empty() {
            anyhow::bail!("DATABASE_URL is empty");
        }
        if self.supabase_anon_key.is_empty() {
            anyhow::bail!("SUPABASE_ANON_KEY is empty");
        }
        if self.plaid_client_id.is_empty() || self.plaid_secret.is_empty() {
            anyhow::bail!("PLAID_CLIENT_ID and PLAID_SECRET must be set");
        }

        url::Url::parse(&self.supabase_url).context("SUPABASE_URL is not a valid URL")?;

        Ok(())
    }
}

/// Plaid deployment environment, selecting the API base URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaidEnvironment {
    Sandbox,
    Development,
    Production,
}

impl PlaidEnvironment {
    pub fn base_url(&self) -> &'static str {
        match self {
            PlaidEnvironment::Sandbox => "https://sandbox.plaid.com",
            PlaidEnvironment::Development => "https://development.plaid.com",
            PlaidEnvironment::Production => "https://production.plaid.com",
        }
    }
}

impl FromStr for PlaidEnvironment {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "sandbox" => Ok(PlaidEnvironment::Sandbox),
            "development" => Ok(PlaidEnvironment::Development),
            "production" => Ok(PlaidEnvironment::Production),
            other => anyhow::bail!(
                "PLAID_ENV must be one of sandbox, development, production (got '{}')",
                other
            ),
        }
    }
}

impl fmt::Display for PlaidEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaidEnvironment::Sandbox => write!(f, "sandbox"),
            PlaidEnvironment::Development => write!(f, "development"),
            PlaidEnvironment::Production => write!(f, "production"),
        }
    }
}

fn parse_allowed_origins(frontend_url: Option<&str>) -> Vec<String> {
    let mut origins: Vec<String> = DEV_ORIGINS.iter().map(|origin| origin.to_string()).collect();

    if let Some(url) = frontend_url {
        let url = url.trim().trim_end_matches('/');
        if !url.is_empty() && !origins.iter().any(|existing| existing == url) {
            origins.push(url.to_string());
        }
    }

    origins
}
