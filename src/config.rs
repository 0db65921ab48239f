// src/config.rs
use crate::error::{ClientError, Result};
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_OAUTH_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_RECENT_TRANSACTIONS: usize = 10;

#[derive(Clone, Debug)]
pub struct Config {
    pub api_url: String,
    pub request_timeout: Duration,
    pub oauth_timeout: Duration,
    pub recent_transactions: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            oauth_timeout: Duration::from_secs(DEFAULT_OAUTH_TIMEOUT_SECS),
            recent_transactions: DEFAULT_RECENT_TRANSACTIONS,
        }
    }
}

impl Config {
    /// Reads the client configuration from the environment, loading `.env` first if present.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = lookup("TRADING_API_URL")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        Ok(Self {
            api_url: normalize_url(&api_url),
            request_timeout: Duration::from_secs(parse_var(
                &lookup,
                "TRADING_REQUEST_TIMEOUT_SECS",
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )?),
            oauth_timeout: Duration::from_secs(parse_var(
                &lookup,
                "TRADING_OAUTH_TIMEOUT_SECS",
                DEFAULT_OAUTH_TIMEOUT_SECS,
            )?),
            recent_transactions: parse_var(
                &lookup,
                "TRADING_RECENT_TRANSACTIONS",
                DEFAULT_RECENT_TRANSACTIONS,
            )?,
        })
    }

    pub fn with_api_url(mut self, api_url: &str) -> Self {
        self.api_url = normalize_url(api_url);
        self
    }
}

fn normalize_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ClientError::Config(format!("{} has invalid value '{}'", key, raw))),
        _ => Ok(default),
    }
}
