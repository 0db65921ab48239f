// src/error.rs
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Invalid session token: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Not logged in")]
    NotAuthenticated,
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),
    #[error("Worker failed: {0}")]
    Worker(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ClientError>;

impl ClientError {
    pub fn validation(message: impl Into<String>) -> Self {
        ClientError::Validation(message.into())
    }
}
