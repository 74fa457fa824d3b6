//! Error taxonomy shared by every order workflow.

use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, OrderError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    /// Bad input, caught before any network call. Never empty.
    #[error("validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// Missing or refused credentials.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// The exchange refused the request (filters, margin, bad price...).
    #[error("exchange rejected request: {code} - {msg}")]
    ExchangeRejected { code: i64, msg: String },

    /// Transport-level failure talking to the exchange.
    #[error("network error: {0}")]
    Network(String),

    #[error("unexpected error: {0}")]
    Unknown(String),
}

impl OrderError {
    pub fn kind(&self) -> &'static str {
        match self {
            OrderError::Validation(_) => "validation",
            OrderError::Authentication(_) => "authentication",
            OrderError::ExchangeRejected { .. } => "exchange_rejected",
            OrderError::Network(_) => "network",
            OrderError::Unknown(_) => "unknown",
        }
    }

    /// Messages collected by the validator; empty for every other kind.
    pub fn validation_messages(&self) -> &[String] {
        match self {
            OrderError::Validation(msgs) => msgs,
            _ => &[],
        }
    }
}

impl From<reqwest::Error> for OrderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() || err.is_request() {
            OrderError::Network(err.to_string())
        } else {
            OrderError::Unknown(err.to_string())
        }
    }
}

impl From<serde_json::Error> for OrderError {
    fn from(err: serde_json::Error) -> Self {
        OrderError::Unknown(format!("malformed exchange response: {}", err))
    }
}
