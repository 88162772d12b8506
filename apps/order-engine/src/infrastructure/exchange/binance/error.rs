//! Binance-specific error types.

use thiserror::Error;

use crate::application::ports::ExchangeError;

/// Binance rejected the order for lack of funds.
const CODE_NEW_ORDER_REJECTED: i64 = -2010;
/// Cancel of an unknown order.
const CODE_CANCEL_REJECTED: i64 = -2011;
/// Query of an unknown order.
const CODE_NO_SUCH_ORDER: i64 = -2013;
/// Malformed or unknown API key.
const CODE_BAD_API_KEY_FMT: i64 = -2014;
/// Invalid key, IP or permissions.
const CODE_REJECTED_MBX_KEY: i64 = -2015;
/// Signature mismatch.
const CODE_INVALID_SIGNATURE: i64 = -1022;

/// Errors from the Binance adapter.
#[derive(Debug, Error, Clone)]
pub enum BinanceError {
    /// Request could not be built.
    #[error("HTTP error: {0}")]
    Http(String),

    /// API returned an error.
    #[error("API error: {code} - {message}")]
    Api {
        /// Binance error code.
        code: i64,
        /// Error message from the API.
        message: String,
    },

    /// Order was rejected.
    #[error("Order rejected: {0}")]
    OrderRejected(String),

    /// Not enough free balance.
    #[error("Insufficient balance: {0}")]
    InsufficientBalance(String),

    /// Authentication failed.
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Rate limited.
    #[error("Rate limited, retry after {retry_after_secs}s")]
    RateLimited {
        /// Suggested retry delay in seconds.
        retry_after_secs: u64,
    },

    /// Network error (retryable).
    #[error("Network error: {0}")]
    Network(String),

    /// JSON parsing error.
    #[error("JSON parsing error: {0}")]
    JsonParse(String),

    /// A numeric field could not be parsed.
    #[error("Invalid number in field {field}: {value}")]
    InvalidNumber {
        /// Field name.
        field: &'static str,
        /// Raw value.
        value: String,
    },

    /// Max retries exceeded.
    #[error("Max retries exceeded after {attempts} attempts")]
    MaxRetriesExceeded {
        /// Number of attempts made before giving up.
        attempts: u32,
    },

    /// Order not found.
    #[error("Order not found: {0}")]
    OrderNotFound(String),
}

impl BinanceError {
    /// Classify an error body returned with a 4xx status.
    #[must_use]
    pub fn from_api(status: u16, code: i64, message: String) -> Self {
        match code {
            CODE_NEW_ORDER_REJECTED if message.to_lowercase().contains("insufficient balance") => {
                Self::InsufficientBalance(message)
            }
            CODE_NEW_ORDER_REJECTED => Self::OrderRejected(message),
            CODE_CANCEL_REJECTED | CODE_NO_SUCH_ORDER => Self::OrderNotFound(message),
            CODE_BAD_API_KEY_FMT | CODE_REJECTED_MBX_KEY | CODE_INVALID_SIGNATURE => {
                Self::AuthenticationFailed(message)
            }
            _ if status == 401 || status == 403 => Self::AuthenticationFailed(message),
            _ => Self::Api { code, message },
        }
    }
}

impl From<BinanceError> for ExchangeError {
    fn from(err: BinanceError) -> Self {
        match err {
            BinanceError::Http(msg) | BinanceError::Network(msg) | BinanceError::JsonParse(msg) => {
                Self::ConnectionError { message: msg }
            }
            BinanceError::Api { code, message } => Self::OrderRejected {
                reason: format!("{code}: {message}"),
            },
            BinanceError::OrderRejected(reason) => Self::OrderRejected { reason },
            BinanceError::InsufficientBalance(_) => Self::InsufficientFunds,
            BinanceError::AuthenticationFailed(message) => Self::AuthenticationFailed { message },
            BinanceError::RateLimited { .. } => Self::RateLimited,
            BinanceError::InvalidNumber { .. } => Self::Unknown {
                message: err.to_string(),
            },
            BinanceError::MaxRetriesExceeded { attempts } => Self::ConnectionError {
                message: format!("Max retries exceeded after {attempts} attempts"),
            },
            BinanceError::OrderNotFound(order_id) => Self::OrderNotFound { order_id },
        }
    }
}
