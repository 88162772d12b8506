//! Engine-wide error type.
//!
//! Every failure surfaced to the command layer or to a user notification is
//! an [`EngineError`] carrying an [`ErrorCode`]. The code decides how the
//! failure is presented:
//!
//! | Code | Value | Severity | Presented as |
//! |------|-------|----------|--------------|
//! | `Validation` | 1 | client | message verbatim |
//! | `BadRequest` | 400 | client | message verbatim |
//! | `NotFound` | 404 | client | message verbatim |
//! | `Internal` | 500 | internal | generic message, operators alerted via logs |

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::order_execution::{OrderError, RepositoryError};
use crate::domain::shared::DomainError;

/// Message shown to users in place of internal failures.
pub const GENERIC_USER_MESSAGE: &str = "Something went wrong, please try again later";

/// Error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Malformed input (bad decimal, out-of-range percent, missing field).
    Validation,
    /// Well-formed request the engine or exchange refused.
    BadRequest,
    /// Missing credentials, order or settings.
    NotFound,
    /// Wrapped lower-level failure (store, cache, exchange transport).
    Internal,
}

/// Coarse severity class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// The user can act on the message.
    Client,
    /// Operators need to look at it.
    Internal,
}

impl ErrorCode {
    /// Numeric code.
    #[must_use]
    pub const fn value(&self) -> u16 {
        match self {
            Self::Validation => 1,
            Self::BadRequest => 400,
            Self::NotFound => 404,
            Self::Internal => 500,
        }
    }

    /// Severity class.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        match self {
            Self::Validation | Self::BadRequest | Self::NotFound => Severity::Client,
            Self::Internal => Severity::Internal,
        }
    }

    /// Reason string.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::Validation => "VALIDATION",
            Self::BadRequest => "BAD_REQUEST",
            Self::NotFound => "NOT_FOUND",
            Self::Internal => "INTERNAL",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.reason())
    }
}

/// An error with code and context.
#[derive(Debug, Clone, Error)]
pub struct EngineError {
    code: ErrorCode,
    message: String,
    context: Vec<(String, String)>,
}

impl EngineError {
    /// Create a new error.
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: Vec::new(),
        }
    }

    /// Validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Validation, message)
    }

    /// Bad-request error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadRequest, message)
    }

    /// Not-found error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    /// Internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, message)
    }

    /// Add context to the error.
    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.context.push((key.into(), value.to_string()));
        self
    }

    /// Get the error code.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        self.code
    }

    /// Get the message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the context.
    #[must_use]
    pub fn context(&self) -> &[(String, String)] {
        &self.context
    }

    /// Returns true for client-severity errors.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(self.code.severity(), Severity::Client)
    }

    /// Text safe to show the end user.
    #[must_use]
    pub fn user_message(&self) -> &str {
        if self.is_client_error() {
            &self.message
        } else {
            GENERIC_USER_MESSAGE
        }
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if !self.context.is_empty() {
            let ctx: Vec<String> = self
                .context
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect();
            write!(f, " ({})", ctx.join(", "))?;
        }
        Ok(())
    }
}

impl From<OrderError> for EngineError {
    fn from(err: OrderError) -> Self {
        match &err {
            OrderError::NotFound { .. } => Self::not_found(err.to_string()),
            OrderError::AlreadyClosed { .. } | OrderError::InvalidStateTransition { .. } => {
                Self::bad_request(err.to_string())
            }
            OrderError::InvalidParameters { .. } | OrderError::PercentOutOfRange { .. } => {
                Self::validation(err.to_string())
            }
        }
    }
}

impl From<DomainError> for EngineError {
    fn from(err: DomainError) -> Self {
        OrderError::from(err).into()
    }
}

impl From<RepositoryError> for EngineError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { .. } => Self::not_found(err.to_string()),
            _ => Self::internal(format!("storage: {err}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_values() {
        assert_eq!(ErrorCode::Validation.value(), 1);
        assert_eq!(ErrorCode::BadRequest.value(), 400);
        assert_eq!(ErrorCode::NotFound.value(), 404);
        assert_eq!(ErrorCode::Internal.value(), 500);
    }

    #[test]
    fn client_errors_are_shown_verbatim() {
        let err = EngineError::validation("qty must be positive");
        assert_eq!(err.user_message(), "qty must be positive");
        assert!(err.is_client_error());
    }

    #[test]
    fn internal_errors_are_masked() {
        let err = EngineError::internal("connection reset by peer");
        assert_eq!(err.user_message(), GENERIC_USER_MESSAGE);
        assert!(!err.is_client_error());
    }

    #[test]
    fn display_includes_context() {
        let err = EngineError::not_found("order not found")
            .with_context("order_id", 42)
            .with_context("symbol", "BTCUSDT");
        assert_eq!(
            err.to_string(),
            "[NOT_FOUND] order not found (order_id=42, symbol=BTCUSDT)"
        );
    }

    #[test]
    fn order_errors_map_to_codes() {
        let closed: EngineError = OrderError::AlreadyClosed {
            order_id: "1".to_string(),
            status: crate::domain::order_execution::OrderStatus::Filled,
        }
        .into();
        assert_eq!(closed.code(), ErrorCode::BadRequest);

        let invalid: EngineError = OrderError::invalid("price", "required").into();
        assert_eq!(invalid.code(), ErrorCode::Validation);
    }

    #[test]
    fn repository_errors_are_internal() {
        let err: EngineError = RepositoryError::Query("deadlock".to_string()).into();
        assert_eq!(err.code(), ErrorCode::Internal);
        assert!(err.message().contains("deadlock"));
    }
}
