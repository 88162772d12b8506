//! Order execution errors.

use std::fmt;

use super::value_objects::OrderStatus;
use crate::domain::shared::DomainError;

/// Errors that can occur in order execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderError {
    /// Invalid state transition attempted.
    InvalidStateTransition {
        /// Current order status.
        from: OrderStatus,
        /// Attempted status.
        to: OrderStatus,
        /// Reason for failure.
        reason: String,
    },

    /// Order is already filled or canceled.
    AlreadyClosed {
        /// Order ID.
        order_id: String,
        /// Terminal status.
        status: OrderStatus,
    },

    /// Invalid order parameters.
    InvalidParameters {
        /// Field with invalid value.
        field: String,
        /// Error message.
        message: String,
    },

    /// A percentage outside `[0, 100]`.
    PercentOutOfRange {
        /// Field name.
        field: String,
        /// Offending value.
        value: String,
    },

    /// Order not found.
    NotFound {
        /// Order ID.
        order_id: String,
    },
}

impl OrderError {
    /// Shorthand for [`OrderError::InvalidParameters`].
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameters {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for OrderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidStateTransition { from, to, reason } => {
                write!(
                    f,
                    "Invalid order state transition: {from} -> {to}: {reason}"
                )
            }
            Self::AlreadyClosed { order_id, status } => {
                write!(f, "Order {order_id} is already {status}")
            }
            Self::InvalidParameters { field, message } => {
                write!(f, "Invalid order parameter '{field}': {message}")
            }
            Self::PercentOutOfRange { field, value } => {
                write!(f, "{field} must be between 0 and 100, got {value}")
            }
            Self::NotFound { order_id } => {
                write!(f, "Order not found: {order_id}")
            }
        }
    }
}

impl std::error::Error for OrderError {}

impl From<DomainError> for OrderError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::InvalidValue { field, message } => Self::InvalidParameters { field, message },
            DomainError::OutOfRange { field, value, .. } => Self::PercentOutOfRange { field, value },
            DomainError::NotFound { id, .. } => Self::NotFound { order_id: id },
        }
    }
}
