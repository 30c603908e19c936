//! Service error model.
//!
//! Every layer above storage reports failures through [`DomainError`]. The
//! variants form a closed taxonomy that the HTTP layer maps one-to-one onto
//! status codes and machine-readable error codes.

use serde::Serialize;
use thiserror::Error;

/// Result type used across the domain and service layers.
pub type DomainResult<T> = Result<T, DomainError>;

/// A single failed input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: String,
    pub description: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            description: description.into(),
        }
    }
}

/// Domain-level error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Malformed request or failed field validation.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        message: String,
        violations: Vec<FieldViolation>,
    },

    /// Missing, invalid or expired credentials.
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    /// Authorization failure. Also used for owner-scoped lookups that found nothing.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// The resource is not in a state that allows the operation.
    #[error("failed precondition: {0}")]
    FailedPrecondition(String),

    /// Storage or infrastructure failure. The message is for logs only.
    #[error("internal: {0}")]
    Internal(String),

    /// The operation was aborted by a deadline or cancellation signal.
    #[error("cancelled")]
    Cancelled,
}

impl DomainError {
    pub fn invalid_argument(msg: impl Into<String>, violations: Vec<FieldViolation>) -> Self {
        Self::InvalidArgument {
            message: msg.into(),
            violations,
        }
    }

    /// Shorthand for an [`DomainError::InvalidArgument`] with one violation.
    pub fn invalid_field(field: impl Into<String>, description: impl Into<String>) -> Self {
        let violation = FieldViolation::new(field, description);
        Self::InvalidArgument {
            message: violation.description.clone(),
            violations: vec![violation],
        }
    }

    pub fn unauthenticated(msg: impl Into<String>) -> Self {
        Self::Unauthenticated(msg.into())
    }

    pub fn permission_denied(msg: impl Into<String>) -> Self {
        Self::PermissionDenied(msg.into())
    }

    pub fn failed_precondition(msg: impl Into<String>) -> Self {
        Self::FailedPrecondition(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Machine-readable code, stable across releases.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidArgument { .. } => "INVALID_ARGUMENT",
            Self::Unauthenticated(_) => "UNAUTHENTICATED",
            Self::PermissionDenied(_) => "PERMISSION_DENIED",
            Self::FailedPrecondition(_) => "FAILED_PRECONDITION",
            Self::Internal(_) => "INTERNAL",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Message safe to show to the caller.
    ///
    /// Internal failures never leak their detail.
    pub fn public_message(&self) -> String {
        match self {
            Self::InvalidArgument { message, .. } => message.clone(),
            Self::Unauthenticated(msg)
            | Self::PermissionDenied(msg)
            | Self::FailedPrecondition(msg) => msg.clone(),
            Self::Internal(_) => "An internal error occurred.".to_string(),
            Self::Cancelled => "The request was cancelled.".to_string(),
        }
    }

    pub fn violations(&self) -> &[FieldViolation] {
        match self {
            Self::InvalidArgument { violations, .. } => violations,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_detail_is_not_public() {
        let err = DomainError::internal("connection refused on 10.0.0.3:5432");
        assert_eq!(err.code(), "INTERNAL");
        assert!(!err.public_message().contains("10.0.0.3"));
    }

    #[test]
    fn invalid_field_carries_one_violation() {
        let err = DomainError::invalid_field("remark", "remark must not be empty");
        assert_eq!(err.code(), "INVALID_ARGUMENT");
        assert_eq!(err.violations().len(), 1);
        assert_eq!(err.violations()[0].field, "remark");
        assert_eq!(err.public_message(), "remark must not be empty");
    }

    #[test]
    fn non_validation_errors_have_no_violations() {
        assert!(DomainError::permission_denied("no").violations().is_empty());
    }
}
