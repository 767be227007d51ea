//! Error types for TokenSettle ledger operations.

use thiserror::Error;

/// Main error type for ledger and settlement operations.
///
/// Every variant is a terminal failure of the current invocation. The host
/// discards all writes the invocation issued before returning it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Wrong argument count, malformed amount or rate, invalid identifier,
    /// or arithmetic that would overflow the balance type.
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        message: String,
        field: Option<String>,
    },

    /// Debit source or queried record was never written.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Amount exceeds the available balance.
    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: u64, available: u64 },

    /// Caller failed the authorization gate.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The ledger store adapter failed or returned a corrupt record.
    #[error("Store failure: {0}")]
    StoreFailure(String),

    /// The host rejected the invocation at commit time because a key in its
    /// read-set changed underneath it.
    #[error("Read conflict on key {0}")]
    Conflict(String),

    /// Broken internal invariant, e.g. an out-of-order settlement stage.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl LedgerError {
    /// Create an invalid argument error without a field reference.
    pub fn invalid(message: impl Into<String>) -> Self {
        LedgerError::InvalidArgument {
            message: message.into(),
            field: None,
        }
    }

    /// Create an invalid argument error naming the offending field.
    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        LedgerError::InvalidArgument {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Check if resubmitting the same invocation may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LedgerError::Conflict(_))
    }

    /// Get error code for caller-facing responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            LedgerError::InvalidArgument { .. } => "INVALID_ARGUMENT",
            LedgerError::NotFound(_) => "NOT_FOUND",
            LedgerError::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            LedgerError::Unauthorized(_) => "UNAUTHORIZED",
            LedgerError::StoreFailure(_) => "STORE_FAILURE",
            LedgerError::Conflict(_) => "CONFLICT",
            LedgerError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

/// Result type alias for TokenSettle operations.
pub type Result<T> = std::result::Result<T, LedgerError>;
