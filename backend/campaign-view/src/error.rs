// backend/campaign-view/src/error.rs
//
// Error taxonomy:
//   - ReadFailure        one field or list did not resolve; kept inside the view
//   - ValidationFailure  a local precondition failed; nothing was submitted
//   - MutationError      what a mutation reports to its caller
//   - GatewayError       what the ledger gateway adapter reports

use serde::Serialize;
use thiserror::Error;

use crate::types::Amount;

/// Error reported by a [`LedgerGateway`](crate::gateway::LedgerGateway) implementation.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum GatewayError {
    #[error("ledger request timed out")]
    Timeout,
    #[error("ledger unavailable: {0}")]
    Unavailable(String),
    #[error("malformed ledger response: {0}")]
    Malformed(String),
    #[error("contract not found")]
    NotFound,
    /// The ledger rejected the caller's role (e.g. a non-owner adding a tier).
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// The transaction was executed and reverted.
    #[error("reverted: {0}")]
    Reverted(String),
}

/// A single read that did not resolve.
#[derive(Clone, Debug, Error, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail")]
pub enum ReadFailure {
    #[error("read timed out")]
    Timeout,
    #[error("ledger unavailable: {0}")]
    Unavailable(String),
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("not found")]
    NotFound,
}

impl From<GatewayError> for ReadFailure {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Timeout => Self::Timeout,
            GatewayError::Unavailable(msg) => Self::Unavailable(msg),
            GatewayError::Malformed(msg) => Self::Malformed(msg),
            GatewayError::NotFound => Self::NotFound,
            // Reads carry no role; treat a rejection as an unusable response.
            GatewayError::Unauthorized(msg) | GatewayError::Reverted(msg) => {
                Self::Malformed(msg)
            }
        }
    }
}

/// A locally checked precondition failed before submission.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ValidationFailure {
    #[error("tier amount must be at least 1")]
    TierAmountBelowMinimum,
    #[error("tier index {index} is out of range (roster has {len} tiers)")]
    TierIndexOutOfRange { index: usize, len: usize },
    #[error("tier {index} changed since it was selected")]
    TierChanged { index: usize },
    #[error("pledge of {offered} does not match tier amount {expected}")]
    PledgeAmountMismatch { expected: Amount, offered: Amount },
    #[error("tier roster could not be read: {0}")]
    TierRosterUnavailable(ReadFailure),
}

/// High-level category used by frontends to route a failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Correctable by changing the input.
    Input,
    /// The ledger refused the caller's role.
    Capability,
    /// Submission or confirmation failed.
    Operation,
}

/// Outcome reported to the caller of a failed mutation.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum MutationError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationFailure),
    #[error("not authorized: {0}")]
    Authorization(String),
    #[error("transaction failed: {0}")]
    Transaction(String),
}

impl MutationError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Validation(_) => ErrorCategory::Input,
            Self::Authorization(_) => ErrorCategory::Capability,
            Self::Transaction(_) => ErrorCategory::Operation,
        }
    }

    /// Whether the ledger never saw the request.
    pub fn is_local(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

impl From<GatewayError> for MutationError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Unauthorized(msg) => Self::Authorization(msg),
            other => Self::Transaction(other.to_string()),
        }
    }
}

/// Configuration could not be loaded.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}
