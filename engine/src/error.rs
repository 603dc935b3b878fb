//! Error types for the Tally engine.

use crate::{ItemId, MovementId, Quantity};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Coarse failure classes surfaced to callers.
///
/// Callers map these onto their own presentation (HTTP status, exit code, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed or out-of-range caller data, rejected before any lock is taken
    InvalidInput,
    /// Referenced item or movement absent at lock time
    NotFound,
    /// Semantically disallowed operation
    Forbidden,
    /// Storage failure inside a unit of work; everything was rolled back
    TransactionFailed,
}

/// All possible errors from the Tally engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    // Validation errors
    #[error("invalid magnitude {magnitude} for {kind} movement")]
    InvalidMagnitude { kind: String, magnitude: Quantity },

    #[error("unknown movement kind: {0}")]
    UnknownKind(String),

    #[error("invalid item field '{field}': {reason}")]
    InvalidField { field: String, reason: String },

    #[error("item already exists: {0}")]
    ItemAlreadyExists(ItemId),

    #[error("movement already exists: {0}")]
    MovementAlreadyExists(MovementId),

    // Lookup errors
    #[error("item not found: {0}")]
    ItemNotFound(ItemId),

    #[error("movement not found: {0}")]
    MovementNotFound(MovementId),

    // Rule errors
    #[error("absolute movement {0} cannot be corrected or reversed")]
    AbsoluteMovementLocked(MovementId),

    // Storage errors
    #[error("transaction failed: {0}")]
    TransactionFailed(String),
}

impl Error {
    /// Classify this error into the caller-facing taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidMagnitude { .. }
            | Error::UnknownKind(_)
            | Error::InvalidField { .. }
            | Error::ItemAlreadyExists(_)
            | Error::MovementAlreadyExists(_) => ErrorKind::InvalidInput,
            Error::ItemNotFound(_) | Error::MovementNotFound(_) => ErrorKind::NotFound,
            Error::AbsoluteMovementLocked(_) => ErrorKind::Forbidden,
            Error::TransactionFailed(_) => ErrorKind::TransactionFailed,
        }
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = Error::ItemNotFound("item-1".into());
        assert_eq!(err.to_string(), "item not found: item-1");

        let err = Error::InvalidMagnitude {
            kind: "inbound".into(),
            magnitude: -3,
        };
        assert_eq!(err.to_string(), "invalid magnitude -3 for inbound movement");

        let err = Error::AbsoluteMovementLocked("mv-9".into());
        assert_eq!(
            err.to_string(),
            "absolute movement mv-9 cannot be corrected or reversed"
        );
    }

    #[test]
    fn error_kinds() {
        assert_eq!(
            Error::UnknownKind("sideways".into()).kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(
            Error::MovementNotFound("mv-1".into()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            Error::AbsoluteMovementLocked("mv-1".into()).kind(),
            ErrorKind::Forbidden
        );
        assert_eq!(
            Error::TransactionFailed("deadlock".into()).kind(),
            ErrorKind::TransactionFailed
        );
    }
}
