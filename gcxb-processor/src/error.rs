//! Error types for the transaction processor

use thiserror::Error;

use crate::{
    address::LedgerAddress, payload::PayloadError, port::StateStoreError,
    state::StateCodecError, types::TransactionRecord,
};

/// Result type for processor operations
pub type Result<T> = std::result::Result<T, Error>;

/// Processor errors
#[derive(Error, Debug)]
pub enum Error {
    /// Payload failed validation
    #[error("Invalid transaction: {0}")]
    InvalidTransaction(#[from] PayloadError),

    /// Target address already holds a committed record
    #[error("Address is already in state, Address: {address} Value: {existing}")]
    DuplicateAddress {
        /// Conflicting address
        address: LedgerAddress,
        /// Record found there
        existing: Box<TransactionRecord>,
    },

    /// Existing state could not be decoded
    #[error("Malformed state: {0}")]
    MalformedState(String),

    /// Store I/O failure
    #[error("State store error: {0}")]
    Store(#[from] StateStoreError),

    /// Record could not be encoded
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Processing failed without a client fault
    #[error("Internal error: {0}")]
    Internal(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether the client can fix this by resubmitting a different transaction
    pub fn is_invalid_transaction(&self) -> bool {
        matches!(
            self,
            Error::InvalidTransaction(_) | Error::DuplicateAddress { .. }
        )
    }

    /// Short stable label, used for metrics
    pub fn reason(&self) -> &'static str {
        match self {
            Error::InvalidTransaction(_) => "invalid_transaction",
            Error::DuplicateAddress { .. } => "duplicate_address",
            Error::MalformedState(_) => "malformed_state",
            Error::Store(_) => "store",
            Error::Encoding(_) => "encoding",
            Error::Internal(_) => "internal",
            Error::Config(_) => "config",
            Error::Io(_) => "io",
        }
    }
}

impl From<StateCodecError> for Error {
    fn from(err: StateCodecError) -> Self {
        match err {
            StateCodecError::MalformedState(msg) => Error::MalformedState(msg),
            StateCodecError::Encoding(msg) => Error::Encoding(msg),
        }
    }
}

/// Failure signalled back to the host runtime
///
/// The host distinguishes a transaction that is invalid (drop it, never
/// retry) from an internal error (the block may be retried or aborted).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApplyError {
    /// Transaction is invalid
    #[error("Invalid transaction: {0}")]
    InvalidTransaction(String),

    /// Processing failed inside the processor or the store
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<Error> for ApplyError {
    fn from(err: Error) -> Self {
        if err.is_invalid_transaction() {
            ApplyError::InvalidTransaction(err.to_string())
        } else {
            ApplyError::InternalError(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::PayloadField;

    #[test]
    fn test_classification() {
        let invalid = Error::from(PayloadError::MissingField(PayloadField::CardId));
        assert!(invalid.is_invalid_transaction());
        assert_eq!(invalid.reason(), "invalid_transaction");

        let malformed = Error::from(StateCodecError::MalformedState("eof".to_string()));
        assert!(!malformed.is_invalid_transaction());
        assert_eq!(malformed.reason(), "malformed_state");

        let store = Error::from(StateStoreError::Read("timeout".to_string()));
        assert!(!store.is_invalid_transaction());
    }

    #[test]
    fn test_apply_error_translation() {
        let err = ApplyError::from(Error::from(PayloadError::MissingField(
            PayloadField::BuyerAddress,
        )));
        assert_eq!(
            err,
            ApplyError::InvalidTransaction(
                "Invalid transaction: Missing required payload field - \"buyerAddress\"".to_string()
            )
        );

        let err = ApplyError::from(Error::Internal("State error!".to_string()));
        assert_eq!(
            err,
            ApplyError::InternalError("Internal error: State error!".to_string())
        );
    }
}
