//! State access port
//!
//! The processor never owns ledger state. It reads and proposes writes through
//! [`StateAccess`], which the host runtime implements over its own store and
//! hands to every apply call.

use std::collections::HashMap;

use thiserror::Error;

use crate::address::LedgerAddress;

/// Store-level failure reported by a [`StateAccess`] implementation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateStoreError {
    /// Read failed
    #[error("State read failed: {0}")]
    Read(String),

    /// Write failed
    #[error("State write failed: {0}")]
    Write(String),

    /// Address outside the namespaces the handler registered
    #[error("Address not authorized: {0}")]
    Unauthorized(LedgerAddress),
}

/// Get and set state entries by address
///
/// Calls are blocking external I/O with no timeout imposed by the processor.
/// Implementations are expected to be cheap to share across threads; the host
/// is responsible for serializing applies that touch the same address.
pub trait StateAccess: Send + Sync {
    /// Fetch entries for `addresses`
    ///
    /// Absent addresses are either left out of the map or mapped to an empty
    /// value; callers treat both the same.
    fn get_state(
        &self,
        addresses: &[LedgerAddress],
    ) -> Result<HashMap<LedgerAddress, Vec<u8>>, StateStoreError>;

    /// Propose writes, returning the addresses actually committed
    fn set_state(
        &self,
        entries: HashMap<LedgerAddress, Vec<u8>>,
    ) -> Result<Vec<LedgerAddress>, StateStoreError>;
}
