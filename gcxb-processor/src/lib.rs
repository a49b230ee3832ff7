//! GCXB Transaction Processor
//!
//! Applies card exchange transactions to a key-value ledger state.
//!
//! # Architecture
//!
//! - **Payload codec**: comma-separated wire payload into a validated record
//! - **Address deriver**: namespace prefix plus truncated SHA-512 of a key
//! - **State codec**: records to and from CBOR state entries
//! - **Applier**: parse, resolve, check, write; one strategy per transaction type
//! - **Handler**: registration surface for the host runtime
//!
//! The processor holds no ledger state. Reads and writes go through the
//! [`StateAccess`] port supplied with every request.
//!
//! # Invariants
//!
//! - Deterministic addresses: same key, same address, across restarts
//! - Create-once: an occupied address is never overwritten
//! - Validation before dispatch: every payload field is checked for every type
//! - No partial writes: the single write is the last step of an apply

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod address;
pub mod applier;
pub mod config;
pub mod error;
pub mod handler;
pub mod memory;
pub mod metrics;
pub mod payload;
pub mod port;
pub mod state;
pub mod types;

// Re-exports
pub use address::{derive_address, AddressKeyPolicy, LedgerAddress, Namespace};
pub use applier::{Applied, TransactionApplier};
pub use config::Config;
pub use error::{ApplyError, Error, Result};
pub use handler::{GcxbHandler, TransactionHandler, TransactionRequest};
pub use memory::InMemoryState;
pub use port::{StateAccess, StateStoreError};
pub use types::{TransactionRecord, TransactionType};
