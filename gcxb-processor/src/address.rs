//! Address derivation
//!
//! A ledger address is 70 lowercase hex characters:
//!
//! ```text
//! ┌──────────────┬──────────────────────────────────────────────┐
//! │ namespace(6) │ sha512(key) truncated to 64 hex characters   │
//! └──────────────┴──────────────────────────────────────────────┘
//! ```
//!
//! Addresses must stay stable across restarts: duplicate detection relies on
//! the same key landing on the same address for the lifetime of the chain.

use std::fmt;

use sha2::{Digest, Sha512};
use thiserror::Error;

use crate::types::TransactionRecord;

/// Hex characters in a namespace prefix
pub const NAMESPACE_LEN: usize = 6;

/// Hex characters taken from the key hash
pub const ENTITY_HASH_LEN: usize = 64;

/// Total hex characters in an address
pub const ADDRESS_LEN: usize = NAMESPACE_LEN + ENTITY_HASH_LEN;

/// Address parsing errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    /// Wrong number of characters
    #[error("Invalid length: expected {expected}, got {actual}")]
    InvalidLength {
        /// Required length
        expected: usize,
        /// Length found
        actual: usize,
    },

    /// Contains something other than lowercase hex
    #[error("Not lowercase hex: {0:?}")]
    NotHex(String),
}

/// Hex-encoded SHA-512 digest (128 characters)
pub fn hash512_hex(data: &[u8]) -> String {
    hex::encode(Sha512::digest(data))
}

fn check_hex(value: &str, expected: usize) -> Result<(), AddressError> {
    if value.len() != expected {
        return Err(AddressError::InvalidLength {
            expected,
            actual: value.len(),
        });
    }
    if !value.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
        return Err(AddressError::NotHex(value.to_string()));
    }
    Ok(())
}

/// Namespace prefix owned by a transaction family
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Namespace(String);

impl Namespace {
    /// First six hex characters of `sha512(family_name)`
    pub fn from_family_name(family_name: &str) -> Self {
        let mut digest = hash512_hex(family_name.as_bytes());
        digest.truncate(NAMESPACE_LEN);
        Self(digest)
    }

    /// Use an explicit prefix
    pub fn from_prefix(prefix: &str) -> Result<Self, AddressError> {
        check_hex(prefix, NAMESPACE_LEN)?;
        Ok(Self(prefix.to_string()))
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether `address` falls under this namespace
    pub fn owns(&self, address: &LedgerAddress) -> bool {
        address.namespace_prefix() == self.0
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fixed-length hex address of a state entry
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LedgerAddress(String);

impl LedgerAddress {
    /// Parse and validate an address string
    pub fn parse(address: &str) -> Result<Self, AddressError> {
        check_hex(address, ADDRESS_LEN)?;
        Ok(Self(address.to_string()))
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The leading namespace characters
    pub fn namespace_prefix(&self) -> &str {
        &self.0[..NAMESPACE_LEN]
    }

    /// The hashed key part
    pub fn entity_hash(&self) -> &str {
        &self.0[NAMESPACE_LEN..]
    }
}

impl fmt::Display for LedgerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for LedgerAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Derive the address of `key` under `namespace`
pub fn derive_address(namespace: &Namespace, key: &str) -> LedgerAddress {
    let mut digest = hash512_hex(key.as_bytes());
    digest.truncate(ENTITY_HASH_LEN);
    LedgerAddress(format!("{}{}", namespace.as_str(), digest))
}

/// Chooses the key an exchange record is stored under
pub trait AddressKeyPolicy: fmt::Debug + Send + Sync {
    /// Key hashed into the entity part of the address
    fn key(&self, record: &TransactionRecord) -> String;
}

/// Key on the transaction type name alone
///
/// Every record of one type maps to the same address, so only the first
/// EXCHANGE on a chain is ever accepted.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransactionTypeKey;

impl AddressKeyPolicy for TransactionTypeKey {
    fn key(&self, record: &TransactionRecord) -> String {
        record.transaction_type.name().to_string()
    }
}

/// Key on the parties and the card, one address per distinct exchange
#[derive(Debug, Clone, Copy, Default)]
pub struct CardIdentityKey;

impl AddressKeyPolicy for CardIdentityKey {
    fn key(&self, record: &TransactionRecord) -> String {
        [
            record.buyer_address.as_str(),
            record.seller_address.as_str(),
            record.card_type.as_str(),
            record.card_id.as_str(),
        ]
        .join("|")
    }
}
