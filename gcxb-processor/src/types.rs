//! Core types for the transaction processor
//!
//! The transaction record is built once per request by the payload codec,
//! borrowed by the applier for the duration of one apply cycle and then
//! dropped. It is also the shape persisted at a ledger address.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::payload::PayloadError;

/// Kind of transaction carried by a payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    /// Card exchange between a buyer and a seller
    Exchange,
    /// Accepted and recorded nowhere
    Other,
}

impl TransactionType {
    /// Every known transaction type, in wire declaration order
    pub const ALL: [TransactionType; 2] = [TransactionType::Exchange, TransactionType::Other];

    /// Canonical wire name
    pub fn name(&self) -> &'static str {
        match self {
            TransactionType::Exchange => "EXCHANGE",
            TransactionType::Other => "OTHER",
        }
    }
}

impl FromStr for TransactionType {
    type Err = PayloadError;

    /// Case-sensitive match against the canonical names
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| PayloadError::UnknownTransactionType(s.to_string()))
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Validated transaction decoded from a request payload
///
/// String fields are never empty and `amount` is finite and non-negative when
/// the record comes out of [`crate::payload::parse`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    /// Transaction kind
    pub transaction_type: TransactionType,

    /// Buyer account address
    pub buyer_address: String,

    /// Seller account address
    pub seller_address: String,

    /// Card brand or product (e.g. `visa`)
    pub card_type: String,

    /// Card identifier
    pub card_id: String,

    /// Exchange amount
    pub amount: f64,
}

impl TransactionRecord {
    /// Create a record from its parts without validation
    pub fn new(
        transaction_type: TransactionType,
        buyer_address: impl Into<String>,
        seller_address: impl Into<String>,
        card_type: impl Into<String>,
        card_id: impl Into<String>,
        amount: f64,
    ) -> Self {
        Self {
            transaction_type,
            buyer_address: buyer_address.into(),
            seller_address: seller_address.into(),
            card_type: card_type.into(),
            card_id: card_id.into(),
            amount,
        }
    }
}

impl fmt::Display for TransactionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} -> {} {}/{} {}",
            self.transaction_type,
            self.buyer_address,
            self.seller_address,
            self.card_type,
            self.card_id,
            self.amount
        )
    }
}
