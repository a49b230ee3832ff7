//! Payload codec
//!
//! Request payloads are UTF-8, comma-separated strings with a fixed field order:
//!
//! ```text
//! transactionType,buyerAddress,sellerAddress,cardType,cardId,amount
//! ```
//!
//! The format is positional and schema-less. Structural validation happens
//! here, but two transposed string fields cannot be detected.

use std::fmt;

use thiserror::Error;

use crate::types::{TransactionRecord, TransactionType};

/// Field separator on the wire
pub const SEPARATOR: char = ',';

/// Number of fields in a payload
pub const FIELD_COUNT: usize = 6;

/// Payload field, in wire order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PayloadField {
    /// `transactionType`
    TransactionType,
    /// `buyerAddress`
    BuyerAddress,
    /// `sellerAddress`
    SellerAddress,
    /// `cardType`
    CardType,
    /// `cardId`
    CardId,
    /// `amount`
    Amount,
}

impl PayloadField {
    /// All fields in wire order
    pub const ALL: [PayloadField; FIELD_COUNT] = [
        PayloadField::TransactionType,
        PayloadField::BuyerAddress,
        PayloadField::SellerAddress,
        PayloadField::CardType,
        PayloadField::CardId,
        PayloadField::Amount,
    ];

    /// Field name as used in error messages and the state envelope
    pub fn name(&self) -> &'static str {
        match self {
            PayloadField::TransactionType => "transactionType",
            PayloadField::BuyerAddress => "buyerAddress",
            PayloadField::SellerAddress => "sellerAddress",
            PayloadField::CardType => "cardType",
            PayloadField::CardId => "cardId",
            PayloadField::Amount => "amount",
        }
    }

    /// Zero-based position in the payload
    pub fn position(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for PayloadField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Reasons a payload is rejected
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PayloadError {
    /// Payload bytes are not UTF-8
    #[error("Payload is not valid UTF-8: {0}")]
    InvalidUtf8(String),

    /// More fields than the schema allows
    #[error("Invalid payload serialization: expected at most {max} fields, got {actual}")]
    TooManyFields {
        /// Schema field count
        max: usize,
        /// Fields found
        actual: usize,
    },

    /// Required field missing or empty
    #[error("Missing required payload field - \"{0}\"")]
    MissingField(PayloadField),

    /// Amount is not a finite number
    #[error("Failed to parse \"amount\" object: {0:?}")]
    InvalidAmount(String),

    /// Amount is below zero
    #[error("Invalid \"amount\": {0} is negative")]
    NegativeAmount(f64),

    /// Transaction type is not one of the known names
    #[error("Unknown transaction type: {0:?}")]
    UnknownTransactionType(String),
}

impl PayloadError {
    /// The field the failure is attributed to, if any
    pub fn field(&self) -> Option<PayloadField> {
        match self {
            PayloadError::MissingField(field) => Some(*field),
            PayloadError::InvalidAmount(_) | PayloadError::NegativeAmount(_) => {
                Some(PayloadField::Amount)
            }
            PayloadError::UnknownTransactionType(_) => Some(PayloadField::TransactionType),
            PayloadError::InvalidUtf8(_) | PayloadError::TooManyFields { .. } => None,
        }
    }
}

/// Parse raw payload bytes into a validated [`TransactionRecord`]
///
/// Trailing empty segments are discarded before counting, so
/// `"EXCHANGE,a,b,c,d,1,"` has six fields. Missing trailing fields are padded
/// with empty strings and then reported as missing.
///
/// Checks run in wire order; the transaction type name is matched last so an
/// incomplete payload reports the missing field first.
pub fn parse(raw: &[u8]) -> Result<TransactionRecord, PayloadError> {
    let payload = std::str::from_utf8(raw).map_err(|e| PayloadError::InvalidUtf8(e.to_string()))?;

    let mut fields: Vec<&str> = payload.split(SEPARATOR).collect();
    while fields.last().is_some_and(|field| field.is_empty()) {
        fields.pop();
    }
    if fields.len() > FIELD_COUNT {
        return Err(PayloadError::TooManyFields {
            max: FIELD_COUNT,
            actual: fields.len(),
        });
    }
    fields.resize(FIELD_COUNT, "");

    let required = |field: PayloadField| match fields[field.position()] {
        "" => Err(PayloadError::MissingField(field)),
        value => Ok(value),
    };

    let transaction_type = required(PayloadField::TransactionType)?;
    let buyer_address = required(PayloadField::BuyerAddress)?;
    let seller_address = required(PayloadField::SellerAddress)?;
    let card_type = required(PayloadField::CardType)?;
    let card_id = required(PayloadField::CardId)?;
    let amount = parse_amount(required(PayloadField::Amount)?)?;
    let transaction_type = transaction_type.parse::<TransactionType>()?;

    Ok(TransactionRecord::new(
        transaction_type,
        buyer_address,
        seller_address,
        card_type,
        card_id,
        amount,
    ))
}

/// Serialize a record back into its wire form
pub fn to_payload(record: &TransactionRecord) -> String {
    let amount = record.amount.to_string();
    [
        record.transaction_type.name(),
        record.buyer_address.as_str(),
        record.seller_address.as_str(),
        record.card_type.as_str(),
        record.card_id.as_str(),
        amount.as_str(),
    ]
    .join(",")
}

fn parse_amount(raw: &str) -> Result<f64, PayloadError> {
    let amount: f64 = raw
        .trim()
        .parse()
        .map_err(|_| PayloadError::InvalidAmount(raw.to_string()))?;
    if !amount.is_finite() {
        return Err(PayloadError::InvalidAmount(raw.to_string()));
    }
    if amount < 0.0 {
        return Err(PayloadError::NegativeAmount(amount));
    }
    // -0 is stored as zero
    if amount == 0.0 {
        return Ok(0.0);
    }
    Ok(amount)
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = "EXCHANGE,buyer1,seller1,visa,card-123,42.50";

    #[test]
    fn test_parse_valid_exchange() {
        let record = parse(VALID.as_bytes()).unwrap();
        assert_eq!(record.transaction_type, TransactionType::Exchange);
        assert_eq!(record.buyer_address, "buyer1");
        assert_eq!(record.seller_address, "seller1");
        assert_eq!(record.card_type, "visa");
        assert_eq!(record.card_id, "card-123");
        assert_eq!(record.amount, 42.5);
    }

    #[test]
    fn test_parse_other() {
        let record = parse(b"OTHER,b,s,mc,c1,0").unwrap();
        assert_eq!(record.transaction_type, TransactionType::Other);
        assert_eq!(record.amount, 0.0);
    }

    #[test]
    fn test_each_blank_field_is_reported() {
        for field in PayloadField::ALL {
            let mut parts: Vec<&str> = VALID.split(',').collect();
            parts[field.position()] = "";
            let err = parse(parts.join(",").as_bytes()).unwrap_err();
            assert_eq!(err, PayloadError::MissingField(field), "blanked {}", field);
        }
    }

    #[test]
    fn test_missing_trailing_fields_are_padded() {
        assert_eq!(
            parse(b"EXCHANGE,buyer1,seller1").unwrap_err(),
            PayloadError::MissingField(PayloadField::CardType)
        );
        assert_eq!(
            parse(b"").unwrap_err(),
            PayloadError::MissingField(PayloadField::TransactionType)
        );
    }

    #[test]
    fn test_trailing_separator_is_ignored() {
        let record = parse(b"EXCHANGE,buyer1,seller1,visa,card-123,42.50,").unwrap();
        assert_eq!(record.amount, 42.5);
    }

    #[test]
    fn test_too_many_fields() {
        let err = parse(b"EXCHANGE,b,s,visa,c,1,extra").unwrap_err();
        assert_eq!(err, PayloadError::TooManyFields { max: 6, actual: 7 });
        assert_eq!(err.field(), None);
    }

    #[test]
    fn test_non_numeric_amount() {
        let err = parse(b"EXCHANGE,b,s,visa,c,lots").unwrap_err();
        assert_eq!(err, PayloadError::InvalidAmount("lots".to_string()));
        assert_eq!(err.field(), Some(PayloadField::Amount));
    }

    #[test]
    fn test_non_finite_amount() {
        for raw in ["NaN", "inf", "-infinity"] {
            let payload = format!("EXCHANGE,b,s,visa,c,{}", raw);
            assert!(matches!(
                parse(payload.as_bytes()),
                Err(PayloadError::InvalidAmount(_))
            ));
        }
    }

    #[test]
    fn test_amount_surrounding_whitespace_is_ignored() {
        for raw in [" 42.50", "42.50\n", "\t42.50 "] {
            let payload = format!("EXCHANGE,b,s,visa,c,{}", raw);
            assert_eq!(parse(payload.as_bytes()).unwrap().amount, 42.5, "{:?}", raw);
        }
        // Whitespace alone is present but not a number
        assert_eq!(
            parse(b"EXCHANGE,b,s,visa,c, ").unwrap_err(),
            PayloadError::InvalidAmount(" ".to_string())
        );
    }

    #[test]
    fn test_string_fields_are_not_trimmed() {
        let record = parse(b"EXCHANGE, buyer1 ,seller1,visa,card-123,1").unwrap();
        assert_eq!(record.buyer_address, " buyer1 ");
    }

    #[test]
    fn test_negative_zero_amount_is_stored_as_zero() {
        for raw in ["-0", "-0.0"] {
            let payload = format!("EXCHANGE,b,s,visa,c,{}", raw);
            let amount = parse(payload.as_bytes()).unwrap().amount;
            assert_eq!(amount.to_bits(), 0.0f64.to_bits(), "{:?}", raw);
        }
    }

    #[test]
    fn test_negative_amount() {
        let err = parse(b"EXCHANGE,b,s,visa,c,-1.5").unwrap_err();
        assert_eq!(err, PayloadError::NegativeAmount(-1.5));
    }

    #[test]
    fn test_unknown_type_checked_after_fields() {
        assert_eq!(
            parse(b"SWAP,b,s,visa,c,1").unwrap_err(),
            PayloadError::UnknownTransactionType("SWAP".to_string())
        );
        // A missing field wins over an unknown type
        assert_eq!(
            parse(b"SWAP,,s,visa,c,1").unwrap_err(),
            PayloadError::MissingField(PayloadField::BuyerAddress)
        );
    }

    #[test]
    fn test_invalid_utf8() {
        assert!(matches!(
            parse(&[0x45, 0xff, 0xfe]),
            Err(PayloadError::InvalidUtf8(_))
        ));
    }

    #[test]
    fn test_missing_field_message() {
        let err = PayloadError::MissingField(PayloadField::BuyerAddress);
        assert_eq!(err.to_string(), "Missing required payload field - \"buyerAddress\"");
    }

    #[test]
    fn test_to_payload_reparses() {
        let record = parse(VALID.as_bytes()).unwrap();
        assert_eq!(to_payload(&record), "EXCHANGE,buyer1,seller1,visa,card-123,42.5");
        assert_eq!(parse(to_payload(&record).as_bytes()).unwrap(), record);
    }
}
