//! State codec
//!
//! State entries are CBOR maps keyed by camelCase field names. Struct fields are
//! written in declaration order, so equal records always produce equal bytes.
//! Unknown keys are skipped when reading, which lets newer writers add fields
//! without breaking older readers.

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

/// State codec errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateCodecError {
    /// Bytes are not a valid record of the expected shape
    #[error("Malformed state: {0}")]
    MalformedState(String),

    /// Value could not be encoded
    #[error("State encoding failed: {0}")]
    Encoding(String),
}

/// Encode a value into a state entry
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, StateCodecError> {
    serde_cbor::to_vec(value).map_err(|e| StateCodecError::Encoding(e.to_string()))
}

/// Decode a state entry
///
/// Callers treat an empty entry as absent and never pass it here; doing so is
/// reported as malformed state.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, StateCodecError> {
    if bytes.is_empty() {
        return Err(StateCodecError::MalformedState("empty state entry".to_string()));
    }
    serde_cbor::from_slice(bytes).map_err(|e| StateCodecError::MalformedState(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{TransactionRecord, TransactionType};
    use serde::Deserialize;
    use std::collections::BTreeMap;

    fn sample() -> TransactionRecord {
        TransactionRecord::new(
            TransactionType::Exchange,
            "buyer1",
            "seller1",
            "visa",
            "card-123",
            42.5,
        )
    }

    #[test]
    fn test_round_trip() {
        let record = sample();
        let decoded: TransactionRecord = decode(&encode(&record).unwrap()).unwrap();
        assert_eq!(decoded, record);
        assert_eq!(decoded.amount.to_bits(), record.amount.to_bits());
    }

    #[test]
    fn test_encoding_is_reproducible() {
        assert_eq!(encode(&sample()).unwrap(), encode(&sample()).unwrap());
    }

    #[test]
    fn test_envelope_is_a_camel_case_map() {
        let bytes = encode(&sample()).unwrap();
        let map: BTreeMap<String, serde_cbor::Value> = decode(&bytes).unwrap();

        let keys: Vec<&str> = map.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec!["amount", "buyerAddress", "cardId", "cardType", "sellerAddress", "transactionType"]
        );
        assert_eq!(
            map["transactionType"],
            serde_cbor::Value::Text("EXCHANGE".to_string())
        );
        assert_eq!(map["amount"], serde_cbor::Value::Float(42.5));
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Extended<'a> {
            #[serde(flatten)]
            record: &'a TransactionRecord,
            settled_at: u64,
        }

        let record = sample();
        let bytes = encode(&Extended {
            record: &record,
            settled_at: 1_700_000_000,
        })
        .unwrap();
        let decoded: TransactionRecord = decode(&bytes).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn test_missing_field_is_malformed() {
        #[derive(Serialize, Deserialize)]
        struct Partial {
            #[serde(rename = "buyerAddress")]
            buyer_address: String,
        }

        let bytes = encode(&Partial {
            buyer_address: "buyer1".to_string(),
        })
        .unwrap();
        assert!(matches!(
            decode::<TransactionRecord>(&bytes),
            Err(StateCodecError::MalformedState(_))
        ));
    }

    #[test]
    fn test_garbage_is_malformed() {
        assert!(matches!(
            decode::<TransactionRecord>(&[0xff, 0x00, 0x13]),
            Err(StateCodecError::MalformedState(_))
        ));
    }

    #[test]
    fn test_empty_is_malformed() {
        assert_eq!(
            decode::<TransactionRecord>(&[]),
            Err(StateCodecError::MalformedState("empty state entry".to_string()))
        );
    }
}
