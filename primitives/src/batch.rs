//! Protobuf messages for batch state reads.
//!
//! Field numbers match the host's `BatchKey` / `BatchKeys` definitions.

use alloc::string::String;
use alloc::vec::Vec;

use prost::Message;

use crate::error::{BridgeError, BridgeResult};

/// One `(key, field)` lookup and, in a reply, its value.
#[derive(Clone, PartialEq, Eq, prost::Message)]
pub struct BatchKey {
    #[prost(string, tag = "1")]
    pub key: String,
    #[prost(string, tag = "2")]
    pub field: String,
    #[prost(bytes = "vec", tag = "3")]
    pub value: Vec<u8>,
    #[prost(string, tag = "4")]
    pub contract_name: String,
}

impl BatchKey {
    pub fn new(key: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            field: field.into(),
            value: Vec::new(),
            contract_name: String::new(),
        }
    }
}

#[derive(Clone, PartialEq, Eq, prost::Message)]
pub struct BatchKeys {
    #[prost(message, repeated, tag = "1")]
    pub keys: Vec<BatchKey>,
}

impl BatchKeys {
    pub fn to_bytes(&self) -> Vec<u8> {
        self.encode_to_vec()
    }

    pub fn from_bytes(data: &[u8]) -> BridgeResult<Self> {
        Self::decode(data)
            .map_err(|e| BridgeError::MalformedRecord(alloc::format!("batch keys: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_keys_wire_layout() {
        let keys = BatchKeys {
            keys: vec![BatchKey::new("a", "b")],
        };
        // keys(1, len 6) { key(1, len 1) "a", field(2, len 1) "b" }
        assert_eq!(
            keys.to_bytes(),
            vec![0x0a, 0x06, 0x0a, 0x01, b'a', 0x12, 0x01, b'b']
        );
    }

    #[test]
    fn test_batch_keys_decode_with_values() {
        let mut key = BatchKey::new("acct", "1");
        key.value = b"100".to_vec();
        key.contract_name = "bank".into();
        let keys = BatchKeys { keys: vec![key.clone(), BatchKey::new("x", "")] };

        let decoded = BatchKeys::from_bytes(&keys.to_bytes()).unwrap();
        assert_eq!(decoded.keys.len(), 2);
        assert_eq!(decoded.keys[0], key);
        assert!(decoded.keys[1].field.is_empty());
    }

    #[test]
    fn test_batch_keys_decode_garbage() {
        assert!(matches!(
            BatchKeys::from_bytes(&[0x0a, 0xff]),
            Err(BridgeError::MalformedRecord(_))
        ));
    }
}
