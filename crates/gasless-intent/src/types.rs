//! on-chain call and batch types, with their json wire shapes

pub use alloy_primitives::{Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};

/// one atomic on-chain instruction (erc-20 approve, vault deposit, ...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Call {
    pub to: Address,
    #[serde(with = "decimal")]
    pub value: U256,
    pub data: Bytes,
}

impl Call {
    /// zero-value call
    pub fn new(to: Address, data: impl Into<Bytes>) -> Self {
        Self {
            to,
            value: U256::ZERO,
            data: data.into(),
        }
    }
}

/// calls scoped to one chain, bounded by a recent block against stale replay
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainBatch {
    pub chain_id: u64,
    pub calls: Vec<Call>,
    pub recent_block: u64,
}

/// a [`ChainBatch`] with its digest, in the shape the relayer expects
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HashedChainBatch {
    pub hash: B256,
    #[serde(with = "decimal")]
    pub chain_id: u64,
    pub calls: Vec<Call>,
    #[serde(with = "decimal")]
    pub recent_block: u64,
}

/// integers carried as decimal strings on the wire
pub mod decimal {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::fmt::Display;
    use std::str::FromStr;

    pub fn serialize<T: Display, S: Serializer>(value: &T, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<T, D::Error>
    where
        T: FromStr,
        T::Err: Display,
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let s = s.trim();
        // U256 would otherwise accept 0x-prefixed input as hex
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(serde::de::Error::custom(format!("expected a decimal integer, got {:?}", s)));
        }
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    #[test]
    fn test_call_wire_shape() {
        let call = Call {
            to: address!("00000000000000000000000000000000000000aa"),
            value: U256::from(1_000_000_000_000_000_000_000u128),
            data: Bytes::from_static(&[0xde, 0xad]),
        };
        let json = serde_json::to_value(&call).unwrap();
        assert_eq!(json["to"], "0x00000000000000000000000000000000000000aa");
        assert_eq!(json["value"], "1000000000000000000000");
        assert_eq!(json["data"], "0xdead");

        let back: Call = serde_json::from_value(json).unwrap();
        assert_eq!(back, call);
    }

    #[test]
    fn test_value_above_u128() {
        let json = r#"{"to": "0x00000000000000000000000000000000000000aa", "value": "340282366920938463463374607431768211456", "data": "0x"}"#;
        let call: Call = serde_json::from_str(json).unwrap();
        assert_eq!(call.value, U256::from(u128::MAX) + U256::from(1));
        assert!(call.data.is_empty());
    }

    #[test]
    fn test_value_must_be_decimal() {
        for value in ["0x10", "-1", "", "1e18"] {
            let json = format!(
                r#"{{"to": "0x00000000000000000000000000000000000000aa", "value": "{}", "data": "0x"}}"#,
                value
            );
            assert!(serde_json::from_str::<Call>(&json).is_err(), "accepted {:?}", value);
        }
    }

    #[test]
    fn test_address_rejects_wrong_length() {
        assert!("0x1234".parse::<Address>().is_err());
        assert!("not hex".parse::<Address>().is_err());
    }

    #[test]
    fn test_batch_wire_shape() {
        let batch = HashedChainBatch {
            hash: B256::repeat_byte(0x11),
            chain_id: 8453,
            calls: vec![],
            recent_block: 123,
        };
        let json = serde_json::to_value(&batch).unwrap();
        assert_eq!(json["chainId"], "8453");
        assert_eq!(json["recentBlock"], "123");
        assert_eq!(json["hash"], format!("0x{}", "11".repeat(32)));
    }
}
