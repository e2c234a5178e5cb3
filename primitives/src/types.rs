//! Protocol constants shared by the guest SDK and any host implementation.

use core::fmt;

/// Version tag carried in every request header.
pub const PROTOCOL_VERSION: &str = "v1.2.0";

/// Value the guest returns from its `runtime_type` export.
pub const CONTRACT_RUNTIME_TYPE: i32 = 4;

/// Maximum number of keys accepted by a single batch state read.
pub const MAX_BATCH_KEYS: usize = 10_000;

/// Separator between key and field in the host's composite state key.
pub const COMPOSITE_KEY_SEPARATOR: char = '#';

// ── Header keys ──

pub const HEADER_CTX_PTR: &str = "ctx_ptr";
pub const HEADER_VERSION: &str = "version";
pub const HEADER_METHOD: &str = "method";

// ── Body keys ──

pub const KEY_KEY: &str = "key";
pub const KEY_FIELD: &str = "field";
pub const KEY_VALUE: &str = "value";
pub const KEY_VALUE_PTR: &str = "value_ptr";
pub const KEY_START_KEY: &str = "start_key";
pub const KEY_START_FIELD: &str = "start_field";
pub const KEY_LIMIT_KEY: &str = "limit_key";
pub const KEY_LIMIT_FIELD: &str = "limit_field";
pub const KEY_RS_INDEX: &str = "rs_index";
pub const KEY_KS_INDEX: &str = "ks_index";
pub const KEY_CONTRACT_NAME: &str = "contract_name";
pub const KEY_METHOD: &str = "method";
pub const KEY_PARAM: &str = "param";
pub const KEY_TOPIC: &str = "topic";
/// Event payload items are named `data0`, `data1`, ...
pub const KEY_DATA_PREFIX: &str = "data";
pub const KEY_BATCH_KEYS: &str = "BatchKeys";

// ── History row keys ──

pub const KEY_TX_ID: &str = "txId";
pub const KEY_BLOCK_HEIGHT: &str = "blockHeight";
pub const KEY_IS_DELETE: &str = "isDelete";
pub const KEY_TIMESTAMP: &str = "timestamp";

// ── Paillier request keys ──

pub const KEY_OP_TYPE: &str = "opType";
pub const KEY_OPERAND_ONE: &str = "operandOne";
pub const KEY_OPERAND_TWO: &str = "operandTwo";
pub const KEY_PUB_KEY: &str = "pubKey";

// ── Reserved call parameters ──

pub const PARAM_CREATOR_ORG_ID: &str = "__creator_org_id__";
pub const PARAM_CREATOR_ROLE: &str = "__creator_role__";
pub const PARAM_CREATOR_PK: &str = "__creator_pk__";
pub const PARAM_SENDER_ORG_ID: &str = "__sender_org_id__";
pub const PARAM_SENDER_ROLE: &str = "__sender_role__";
pub const PARAM_SENDER_PK: &str = "__sender_pk__";
pub const PARAM_BLOCK_HEIGHT: &str = "__block_height__";
pub const PARAM_TX_ID: &str = "__tx_id__";
pub const PARAM_CONTEXT_PTR: &str = "__context_ptr__";
pub const PARAM_TX_TIMESTAMP: &str = "__tx_time_stamp__";

/// Every reserved parameter key, in declaration order.
pub const RESERVED_PARAMS: [&str; 10] = [
    PARAM_CREATOR_ORG_ID,
    PARAM_CREATOR_ROLE,
    PARAM_CREATOR_PK,
    PARAM_SENDER_ORG_ID,
    PARAM_SENDER_ROLE,
    PARAM_SENDER_PK,
    PARAM_BLOCK_HEIGHT,
    PARAM_TX_ID,
    PARAM_CONTEXT_PTR,
    PARAM_TX_TIMESTAMP,
];

/// Returns true if `key` is one of the reserved parameter names.
pub fn is_reserved_param(key: &str) -> bool {
    RESERVED_PARAMS.contains(&key)
}

/// Host composite key for `(key, field)`; the bare key when `field` is empty.
pub fn composite_key(key: &str, field: &str) -> alloc::string::String {
    let mut out = alloc::string::String::with_capacity(key.len() + field.len() + 1);
    out.push_str(key);
    if !field.is_empty() {
        out.push(COMPOSITE_KEY_SEPARATOR);
        out.push_str(field);
    }
    out
}

/// Severity passed to the leveled log import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(i32)]
pub enum LogLevel {
    Debug = -1,
    Info = 0,
    Warn = 1,
    Error = 2,
}

impl LogLevel {
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

impl TryFrom<i32> for LogLevel {
    type Error = i32;

    fn try_from(level: i32) -> Result<Self, i32> {
        match level {
            -1 => Ok(Self::Debug),
            0 => Ok(Self::Info),
            1 => Ok(Self::Warn),
            2 => Ok(Self::Error),
            other => Err(other),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Debug => write!(f, "DEBUG"),
            Self::Info => write!(f, "INFO"),
            Self::Warn => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_composite_key() {
        assert_eq!(composite_key("T", "F"), "T#F");
        assert_eq!(composite_key("T", ""), "T");
        assert_eq!(composite_key("", "F"), "#F");
    }

    #[test]
    fn test_reserved_params() {
        assert!(is_reserved_param("__tx_id__"));
        assert!(is_reserved_param(PARAM_CONTEXT_PTR));
        assert!(!is_reserved_param("tx_id"));
    }

    #[test]
    fn test_log_level_roundtrip() {
        for level in [LogLevel::Debug, LogLevel::Info, LogLevel::Warn, LogLevel::Error] {
            assert_eq!(LogLevel::try_from(level.as_i32()), Ok(level));
        }
        assert_eq!(LogLevel::try_from(3), Err(3));
        assert_eq!(LogLevel::try_from(-2), Err(-2));
    }
}
