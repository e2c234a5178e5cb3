//! Result codes and error types for the call bridge.
//!
//! Every bridge operation reports a two-valued [`ResultCode`]. On the Rust
//! side operations return [`BridgeResult`]; every [`BridgeError`] maps to
//! `ResultCode::Error`, whatever its cause.

use alloc::string::String;
use core::fmt;

/// Outcome tag shared with the host (0 = success, 1 = error).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ResultCode {
    Success = 0,
    Error = 1,
}

impl ResultCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    pub fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}

/// Raised when an integer is not a known result code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownResultCode(pub i32);

impl fmt::Display for UnknownResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown result code {}", self.0)
    }
}

impl TryFrom<i32> for ResultCode {
    type Error = UnknownResultCode;

    fn try_from(code: i32) -> Result<Self, UnknownResultCode> {
        match code {
            0 => Ok(Self::Success),
            1 => Ok(Self::Error),
            other => Err(UnknownResultCode(other)),
        }
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "SUCCESS"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

impl<T> From<&BridgeResult<T>> for ResultCode {
    fn from(result: &BridgeResult<T>) -> Self {
        match result {
            Ok(_) => Self::Success,
            Err(e) => e.result_code(),
        }
    }
}

/// Bridge error type.
///
/// Host failures are deliberately opaque: a timeout, an exhausted budget and
/// a rejected request all surface as [`BridgeError::HostCall`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BridgeError {
    /// A record buffer was truncated or internally inconsistent.
    #[error("malformed record: {0}")]
    MalformedRecord(String),

    /// The host reported a non-success status for this method.
    #[error("host call {method} failed")]
    HostCall { method: String },

    /// An iterator handle was used after it was closed.
    #[error("iterator handle {handle} is closed")]
    IteratorClosed { handle: i32 },

    /// The requested call argument is not present.
    #[error("argument {0} not found")]
    MissingArg(String),

    /// A host reply record lacks a required item.
    #[error("reply is missing field {0}")]
    MissingField(&'static str),

    /// A value expected to be text was not valid UTF-8.
    #[error("{0} is not valid UTF-8")]
    InvalidUtf8(&'static str),

    /// Caller input rejected before any host call was made.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl BridgeError {
    /// The result code reported for this error. Always `ResultCode::Error`.
    pub fn result_code(&self) -> ResultCode {
        ResultCode::Error
    }

    pub fn host_call(method: &str) -> Self {
        Self::HostCall {
            method: String::from(method),
        }
    }
}

/// Convenience result type for bridge operations.
pub type BridgeResult<T> = core::result::Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_code_repr_values() {
        assert_eq!(ResultCode::Success as i32, 0);
        assert_eq!(ResultCode::Error as i32, 1);
    }

    #[test]
    fn test_result_code_try_from() {
        assert_eq!(ResultCode::try_from(0), Ok(ResultCode::Success));
        assert_eq!(ResultCode::try_from(1), Ok(ResultCode::Error));
        assert_eq!(ResultCode::try_from(2), Err(UnknownResultCode(2)));
        assert_eq!(ResultCode::try_from(-1), Err(UnknownResultCode(-1)));
    }

    #[test]
    fn test_every_error_maps_to_error_code() {
        let errors = [
            BridgeError::MalformedRecord("x".into()),
            BridgeError::host_call("GetState"),
            BridgeError::IteratorClosed { handle: 3 },
            BridgeError::MissingArg("a".into()),
            BridgeError::MissingField("key"),
            BridgeError::InvalidUtf8("state value"),
            BridgeError::InvalidArgument("x".into()),
        ];
        for err in &errors {
            assert_eq!(err.result_code(), ResultCode::Error);
        }
    }

    #[test]
    fn test_result_code_from_result() {
        let ok: BridgeResult<u8> = Ok(1);
        let err: BridgeResult<u8> = Err(BridgeError::host_call("PutState"));
        assert_eq!(ResultCode::from(&ok), ResultCode::Success);
        assert_eq!(ResultCode::from(&err), ResultCode::Error);
    }

    #[test]
    fn test_display() {
        let s = alloc::format!("{}", BridgeError::host_call("KvIteratorNext"));
        assert!(s.contains("KvIteratorNext"));
        assert_eq!(alloc::format!("{}", ResultCode::Error), "ERROR");
    }
}
