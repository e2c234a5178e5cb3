//! Result recording rules for one contract execution.
//!
//! A success payload is overwritten by every later success. Error payloads
//! accumulate in call order and, once any error has been recorded, the
//! execution outcome is an error no matter what succeeds afterwards.

use alloc::vec::Vec;

use crate::error::ResultCode;

/// Final outcome of one execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success(Vec<u8>),
    Error(Vec<u8>),
}

impl Outcome {
    pub fn code(&self) -> ResultCode {
        match self {
            Self::Success(_) => ResultCode::Success,
            Self::Error(_) => ResultCode::Error,
        }
    }

    pub fn payload(&self) -> &[u8] {
        match self {
            Self::Success(p) | Self::Error(p) => p,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// Accumulates `SuccessResult` / `ErrorResult` reports.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultRecorder {
    success: Option<Vec<u8>>,
    errors: Vec<u8>,
    errored: bool,
}

impl ResultRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the success payload.
    pub fn record_success(&mut self, payload: &[u8]) {
        self.success = Some(payload.to_vec());
    }

    /// Append to the error payload. Messages are concatenated verbatim.
    pub fn record_error(&mut self, message: &[u8]) {
        self.errors.extend_from_slice(message);
        self.errored = true;
    }

    pub fn is_errored(&self) -> bool {
        self.errored
    }

    /// Last recorded success payload, if any.
    pub fn success_payload(&self) -> Option<&[u8]> {
        self.success.as_deref()
    }

    pub fn error_payload(&self) -> &[u8] {
        &self.errors
    }

    pub fn outcome(&self) -> Outcome {
        if self.errored {
            Outcome::Error(self.errors.clone())
        } else {
            Outcome::Success(self.success.clone().unwrap_or_default())
        }
    }

    pub fn code(&self) -> ResultCode {
        if self.errored {
            ResultCode::Error
        } else {
            ResultCode::Success
        }
    }
}
