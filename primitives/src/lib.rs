//! `sysbridge-primitives`: wire-level building blocks for the sysbridge
//! guest/host call bridge.
//!
//! This crate provides the typed record codec, result codes and errors, the
//! method catalogue and reserved keys, the result recording rules shared by
//! guests and test hosts, and the batch-key protobuf messages.
//!
//! Supports `#![no_std]` for WASM guest compatibility (use `default-features = false`).

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod types;
pub mod error;
pub mod codec;
pub mod methods;
pub mod outcome;
pub mod batch;

// Re-export commonly used types at the crate root for convenience.
pub use types::{LogLevel, PROTOCOL_VERSION, MAX_BATCH_KEYS};
pub use error::{BridgeError, BridgeResult, ResultCode};
pub use codec::{ItemValue, KeyType, Record, TypedItem, ValueType};
pub use outcome::{Outcome, ResultRecorder};
pub use batch::{BatchKey, BatchKeys};
