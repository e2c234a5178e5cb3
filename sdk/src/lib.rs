//! `sysbridge-sdk`: guest-side runtime for the sysbridge call bridge.
//!
//! Contract code talks to its host through one narrow import (`sys_call`)
//! plus two log imports. This crate builds everything a contract needs on
//! top of that surface.
//!
//! ## Architecture
//!
//! - [`host::HostInterface`]: trait over the three host imports
//! - [`gateway::Gateway`]: request envelopes and the two-phase fetch
//! - [`iterator`]: range, prefix and history cursors over host handles
//! - [`context::Context`]: the per-frame facade contracts program against
//! - [`paillier::Paillier`]: host-evaluated ciphertext arithmetic
//! - [`mock_host::MockHost`]: in-memory host for native tests
//! - `WasmHost`: the real imports, wasm32 only

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod host;
pub mod gateway;
pub mod iterator;
pub mod context;
pub mod paillier;
pub mod mem_store;
pub mod mock_host;

#[cfg(target_arch = "wasm32")]
mod imports;
#[cfg(target_arch = "wasm32")]
pub mod wasm_host;

// Re-export key types for convenience
pub use context::Context;
pub use gateway::Gateway;
pub use host::{Destination, HostInterface};
pub use iterator::{HistoryIterator, KeyModification, KvIterator, KvRow};
pub use mock_host::{MockHost, MockHostConfig};
#[cfg(target_arch = "wasm32")]
pub use wasm_host::WasmHost;

pub use sysbridge_primitives as primitives;
