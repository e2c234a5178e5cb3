//! `sysbridge-fact-guest`: evidence-store contract for the sysbridge host.
//!
//! Stores a file hash together with the file name and a timestamp, and
//! looks it up again by hash. The contract logic in [`fact`] is generic
//! over [`sysbridge_sdk::HostInterface`], so it runs natively against
//! `MockHost` in tests; the wasm32 build wires it to the real imports
//! through the exported functions in `exports`:
//!
//! - `runtime_type`: runtime tag the host checks at deploy time
//! - `init_contract`, `upgrade`: lifecycle hooks
//! - `save`, `find_by_file_hash`: contract methods
//!
//! The wasm32 standard library provides the allocator and panic handler.

pub mod fact;

#[cfg(target_arch = "wasm32")]
mod exports;

#[cfg(target_arch = "wasm32")]
pub use exports::{find_by_file_hash, init_contract, runtime_type, save, upgrade};
