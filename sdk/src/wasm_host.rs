//! WASM host: implements `HostInterface` by calling the imported functions.
//!
//! The host writes replies straight into guest memory at the `value_ptr`
//! address carried in the request body, so the destination handed to
//! `sys_call` only has to stay alive until the import returns.

use sysbridge_primitives::LogLevel;

use crate::host::{Destination, HostInterface};
use crate::imports;

/// Zero-sized bridge to the `env` imports.
#[derive(Debug, Clone, Copy, Default)]
pub struct WasmHost;

impl HostInterface for WasmHost {
    fn sys_call(&self, header: &[u8], body: &[u8], dest: Option<Destination<'_>>) -> i32 {
        let status = unsafe {
            imports::sys_call(
                header.as_ptr() as i32,
                header.len() as i32,
                body.as_ptr() as i32,
                body.len() as i32,
            )
        };
        drop(dest);
        status
    }

    fn log_message(&self, msg: &str) {
        unsafe { imports::log_message(msg.as_ptr() as i32, msg.len() as i32) }
    }

    fn log_message_with_type(&self, msg: &str, level: LogLevel) {
        unsafe {
            imports::log_message_with_type(msg.as_ptr() as i32, msg.len() as i32, level.as_i32())
        }
    }
}
