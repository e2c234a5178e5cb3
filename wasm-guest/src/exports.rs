//! Guest exported functions.
//!
//! The host calls these by name. Contract methods take no parameters: each
//! one bootstraps a [`Context`] over the `env` imports, which fetches the
//! call arguments from the host. They must never panic, since a panic in
//! wasm traps the whole execution.

use sysbridge_primitives::{types::CONTRACT_RUNTIME_TYPE, BridgeResult, LogLevel};
use sysbridge_sdk::{Context, HostInterface, WasmHost};

use crate::fact;

type Method = fn(&Context<WasmHost>) -> BridgeResult<()>;

/// Bootstrap a context and run `method`, reporting a host failure as an
/// error result.
fn run(name: &str, method: Method) {
    let ctx = match Context::new(WasmHost) {
        Ok(ctx) => ctx,
        Err(e) => {
            WasmHost.log_message_with_type(&format!("{}: bootstrap failed: {}", name, e), LogLevel::Error);
            return;
        }
    };
    if let Err(e) = method(&ctx) {
        ctx.log_error(&format!("{}: {}", name, e));
        let _ = ctx.error_result(&format!("{}", e));
    }
}

/// Runtime tag the host checks before instantiating the contract.
#[no_mangle]
pub extern "C" fn runtime_type() -> i32 {
    CONTRACT_RUNTIME_TYPE
}

/// Called once when the contract is installed. Nothing to set up.
#[no_mangle]
pub extern "C" fn init_contract() {}

/// Called when the contract is upgraded. Stored facts carry over unchanged.
#[no_mangle]
pub extern "C" fn upgrade() {}

#[no_mangle]
pub extern "C" fn save() {
    run("save", fact::save::<WasmHost>);
}

#[no_mangle]
pub extern "C" fn find_by_file_hash() {
    run("find_by_file_hash", fact::find_by_file_hash::<WasmHost>);
}
