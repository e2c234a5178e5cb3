//! Host function imports.
//!
//! All host functions are imported under the `env` WASM module. Strings are
//! passed as (pointer, length) pairs into guest linear memory.

#[link(wasm_import_module = "env")]
extern "C" {
    /// Dispatch one request. `header` and `body` are encoded records.
    /// Returns 0 on success, non-zero on failure.
    pub fn sys_call(header_ptr: i32, header_len: i32, body_ptr: i32, body_len: i32) -> i32;

    /// Write an unstructured log line.
    pub fn log_message(msg_ptr: i32, msg_len: i32);

    /// Write a log line at `level` (-1 debug, 0 info, 1 warn, 2 error).
    pub fn log_message_with_type(msg_ptr: i32, msg_len: i32, level: i32);
}
