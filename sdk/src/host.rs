//! Host interface trait: abstraction over the three host imports.
//!
//! The `HostInterface` trait decouples the gateway from the execution
//! environment:
//!
//! - In WASM: implemented by [`WasmHost`](crate::WasmHost), which calls the
//!   imported `sys_call` / `log_message` / `log_message_with_type` functions
//! - In tests: implemented by [`MockHost`](crate::MockHost) (in-memory store)
//!
//! Every method takes `&self`. A nested cross-contract call re-enters the
//! same host while the caller's request is still in flight, so hosts keep
//! any mutable bookkeeping behind interior mutability.

use sysbridge_primitives::{BridgeError, BridgeResult, LogLevel};

/// A guest-owned buffer the host may write a reply into.
///
/// Guest code never handles addresses: the gateway creates one destination
/// per request, sized exactly for the expected reply, and the host fills it.
/// A WASM host writes through the address carried in the request body; an
/// in-process host writes through [`Destination::write`].
pub struct Destination<'a> {
    buf: &'a mut [u8],
}

impl<'a> Destination<'a> {
    pub(crate) fn new(buf: &'a mut [u8]) -> Self {
        Self { buf }
    }

    /// Number of bytes the host is allowed to write.
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Copy `data` into the start of the buffer.
    ///
    /// Fails without writing anything if `data` does not fit.
    pub fn write(&mut self, data: &[u8]) -> BridgeResult<()> {
        if data.len() > self.buf.len() {
            return Err(BridgeError::InvalidArgument(alloc::format!(
                "reply of {} bytes exceeds destination of {} bytes",
                data.len(),
                self.buf.len()
            )));
        }
        self.buf[..data.len()].copy_from_slice(data);
        Ok(())
    }

    /// Write a little-endian `i32`, as the host does for length slots.
    pub fn write_i32(&mut self, value: i32) -> BridgeResult<()> {
        self.write(&value.to_le_bytes())
    }

    /// Linear-memory address of the buffer, as sent in `value_ptr`.
    ///
    /// Only meaningful on wasm32, where pointers are 32 bits wide.
    pub(crate) fn address(&self) -> i32 {
        self.buf.as_ptr() as usize as i32
    }
}

/// Abstraction over the host call surface.
pub trait HostInterface {
    /// Dispatch one request.
    ///
    /// `header` and `body` are encoded records. `dest`, when present, is the
    /// buffer named by the body's `value_ptr` item. Returns the host status:
    /// 0 for success, anything else is a failure.
    fn sys_call(&self, header: &[u8], body: &[u8], dest: Option<Destination<'_>>) -> i32;

    /// Write an unstructured log line.
    fn log_message(&self, msg: &str);

    /// Write a log line at the given severity.
    fn log_message_with_type(&self, msg: &str, level: LogLevel);
}

impl<T: HostInterface + ?Sized> HostInterface for &T {
    fn sys_call(&self, header: &[u8], body: &[u8], dest: Option<Destination<'_>>) -> i32 {
        (**self).sys_call(header, body, dest)
    }

    fn log_message(&self, msg: &str) {
        (**self).log_message(msg)
    }

    fn log_message_with_type(&self, msg: &str, level: LogLevel) {
        (**self).log_message_with_type(msg, level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_destination_write_fits() {
        let mut buf = [0u8; 4];
        let mut dest = Destination::new(&mut buf);
        assert_eq!(dest.capacity(), 4);
        dest.write(b"ab").unwrap();
        assert_eq!(&buf, b"ab\0\0");
    }

    #[test]
    fn test_destination_write_overflow_leaves_buffer_untouched() {
        let mut buf = [7u8; 2];
        let mut dest = Destination::new(&mut buf);
        assert!(dest.write(b"abc").is_err());
        assert_eq!(buf, [7, 7]);
    }

    #[test]
    fn test_destination_write_i32() {
        let mut slot = [0u8; 4];
        Destination::new(&mut slot).write_i32(-2).unwrap();
        assert_eq!(i32::from_le_bytes(slot), -2);
    }

    #[test]
    fn test_zero_capacity_destination() {
        let mut buf: [u8; 0] = [];
        let mut dest = Destination::new(&mut buf);
        dest.write(b"").unwrap();
        assert!(dest.write(b"x").is_err());
    }
}
