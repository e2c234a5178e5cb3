//! Host call gateway: request envelopes and the two-phase fetch.
//!
//! Every request is a header record (`ctx_ptr`, `version`, `method`) plus a
//! body. Replies whose size is not known up front are fetched in two round
//! trips: the length method writes the reply size into a 4-byte slot, then
//! the data method writes the reply into a buffer of exactly that size.
//!
//! All encode buffers, length slots and reply buffers are locals of the
//! call that needs them. A nested cross-contract call that re-enters the
//! gateway can never touch an outer call's in-flight buffers.

use alloc::vec;
use alloc::vec::Vec;

use sysbridge_primitives::{
    BridgeError, BridgeResult, ItemValue, KeyType, LogLevel, Record, ResultCode,
    types::{HEADER_CTX_PTR, HEADER_METHOD, HEADER_VERSION, KEY_VALUE_PTR, PROTOCOL_VERSION},
};

use crate::host::{Destination, HostInterface};

/// Issues host calls on behalf of one execution frame.
pub struct Gateway<H> {
    host: H,
    ctx_ptr: i32,
}

impl<H: HostInterface> Gateway<H> {
    pub fn new(host: H, ctx_ptr: i32) -> Self {
        Self { host, ctx_ptr }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn into_host(self) -> H {
        self.host
    }

    pub fn ctx_ptr(&self) -> i32 {
        self.ctx_ptr
    }

    pub(crate) fn set_ctx_ptr(&mut self, ctx_ptr: i32) {
        self.ctx_ptr = ctx_ptr;
    }

    /// Header record for a call to `method`.
    pub fn header(&self, method: &str) -> Record {
        let mut header = Record::new();
        header.add_value(KeyType::System, HEADER_CTX_PTR, ItemValue::Int32(self.ctx_ptr));
        header.add_value(
            KeyType::System,
            HEADER_VERSION,
            ItemValue::String(PROTOCOL_VERSION.into()),
        );
        header.add_value(KeyType::System, HEADER_METHOD, ItemValue::String(method.into()));
        header
    }

    /// Single call with a structured body and no reply payload.
    pub fn invoke(&self, method: &str, body: &Record) -> BridgeResult<()> {
        self.call(method, &body.encode(), None)
    }

    /// Single call with an unstructured body.
    pub fn invoke_raw(&self, method: &str, body: &[u8]) -> BridgeResult<()> {
        self.call(method, body, None)
    }

    /// Length-then-data retrieval of a variable-size reply.
    ///
    /// A zero length is a valid empty reply and skips the data phase. A
    /// failure in either phase fails the whole fetch; no partial buffer is
    /// ever returned.
    pub fn fetch_bytes(
        &self,
        body: &Record,
        len_method: &str,
        data_method: &str,
    ) -> BridgeResult<Vec<u8>> {
        let mut request = body.clone();

        let len = {
            let mut slot = [0u8; 4];
            let dest = Destination::new(&mut slot);
            request.add_int32(KEY_VALUE_PTR, dest.address());
            self.call(len_method, &request.encode(), Some(dest))?;
            i32::from_le_bytes(slot)
        };

        if len == 0 {
            return Ok(Vec::new());
        }
        if len < 0 {
            return Err(BridgeError::host_call(len_method));
        }

        let mut buf = vec![0u8; len as usize];
        {
            let dest = Destination::new(&mut buf);
            request.remove_key(KEY_VALUE_PTR);
            request.add_int32(KEY_VALUE_PTR, dest.address());
            self.call(data_method, &request.encode(), Some(dest))?;
        }
        Ok(buf)
    }

    /// Single call whose reply is one `i32` written into the length slot.
    pub fn fetch_int32(&self, body: &Record, method: &str) -> BridgeResult<i32> {
        let mut request = body.clone();
        let mut slot = [0u8; 4];
        {
            let dest = Destination::new(&mut slot);
            request.add_int32(KEY_VALUE_PTR, dest.address());
            self.call(method, &request.encode(), Some(dest))?;
        }
        Ok(i32::from_le_bytes(slot))
    }

    pub fn log(&self, msg: &str) {
        self.host.log_message(msg);
    }

    pub fn log_with_level(&self, msg: &str, level: LogLevel) {
        self.host.log_message_with_type(msg, level);
    }

    fn call(&self, method: &str, body: &[u8], dest: Option<Destination<'_>>) -> BridgeResult<()> {
        let header = self.header(method).encode();
        let status = self.host.sys_call(&header, body, dest);
        if status == ResultCode::Success.as_i32() {
            Ok(())
        } else {
            Err(BridgeError::host_call(method))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::String;
    use core::cell::RefCell;

    /// Answers every call from a queue of (status, reply) pairs.
    struct QueueHost {
        replies: RefCell<Vec<(i32, Vec<u8>)>>,
        seen: RefCell<Vec<(Record, Record)>>,
    }

    impl QueueHost {
        fn new(mut replies: Vec<(i32, Vec<u8>)>) -> Self {
            replies.reverse();
            Self {
                replies: RefCell::new(replies),
                seen: RefCell::new(Vec::new()),
            }
        }

        fn methods(&self) -> Vec<String> {
            self.seen
                .borrow()
                .iter()
                .map(|(h, _)| String::from(h.get_string(HEADER_METHOD).unwrap()))
                .collect()
        }
    }

    impl HostInterface for QueueHost {
        fn sys_call(&self, header: &[u8], body: &[u8], dest: Option<Destination<'_>>) -> i32 {
            let header = Record::from_bytes(header).unwrap();
            let body = Record::from_bytes(body).unwrap_or_default();
            self.seen.borrow_mut().push((header, body));
            let (status, reply) = self.replies.borrow_mut().pop().expect("unexpected call");
            if let Some(mut dest) = dest {
                dest.write(&reply).unwrap();
            }
            status
        }

        fn log_message(&self, _msg: &str) {}

        fn log_message_with_type(&self, _msg: &str, _level: LogLevel) {}
    }

    #[test]
    fn test_header_layout() {
        let host = QueueHost::new(Vec::new());
        let gw = Gateway::new(&host, 42);
        let header = gw.header("PutState");
        let keys: Vec<&str> = header.iter().map(|i| i.key.as_str()).collect();
        assert_eq!(keys, vec!["ctx_ptr", "version", "method"]);
        assert!(header.iter().all(|i| i.key_type == KeyType::System));
        assert_eq!(header.get_int32("ctx_ptr"), Some(42));
        assert_eq!(header.get_string("version"), Some("v1.2.0"));
        assert_eq!(header.get_string("method"), Some("PutState"));
    }

    #[test]
    fn test_fetch_bytes_two_phases() {
        let host = QueueHost::new(vec![
            (0, 3i32.to_le_bytes().to_vec()),
            (0, b"abc".to_vec()),
        ]);
        let gw = Gateway::new(&host, 0);
        let mut body = Record::new();
        body.add_string("key", "k");

        let out = gw.fetch_bytes(&body, "GetStateLen", "GetState").unwrap();
        assert_eq!(out, b"abc");
        assert_eq!(host.methods(), vec!["GetStateLen", "GetState"]);

        // The data request carries exactly one value_ptr, after the caller's items.
        let seen = host.seen.borrow();
        let data_body = &seen[1].1;
        let keys: Vec<&str> = data_body.iter().map(|i| i.key.as_str()).collect();
        assert_eq!(keys, vec!["key", "value_ptr"]);
    }

    #[test]
    fn test_fetch_bytes_zero_length_skips_data_phase() {
        let host = QueueHost::new(vec![(0, 0i32.to_le_bytes().to_vec())]);
        let gw = Gateway::new(&host, 0);
        let out = gw.fetch_bytes(&Record::new(), "GetArgLen", "GetArg").unwrap();
        assert!(out.is_empty());
        assert_eq!(host.methods(), vec!["GetArgLen"]);
    }

    #[test]
    fn test_fetch_bytes_length_failure_aborts() {
        let host = QueueHost::new(vec![(1, 5i32.to_le_bytes().to_vec())]);
        let gw = Gateway::new(&host, 0);
        let err = gw.fetch_bytes(&Record::new(), "GetStateLen", "GetState").unwrap_err();
        assert_eq!(err, BridgeError::host_call("GetStateLen"));
        assert_eq!(host.methods().len(), 1);
    }

    #[test]
    fn test_fetch_bytes_data_failure_returns_no_partial() {
        let host = QueueHost::new(vec![
            (0, 2i32.to_le_bytes().to_vec()),
            (1, b"xy".to_vec()),
        ]);
        let gw = Gateway::new(&host, 0);
        let err = gw.fetch_bytes(&Record::new(), "GetStateLen", "GetState").unwrap_err();
        assert_eq!(err, BridgeError::host_call("GetState"));
    }

    #[test]
    fn test_fetch_bytes_negative_length_is_error() {
        let host = QueueHost::new(vec![(0, (-4i32).to_le_bytes().to_vec())]);
        let gw = Gateway::new(&host, 0);
        assert!(gw.fetch_bytes(&Record::new(), "GetStateLen", "GetState").is_err());
        assert_eq!(host.methods().len(), 1);
    }

    #[test]
    fn test_unknown_status_is_failure() {
        let host = QueueHost::new(vec![(77, Vec::new())]);
        let gw = Gateway::new(&host, 0);
        assert_eq!(
            gw.invoke("DeleteState", &Record::new()),
            Err(BridgeError::host_call("DeleteState"))
        );
    }

    #[test]
    fn test_fetch_int32() {
        let host = QueueHost::new(vec![(0, 9i32.to_le_bytes().to_vec())]);
        let gw = Gateway::new(&host, 0);
        assert_eq!(gw.fetch_int32(&Record::new(), "KvIterator"), Ok(9));
    }
}
