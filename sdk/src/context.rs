//! Contract-facing call/result facade.
//!
//! A [`Context`] is one execution frame's view of the host: arguments,
//! identity, composite-key state, iterators, events, cross-contract calls
//! and result reporting. Every operation is a method on `&self`, so state
//! can be read and written while iterators borrowed from the same context
//! are still open.
//!
//! Result reporting is asymmetric. [`Context::success_result`] replaces the
//! success payload; [`Context::error_result`] appends to the error payload,
//! and once any error is reported the execution outcome is an error.

use alloc::collections::BTreeMap;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;

use sysbridge_primitives::{
    BatchKey, BatchKeys, BridgeError, BridgeResult, LogLevel, Outcome, Record, ResultRecorder,
    MAX_BATCH_KEYS,
    methods,
    types::*,
};

use crate::gateway::Gateway;
use crate::host::HostInterface;
use crate::iterator::{HistoryIterator, KvIterator};
use crate::paillier::Paillier;

/// Callee and method used to look up a transaction by id.
pub const CHAIN_QUERY_CONTRACT: &str = "CHAIN_QUERY";
pub const GET_TX_BY_TX_ID: &str = "GET_TX_BY_TX_ID";

pub struct Context<H: HostInterface> {
    gateway: Gateway<H>,
    args: RefCell<Option<Record>>,
    origin: RefCell<Option<String>>,
    results: RefCell<ResultRecorder>,
}

impl<H: HostInterface> Context<H> {
    /// Bootstrap a frame: fetch the arguments and read the context pointer.
    ///
    /// The argument fetch itself is sent with a zero context pointer. A
    /// missing `__context_ptr__` is logged and leaves the pointer at 0; an
    /// unparsable one is logged at error level and also falls back to 0.
    pub fn new(host: H) -> BridgeResult<Self> {
        let mut ctx = Self::with_ctx_ptr(host, 0);
        let args = fetch_args(&ctx.gateway)?;

        let ctx_ptr = match args.get(PARAM_CONTEXT_PTR) {
            Some(item) => match parse_ctx_ptr(&item.value.to_bytes()) {
                Ok(ptr) => ptr,
                Err(e) => {
                    ctx.gateway
                        .log_with_level(&format!("get ptr err: {}", e), LogLevel::Error);
                    0
                }
            },
            None => {
                ctx.gateway.log("failed to get ctx ptr");
                0
            }
        };
        ctx.gateway.set_ctx_ptr(ctx_ptr);
        *ctx.args.get_mut() = Some(args);
        Ok(ctx)
    }

    /// A frame with a known context pointer. Arguments are fetched lazily.
    pub fn with_ctx_ptr(host: H, ctx_ptr: i32) -> Self {
        Self {
            gateway: Gateway::new(host, ctx_ptr),
            args: RefCell::new(None),
            origin: RefCell::new(None),
            results: RefCell::new(ResultRecorder::new()),
        }
    }

    pub fn gateway(&self) -> &Gateway<H> {
        &self.gateway
    }

    pub fn host(&self) -> &H {
        self.gateway.host()
    }

    pub fn ctx_ptr(&self) -> i32 {
        self.gateway.ctx_ptr()
    }

    // ── Arguments ──

    /// All call arguments, reserved parameters included.
    pub fn args(&self) -> BridgeResult<Record> {
        if let Some(args) = self.args.borrow().as_ref() {
            return Ok(args.clone());
        }
        let args = fetch_args(&self.gateway)?;
        *self.args.borrow_mut() = Some(args.clone());
        Ok(args)
    }

    /// Raw argument value. STRING values come back as UTF-8, INT32 as decimal text.
    pub fn arg(&self, key: &str) -> BridgeResult<Vec<u8>> {
        let args = self.args()?;
        args.get(key)
            .map(|item| item.value.to_bytes())
            .ok_or_else(|| BridgeError::MissingArg(String::from(key)))
    }

    pub fn arg_string(&self, key: &str) -> BridgeResult<String> {
        String::from_utf8(self.arg(key)?).map_err(|_| BridgeError::InvalidUtf8("argument"))
    }

    // ── Identity and transaction metadata ──

    pub fn creator_org_id(&self) -> BridgeResult<String> {
        self.arg_string(PARAM_CREATOR_ORG_ID)
    }

    pub fn creator_role(&self) -> BridgeResult<String> {
        self.arg_string(PARAM_CREATOR_ROLE)
    }

    pub fn creator_pk(&self) -> BridgeResult<String> {
        self.arg_string(PARAM_CREATOR_PK)
    }

    pub fn sender_org_id(&self) -> BridgeResult<String> {
        self.arg_string(PARAM_SENDER_ORG_ID)
    }

    pub fn sender_role(&self) -> BridgeResult<String> {
        self.arg_string(PARAM_SENDER_ROLE)
    }

    pub fn sender_pk(&self) -> BridgeResult<String> {
        self.arg_string(PARAM_SENDER_PK)
    }

    pub fn block_height(&self) -> BridgeResult<String> {
        self.arg_string(PARAM_BLOCK_HEIGHT)
    }

    pub fn tx_id(&self) -> BridgeResult<String> {
        self.arg_string(PARAM_TX_ID)
    }

    pub fn tx_timestamp(&self) -> BridgeResult<String> {
        self.arg_string(PARAM_TX_TIMESTAMP)
    }

    /// Sender address, always fetched from the host.
    pub fn sender_address(&self) -> BridgeResult<String> {
        let bytes = self.gateway.fetch_bytes(
            &Record::new(),
            methods::GET_SENDER_ADDRESS_LEN,
            methods::GET_SENDER_ADDRESS,
        )?;
        String::from_utf8(bytes).map_err(|_| BridgeError::InvalidUtf8("sender address"))
    }

    /// Sender address, cached for the life of this context.
    pub fn origin(&self) -> BridgeResult<String> {
        if let Some(origin) = self.origin.borrow().as_ref() {
            return Ok(origin.clone());
        }
        let origin = self.sender_address()?;
        *self.origin.borrow_mut() = Some(origin.clone());
        Ok(origin)
    }

    pub fn sender(&self) -> BridgeResult<String> {
        self.origin()
    }

    pub fn sender_addr(&self) -> BridgeResult<String> {
        self.origin()
    }

    // ── State ──

    pub fn get_state(&self, key: &str, field: &str) -> BridgeResult<String> {
        String::from_utf8(self.get_state_bytes(key, field)?)
            .map_err(|_| BridgeError::InvalidUtf8("state value"))
    }

    /// Value stored under `(key, field)`; empty if nothing is stored.
    pub fn get_state_bytes(&self, key: &str, field: &str) -> BridgeResult<Vec<u8>> {
        self.gateway.fetch_bytes(
            &state_body(key, field),
            methods::GET_STATE_LEN,
            methods::GET_STATE,
        )
    }

    /// Value plus whether it exists. An empty value counts as absent.
    pub fn get_state_with_exists(&self, key: &str, field: &str) -> BridgeResult<(String, bool)> {
        let value = self.get_state(key, field)?;
        let exists = !value.is_empty();
        Ok((value, exists))
    }

    pub fn get_state_from_key(&self, key: &str) -> BridgeResult<String> {
        self.get_state(key, "")
    }

    pub fn get_state_from_key_bytes(&self, key: &str) -> BridgeResult<Vec<u8>> {
        self.get_state_bytes(key, "")
    }

    pub fn get_state_from_key_with_exists(&self, key: &str) -> BridgeResult<(String, bool)> {
        self.get_state_with_exists(key, "")
    }

    pub fn put_state(&self, key: &str, field: &str, value: &str) -> BridgeResult<()> {
        self.put_state_bytes(key, field, value.as_bytes())
    }

    pub fn put_state_bytes(&self, key: &str, field: &str, value: &[u8]) -> BridgeResult<()> {
        let mut body = state_body(key, field);
        body.add_bytes(KEY_VALUE, value.to_vec());
        self.gateway.invoke(methods::PUT_STATE, &body)
    }

    pub fn put_state_from_key(&self, key: &str, value: &str) -> BridgeResult<()> {
        self.put_state(key, "", value)
    }

    pub fn put_state_from_key_bytes(&self, key: &str, value: &[u8]) -> BridgeResult<()> {
        self.put_state_bytes(key, "", value)
    }

    pub fn delete_state(&self, key: &str, field: &str) -> BridgeResult<()> {
        self.gateway.invoke(methods::DELETE_STATE, &state_body(key, field))
    }

    pub fn delete_state_from_key(&self, key: &str) -> BridgeResult<()> {
        self.delete_state(key, "")
    }

    /// Read many `(key, field)` pairs in one round trip.
    ///
    /// More than [`MAX_BATCH_KEYS`] keys is rejected before any host call.
    pub fn get_batch_state(&self, keys: &[BatchKey]) -> BridgeResult<Vec<BatchKey>> {
        if keys.len() > MAX_BATCH_KEYS {
            return Err(BridgeError::InvalidArgument(format!(
                "over batch keys count limit {}",
                MAX_BATCH_KEYS
            )));
        }
        let request = BatchKeys {
            keys: keys.to_vec(),
        };
        let mut body = Record::new();
        body.add_bytes(KEY_BATCH_KEYS, request.to_bytes());
        let reply = self.gateway.fetch_bytes(
            &body,
            methods::GET_BATCH_STATE_LEN,
            methods::GET_BATCH_STATE,
        )?;
        Ok(BatchKeys::from_bytes(&reply)?.keys)
    }

    // ── Iterators ──

    /// Keys in `[start_key, limit_key)`, whole-key addressing.
    pub fn new_iterator(&self, start_key: &str, limit_key: &str) -> BridgeResult<KvIterator<'_, H>> {
        self.open_range(start_key, "", limit_key, "")
    }

    /// Fields of one key in `[start_field, limit_field)`.
    pub fn new_iterator_with_field(
        &self,
        key: &str,
        start_field: &str,
        limit_field: &str,
    ) -> BridgeResult<KvIterator<'_, H>> {
        self.open_range(key, start_field, key, limit_field)
    }

    /// Every pair whose composite key starts with `key`.
    pub fn new_iterator_prefix_with_key(&self, key: &str) -> BridgeResult<KvIterator<'_, H>> {
        self.new_iterator_prefix_with_key_field(key, "")
    }

    /// Every pair whose composite key starts with `key#field`.
    pub fn new_iterator_prefix_with_key_field(
        &self,
        key: &str,
        field: &str,
    ) -> BridgeResult<KvIterator<'_, H>> {
        let mut body = Record::new();
        body.add_string(KEY_START_KEY, key);
        body.add_string(KEY_START_FIELD, field);
        let handle = self.gateway.fetch_int32(&body, methods::KV_PRE_ITERATOR)?;
        Ok(KvIterator::new(&self.gateway, handle))
    }

    /// Recorded versions of `(key, field)`.
    pub fn new_history_kv_iter_for_key(
        &self,
        key: &str,
        field: &str,
    ) -> BridgeResult<HistoryIterator<'_, H>> {
        let mut body = Record::new();
        body.add_string(KEY_START_KEY, key);
        body.add_string(KEY_START_FIELD, field);
        let handle = self.gateway.fetch_int32(&body, methods::HISTORY_KV_ITERATOR)?;
        Ok(HistoryIterator::new(&self.gateway, handle, key, field))
    }

    fn open_range(
        &self,
        start_key: &str,
        start_field: &str,
        limit_key: &str,
        limit_field: &str,
    ) -> BridgeResult<KvIterator<'_, H>> {
        let mut body = Record::new();
        body.add_string(KEY_START_KEY, start_key);
        body.add_string(KEY_START_FIELD, start_field);
        body.add_string(KEY_LIMIT_KEY, limit_key);
        body.add_string(KEY_LIMIT_FIELD, limit_field);
        let handle = self.gateway.fetch_int32(&body, methods::KV_ITERATOR)?;
        Ok(KvIterator::new(&self.gateway, handle))
    }

    // ── Events ──

    pub fn emit_event(&self, topic: &str, data: &[&str]) -> BridgeResult<()> {
        let mut body = Record::new();
        body.add_string(KEY_TOPIC, topic);
        for (i, item) in data.iter().enumerate() {
            body.add_string(format!("{}{}", KEY_DATA_PREFIX, i), *item);
        }
        self.gateway.invoke(methods::EMIT_EVENT, &body)
    }

    // ── Results ──

    /// Replace the success payload. Last call wins.
    pub fn success_result(&self, msg: &str) -> BridgeResult<()> {
        self.success_result_bytes(msg.as_bytes())
    }

    pub fn success_result_bytes(&self, msg: &[u8]) -> BridgeResult<()> {
        self.gateway.invoke_raw(methods::SUCCESS_RESULT, msg)?;
        self.results.borrow_mut().record_success(msg);
        Ok(())
    }

    /// Append to the error payload. Makes the outcome an error for good.
    pub fn error_result(&self, msg: &str) -> BridgeResult<()> {
        self.gateway.invoke_raw(methods::ERROR_RESULT, msg.as_bytes())?;
        self.results.borrow_mut().record_error(msg.as_bytes());
        Ok(())
    }

    /// Outcome as acknowledged by the host so far. Reports the host
    /// rejected are not included.
    pub fn outcome(&self) -> Outcome {
        self.results.borrow().outcome()
    }

    // ── Cross-contract ──

    /// Invoke `method` on another contract and return its success payload.
    pub fn call_contract(
        &self,
        contract_name: &str,
        method: &str,
        params: &BTreeMap<String, Vec<u8>>,
    ) -> BridgeResult<Vec<u8>> {
        let mut body = Record::new();
        body.add_bytes(KEY_PARAM, Record::with_params(params).encode());
        body.add_string(KEY_CONTRACT_NAME, contract_name);
        body.add_string(KEY_METHOD, method);
        self.gateway.fetch_bytes(
            &body,
            methods::CALL_CONTRACT_LEN,
            methods::CALL_CONTRACT,
        )
    }

    pub fn get_tx_info(&self, tx_id: &str) -> BridgeResult<Vec<u8>> {
        let mut params = BTreeMap::new();
        params.insert(String::from(KEY_TX_ID), tx_id.as_bytes().to_vec());
        params.insert(String::from(KEY_METHOD), GET_TX_BY_TX_ID.as_bytes().to_vec());
        self.call_contract(CHAIN_QUERY_CONTRACT, GET_TX_BY_TX_ID, &params)
    }

    pub fn paillier(&self) -> Paillier<'_, H> {
        Paillier::new(&self.gateway)
    }

    // ── Logging ──

    pub fn log(&self, msg: &str) {
        self.gateway.log(msg);
    }

    pub fn log_debug(&self, msg: &str) {
        self.gateway.log_with_level(msg, LogLevel::Debug);
    }

    pub fn log_info(&self, msg: &str) {
        self.gateway.log_with_level(msg, LogLevel::Info);
    }

    pub fn log_warn(&self, msg: &str) {
        self.gateway.log_with_level(msg, LogLevel::Warn);
    }

    pub fn log_error(&self, msg: &str) {
        self.gateway.log_with_level(msg, LogLevel::Error);
    }

    /// Leveled log of a formatted message, e.g. `ctx.log_fmt(LogLevel::Info, format_args!("n={}", n))`.
    pub fn log_fmt(&self, level: LogLevel, args: fmt::Arguments<'_>) {
        match args.as_str() {
            Some(msg) => self.gateway.log_with_level(msg, level),
            None => self.gateway.log_with_level(&format!("{}", args), level),
        }
    }
}

fn state_body(key: &str, field: &str) -> Record {
    let mut body = Record::new();
    body.add_string(KEY_KEY, key);
    body.add_string(KEY_FIELD, field);
    body
}

fn fetch_args<H: HostInterface>(gateway: &Gateway<H>) -> BridgeResult<Record> {
    let bytes = gateway.fetch_bytes(&Record::new(), methods::GET_ARG_LEN, methods::GET_ARG)?;
    if bytes.is_empty() {
        return Ok(Record::new());
    }
    Record::from_bytes(&bytes)
}

fn parse_ctx_ptr(raw: &[u8]) -> BridgeResult<i32> {
    core::str::from_utf8(raw)
        .ok()
        .and_then(|s| s.trim().parse::<i32>().ok())
        .ok_or_else(|| {
            BridgeError::InvalidArgument(format!(
                "context pointer {:?} is not a decimal i32",
                String::from_utf8_lossy(raw)
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_host::{MockHost, MockHostConfig};

    #[test]
    fn test_parse_ctx_ptr() {
        assert_eq!(parse_ctx_ptr(b"17"), Ok(17));
        assert_eq!(parse_ctx_ptr(b"-3"), Ok(-3));
        assert!(parse_ctx_ptr(b"0x10").is_err());
        assert!(parse_ctx_ptr(b"99999999999").is_err());
        assert!(parse_ctx_ptr(&[0xff]).is_err());
    }

    #[test]
    fn test_bootstrap_reads_ctx_ptr() {
        let host = MockHost::with_config(MockHostConfig {
            ctx_ptr: 40,
            ..MockHostConfig::default()
        });
        let ctx = Context::new(&host).unwrap();
        assert_eq!(ctx.ctx_ptr(), 40);

        // The bootstrap argument fetch goes out with pointer 0, later calls with 40.
        ctx.put_state_from_key("k", "v").unwrap();
        let records = host.call_records();
        assert_eq!(records[0].ctx_ptr, 0);
        assert_eq!(records.last().unwrap().ctx_ptr, 40);
    }

    #[test]
    fn test_args_are_fetched_once() {
        let host = MockHost::new();
        host.set_arg("name", b"alice".to_vec());
        let ctx = Context::new(&host).unwrap();
        let after_bootstrap = host.calls().len();

        assert_eq!(ctx.arg_string("name").unwrap(), "alice");
        assert_eq!(ctx.arg("name").unwrap(), b"alice");
        assert_eq!(host.calls().len(), after_bootstrap);
    }

    #[test]
    fn test_lazy_args_with_known_ptr() {
        let host = MockHost::new();
        host.set_arg("n", b"1".to_vec());
        let ctx = Context::with_ctx_ptr(&host, 1);
        assert!(host.calls().is_empty());
        assert_eq!(ctx.arg("n").unwrap(), b"1");
        assert_eq!(host.calls(), vec!["GetArgLen", "GetArg"]);
    }

    #[test]
    fn test_missing_arg() {
        let host = MockHost::new();
        let ctx = Context::new(&host).unwrap();
        assert_eq!(
            ctx.arg("absent"),
            Err(BridgeError::MissingArg("absent".into()))
        );
    }

    #[test]
    fn test_batch_limit_checked_before_host_call() {
        let host = MockHost::new();
        let ctx = Context::with_ctx_ptr(&host, 1);
        let keys = vec![BatchKey::new("k", ""); MAX_BATCH_KEYS + 1];
        assert!(matches!(
            ctx.get_batch_state(&keys),
            Err(BridgeError::InvalidArgument(_))
        ));
        assert!(host.calls().is_empty());
    }

    #[test]
    fn test_log_fmt() {
        let host = MockHost::new();
        let ctx = Context::with_ctx_ptr(&host, 1);
        ctx.log_fmt(LogLevel::Warn, format_args!("height={}", 7));
        ctx.log_fmt(LogLevel::Debug, format_args!("static"));
        let logs = host.logs();
        assert_eq!(logs[0].message, "height=7");
        assert_eq!(logs[0].level, Some(LogLevel::Warn));
        assert_eq!(logs[1].message, "static");
    }
}
