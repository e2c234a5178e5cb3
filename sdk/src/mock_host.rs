//! In-memory host for deterministic testing.
//!
//! `MockHost` implements [`HostInterface`] by decoding each request envelope
//! and serving it from a [`MemStore`]. It keeps a stack of execution frames
//! (arguments plus a [`ResultRecorder`]), a table of snapshot cursors, and
//! records every event, log line and call for assertions.
//!
//! Cross-contract calls run a registered callee closure against the same
//! host. The callee executes during the length phase with the host's
//! internal borrow released, so it may issue further calls, including
//! nested cross-contract calls.

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::format;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::RefCell;

use sysbridge_primitives::{
    BatchKeys, BridgeError, BridgeResult, LogLevel, Outcome, Record, ResultCode, ResultRecorder,
    methods,
    types::*,
};

use crate::host::{Destination, HostInterface};
use crate::mem_store::{HistoryEntry, MemStore, StoredEntry, TxMeta};

/// Nested cross-contract calls deeper than this fail.
pub const MAX_CALL_DEPTH: usize = 16;

/// A callee contract: receives the host and the invoked method name.
pub type ContractFn = Rc<dyn Fn(&MockHost, &str)>;

/// Identity and transaction values served as reserved arguments.
#[derive(Debug, Clone)]
pub struct MockHostConfig {
    /// Context pointer of the outermost frame. Nested frames count up from it.
    pub ctx_ptr: i32,
    pub tx_id: String,
    pub block_height: i32,
    pub tx_timestamp: String,
    pub creator_org_id: String,
    pub creator_role: String,
    pub creator_pk: String,
    pub sender_org_id: String,
    pub sender_role: String,
    pub sender_pk: String,
    pub sender_address: String,
}

impl Default for MockHostConfig {
    fn default() -> Self {
        Self {
            ctx_ptr: 1,
            tx_id: String::from("tx-0001"),
            block_height: 1,
            tx_timestamp: String::from("1700000000"),
            creator_org_id: String::from("org1"),
            creator_role: String::from("admin"),
            creator_pk: String::from("creator-pk"),
            sender_org_id: String::from("org1"),
            sender_role: String::from("client"),
            sender_pk: String::from("sender-pk"),
            sender_address: String::from("sender-address"),
        }
    }
}

/// A log line received through either log import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    /// `None` for the plain `log_message` import.
    pub level: Option<LogLevel>,
    pub message: String,
}

/// An event received through `EmitEvent`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedEvent {
    pub topic: String,
    pub data: Vec<String>,
}

/// One `sys_call` as seen by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRecord {
    pub ctx_ptr: i32,
    pub method: String,
    pub body: Vec<u8>,
}

struct Frame {
    ctx_ptr: i32,
    params: BTreeMap<String, Vec<u8>>,
    results: ResultRecorder,
}

enum CursorRows {
    Kv(Vec<StoredEntry>),
    History(Vec<HistoryEntry>),
}

struct HostCursor {
    rows: CursorRows,
    pos: usize,
}

impl HostCursor {
    fn len(&self) -> usize {
        match &self.rows {
            CursorRows::Kv(rows) => rows.len(),
            CursorRows::History(rows) => rows.len(),
        }
    }

    fn has_next(&self) -> bool {
        self.pos < self.len()
    }

    /// Encoded record for the row under the cursor, without advancing.
    fn peek(&self) -> Option<Vec<u8>> {
        let mut row = Record::new();
        match &self.rows {
            CursorRows::Kv(rows) => {
                let entry = rows.get(self.pos)?;
                row.add_string(KEY_KEY, entry.key.as_str());
                row.add_string(KEY_FIELD, entry.field.as_str());
                row.add_bytes(KEY_VALUE, entry.value.clone());
            }
            CursorRows::History(rows) => {
                let entry = rows.get(self.pos)?;
                row.add_bytes(KEY_VALUE, entry.value.clone());
                row.add_string(KEY_TX_ID, entry.tx_id.as_str());
                row.add_int32(KEY_BLOCK_HEIGHT, entry.block_height);
                row.add_int32(KEY_IS_DELETE, i32::from(entry.is_delete));
                row.add_string(KEY_TIMESTAMP, entry.timestamp.as_str());
            }
        }
        Some(row.encode())
    }
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum CursorKind {
    Kv,
    History,
}

struct MockState {
    config: MockHostConfig,
    store: MemStore,
    frames: Vec<Frame>,
    cursors: BTreeMap<(CursorKind, i32), HostCursor>,
    next_handle: i32,
    /// Callee replies waiting for the data phase, keyed by caller depth.
    pending_calls: BTreeMap<usize, Vec<u8>>,
    contracts: BTreeMap<String, ContractFn>,
    canned: BTreeMap<String, Vec<u8>>,
    failing: BTreeSet<String>,
    events: Vec<EmittedEvent>,
    logs: Vec<LogLine>,
    calls: Vec<CallRecord>,
}

impl MockState {
    fn frame(&self) -> BridgeResult<&Frame> {
        self.frames
            .last()
            .ok_or_else(|| BridgeError::InvalidArgument("no active frame".into()))
    }

    fn frame_mut(&mut self) -> BridgeResult<&mut Frame> {
        self.frames
            .last_mut()
            .ok_or_else(|| BridgeError::InvalidArgument("no active frame".into()))
    }

    fn tx_meta(&self) -> TxMeta {
        TxMeta {
            tx_id: self.config.tx_id.clone(),
            block_height: self.config.block_height,
            timestamp: self.config.tx_timestamp.clone(),
        }
    }

    /// Reserved parameters followed by the caller's arguments.
    fn frame_args(&self) -> BridgeResult<Record> {
        let frame = self.frame()?;
        let c = &self.config;
        let ctx_ptr = format!("{}", frame.ctx_ptr);
        let height = format!("{}", c.block_height);
        let reserved: [(&str, &str); 10] = [
            (PARAM_CREATOR_ORG_ID, &c.creator_org_id),
            (PARAM_CREATOR_ROLE, &c.creator_role),
            (PARAM_CREATOR_PK, &c.creator_pk),
            (PARAM_SENDER_ORG_ID, &c.sender_org_id),
            (PARAM_SENDER_ROLE, &c.sender_role),
            (PARAM_SENDER_PK, &c.sender_pk),
            (PARAM_BLOCK_HEIGHT, &height),
            (PARAM_TX_ID, &c.tx_id),
            (PARAM_CONTEXT_PTR, &ctx_ptr),
            (PARAM_TX_TIMESTAMP, &c.tx_timestamp),
        ];

        let mut args = Record::new();
        for (key, value) in reserved {
            args.add_bytes(key, value.as_bytes().to_vec());
        }
        for (key, value) in &frame.params {
            args.add_bytes(key.as_str(), value.clone());
        }
        Ok(args)
    }

    fn open_cursor(&mut self, kind: CursorKind, rows: CursorRows) -> i32 {
        let handle = self.next_handle;
        self.next_handle += 1;
        self.cursors.insert((kind, handle), HostCursor { rows, pos: 0 });
        handle
    }

    fn cursor(&self, kind: CursorKind, body: &Record) -> BridgeResult<&HostCursor> {
        let handle = handle_of(kind, body)?;
        self.cursors
            .get(&(kind, handle))
            .ok_or(BridgeError::IteratorClosed { handle })
    }

    fn cursor_mut(&mut self, kind: CursorKind, body: &Record) -> BridgeResult<&mut HostCursor> {
        let handle = handle_of(kind, body)?;
        self.cursors
            .get_mut(&(kind, handle))
            .ok_or(BridgeError::IteratorClosed { handle })
    }
}

/// What a request produced.
enum Reply {
    Done,
    Int32(i32),
    /// Length phase of a two-phase read.
    Len(usize),
    Bytes(Vec<u8>),
}

/// In-memory host implementation for deterministic testing.
pub struct MockHost {
    state: RefCell<MockState>,
}

impl Default for MockHost {
    fn default() -> Self {
        Self::new()
    }
}

impl MockHost {
    pub fn new() -> Self {
        Self::with_config(MockHostConfig::default())
    }

    pub fn with_config(config: MockHostConfig) -> Self {
        let root = Frame {
            ctx_ptr: config.ctx_ptr,
            params: BTreeMap::new(),
            results: ResultRecorder::new(),
        };
        Self {
            state: RefCell::new(MockState {
                config,
                store: MemStore::new(),
                frames: alloc::vec![root],
                cursors: BTreeMap::new(),
                next_handle: 1,
                pending_calls: BTreeMap::new(),
                contracts: BTreeMap::new(),
                canned: BTreeMap::new(),
                failing: BTreeSet::new(),
                events: Vec::new(),
                logs: Vec::new(),
                calls: Vec::new(),
            }),
        }
    }

    // ── Setup ──

    /// Set a caller argument on the outermost frame.
    pub fn set_arg(&self, key: &str, value: impl Into<Vec<u8>>) {
        let mut state = self.state.borrow_mut();
        if let Some(frame) = state.frames.first_mut() {
            frame.params.insert(String::from(key), value.into());
        }
    }

    /// Seed state directly, stamped with the current transaction metadata.
    pub fn put_state(&self, key: &str, field: &str, value: &[u8]) {
        let mut state = self.state.borrow_mut();
        let meta = state.tx_meta();
        state.store.put(key, field, value, &meta);
    }

    /// Switch transaction metadata for subsequent writes and arguments.
    pub fn set_tx(&self, tx_id: &str, block_height: i32, timestamp: &str) {
        let mut state = self.state.borrow_mut();
        state.config.tx_id = String::from(tx_id);
        state.config.block_height = block_height;
        state.config.tx_timestamp = String::from(timestamp);
    }

    /// Register a callee for `CallContract`.
    pub fn register_contract(&self, name: &str, contract: impl Fn(&MockHost, &str) + 'static) {
        self.state
            .borrow_mut()
            .contracts
            .insert(String::from(name), Rc::new(contract));
    }

    /// Serve `reply` for a two-phase method with no built-in handler.
    ///
    /// `method` is the data-phase name; its `Len` twin is answered too.
    pub fn set_canned_reply(&self, method: &str, reply: &[u8]) {
        self.state
            .borrow_mut()
            .canned
            .insert(String::from(method), reply.to_vec());
    }

    /// Make every call to `method` fail.
    pub fn fail_method(&self, method: &str) {
        self.state.borrow_mut().failing.insert(String::from(method));
    }

    pub fn clear_failures(&self) {
        self.state.borrow_mut().failing.clear();
    }

    // ── Inspection ──

    pub fn get_state(&self, key: &str, field: &str) -> Option<Vec<u8>> {
        self.state.borrow().store.get(key, field).map(<[u8]>::to_vec)
    }

    /// Outcome recorded by the outermost frame.
    pub fn outcome(&self) -> Outcome {
        let state = self.state.borrow();
        state
            .frames
            .first()
            .map(|f| f.results.outcome())
            .unwrap_or(Outcome::Success(Vec::new()))
    }

    pub fn events(&self) -> Vec<EmittedEvent> {
        self.state.borrow().events.clone()
    }

    pub fn logs(&self) -> Vec<LogLine> {
        self.state.borrow().logs.clone()
    }

    /// Method names of every call so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.state
            .borrow()
            .calls
            .iter()
            .map(|c| c.method.clone())
            .collect()
    }

    pub fn call_records(&self) -> Vec<CallRecord> {
        self.state.borrow().calls.clone()
    }

    pub fn open_iterators(&self) -> usize {
        self.state.borrow().cursors.len()
    }

    pub fn depth(&self) -> usize {
        self.state.borrow().frames.len()
    }

    // ── Dispatch ──

    fn dispatch(&self, method: &str, body: &[u8]) -> BridgeResult<Reply> {
        if method == methods::CALL_CONTRACT_LEN {
            return self.call_contract_len(body);
        }

        let mut state = self.state.borrow_mut();
        match method {
            methods::SUCCESS_RESULT => {
                state.frame_mut()?.results.record_success(body);
                Ok(Reply::Done)
            }
            methods::ERROR_RESULT => {
                state.frame_mut()?.results.record_error(body);
                Ok(Reply::Done)
            }
            methods::LOG_MESSAGE => {
                state.logs.push(LogLine {
                    level: None,
                    message: String::from_utf8_lossy(body).into_owned(),
                });
                Ok(Reply::Done)
            }
            methods::EMIT_EVENT => {
                let body = Record::from_bytes(body)?;
                let topic = string_item(&body, KEY_TOPIC)?;
                let mut data = Vec::new();
                while let Some(item) = body.get_string(&format!("{}{}", KEY_DATA_PREFIX, data.len())) {
                    data.push(String::from(item));
                }
                state.events.push(EmittedEvent { topic, data });
                Ok(Reply::Done)
            }

            methods::GET_ARG_LEN => Ok(Reply::Len(state.frame_args()?.encode().len())),
            methods::GET_ARG => Ok(Reply::Bytes(state.frame_args()?.encode())),
            methods::GET_SENDER_ADDRESS_LEN => Ok(Reply::Len(state.config.sender_address.len())),
            methods::GET_SENDER_ADDRESS => {
                Ok(Reply::Bytes(state.config.sender_address.as_bytes().to_vec()))
            }

            methods::GET_STATE_LEN | methods::GET_STATE => {
                let body = Record::from_bytes(body)?;
                let key = string_item(&body, KEY_KEY)?;
                let field = string_item(&body, KEY_FIELD)?;
                let value = state.store.get(&key, &field).map(<[u8]>::to_vec).unwrap_or_default();
                Ok(two_phase(method == methods::GET_STATE_LEN, value))
            }
            methods::PUT_STATE => {
                let body = Record::from_bytes(body)?;
                let key = string_item(&body, KEY_KEY)?;
                let field = string_item(&body, KEY_FIELD)?;
                let value = body
                    .get_bytes(KEY_VALUE)
                    .ok_or(BridgeError::MissingField(KEY_VALUE))?
                    .to_vec();
                let meta = state.tx_meta();
                state.store.put(&key, &field, &value, &meta);
                Ok(Reply::Done)
            }
            methods::DELETE_STATE => {
                let body = Record::from_bytes(body)?;
                let key = string_item(&body, KEY_KEY)?;
                let field = string_item(&body, KEY_FIELD)?;
                let meta = state.tx_meta();
                state.store.delete(&key, &field, &meta);
                Ok(Reply::Done)
            }
            methods::GET_BATCH_STATE_LEN | methods::GET_BATCH_STATE => {
                let body = Record::from_bytes(body)?;
                let request = body
                    .get_bytes(KEY_BATCH_KEYS)
                    .ok_or(BridgeError::MissingField(KEY_BATCH_KEYS))?;
                let mut keys = BatchKeys::from_bytes(request)?;
                for key in &mut keys.keys {
                    key.value = state
                        .store
                        .get(&key.key, &key.field)
                        .map(<[u8]>::to_vec)
                        .unwrap_or_default();
                }
                Ok(two_phase(method == methods::GET_BATCH_STATE_LEN, keys.to_bytes()))
            }

            methods::KV_ITERATOR => {
                let body = Record::from_bytes(body)?;
                let start = composite_key(
                    &string_item(&body, KEY_START_KEY)?,
                    &string_item(&body, KEY_START_FIELD)?,
                );
                let limit = composite_key(
                    &string_item(&body, KEY_LIMIT_KEY)?,
                    &string_item(&body, KEY_LIMIT_FIELD)?,
                );
                let rows = state.store.range(&start, &limit);
                Ok(Reply::Int32(state.open_cursor(CursorKind::Kv, CursorRows::Kv(rows))))
            }
            methods::KV_PRE_ITERATOR => {
                let body = Record::from_bytes(body)?;
                let prefix = composite_key(
                    &string_item(&body, KEY_START_KEY)?,
                    &string_item(&body, KEY_START_FIELD)?,
                );
                let rows = state.store.prefix(&prefix);
                Ok(Reply::Int32(state.open_cursor(CursorKind::Kv, CursorRows::Kv(rows))))
            }
            methods::HISTORY_KV_ITERATOR => {
                let body = Record::from_bytes(body)?;
                let key = string_item(&body, KEY_START_KEY)?;
                let field = string_item(&body, KEY_START_FIELD)?;
                let rows = state.store.history(&key, &field);
                Ok(Reply::Int32(
                    state.open_cursor(CursorKind::History, CursorRows::History(rows)),
                ))
            }

            methods::KV_ITERATOR_HAS_NEXT => cursor_has_next(&state, CursorKind::Kv, body),
            methods::HISTORY_KV_ITER_HAS_NEXT => {
                cursor_has_next(&state, CursorKind::History, body)
            }
            methods::KV_ITERATOR_NEXT_LEN => cursor_next(&mut state, CursorKind::Kv, body, true),
            methods::KV_ITERATOR_NEXT => cursor_next(&mut state, CursorKind::Kv, body, false),
            methods::HISTORY_KV_ITER_NEXT_LEN => {
                cursor_next(&mut state, CursorKind::History, body, true)
            }
            methods::HISTORY_KV_ITER_NEXT => {
                cursor_next(&mut state, CursorKind::History, body, false)
            }
            methods::KV_ITERATOR_CLOSE => cursor_close(&mut state, CursorKind::Kv, body),
            methods::HISTORY_KV_ITER_CLOSE => cursor_close(&mut state, CursorKind::History, body),

            methods::CALL_CONTRACT => {
                let depth = state.frames.len();
                state
                    .pending_calls
                    .remove(&depth)
                    .map(Reply::Bytes)
                    .ok_or_else(|| BridgeError::InvalidArgument("no pending call result".into()))
            }

            other => {
                if let Some(reply) = state.canned.get(other) {
                    return Ok(Reply::Bytes(reply.clone()));
                }
                if let Some(data_method) = other.strip_suffix("Len") {
                    if let Some(reply) = state.canned.get(data_method) {
                        return Ok(Reply::Len(reply.len()));
                    }
                }
                Err(BridgeError::host_call(other))
            }
        }
    }

    /// Run the callee in a fresh frame and stash its reply for the data phase.
    fn call_contract_len(&self, body: &[u8]) -> BridgeResult<Reply> {
        let body = Record::from_bytes(body)?;
        let name = string_item(&body, KEY_CONTRACT_NAME)?;
        let method = string_item(&body, KEY_METHOD)?;
        let param_bytes = body
            .get_bytes(KEY_PARAM)
            .ok_or(BridgeError::MissingField(KEY_PARAM))?;
        let params: BTreeMap<String, Vec<u8>> = Record::from_bytes(param_bytes)?
            .into_items()
            .into_iter()
            .map(|item| (item.key, item.value.to_bytes()))
            .collect();

        let (contract, caller_depth) = {
            let mut state = self.state.borrow_mut();
            let caller_depth = state.frames.len();
            if caller_depth >= MAX_CALL_DEPTH {
                return Err(BridgeError::InvalidArgument("call depth exceeded".into()));
            }
            let contract = state
                .contracts
                .get(&name)
                .cloned()
                .ok_or_else(|| BridgeError::InvalidArgument(format!("unknown contract {}", name)))?;
            let ctx_ptr = state.config.ctx_ptr + caller_depth as i32;
            state.frames.push(Frame {
                ctx_ptr,
                params,
                results: ResultRecorder::new(),
            });
            (contract, caller_depth)
        };

        // Borrow released: the callee issues its own calls against this host.
        contract(self, &method);

        let mut state = self.state.borrow_mut();
        let frame = state
            .frames
            .pop()
            .ok_or_else(|| BridgeError::InvalidArgument("frame stack underflow".into()))?;
        match frame.results.outcome() {
            Outcome::Success(payload) => {
                let len = payload.len();
                if len > 0 {
                    state.pending_calls.insert(caller_depth, payload);
                }
                Ok(Reply::Len(len))
            }
            Outcome::Error(_) => Err(BridgeError::host_call(methods::CALL_CONTRACT)),
        }
    }
}

impl HostInterface for MockHost {
    fn sys_call(&self, header: &[u8], body: &[u8], dest: Option<Destination<'_>>) -> i32 {
        let header = match Record::from_bytes(header) {
            Ok(h) => h,
            Err(_) => return ResultCode::Error.as_i32(),
        };
        let method = String::from(header.get_string(HEADER_METHOD).unwrap_or_default());
        let ctx_ptr = header.get_int32(HEADER_CTX_PTR).unwrap_or_default();

        let failing = {
            let mut state = self.state.borrow_mut();
            state.calls.push(CallRecord {
                ctx_ptr,
                method: method.clone(),
                body: body.to_vec(),
            });
            state.failing.contains(&method)
        };
        if failing {
            return ResultCode::Error.as_i32();
        }

        let written = self.dispatch(&method, body).and_then(|reply| write_reply(reply, dest));
        match written {
            Ok(()) => ResultCode::Success.as_i32(),
            Err(e) => e.result_code().as_i32(),
        }
    }

    fn log_message(&self, msg: &str) {
        self.state.borrow_mut().logs.push(LogLine {
            level: None,
            message: String::from(msg),
        });
    }

    fn log_message_with_type(&self, msg: &str, level: LogLevel) {
        self.state.borrow_mut().logs.push(LogLine {
            level: Some(level),
            message: String::from(msg),
        });
    }
}

fn write_reply(reply: Reply, dest: Option<Destination<'_>>) -> BridgeResult<()> {
    let bytes = match reply {
        Reply::Done => return Ok(()),
        Reply::Int32(v) => v.to_le_bytes().to_vec(),
        Reply::Len(len) => i32::try_from(len)
            .map_err(|_| BridgeError::InvalidArgument("reply too large".into()))?
            .to_le_bytes()
            .to_vec(),
        Reply::Bytes(b) => b,
    };
    let mut dest =
        dest.ok_or_else(|| BridgeError::InvalidArgument("reply needs a destination".into()))?;
    dest.write(&bytes)
}

fn two_phase(len_phase: bool, value: Vec<u8>) -> Reply {
    if len_phase {
        Reply::Len(value.len())
    } else {
        Reply::Bytes(value)
    }
}

fn string_item(body: &Record, key: &'static str) -> BridgeResult<String> {
    body.get_string(key)
        .map(String::from)
        .ok_or(BridgeError::MissingField(key))
}

fn handle_of(kind: CursorKind, body: &Record) -> BridgeResult<i32> {
    let key = match kind {
        CursorKind::Kv => KEY_RS_INDEX,
        CursorKind::History => KEY_KS_INDEX,
    };
    body.get_int32(key).ok_or(BridgeError::MissingField(key))
}

fn cursor_has_next(state: &MockState, kind: CursorKind, body: &[u8]) -> BridgeResult<Reply> {
    let body = Record::from_bytes(body)?;
    let cursor = state.cursor(kind, &body)?;
    Ok(Reply::Int32(i32::from(cursor.has_next())))
}

fn cursor_next(
    state: &mut MockState,
    kind: CursorKind,
    body: &[u8],
    len_phase: bool,
) -> BridgeResult<Reply> {
    let body = Record::from_bytes(body)?;
    let cursor = state.cursor_mut(kind, &body)?;
    let row = cursor
        .peek()
        .ok_or_else(|| BridgeError::InvalidArgument("iterator exhausted".into()))?;
    if len_phase {
        Ok(Reply::Len(row.len()))
    } else {
        cursor.pos += 1;
        Ok(Reply::Bytes(row))
    }
}

fn cursor_close(state: &mut MockState, kind: CursorKind, body: &[u8]) -> BridgeResult<Reply> {
    let body = Record::from_bytes(body)?;
    let handle = handle_of(kind, &body)?;
    state
        .cursors
        .remove(&(kind, handle))
        .map(|_| Reply::Int32(1))
        .ok_or(BridgeError::IteratorClosed { handle })
}
