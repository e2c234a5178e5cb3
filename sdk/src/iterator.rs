//! Host-held cursors over state: key ranges, prefixes and key history.
//!
//! An iterator owns one host handle. `has_next` may be called any number of
//! times without moving the cursor; `next_entry` / `next_modification`
//! advance it by one row. After `close` the handle is poisoned: every later
//! call fails locally with [`BridgeError::IteratorClosed`] and never reaches
//! the host. Dropping an iterator that was not closed closes it once.
//!
//! Advancing when `has_next` reports false is a caller error. The host
//! decides what happens; the in-memory host reports a failure.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use sysbridge_primitives::{
    BridgeError, BridgeResult, Record,
    methods,
    types::{
        KEY_BLOCK_HEIGHT, KEY_FIELD, KEY_IS_DELETE, KEY_KEY, KEY_KS_INDEX, KEY_RS_INDEX,
        KEY_TIMESTAMP, KEY_TX_ID, KEY_VALUE,
    },
};

use crate::gateway::Gateway;
use crate::host::HostInterface;

/// Method names and handle key for one cursor family.
struct CursorMethods {
    handle_key: &'static str,
    has_next: &'static str,
    next_len: &'static str,
    next: &'static str,
    close: &'static str,
}

const KV_METHODS: CursorMethods = CursorMethods {
    handle_key: KEY_RS_INDEX,
    has_next: methods::KV_ITERATOR_HAS_NEXT,
    next_len: methods::KV_ITERATOR_NEXT_LEN,
    next: methods::KV_ITERATOR_NEXT,
    close: methods::KV_ITERATOR_CLOSE,
};

const HISTORY_METHODS: CursorMethods = CursorMethods {
    handle_key: KEY_KS_INDEX,
    has_next: methods::HISTORY_KV_ITER_HAS_NEXT,
    next_len: methods::HISTORY_KV_ITER_NEXT_LEN,
    next: methods::HISTORY_KV_ITER_NEXT,
    close: methods::HISTORY_KV_ITER_CLOSE,
};

/// Shared handle state machine for both cursor families.
struct Cursor<'g, H: HostInterface> {
    gateway: &'g Gateway<H>,
    methods: &'static CursorMethods,
    handle: i32,
    closed: bool,
}

impl<'g, H: HostInterface> Cursor<'g, H> {
    fn new(gateway: &'g Gateway<H>, methods: &'static CursorMethods, handle: i32) -> Self {
        Self {
            gateway,
            methods,
            handle,
            closed: false,
        }
    }

    fn handle_body(&self) -> BridgeResult<Record> {
        if self.closed {
            return Err(BridgeError::IteratorClosed {
                handle: self.handle,
            });
        }
        let mut body = Record::new();
        body.add_int32(self.methods.handle_key, self.handle);
        Ok(body)
    }

    fn has_next(&self) -> BridgeResult<bool> {
        let body = self.handle_body()?;
        Ok(self.gateway.fetch_int32(&body, self.methods.has_next)? != 0)
    }

    fn next_row(&self) -> BridgeResult<Record> {
        let body = self.handle_body()?;
        let bytes = self
            .gateway
            .fetch_bytes(&body, self.methods.next_len, self.methods.next)?;
        Record::from_bytes(&bytes)
    }

    fn close(&mut self) -> BridgeResult<bool> {
        let body = self.handle_body()?;
        // Poisoned even if the host rejects the close.
        self.closed = true;
        Ok(self.gateway.fetch_int32(&body, self.methods.close)? != 0)
    }
}

impl<H: HostInterface> Drop for Cursor<'_, H> {
    fn drop(&mut self) {
        if !self.closed {
            let _ = self.close();
        }
    }
}

/// One row of a key/value scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KvRow {
    pub key: String,
    pub field: String,
    pub value: Vec<u8>,
}

impl KvRow {
    fn from_record(row: &Record) -> BridgeResult<Self> {
        Ok(Self {
            key: required_string(row, KEY_KEY)?,
            field: required_string(row, KEY_FIELD)?,
            value: required_bytes(row, KEY_VALUE)?,
        })
    }
}

/// One historical version of a `(key, field)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyModification {
    pub key: String,
    pub field: String,
    pub value: Vec<u8>,
    pub tx_id: String,
    pub block_height: i32,
    pub is_delete: bool,
    pub timestamp: String,
}

/// Cursor over a key range, field range or prefix.
pub struct KvIterator<'g, H: HostInterface> {
    cursor: Cursor<'g, H>,
}

impl<'g, H: HostInterface> KvIterator<'g, H> {
    pub(crate) fn new(gateway: &'g Gateway<H>, handle: i32) -> Self {
        Self {
            cursor: Cursor::new(gateway, &KV_METHODS, handle),
        }
    }

    pub fn handle(&self) -> i32 {
        self.cursor.handle
    }

    pub fn is_closed(&self) -> bool {
        self.cursor.closed
    }

    pub fn has_next(&self) -> BridgeResult<bool> {
        self.cursor.has_next()
    }

    /// Next row as the raw reply record.
    pub fn next_row(&mut self) -> BridgeResult<Record> {
        self.cursor.next_row()
    }

    pub fn next_entry(&mut self) -> BridgeResult<KvRow> {
        KvRow::from_record(&self.cursor.next_row()?)
    }

    /// Release the host handle. Returns the host's closed flag.
    pub fn close(&mut self) -> BridgeResult<bool> {
        self.cursor.close()
    }
}

impl<H: HostInterface> fmt::Debug for KvIterator<'_, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KvIterator")
            .field("handle", &self.cursor.handle)
            .field("closed", &self.cursor.closed)
            .finish()
    }
}

/// Cursor over the recorded versions of one `(key, field)` pair.
pub struct HistoryIterator<'g, H: HostInterface> {
    cursor: Cursor<'g, H>,
    key: String,
    field: String,
}

impl<'g, H: HostInterface> HistoryIterator<'g, H> {
    pub(crate) fn new(gateway: &'g Gateway<H>, handle: i32, key: &str, field: &str) -> Self {
        Self {
            cursor: Cursor::new(gateway, &HISTORY_METHODS, handle),
            key: String::from(key),
            field: String::from(field),
        }
    }

    pub fn handle(&self) -> i32 {
        self.cursor.handle
    }

    pub fn is_closed(&self) -> bool {
        self.cursor.closed
    }

    pub fn has_next(&self) -> BridgeResult<bool> {
        self.cursor.has_next()
    }

    pub fn next_row(&mut self) -> BridgeResult<Record> {
        self.cursor.next_row()
    }

    /// Next version, merged with the queried key and field.
    pub fn next_modification(&mut self) -> BridgeResult<KeyModification> {
        let row = self.cursor.next_row()?;
        Ok(KeyModification {
            key: self.key.clone(),
            field: self.field.clone(),
            value: required_bytes(&row, KEY_VALUE)?,
            tx_id: required_string(&row, KEY_TX_ID)?,
            block_height: row
                .get_int32(KEY_BLOCK_HEIGHT)
                .ok_or(BridgeError::MissingField(KEY_BLOCK_HEIGHT))?,
            is_delete: row
                .get_int32(KEY_IS_DELETE)
                .ok_or(BridgeError::MissingField(KEY_IS_DELETE))?
                == 1,
            timestamp: required_string(&row, KEY_TIMESTAMP)?,
        })
    }

    pub fn close(&mut self) -> BridgeResult<bool> {
        self.cursor.close()
    }
}

impl<H: HostInterface> fmt::Debug for HistoryIterator<'_, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HistoryIterator")
            .field("handle", &self.cursor.handle)
            .field("closed", &self.cursor.closed)
            .field("key", &self.key)
            .field("field", &self.field)
            .finish()
    }
}

fn required_string(row: &Record, key: &'static str) -> BridgeResult<String> {
    row.get_string(key)
        .map(String::from)
        .ok_or(BridgeError::MissingField(key))
}

fn required_bytes(row: &Record, key: &'static str) -> BridgeResult<Vec<u8>> {
    row.get_bytes(key)
        .map(<[u8]>::to_vec)
        .ok_or(BridgeError::MissingField(key))
}
