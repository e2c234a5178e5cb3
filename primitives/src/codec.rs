//! Typed record codec: the only payload format crossing the guest/host boundary.
//!
//! A [`Record`] is an ordered list of [`TypedItem`]s. Every host call carries
//! two records (header and body), and every structured reply is a record.
//!
//! Encoding format (all integers little-endian):
//! - Record: item count (u32), then each item in document order
//! - Item: key type tag (u32), key length (u32), key bytes, value type tag (u32), value
//! - INT32 values are written as 4 raw bytes
//! - STRING and BYTES values are length-prefixed (u32) then concatenated
//!
//! Empty strings and empty byte arrays are encoded as zero-length values,
//! never omitted. Decoding is strict: truncated input, unknown tags, invalid
//! UTF-8, or trailing bytes all fail with [`BridgeError::MalformedRecord`].

use alloc::borrow::ToOwned;
use alloc::collections::BTreeMap;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::error::{BridgeError, BridgeResult};

/// Smallest possible encoded item: three tags/lengths plus a 4-byte INT32.
const MIN_ITEM_LEN: usize = 16;

/// Distinguishes protocol-reserved keys from caller-supplied ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u32)]
pub enum KeyType {
    System = 0,
    User = 1,
}

impl TryFrom<u32> for KeyType {
    type Error = BridgeError;

    fn try_from(tag: u32) -> Result<Self, Self::Error> {
        match tag {
            0 => Ok(Self::System),
            1 => Ok(Self::User),
            _ => Err(BridgeError::MalformedRecord(format!(
                "unknown key type tag {}",
                tag
            ))),
        }
    }
}

/// Wire tag describing how an item's value is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u32)]
pub enum ValueType {
    Int32 = 0,
    String = 1,
    Bytes = 2,
}

impl TryFrom<u32> for ValueType {
    type Error = BridgeError;

    fn try_from(tag: u32) -> Result<Self, Self::Error> {
        match tag {
            0 => Ok(Self::Int32),
            1 => Ok(Self::String),
            2 => Ok(Self::Bytes),
            _ => Err(BridgeError::MalformedRecord(format!(
                "unknown value type tag {}",
                tag
            ))),
        }
    }
}

/// An item's value. The variant is the value type; they cannot disagree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ItemValue {
    Int32(i32),
    String(String),
    Bytes(Vec<u8>),
}

impl ItemValue {
    /// The wire tag for this value.
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::Int32(_) => ValueType::Int32,
            Self::String(_) => ValueType::String,
            Self::Bytes(_) => ValueType::Bytes,
        }
    }

    /// Render the value as raw bytes: strings as UTF-8, integers as decimal text.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Self::Int32(v) => format!("{}", v).into_bytes(),
            Self::String(s) => s.as_bytes().to_vec(),
            Self::Bytes(b) => b.clone(),
        }
    }
}

impl Serialize for ItemValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Int32(v) => serializer.serialize_i32(*v),
            Self::String(s) => serializer.serialize_str(s),
            Self::Bytes(b) => serializer.serialize_str(&String::from_utf8_lossy(b)),
        }
    }
}

/// One (key type, key, value) triple.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypedItem {
    pub key_type: KeyType,
    pub key: String,
    pub value: ItemValue,
}

impl TypedItem {
    pub fn new(key_type: KeyType, key: impl Into<String>, value: ItemValue) -> Self {
        Self {
            key_type,
            key: key.into(),
            value,
        }
    }

    pub fn value_type(&self) -> ValueType {
        self.value.value_type()
    }
}

/// A cursor for reading bytes during decoding.
struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    fn read_bytes(&mut self, n: usize, what: &str) -> BridgeResult<&'a [u8]> {
        if n > self.remaining() {
            return Err(BridgeError::MalformedRecord(format!(
                "truncated {}: need {} bytes at offset {}, have {}",
                what,
                n,
                self.pos,
                self.remaining()
            )));
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn read_u32(&mut self, what: &str) -> BridgeResult<u32> {
        let bytes = self.read_bytes(4, what)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn read_i32(&mut self, what: &str) -> BridgeResult<i32> {
        let bytes = self.read_bytes(4, what)?;
        Ok(i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn read_var_bytes(&mut self, what: &str) -> BridgeResult<&'a [u8]> {
        let len = self.read_u32(what)? as usize;
        self.read_bytes(len, what)
    }

    fn read_string(&mut self, what: &str) -> BridgeResult<String> {
        let bytes = self.read_var_bytes(what)?;
        core::str::from_utf8(bytes)
            .map(ToOwned::to_owned)
            .map_err(|_| BridgeError::MalformedRecord(format!("invalid UTF-8 in {}", what)))
    }
}

// ── Encoding helpers ──

fn write_u32(buf: &mut Vec<u8>, v: u32) {
    buf.extend_from_slice(&v.to_le_bytes());
}

fn write_var_bytes(buf: &mut Vec<u8>, data: &[u8]) {
    write_u32(buf, data.len() as u32);
    buf.extend_from_slice(data);
}

fn encoded_item_len(item: &TypedItem) -> usize {
    let value_len = match &item.value {
        ItemValue::Int32(_) => 4,
        ItemValue::String(s) => 4 + s.len(),
        ItemValue::Bytes(b) => 4 + b.len(),
    };
    12 + item.key.len() + value_len
}

/// Encode an ordered item list into one buffer.
pub fn encode(items: &[TypedItem]) -> Vec<u8> {
    let total = 4 + items.iter().map(encoded_item_len).sum::<usize>();
    let mut buf = Vec::with_capacity(total);

    write_u32(&mut buf, items.len() as u32);
    for item in items {
        write_u32(&mut buf, item.key_type as u32);
        write_var_bytes(&mut buf, item.key.as_bytes());
        write_u32(&mut buf, item.value_type() as u32);
        match &item.value {
            ItemValue::Int32(v) => buf.extend_from_slice(&v.to_le_bytes()),
            ItemValue::String(s) => write_var_bytes(&mut buf, s.as_bytes()),
            ItemValue::Bytes(b) => write_var_bytes(&mut buf, b),
        }
    }

    buf
}

/// Decode a buffer produced by [`encode`] back into the same item list.
pub fn decode(data: &[u8]) -> BridgeResult<Vec<TypedItem>> {
    let mut r = Reader::new(data);

    let count = r.read_u32("item count")? as usize;
    // Never trust the declared count for allocation.
    let mut items = Vec::with_capacity(count.min(r.remaining() / MIN_ITEM_LEN));
    for _ in 0..count {
        let key_type = KeyType::try_from(r.read_u32("key type")?)?;
        let key = r.read_string("key")?;
        let value = match ValueType::try_from(r.read_u32("value type")?)? {
            ValueType::Int32 => ItemValue::Int32(r.read_i32("int32 value")?),
            ValueType::String => ItemValue::String(r.read_string("string value")?),
            ValueType::Bytes => ItemValue::Bytes(r.read_var_bytes("bytes value")?.to_vec()),
        };
        items.push(TypedItem {
            key_type,
            key,
            value,
        });
    }

    if r.remaining() != 0 {
        return Err(BridgeError::MalformedRecord(format!(
            "{} trailing bytes after {} items",
            r.remaining(),
            count
        )));
    }

    Ok(items)
}

/// An ordered sequence of typed items, serialized as one buffer.
///
/// Keys are not de-duplicated. Lookups and [`remove_key`](Record::remove_key)
/// act on the first item with a matching key, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Record {
    items: Vec<TypedItem>,
}

impl Record {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn from_items(items: Vec<TypedItem>) -> Self {
        Self { items }
    }

    /// Decode a record from its wire form.
    pub fn from_bytes(data: &[u8]) -> BridgeResult<Self> {
        decode(data).map(Self::from_items)
    }

    /// Build a record holding one USER/BYTES item per parameter, in key order.
    pub fn with_params(params: &BTreeMap<String, Vec<u8>>) -> Self {
        let mut record = Self::new();
        for (key, value) in params {
            record.add_bytes(key.as_str(), value.clone());
        }
        record
    }

    pub fn encode(&self) -> Vec<u8> {
        encode(&self.items)
    }

    pub fn add_value(&mut self, key_type: KeyType, key: impl Into<String>, value: ItemValue) {
        self.items.push(TypedItem::new(key_type, key, value));
    }

    pub fn add_item(&mut self, item: TypedItem) {
        self.items.push(item);
    }

    pub fn add_string(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.add_value(KeyType::User, key, ItemValue::String(value.into()));
    }

    pub fn add_int32(&mut self, key: impl Into<String>, value: i32) {
        self.add_value(KeyType::User, key, ItemValue::Int32(value));
    }

    pub fn add_bytes(&mut self, key: impl Into<String>, value: impl Into<Vec<u8>>) {
        self.add_value(KeyType::User, key, ItemValue::Bytes(value.into()));
    }

    /// First item with this key, regardless of type.
    pub fn get(&self, key: &str) -> Option<&TypedItem> {
        self.items.iter().find(|item| item.key == key)
    }

    pub fn get_string(&self, key: &str) -> Option<&str> {
        match self.get(key).map(|item| &item.value) {
            Some(ItemValue::String(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn get_int32(&self, key: &str) -> Option<i32> {
        match self.get(key).map(|item| &item.value) {
            Some(ItemValue::Int32(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_bytes(&self, key: &str) -> Option<&[u8]> {
        match self.get(key).map(|item| &item.value) {
            Some(ItemValue::Bytes(b)) => Some(b.as_slice()),
            _ => None,
        }
    }

    /// Remove the first item with this key and return it.
    ///
    /// Only one item is removed per call; duplicates need repeated calls.
    pub fn remove_key(&mut self, key: &str) -> Option<TypedItem> {
        let index = self.items.iter().position(|item| item.key == key)?;
        Some(self.items.remove(index))
    }

    pub fn items(&self) -> &[TypedItem] {
        &self.items
    }

    pub fn into_items(self) -> Vec<TypedItem> {
        self.items
    }

    pub fn iter(&self) -> core::slice::Iter<'_, TypedItem> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Render the record as a JSON object keyed by item key.
    pub fn to_json(&self) -> String {
        // Serializing into a String cannot fail for these value shapes.
        serde_json::to_string(self).unwrap_or_default()
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.items.len()))?;
        for item in &self.items {
            map.serialize_entry(&item.key, &item.value)?;
        }
        map.end()
    }
}

impl<'a> IntoIterator for &'a Record {
    type Item = &'a TypedItem;
    type IntoIter = core::slice::Iter<'a, TypedItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl From<Vec<TypedItem>> for Record {
    fn from(items: Vec<TypedItem>) -> Self {
        Self::from_items(items)
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_json())
    }
}
