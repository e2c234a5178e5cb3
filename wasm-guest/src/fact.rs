//! The evidence record and the two contract methods over it.
//!
//! Each fact is stored twice under the file hash: once as JSON in
//! `fact_json` and once as an encoded record in `fact_bytes`.

use sysbridge_primitives::{BridgeError, BridgeResult, Record};
use sysbridge_sdk::{Context, HostInterface};

pub const FACT_JSON_KEY: &str = "fact_json";
pub const FACT_BYTES_KEY: &str = "fact_bytes";
pub const SAVE_TOPIC: &str = "topic_vx";

const ARG_FILE_HASH: &str = "file_hash";
const ARG_FILE_NAME: &str = "file_name";
const ARG_TIME: &str = "time";

/// One piece of stored evidence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fact {
    pub file_hash: String,
    pub file_name: String,
    /// Seconds.
    pub time: i32,
}

impl Fact {
    pub fn new(file_hash: impl Into<String>, file_name: impl Into<String>, time: i32) -> Self {
        Self {
            file_hash: file_hash.into(),
            file_name: file_name.into(),
            time,
        }
    }

    fn to_record(&self) -> Record {
        let mut record = Record::new();
        record.add_string("fileHash", self.file_hash.as_str());
        record.add_string("fileName", self.file_name.as_str());
        record.add_int32("time", self.time);
        record
    }

    pub fn to_json(&self) -> String {
        self.to_record().to_json()
    }

    pub fn encode(&self) -> Vec<u8> {
        self.to_record().encode()
    }

    pub fn decode(data: &[u8]) -> BridgeResult<Self> {
        let record = Record::from_bytes(data)?;
        Ok(Self {
            file_hash: String::from(
                record
                    .get_string("fileHash")
                    .ok_or(BridgeError::MissingField("fileHash"))?,
            ),
            file_name: String::from(
                record
                    .get_string("fileName")
                    .ok_or(BridgeError::MissingField("fileName"))?,
            ),
            time: record
                .get_int32("time")
                .ok_or(BridgeError::MissingField("time"))?,
        })
    }
}

/// Store a fact from the `file_hash`, `file_name` and `time` arguments.
///
/// Bad arguments are reported through `ErrorResult`; only host failures
/// come back as `Err`.
pub fn save<H: HostInterface>(ctx: &Context<H>) -> BridgeResult<()> {
    let args = (
        ctx.arg_string(ARG_FILE_HASH),
        ctx.arg_string(ARG_FILE_NAME),
        ctx.arg_string(ARG_TIME),
    );
    let (file_hash, file_name, time) = match args {
        (Ok(hash), Ok(name), Ok(time)) => (hash, name, time),
        _ => {
            ctx.log("get arg fail.");
            return ctx.error_result("get arg fail.");
        }
    };
    let time = match time.parse::<i32>() {
        Ok(t) => t,
        Err(e) => {
            let msg = format!("invalid time {:?}: {}", time, e);
            ctx.log_warn(&msg);
            return ctx.error_result(&msg);
        }
    };

    let fact = Fact::new(file_hash, file_name, time);
    ctx.emit_event(SAVE_TOPIC, &[fact.file_hash.as_str(), fact.file_name.as_str()])?;
    ctx.put_state(FACT_JSON_KEY, &fact.file_hash, &fact.to_json())?;
    ctx.put_state_bytes(FACT_BYTES_KEY, &fact.file_hash, &fact.encode())?;

    ctx.log(&format!("[save] fileHash={}", fact.file_hash));
    ctx.log(&format!("[save] fileName={}", fact.file_name));
    ctx.success_result(&format!("{}{}", fact.file_name, fact.file_hash))
}

/// Look up the fact stored under the `file_hash` argument and return it as JSON.
pub fn find_by_file_hash<H: HostInterface>(ctx: &Context<H>) -> BridgeResult<()> {
    let file_hash = match ctx.arg_string(ARG_FILE_HASH) {
        Ok(hash) => hash,
        Err(_) => return ctx.error_result("missing arg file_hash."),
    };

    let json = ctx.get_state_bytes(FACT_JSON_KEY, &file_hash)?;
    if json.is_empty() {
        return ctx.error_result(&format!(
            "no fact stored. got key:{}, field:{}",
            FACT_JSON_KEY, file_hash
        ));
    }
    ctx.success_result_bytes(&json)?;
    ctx.log(&format!("get val:{}", String::from_utf8_lossy(&json)));

    // The encoded copy, when readable, takes precedence as the reply.
    let encoded = ctx.get_state_bytes(FACT_BYTES_KEY, &file_hash)?;
    if let Ok(fact) = Fact::decode(&encoded) {
        let json = fact.to_json();
        ctx.success_result(&json)?;
        ctx.log(&format!("[find_by_file_hash] fileHash={}", fact.file_hash));
        ctx.log(&format!("[find_by_file_hash] fileName={}", fact.file_name));
    }
    Ok(())
}
