//! Shared test helpers for integration tests.
//!
//! Provides a scripted host that replays canned replies and records every
//! request, plus factory functions for contexts over the in-memory host.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;

use sysbridge_sdk::primitives::{types::HEADER_METHOD, LogLevel, Record};
use sysbridge_sdk::{Context, Destination, HostInterface, MockHost, MockHostConfig};

// ── Scripted host ──

/// One scripted answer: the status to return and the bytes to write into
/// the destination, if the request has one.
pub struct ScriptedReply {
    pub status: i32,
    pub payload: Vec<u8>,
}

pub fn ok_len(len: i32) -> ScriptedReply {
    ScriptedReply {
        status: 0,
        payload: len.to_le_bytes().to_vec(),
    }
}

pub fn ok_bytes(bytes: &[u8]) -> ScriptedReply {
    ScriptedReply {
        status: 0,
        payload: bytes.to_vec(),
    }
}

pub fn fail() -> ScriptedReply {
    ScriptedReply {
        status: 1,
        payload: Vec::new(),
    }
}

/// A request as received by the scripted host.
pub struct SeenRequest {
    pub header: Record,
    pub body: Vec<u8>,
    pub had_destination: bool,
}

impl SeenRequest {
    pub fn method(&self) -> &str {
        self.header.get_string(HEADER_METHOD).unwrap_or("")
    }
}

/// Host that answers from a script and panics on any unscripted call.
#[derive(Default)]
pub struct ScriptedHost {
    script: RefCell<VecDeque<ScriptedReply>>,
    seen: RefCell<Vec<SeenRequest>>,
    logs: RefCell<Vec<(Option<LogLevel>, String)>>,
}

impl ScriptedHost {
    pub fn new(replies: Vec<ScriptedReply>) -> Self {
        Self {
            script: RefCell::new(replies.into()),
            seen: RefCell::new(Vec::new()),
            logs: RefCell::new(Vec::new()),
        }
    }

    /// Log lines received, with their level (`None` for plain logs).
    pub fn logs(&self) -> Vec<(Option<LogLevel>, String)> {
        self.logs.borrow().clone()
    }

    pub fn methods(&self) -> Vec<String> {
        self.seen
            .borrow()
            .iter()
            .map(|r| r.method().to_string())
            .collect()
    }

    pub fn body(&self, index: usize) -> Record {
        Record::from_bytes(&self.seen.borrow()[index].body).expect("structured body")
    }

    pub fn header(&self, index: usize) -> Record {
        self.seen.borrow()[index].header.clone()
    }

    pub fn had_destination(&self, index: usize) -> bool {
        self.seen.borrow()[index].had_destination
    }

    pub fn remaining(&self) -> usize {
        self.script.borrow().len()
    }
}

impl HostInterface for ScriptedHost {
    fn sys_call(&self, header: &[u8], body: &[u8], dest: Option<Destination<'_>>) -> i32 {
        let header = Record::from_bytes(header).expect("header must decode");
        let reply = self
            .script
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| panic!("unscripted call to {:?}", header.get_string(HEADER_METHOD)));
        let had_destination = dest.is_some();
        if let Some(mut dest) = dest {
            dest.write(&reply.payload).expect("scripted payload must fit");
        }
        self.seen.borrow_mut().push(SeenRequest {
            header,
            body: body.to_vec(),
            had_destination,
        });
        reply.status
    }

    fn log_message(&self, msg: &str) {
        self.logs.borrow_mut().push((None, msg.to_string()));
    }

    fn log_message_with_type(&self, msg: &str, level: LogLevel) {
        self.logs.borrow_mut().push((Some(level), msg.to_string()));
    }
}

// ── Context factories ──

/// Context over `host`, bootstrapped the way a deployed contract starts.
pub fn context(host: &MockHost) -> Context<&MockHost> {
    Context::new(host).expect("bootstrap against MockHost")
}

pub fn host_with_args(args: &[(&str, &[u8])]) -> MockHost {
    let host = MockHost::with_config(MockHostConfig::default());
    for (key, value) in args {
        host.set_arg(key, value.to_vec());
    }
    host
}
