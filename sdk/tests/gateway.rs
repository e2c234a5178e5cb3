//! Two-phase fetch rules, checked against a scripted host.

mod common;

use sysbridge_sdk::primitives::{methods, BridgeError, Record, ResultCode};
use sysbridge_sdk::Gateway;

use common::*;

fn key_body() -> Record {
    let mut body = Record::new();
    body.add_string("key", "k");
    body.add_string("field", "");
    body
}

// ── Test: zero length skips the data phase ──

#[test]
fn test_zero_length_short_circuits() {
    let host = ScriptedHost::new(vec![ok_len(0)]);
    let gw = Gateway::new(&host, 3);

    let out = gw
        .fetch_bytes(&key_body(), methods::GET_STATE_LEN, methods::GET_STATE)
        .unwrap();

    assert!(out.is_empty());
    assert_eq!(host.methods(), vec!["GetStateLen"]);
    assert_eq!(host.remaining(), 0);
}

// ── Test: length-phase failure never reaches the data phase ──

#[test]
fn test_length_failure_aborts() {
    let host = ScriptedHost::new(vec![fail(), ok_bytes(b"never")]);
    let gw = Gateway::new(&host, 3);

    let result = gw.fetch_bytes(&key_body(), methods::GET_STATE_LEN, methods::GET_STATE);

    assert_eq!(ResultCode::from(&result), ResultCode::Error);
    assert_eq!(result, Err(BridgeError::host_call("GetStateLen")));
    assert_eq!(host.methods(), vec!["GetStateLen"]);
    assert_eq!(host.remaining(), 1);
}

// ── Test: data phase gets an exactly-sized destination ──

#[test]
fn test_data_phase_reads_exact_length() {
    let host = ScriptedHost::new(vec![ok_len(5), ok_bytes(b"hello")]);
    let gw = Gateway::new(&host, 3);

    let out = gw
        .fetch_bytes(&key_body(), methods::GET_STATE_LEN, methods::GET_STATE)
        .unwrap();
    assert_eq!(out, b"hello");

    // Both requests carry one value_ptr, appended after the caller's items.
    for i in 0..2 {
        let body = host.body(i);
        let keys: Vec<&str> = body.iter().map(|item| item.key.as_str()).collect();
        assert_eq!(keys, vec!["key", "field", "value_ptr"]);
    }
}

// ── Test: every header carries ctx pointer, version and method ──

#[test]
fn test_every_header_is_complete() {
    let host = ScriptedHost::new(vec![ok_len(1), ok_bytes(b"x"), ok_bytes(b"")]);
    let gw = Gateway::new(&host, 11);

    gw.fetch_bytes(&key_body(), methods::GET_STATE_LEN, methods::GET_STATE)
        .unwrap();
    gw.invoke(methods::PUT_STATE, &key_body()).unwrap();

    assert_eq!(host.methods(), vec!["GetStateLen", "GetState", "PutState"]);
    for i in 0..3 {
        let header = host.header(i);
        assert_eq!(header.len(), 3);
        assert_eq!(header.get_int32("ctx_ptr"), Some(11));
        assert_eq!(header.get_string("version"), Some("v1.2.0"));

        // Only the two-phase requests carry a destination.
        assert_eq!(host.had_destination(i), i < 2);
        assert_eq!(host.body(i).get("value_ptr").is_some(), i < 2);
    }
}

// ── Test: scalar fetch ──

#[test]
fn test_fetch_int32_reads_slot() {
    let host = ScriptedHost::new(vec![ok_len(-7)]);
    let gw = Gateway::new(&host, 0);
    assert_eq!(gw.fetch_int32(&Record::new(), methods::KV_ITERATOR_HAS_NEXT), Ok(-7));
}

#[test]
fn test_fetch_int32_failure() {
    let host = ScriptedHost::new(vec![fail()]);
    let gw = Gateway::new(&host, 0);
    assert!(gw.fetch_int32(&Record::new(), methods::KV_ITERATOR).is_err());
}
