//! Cross-contract calls through the in-memory host.

mod common;

use std::collections::BTreeMap;

use sysbridge_sdk::primitives::BridgeError;
use sysbridge_sdk::{Context, MockHost};

use common::*;

fn params(pairs: &[(&str, &[u8])]) -> BTreeMap<String, Vec<u8>> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_vec()))
        .collect()
}

/// Callee that stores its `value` argument and echoes it back.
fn register_store(host: &MockHost) {
    host.register_contract("store", |host, method| {
        let ctx = Context::new(host).unwrap();
        assert_eq!(method, "save");
        let value = ctx.arg_string("value").unwrap();
        ctx.put_state("saved", "", &value).unwrap();
        ctx.success_result(&format!("saved:{}", value)).unwrap();
    });
}

// ── Test: basic call ──

#[test]
fn test_call_returns_callee_success() {
    let host = MockHost::new();
    register_store(&host);
    let ctx = context(&host);

    let reply = ctx
        .call_contract("store", "save", &params(&[("value", b"42")]))
        .unwrap();

    assert_eq!(reply, b"saved:42");
    assert_eq!(host.get_state("saved", ""), Some(b"42".to_vec()));
    assert_eq!(host.depth(), 1);
}

#[test]
fn test_callee_runs_in_its_own_frame() {
    let host = MockHost::new();
    register_store(&host);
    let ctx = context(&host);
    assert_eq!(ctx.ctx_ptr(), 1);

    ctx.call_contract("store", "save", &params(&[("value", b"x")]))
        .unwrap();

    // The callee's own writes carry the nested context pointer.
    let put = host
        .call_records()
        .into_iter()
        .find(|c| c.method == "PutState")
        .unwrap();
    assert_eq!(put.ctx_ptr, 2);

    // The callee's result does not leak into the caller's outcome.
    assert_eq!(host.outcome().payload(), b"");
}

#[test]
fn test_empty_success_is_empty_reply() {
    let host = MockHost::new();
    host.register_contract("quiet", |host, _| {
        let _ctx = Context::new(host).unwrap();
    });
    let ctx = context(&host);

    let reply = ctx.call_contract("quiet", "noop", &BTreeMap::new()).unwrap();
    assert!(reply.is_empty());
    assert!(!host.calls().contains(&"CallContract".to_string()));
}

// ── Test: nested re-entrant calls ──

#[test]
fn test_nested_calls() {
    let host = MockHost::new();
    host.register_contract("b", |host, _| {
        let ctx = Context::new(host).unwrap();
        let n = ctx.arg_string("n").unwrap();
        ctx.success_result(&format!("b({})", n)).unwrap();
    });
    host.register_contract("a", |host, _| {
        let ctx = Context::new(host).unwrap();
        let inner = ctx
            .call_contract("b", "run", &params(&[("n", b"7")]))
            .unwrap();
        let mut reply = b"a>".to_vec();
        reply.extend_from_slice(&inner);
        ctx.success_result_bytes(&reply).unwrap();
    });
    let ctx = context(&host);

    let reply = ctx.call_contract("a", "run", &BTreeMap::new()).unwrap();
    assert_eq!(reply, b"a>b(7)");
    assert_eq!(host.depth(), 1);
}

// ── Test: failures ──

#[test]
fn test_callee_error_fails_call() {
    let host = MockHost::new();
    host.register_contract("broken", |host, _| {
        let ctx = Context::new(host).unwrap();
        ctx.success_result("partial").unwrap();
        ctx.error_result("boom").unwrap();
    });
    let ctx = context(&host);

    let result = ctx.call_contract("broken", "run", &BTreeMap::new());
    assert_eq!(result, Err(BridgeError::host_call("CallContractLen")));
    // The caller is still free to report its own outcome.
    ctx.success_result("recovered").unwrap();
    assert_eq!(host.outcome().payload(), b"recovered");
}

#[test]
fn test_unknown_contract_fails() {
    let host = MockHost::new();
    let ctx = context(&host);
    assert!(ctx.call_contract("nobody", "run", &BTreeMap::new()).is_err());
    assert_eq!(host.depth(), 1);
}

#[test]
fn test_runaway_recursion_is_bounded() {
    let host = MockHost::new();
    host.register_contract("loop", |host, _| {
        let ctx = Context::new(host).unwrap();
        if ctx.call_contract("loop", "run", &BTreeMap::new()).is_err() {
            ctx.error_result("too deep").unwrap();
        }
    });
    let ctx = context(&host);

    assert!(ctx.call_contract("loop", "run", &BTreeMap::new()).is_err());
    assert_eq!(host.depth(), 1);
}

// ── Test: transaction lookup ──

#[test]
fn test_get_tx_info() {
    let host = MockHost::new();
    host.register_contract("CHAIN_QUERY", |host, method| {
        let ctx = Context::new(host).unwrap();
        assert_eq!(method, "GET_TX_BY_TX_ID");
        let tx_id = ctx.arg_string("txId").unwrap();
        ctx.success_result(&format!("{{\"txId\":\"{}\"}}", tx_id)).unwrap();
    });
    let ctx = context(&host);

    let info = ctx.get_tx_info("tx-77").unwrap();
    assert_eq!(info, br#"{"txId":"tx-77"}"#);
}
