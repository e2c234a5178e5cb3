//! Method catalogue dispatched through the `sys_call` import.
//!
//! Variable-length reads come in pairs: `<Name>Len` reports the payload size
//! into a length slot, `<Name>` writes the payload into a buffer of exactly
//! that size.

// ── Results, logging, events ──

pub const SUCCESS_RESULT: &str = "SuccessResult";
pub const ERROR_RESULT: &str = "ErrorResult";
pub const LOG_MESSAGE: &str = "LogMessage";
pub const EMIT_EVENT: &str = "EmitEvent";

// ── Arguments and identity ──

pub const GET_ARG_LEN: &str = "GetArgLen";
pub const GET_ARG: &str = "GetArg";
pub const GET_SENDER_ADDRESS_LEN: &str = "GetSenderAddressLen";
pub const GET_SENDER_ADDRESS: &str = "GetSenderAddress";

// ── Cross-contract ──

pub const CALL_CONTRACT_LEN: &str = "CallContractLen";
pub const CALL_CONTRACT: &str = "CallContract";

// ── Key/value state ──

pub const GET_STATE_LEN: &str = "GetStateLen";
pub const GET_STATE: &str = "GetState";
pub const PUT_STATE: &str = "PutState";
pub const DELETE_STATE: &str = "DeleteState";
pub const GET_BATCH_STATE_LEN: &str = "GetBatchStateLen";
pub const GET_BATCH_STATE: &str = "GetBatchState";

// ── Key/value iterators ──

pub const KV_ITERATOR: &str = "KvIterator";
pub const KV_PRE_ITERATOR: &str = "KvPreIterator";
pub const KV_ITERATOR_HAS_NEXT: &str = "KvIteratorHasNext";
pub const KV_ITERATOR_NEXT_LEN: &str = "KvIteratorNextLen";
pub const KV_ITERATOR_NEXT: &str = "KvIteratorNext";
pub const KV_ITERATOR_CLOSE: &str = "KvIteratorClose";

// ── Key history iterators ──

pub const HISTORY_KV_ITERATOR: &str = "HistoryKvIterator";
pub const HISTORY_KV_ITER_HAS_NEXT: &str = "HistoryKvIterHasNext";
pub const HISTORY_KV_ITER_NEXT_LEN: &str = "HistoryKvIterNextLen";
pub const HISTORY_KV_ITER_NEXT: &str = "HistoryKvIterNext";
pub const HISTORY_KV_ITER_CLOSE: &str = "HistoryKvIterClose";

// ── Host-side cryptographic operations ──

pub const GET_PAILLIER_OPERATION_RESULT_LEN: &str = "GetPaillierOperationResultLen";
pub const GET_PAILLIER_OPERATION_RESULT: &str = "GetPaillierOperationResult";
pub const GET_BULLETPROOFS_RESULT_LEN: &str = "GetBulletproofsResultLen";
pub const GET_BULLETPROOFS_RESULT: &str = "GetBulletproofsResult";

// ── SQL result sets (catalogued; no guest-side support) ──

pub const EXECUTE_QUERY: &str = "ExecuteQuery";
pub const EXECUTE_QUERY_ONE: &str = "ExecuteQueryOne";
pub const EXECUTE_QUERY_ONE_LEN: &str = "ExecuteQueryOneLen";
pub const RS_NEXT: &str = "RSNext";
pub const RS_NEXT_LEN: &str = "RSNextLen";
pub const RS_HAS_NEXT: &str = "RSHasNext";
pub const RS_CLOSE: &str = "RSClose";
pub const EXECUTE_UPDATE: &str = "ExecuteUpdate";
pub const EXECUTE_DDL: &str = "ExecuteDDL";

/// Paillier operation names sent in the `opType` item.
pub mod paillier {
    pub const ADD_CIPHERTEXT: &str = "AddCiphertext";
    pub const ADD_PLAINTEXT: &str = "AddPlaintext";
    pub const SUB_CIPHERTEXT: &str = "SubCiphertext";
    pub const SUB_PLAINTEXT: &str = "SubPlaintext";
    pub const NUM_MUL: &str = "NumMul";
}
