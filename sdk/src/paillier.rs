//! Paillier ciphertext arithmetic, evaluated by the host.
//!
//! The guest only marshals operands: each operation is one two-phase fetch
//! of `GetPaillierOperationResult` carrying the operation name, both
//! operands and the public key. Plaintext operands are sent as their
//! decimal text.

use alloc::vec::Vec;

use sysbridge_primitives::{
    BridgeResult, Record,
    methods::{self, paillier as op},
    types::{KEY_OPERAND_ONE, KEY_OPERAND_TWO, KEY_OP_TYPE, KEY_PUB_KEY},
};

use crate::gateway::Gateway;
use crate::host::HostInterface;

pub struct Paillier<'g, H: HostInterface> {
    gateway: &'g Gateway<H>,
}

impl<'g, H: HostInterface> Paillier<'g, H> {
    pub(crate) fn new(gateway: &'g Gateway<H>) -> Self {
        Self { gateway }
    }

    pub fn add_ciphertext(&self, pub_key: &[u8], ct1: &[u8], ct2: &[u8]) -> BridgeResult<Vec<u8>> {
        self.operate(op::ADD_CIPHERTEXT, pub_key, ct1, ct2)
    }

    pub fn add_plaintext(&self, pub_key: &[u8], ct: &[u8], pt: &str) -> BridgeResult<Vec<u8>> {
        self.operate(op::ADD_PLAINTEXT, pub_key, ct, pt.as_bytes())
    }

    pub fn sub_ciphertext(&self, pub_key: &[u8], ct1: &[u8], ct2: &[u8]) -> BridgeResult<Vec<u8>> {
        self.operate(op::SUB_CIPHERTEXT, pub_key, ct1, ct2)
    }

    pub fn sub_plaintext(&self, pub_key: &[u8], ct: &[u8], pt: &str) -> BridgeResult<Vec<u8>> {
        self.operate(op::SUB_PLAINTEXT, pub_key, ct, pt.as_bytes())
    }

    pub fn num_mul(&self, pub_key: &[u8], ct: &[u8], pt: &str) -> BridgeResult<Vec<u8>> {
        self.operate(op::NUM_MUL, pub_key, ct, pt.as_bytes())
    }

    fn operate(
        &self,
        op_type: &str,
        pub_key: &[u8],
        operand_one: &[u8],
        operand_two: &[u8],
    ) -> BridgeResult<Vec<u8>> {
        let mut body = Record::new();
        body.add_string(KEY_OP_TYPE, op_type);
        body.add_bytes(KEY_OPERAND_ONE, operand_one.to_vec());
        body.add_bytes(KEY_OPERAND_TWO, operand_two.to_vec());
        body.add_bytes(KEY_PUB_KEY, pub_key.to_vec());
        self.gateway.fetch_bytes(
            &body,
            methods::GET_PAILLIER_OPERATION_RESULT_LEN,
            methods::GET_PAILLIER_OPERATION_RESULT,
        )
    }
}
