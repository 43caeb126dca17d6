//! canonical hashing of chain batches and the intent digest
//!
//! every field is laid out as a 32-byte abi word so that no two distinct
//! `(chain_id, calls, recent_block)` tuples share a preimage:
//!
//! ```text
//! call_hash   = keccak(pad32(to) ‖ u256(value) ‖ keccak(data))
//! batch_hash  = keccak(u256(chain_id) ‖ keccak(call_hash_0 ‖ … ‖ call_hash_n) ‖ u256(recent_block))
//! intent_hash = keccak(batch_hash_0 ‖ … ‖ batch_hash_m)
//! ```
//!
//! call order and batch order are part of the preimage.

use crate::types::{Call, ChainBatch, HashedChainBatch, B256, U256};
pub use alloy_primitives::keccak256;
use alloy_primitives::Keccak256;

/// big-endian u256 word
pub fn word(value: u64) -> [u8; 32] {
    U256::from(value).to_be_bytes()
}

pub fn call_hash(call: &Call) -> B256 {
    let mut hasher = Keccak256::new();
    hasher.update(call.to.into_word());
    hasher.update(call.value.to_be_bytes::<32>());
    hasher.update(keccak256(&call.data));
    hasher.finalize()
}

pub fn batch_hash(batch: &ChainBatch) -> B256 {
    let mut calls = Keccak256::new();
    for call in &batch.calls {
        calls.update(call_hash(call));
    }
    let calls_digest = calls.finalize();

    let mut hasher = Keccak256::new();
    hasher.update(word(batch.chain_id));
    hasher.update(calls_digest);
    hasher.update(word(batch.recent_block));
    hasher.finalize()
}

pub fn hash_chain_batches(batches: &[ChainBatch]) -> Vec<HashedChainBatch> {
    batches
        .iter()
        .map(|batch| HashedChainBatch {
            hash: batch_hash(batch),
            chain_id: batch.chain_id,
            calls: batch.calls.clone(),
            recent_block: batch.recent_block,
        })
        .collect()
}

/// digest the wallet signs as a personal message
pub fn intent_hash(batches: &[HashedChainBatch]) -> B256 {
    let mut hasher = Keccak256::new();
    for batch in batches {
        hasher.update(batch.hash);
    }
    hasher.finalize()
}
