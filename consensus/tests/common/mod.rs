#![allow(dead_code)]

use consensus::ChainState;
use consensus_core::address::Address;
use consensus_core::block::Block;
use consensus_core::constants::MIN_DIFFICULTY_BITS;
use consensus_core::network::{NetworkParams, SIMNET_PARAMS};
use consensus_core::script::pay_to_address_script;
use consensus_core::subnets::{SUBNETWORK_ID_COINBASE, SUBNETWORK_ID_NATIVE};
use consensus_core::tx::{ScriptPublicKey, Transaction, TransactionInput, TransactionOutpoint, TransactionOutput};
use consensus_core::Hash;
use database::Database;
use std::path::Path;
use std::sync::Arc;

/// Difficulty bits giving a block far more work than [`MIN_DIFFICULTY_BITS`]
pub const HARD_BITS: u32 = 0x1f7f_ffff;

pub fn params(k: u32) -> NetworkParams {
    SIMNET_PARAMS.with_ghostdag_k(k)
}

pub fn address(seed: u8) -> Address {
    Address::new(SIMNET_PARAMS.pubkey_hash_addr_id, [seed; 20])
}

pub fn pay(address: &Address) -> ScriptPublicKey {
    pay_to_address_script(address, &SIMNET_PARAMS).unwrap()
}

/// Coinbase with the given outputs; `tag` keeps ids of otherwise equal coinbases apart
pub fn coinbase(outputs: &[(u64, &Address)], tag: u64) -> Transaction {
    let outputs = outputs.iter().map(|(value, to)| TransactionOutput::new(*value, pay(to))).collect();
    Transaction::new(0, vec![], outputs, 0, SUBNETWORK_ID_COINBASE, 0, tag.to_le_bytes().to_vec())
}

pub fn transfer(inputs: &[TransactionOutpoint], outputs: &[(u64, &Address)]) -> Transaction {
    let inputs = inputs.iter().map(|o| TransactionInput::new(*o, vec![], 0, 1)).collect();
    let outputs = outputs.iter().map(|(value, to)| TransactionOutput::new(*value, pay(to))).collect();
    Transaction::new(0, inputs, outputs, 0, SUBNETWORK_ID_NATIVE, 0, vec![])
}

pub fn block(parents: &[Hash], nonce: u64, transactions: Vec<Transaction>) -> Block {
    Block::from_transactions(parents.to_vec(), nonce, MIN_DIFFICULTY_BITS, nonce, transactions)
}

pub fn hard_block(parents: &[Hash], nonce: u64, transactions: Vec<Transaction>) -> Block {
    Block::from_transactions(parents.to_vec(), nonce, HARD_BITS, nonce, transactions)
}

pub fn open_state(path: &Path, params: NetworkParams) -> ChainState {
    let db = Arc::new(Database::open(path).unwrap());
    ChainState::open(db, params, 64).unwrap()
}

pub fn open_state_read_only(path: &Path, params: NetworkParams) -> ChainState {
    let db = Arc::new(Database::open_read_only(path).unwrap());
    ChainState::open(db, params, 64).unwrap()
}

/// Genesis B0 paying 50 to `a`, B1 (heavier) spending it back to `a`, and a
/// sibling B2 of B1 with a 30 coinbase to `a`. With k = 0, B2 is red.
pub fn three_block_scenario(state: &ChainState, a: &Address) -> [Block; 3] {
    let cb0 = coinbase(&[(50, a)], 0);
    let b0 = block(&[], 0, vec![cb0.clone()]);
    let b1 = hard_block(&[b0.hash()], 1, vec![coinbase(&[], 1), transfer(&[cb0.outpoint(0)], &[(50, a)])]);
    let b2 = block(&[b0.hash()], 2, vec![coinbase(&[(30, a)], 2)]);
    for b in [&b0, &b1, &b2] {
        state.add_block(b).unwrap();
    }
    [b0, b1, b2]
}
