use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::{hashing, BlueWorkType, Hash};

/// Block header. `hash` caches the header hash and is recomputed by [`Header::finalize`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
#[serde(rename_all = "camelCase")]
pub struct Header {
    pub hash: Hash,
    pub version: u16,
    /// Direct parents. Empty only for genesis.
    pub parents: Vec<Hash>,
    pub hash_merkle_root: Hash,
    pub timestamp: u64,
    pub bits: u32,
    pub nonce: u64,
}

impl Header {
    pub fn new_finalized(
        version: u16,
        parents: Vec<Hash>,
        hash_merkle_root: Hash,
        timestamp: u64,
        bits: u32,
        nonce: u64,
    ) -> Self {
        let mut header = Self { hash: Default::default(), version, parents, hash_merkle_root, timestamp, bits, nonce };
        header.finalize();
        header
    }

    /// Builds a header whose hash is fixed by the caller, used where only DAG shape matters.
    pub fn from_precomputed_hash(hash: Hash, parents: Vec<Hash>) -> Self {
        Self {
            hash,
            version: crate::constants::BLOCK_VERSION,
            parents,
            hash_merkle_root: Default::default(),
            timestamp: 0,
            bits: crate::constants::MIN_DIFFICULTY_BITS,
            nonce: 0,
        }
    }

    /// Recompute and cache the header hash
    pub fn finalize(&mut self) {
        self.hash = hashing::header::calc_header_hash(self);
    }

    pub fn direct_parents(&self) -> &[Hash] {
        &self.parents
    }

    pub fn is_genesis(&self) -> bool {
        self.parents.is_empty()
    }

    /// Proof-of-work this header claims through its difficulty bits
    pub fn work(&self) -> BlueWorkType {
        hashing::header::calc_work(self.bits)
    }
}
