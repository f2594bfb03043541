use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::constants::HASH160_SIZE;

const CHECKSUM_SIZE: usize = 4;
const ENCODED_SIZE: usize = 1 + HASH160_SIZE + CHECKSUM_SIZE;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("invalid base58: {0}")]
    Base58(String),

    #[error("decoded address has {0} bytes, expected {ENCODED_SIZE}")]
    InvalidLength(usize),

    #[error("address checksum mismatch")]
    ChecksumMismatch,
}

/// A base58check address: version byte followed by a 20-byte hash160 payload
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Address {
    pub version: u8,
    pub payload: [u8; HASH160_SIZE],
}

/// RIPEMD160(SHA256(data))
pub fn hash160(data: &[u8]) -> [u8; HASH160_SIZE] {
    let sha = Sha256::digest(data);
    ripemd::Ripemd160::digest(sha).into()
}

fn checksum(data: &[u8]) -> [u8; CHECKSUM_SIZE] {
    let digest = Sha256::digest(Sha256::digest(data));
    let mut out = [0u8; CHECKSUM_SIZE];
    out.copy_from_slice(&digest[..CHECKSUM_SIZE]);
    out
}

impl Address {
    pub fn new(version: u8, payload: [u8; HASH160_SIZE]) -> Self {
        Self { version, payload }
    }

    /// Pay-to-pubkey-hash address of a serialized public key
    pub fn from_public_key(version: u8, public_key: &[u8]) -> Self {
        Self::new(version, hash160(public_key))
    }

    fn encode(&self) -> String {
        let mut bytes = Vec::with_capacity(ENCODED_SIZE);
        bytes.push(self.version);
        bytes.extend_from_slice(&self.payload);
        let check = checksum(&bytes);
        bytes.extend_from_slice(&check);
        bs58::encode(bytes).into_string()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.encode())
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = bs58::decode(s).into_vec().map_err(|e| AddressError::Base58(e.to_string()))?;
        if bytes.len() != ENCODED_SIZE {
            return Err(AddressError::InvalidLength(bytes.len()));
        }
        let (body, check) = bytes.split_at(1 + HASH160_SIZE);
        if checksum(body) != check {
            return Err(AddressError::ChecksumMismatch);
        }
        let mut payload = [0u8; HASH160_SIZE];
        payload.copy_from_slice(&body[1..]);
        Ok(Self::new(body[0], payload))
    }
}
