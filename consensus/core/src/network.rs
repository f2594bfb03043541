use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{constants::GHOSTDAG_K, KType};

/// Network type identifies the network a node is operating on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkType {
    /// Main network
    Mainnet,
    /// Test network
    Testnet,
    /// Development network
    Devnet,
    /// Simnet for testing
    Simnet,
}

impl fmt::Display for NetworkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkType::Mainnet => write!(f, "mainnet"),
            NetworkType::Testnet => write!(f, "testnet"),
            NetworkType::Devnet => write!(f, "devnet"),
            NetworkType::Simnet => write!(f, "simnet"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown network '{0}', expected one of mainnet, testnet, devnet, simnet")]
pub struct UnknownNetworkError(pub String);

impl FromStr for NetworkType {
    type Err = UnknownNetworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::iter().find(|n| n.to_string().eq_ignore_ascii_case(s)).ok_or_else(|| UnknownNetworkError(s.to_string()))
    }
}

impl NetworkType {
    /// Returns an iterator over all NetworkType variants
    pub fn iter() -> impl Iterator<Item = NetworkType> {
        [NetworkType::Mainnet, NetworkType::Testnet, NetworkType::Devnet, NetworkType::Simnet].into_iter()
    }
}

/// Parameters the ledger core needs from the active network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkParams {
    pub network_type: NetworkType,
    /// Base58 version byte of pay-to-pubkey-hash addresses
    pub pubkey_hash_addr_id: u8,
    /// Base58 version byte of pay-to-script-hash addresses
    pub script_hash_addr_id: u8,
    pub ghostdag_k: KType,
}

pub const MAINNET_PARAMS: NetworkParams =
    NetworkParams { network_type: NetworkType::Mainnet, pubkey_hash_addr_id: 0x00, script_hash_addr_id: 0x05, ghostdag_k: GHOSTDAG_K };

pub const TESTNET_PARAMS: NetworkParams =
    NetworkParams { network_type: NetworkType::Testnet, pubkey_hash_addr_id: 0x6f, script_hash_addr_id: 0xc4, ghostdag_k: GHOSTDAG_K };

pub const DEVNET_PARAMS: NetworkParams =
    NetworkParams { network_type: NetworkType::Devnet, pubkey_hash_addr_id: 0x1e, script_hash_addr_id: 0x1c, ghostdag_k: GHOSTDAG_K };

pub const SIMNET_PARAMS: NetworkParams =
    NetworkParams { network_type: NetworkType::Simnet, pubkey_hash_addr_id: 0x3f, script_hash_addr_id: 0x7b, ghostdag_k: GHOSTDAG_K };

impl NetworkParams {
    pub fn new(network_type: NetworkType) -> Self {
        match network_type {
            NetworkType::Mainnet => MAINNET_PARAMS,
            NetworkType::Testnet => TESTNET_PARAMS,
            NetworkType::Devnet => DEVNET_PARAMS,
            NetworkType::Simnet => SIMNET_PARAMS,
        }
    }

    pub fn from_name(name: &str) -> Result<Self, UnknownNetworkError> {
        Ok(Self::new(name.parse()?))
    }

    pub fn with_ghostdag_k(mut self, k: KType) -> Self {
        self.ghostdag_k = k;
        self
    }

    /// Whether `version` is one of this network's address version bytes
    pub fn is_address_version(&self, version: u8) -> bool {
        version == self.pubkey_hash_addr_id || version == self.script_hash_addr_id
    }
}

impl From<NetworkType> for NetworkParams {
    fn from(network_type: NetworkType) -> Self {
        Self::new(network_type)
    }
}
