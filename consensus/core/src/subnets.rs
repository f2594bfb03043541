use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Size of a subnetwork ID in bytes
pub const SUBNETWORK_ID_SIZE: usize = 20;

/// Subnetwork ID of regular transactions
pub const SUBNETWORK_ID_NATIVE: SubnetworkId = SubnetworkId([0; SUBNETWORK_ID_SIZE]);

/// Subnetwork ID for coinbase transactions
pub const SUBNETWORK_ID_COINBASE: SubnetworkId =
    SubnetworkId([1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);

/// Represents a unique identifier for a subnetwork
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct SubnetworkId([u8; SUBNETWORK_ID_SIZE]);

impl SubnetworkId {
    /// Creates a new SubnetworkId from raw bytes
    pub const fn new(bytes: [u8; SUBNETWORK_ID_SIZE]) -> Self {
        Self(bytes)
    }

    /// Returns the underlying bytes
    pub fn as_bytes(&self) -> &[u8; SUBNETWORK_ID_SIZE] {
        &self.0
    }
}

impl From<u64> for SubnetworkId {
    fn from(v: u64) -> Self {
        let mut bytes = [0u8; SUBNETWORK_ID_SIZE];
        bytes[..8].copy_from_slice(&v.to_le_bytes());
        SubnetworkId(bytes)
    }
}

impl fmt::Display for SubnetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coinbase_subnetwork_is_one() {
        assert_eq!(SubnetworkId::from(1u64), SUBNETWORK_ID_COINBASE);
        assert_eq!(SubnetworkId::default(), SUBNETWORK_ID_NATIVE);
    }
}
