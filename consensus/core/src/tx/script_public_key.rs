use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::str::FromStr;

/// Size of the underlying script vector of a script.
pub const SCRIPT_VECTOR_SIZE: usize = 36;

/// Used as the underlying type for script public key data, optimized for the common p2pkh script size (25).
pub type ScriptVec = SmallVec<[u8; SCRIPT_VECTOR_SIZE]>;

/// Represents the ScriptPublicKey Version
pub type ScriptPublicKeyVersion = u16;

/// Alias the `smallvec!` macro to ease maintenance
pub use smallvec::smallvec as scriptvec;

/// Output locking script together with its script version
#[derive(Default, PartialEq, Eq, Clone, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ScriptPublicKey {
    pub version: ScriptPublicKeyVersion,
    script: ScriptVec, // Kept private to preserve read-only semantics
}

impl std::fmt::Debug for ScriptPublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptPublicKey").field("version", &self.version).field("script", &hex::encode(&self.script)).finish()
    }
}

impl std::fmt::Display for ScriptPublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", hex::encode(&self.script))
    }
}

impl ScriptPublicKey {
    pub fn new(version: ScriptPublicKeyVersion, script: ScriptVec) -> Self {
        Self { version, script }
    }

    pub fn from_vec(version: ScriptPublicKeyVersion, script: Vec<u8>) -> Self {
        Self { version, script: ScriptVec::from_vec(script) }
    }

    pub fn from_hex<T: AsRef<[u8]>>(hex: T) -> Result<Self, hex::FromHexError> {
        Ok(Self::from_vec(0, hex::decode(hex)?))
    }

    pub fn version(&self) -> ScriptPublicKeyVersion {
        self.version
    }

    pub fn script(&self) -> &[u8] {
        &self.script
    }
}

impl FromStr for ScriptPublicKey {
    type Err = hex::FromHexError;

    /// Parses `version (2 bytes BE) || script` from hex
    fn from_str(hex_str: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(hex_str)?;
        if bytes.len() < 2 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let version = u16::from_be_bytes([bytes[0], bytes[1]]);
        Ok(Self { version, script: SmallVec::from_slice(&bytes[2..]) })
    }
}

//
// Borsh serializers need to be manually implemented for `ScriptPublicKey` since
// smallvec does not currently support Borsh
//

impl BorshSerialize for ScriptPublicKey {
    fn serialize<W: std::io::Write>(&self, writer: &mut W) -> std::io::Result<()> {
        borsh::BorshSerialize::serialize(&self.version, writer)?;
        // Vectors and slices are all serialized internally the same way
        borsh::BorshSerialize::serialize(&self.script.as_slice(), writer)?;
        Ok(())
    }
}

impl BorshDeserialize for ScriptPublicKey {
    fn deserialize_reader<R: std::io::Read>(reader: &mut R) -> std::io::Result<Self> {
        let version: ScriptPublicKeyVersion = BorshDeserialize::deserialize_reader(reader)?;
        let script: Vec<u8> = BorshDeserialize::deserialize_reader(reader)?;
        Ok(Self::from_vec(version, script))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_versioned_hex_parsing() {
        let spk: ScriptPublicKey = "0001abcd".parse().unwrap();
        assert_eq!(spk.version(), 1);
        assert_eq!(spk.script(), &[0xab, 0xcd]);
        assert!("00".parse::<ScriptPublicKey>().is_err());
    }

    #[test]
    fn test_borsh_keeps_script_bytes() {
        let spk = ScriptPublicKey::from_vec(0, vec![0x76; 40]);
        let bytes = borsh::to_vec(&spk).unwrap();
        assert_eq!(ScriptPublicKey::try_from_slice(&bytes).unwrap(), spk);
    }
}
