use crate::KType;

/// Current block version
pub const BLOCK_VERSION: u16 = 1;

/// Current transaction version
pub const TX_VERSION: u16 = 0;

/// GhostDAG K parameter - maximum number of blue blocks in the anticone of a blue block
pub const GHOSTDAG_K: KType = 18;

/// Minimum difficulty bits (maximum target)
pub const MIN_DIFFICULTY_BITS: u32 = 0x207f_ffff;

/// Length of a hash160 (RIPEMD160(SHA256(x))) payload
pub const HASH160_SIZE: usize = 20;

/// Size of a serialized compressed secp256k1 public key
pub const COMPRESSED_PUBKEY_SIZE: usize = 33;

/// Size of a serialized uncompressed secp256k1 public key
pub const UNCOMPRESSED_PUBKEY_SIZE: usize = 65;
