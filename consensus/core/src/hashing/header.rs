use crypto_hashes::HashWriter;
use primitive_types::U256;

use crate::header::Header;
use crate::{BlueWorkType, Hash};

/// Converts compact difficulty bits to a 256-bit target
pub fn bits_to_target(bits: u32) -> U256 {
    let exponent = (bits >> 24) as usize;
    let mantissa = bits & 0x007f_ffff;

    if exponent <= 3 {
        U256::from(mantissa >> (8 * (3 - exponent)))
    } else {
        U256::from(mantissa) << (8 * (exponent - 3))
    }
}

/// Work represented by a target: `2^256 / (target + 1)`, never less than one.
pub fn calc_work(bits: u32) -> BlueWorkType {
    let target = bits_to_target(bits);
    if target.is_zero() {
        return U256::one();
    }
    let work = (!target / target.saturating_add(U256::one())).saturating_add(U256::one());
    work.max(U256::one())
}

/// Computes the hash of a block header over every field except the cached hash
pub fn calc_header_hash(header: &Header) -> Hash {
    let mut writer = HashWriter::new();
    writer.update(header.version.to_le_bytes());
    writer.update((header.parents.len() as u64).to_le_bytes());
    for parent in &header.parents {
        writer.update(parent);
    }
    writer
        .update(header.hash_merkle_root)
        .update(header.timestamp.to_le_bytes())
        .update(header.bits.to_le_bytes())
        .update(header.nonce.to_le_bytes());
    writer.finalize_double()
}
