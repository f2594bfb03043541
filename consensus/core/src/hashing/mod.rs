pub mod header;
pub mod tx;

use crypto_hashes::HashWriter;

use crate::Hash;

pub use crypto_hashes::double_sha256;

/// Merkle root over a list of leaf hashes. An odd node is paired with itself.
pub fn merkle_root(leaves: &[Hash]) -> Hash {
    if leaves.is_empty() {
        return Hash::zeroed();
    }
    let mut level = leaves.to_vec();
    while level.len() > 1 {
        level = level
            .chunks(2)
            .map(|pair| {
                let left = &pair[0];
                let right = pair.get(1).unwrap_or(left);
                let mut writer = HashWriter::new();
                writer.update(left).update(right);
                writer.finalize_double()
            })
            .collect();
    }
    level[0]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merkle_root_single_leaf() {
        let leaf = Hash::from_u64_word(5);
        assert_eq!(merkle_root(&[leaf]), leaf);
    }

    #[test]
    fn test_merkle_root_depends_on_order() {
        let a = Hash::from_u64_word(1);
        let b = Hash::from_u64_word(2);
        assert_ne!(merkle_root(&[a, b]), merkle_root(&[b, a]));
        assert_eq!(merkle_root(&[a, b, b]), merkle_root(&[a, b, b]));
    }
}
