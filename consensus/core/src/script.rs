//! Standard output script templates and destination address extraction.
//!
//! Only the parsing needed to recognise templates lives here; scripts are never executed.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::{
    address::{hash160, Address},
    constants::{COMPRESSED_PUBKEY_SIZE, HASH160_SIZE, UNCOMPRESSED_PUBKEY_SIZE},
    network::NetworkParams,
    tx::ScriptPublicKey,
};

/// Script opcodes recognised by the template matcher
#[allow(non_camel_case_types)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Opcode {
    OP_0 = 0x00,
    OP_PUSHDATA1 = 0x4c,
    OP_PUSHDATA2 = 0x4d,
    OP_PUSHDATA4 = 0x4e,
    OP_1 = 0x51,
    OP_16 = 0x60,
    OP_RETURN = 0x6a,
    OP_DUP = 0x76,
    OP_EQUAL = 0x87,
    OP_EQUALVERIFY = 0x88,
    OP_HASH160 = 0xa9,
    OP_CHECKSIG = 0xac,
    OP_CHECKMULTISIG = 0xae,
}

const MAX_DIRECT_PUSH: u8 = 0x4b;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScriptError {
    #[error("push of {needed} bytes at offset {offset} runs past the end of a {len}-byte script")]
    PushPastEnd { offset: usize, needed: usize, len: usize },

    #[error("truncated push-data length at offset {0}")]
    TruncatedPushLength(usize),
}

/// Standard script template of an output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScriptClass {
    NonStandard,
    PubKey,
    PubKeyHash,
    ScriptHash,
    MultiSig,
    NullData,
}

impl fmt::Display for ScriptClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScriptClass::NonStandard => "nonstandard",
            ScriptClass::PubKey => "pubkey",
            ScriptClass::PubKeyHash => "pubkeyhash",
            ScriptClass::ScriptHash => "scripthash",
            ScriptClass::MultiSig => "multisig",
            ScriptClass::NullData => "nulldata",
        };
        f.write_str(name)
    }
}

/// One parsed instruction. `data` is empty for non-push opcodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction<'a> {
    pub opcode: u8,
    pub data: &'a [u8],
}

impl Instruction<'_> {
    fn is_push(&self) -> bool {
        self.opcode <= Opcode::OP_PUSHDATA4 as u8
    }

    fn is(&self, opcode: Opcode) -> bool {
        self.opcode == opcode as u8
    }

    /// Value of OP_1..OP_16
    fn small_int(&self) -> Option<usize> {
        (Opcode::OP_1 as u8..=Opcode::OP_16 as u8).contains(&self.opcode).then(|| (self.opcode - Opcode::OP_1 as u8 + 1) as usize)
    }
}

/// Splits a script into instructions, failing on pushes that overrun the script
pub fn parse_script(script: &[u8]) -> Result<Vec<Instruction<'_>>, ScriptError> {
    let mut instructions = Vec::new();
    let mut pos = 0;
    while pos < script.len() {
        let opcode = script[pos];
        let start = pos;
        pos += 1;
        let len = match opcode {
            0x01..=MAX_DIRECT_PUSH => opcode as usize,
            0x4c => read_push_len(script, &mut pos, 1)?,
            0x4d => read_push_len(script, &mut pos, 2)?,
            0x4e => read_push_len(script, &mut pos, 4)?,
            _ => 0,
        };
        let end = pos.checked_add(len).filter(|end| *end <= script.len());
        let Some(end) = end else {
            return Err(ScriptError::PushPastEnd { offset: start, needed: len, len: script.len() });
        };
        instructions.push(Instruction { opcode, data: &script[pos..end] });
        pos = end;
    }
    Ok(instructions)
}

fn read_push_len(script: &[u8], pos: &mut usize, width: usize) -> Result<usize, ScriptError> {
    let bytes = script.get(*pos..*pos + width).ok_or(ScriptError::TruncatedPushLength(*pos - 1))?;
    *pos += width;
    let mut le = [0u8; 8];
    le[..width].copy_from_slice(bytes);
    Ok(u64::from_le_bytes(le) as usize)
}

fn is_pubkey(data: &[u8]) -> bool {
    data.len() == COMPRESSED_PUBKEY_SIZE || data.len() == UNCOMPRESSED_PUBKEY_SIZE
}

/// Classifies already parsed instructions
pub fn classify(ops: &[Instruction<'_>]) -> ScriptClass {
    use Opcode::*;
    match ops {
        [dup, hash, push, eqv, checksig]
            if dup.is(OP_DUP) && hash.is(OP_HASH160) && push.data.len() == HASH160_SIZE && eqv.is(OP_EQUALVERIFY) && checksig.is(OP_CHECKSIG) =>
        {
            ScriptClass::PubKeyHash
        }
        [hash, push, eq] if hash.is(OP_HASH160) && push.data.len() == HASH160_SIZE && eq.is(OP_EQUAL) => ScriptClass::ScriptHash,
        [push, checksig] if is_pubkey(push.data) && checksig.is(OP_CHECKSIG) => ScriptClass::PubKey,
        [first, .., _] if first.is(OP_RETURN) && ops[1..].iter().all(Instruction::is_push) => ScriptClass::NullData,
        [first] if first.is(OP_RETURN) => ScriptClass::NullData,
        _ if is_multisig(ops) => ScriptClass::MultiSig,
        _ => ScriptClass::NonStandard,
    }
}

fn is_multisig(ops: &[Instruction<'_>]) -> bool {
    let [required, keys @ .., total, check] = ops else {
        return false;
    };
    let (Some(required), Some(total)) = (required.small_int(), total.small_int()) else {
        return false;
    };
    check.is(Opcode::OP_CHECKMULTISIG)
        && !keys.is_empty()
        && keys.len() == total
        && required <= total
        && keys.iter().all(|k| k.is_push() && is_pubkey(k.data))
}

/// Result of address extraction: the template, its destinations and how many signatures it needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedAddresses {
    pub class: ScriptClass,
    pub addresses: Vec<Address>,
    pub required_sigs: usize,
}

impl ExtractedAddresses {
    fn none(class: ScriptClass) -> Self {
        Self { class, addresses: Vec::new(), required_sigs: 0 }
    }

    /// The destination when exactly one address was extracted
    pub fn single(&self) -> Option<&Address> {
        match self.addresses.as_slice() {
            [address] => Some(address),
            _ => None,
        }
    }
}

/// Extracts the destination addresses of an output script.
///
/// Pay-to-pubkey outputs resolve to the pay-to-pubkey-hash address of the key, so
/// both templates paying one key share an address. Non-standard and null-data
/// scripts yield no address. A script whose pushes overrun its length is an error.
pub fn extract_script_addresses(script: &[u8], params: &NetworkParams) -> Result<ExtractedAddresses, ScriptError> {
    let ops = parse_script(script)?;
    let class = classify(&ops);
    let p2pkh = |data: &[u8]| Address::from_public_key(params.pubkey_hash_addr_id, data);
    let extracted = match class {
        ScriptClass::PubKeyHash => {
            let mut payload = [0u8; HASH160_SIZE];
            payload.copy_from_slice(ops[2].data);
            ExtractedAddresses { class, addresses: vec![Address::new(params.pubkey_hash_addr_id, payload)], required_sigs: 1 }
        }
        ScriptClass::ScriptHash => {
            let mut payload = [0u8; HASH160_SIZE];
            payload.copy_from_slice(ops[1].data);
            ExtractedAddresses { class, addresses: vec![Address::new(params.script_hash_addr_id, payload)], required_sigs: 1 }
        }
        ScriptClass::PubKey => ExtractedAddresses { class, addresses: vec![p2pkh(ops[0].data)], required_sigs: 1 },
        ScriptClass::MultiSig => {
            let required_sigs = ops[0].small_int().unwrap_or_default();
            let addresses = ops[1..ops.len() - 2].iter().map(|k| p2pkh(k.data)).collect();
            ExtractedAddresses { class, addresses, required_sigs }
        }
        ScriptClass::NullData | ScriptClass::NonStandard => ExtractedAddresses::none(class),
    };
    Ok(extracted)
}

/// Convenience over [`extract_script_addresses`] for a [`ScriptPublicKey`]
pub fn extract_spk_addresses(spk: &ScriptPublicKey, params: &NetworkParams) -> Result<ExtractedAddresses, ScriptError> {
    extract_script_addresses(spk.script(), params)
}

//
// Template builders
//

pub fn pay_to_pubkey_hash_script(pubkey_hash: &[u8; HASH160_SIZE]) -> ScriptPublicKey {
    let mut script = Vec::with_capacity(25);
    script.extend_from_slice(&[Opcode::OP_DUP as u8, Opcode::OP_HASH160 as u8, HASH160_SIZE as u8]);
    script.extend_from_slice(pubkey_hash);
    script.extend_from_slice(&[Opcode::OP_EQUALVERIFY as u8, Opcode::OP_CHECKSIG as u8]);
    ScriptPublicKey::from_vec(0, script)
}

/// Script paying to `address` when it carries one of the network's version bytes
pub fn pay_to_address_script(address: &Address, params: &NetworkParams) -> Option<ScriptPublicKey> {
    if address.version == params.pubkey_hash_addr_id {
        Some(pay_to_pubkey_hash_script(&address.payload))
    } else if address.version == params.script_hash_addr_id {
        Some(pay_to_script_hash_script(&address.payload))
    } else {
        None
    }
}

pub fn pay_to_script_hash_script(script_hash: &[u8; HASH160_SIZE]) -> ScriptPublicKey {
    let mut script = Vec::with_capacity(23);
    script.extend_from_slice(&[Opcode::OP_HASH160 as u8, HASH160_SIZE as u8]);
    script.extend_from_slice(script_hash);
    script.push(Opcode::OP_EQUAL as u8);
    ScriptPublicKey::from_vec(0, script)
}

pub fn pay_to_pubkey_script(public_key: &[u8]) -> ScriptPublicKey {
    let mut script = Vec::with_capacity(public_key.len() + 2);
    script.push(public_key.len() as u8);
    script.extend_from_slice(public_key);
    script.push(Opcode::OP_CHECKSIG as u8);
    ScriptPublicKey::from_vec(0, script)
}

/// `required`-of-`keys.len()` multisig. Both counts must be in 1..=16.
pub fn multisig_script(required: u8, keys: &[&[u8]]) -> ScriptPublicKey {
    let mut script = vec![Opcode::OP_1 as u8 + required - 1];
    for key in keys {
        script.push(key.len() as u8);
        script.extend_from_slice(key);
    }
    script.push(Opcode::OP_1 as u8 + keys.len() as u8 - 1);
    script.push(Opcode::OP_CHECKMULTISIG as u8);
    ScriptPublicKey::from_vec(0, script)
}

pub fn null_data_script(data: &[u8]) -> ScriptPublicKey {
    let mut script = vec![Opcode::OP_RETURN as u8, data.len() as u8];
    script.extend_from_slice(data);
    ScriptPublicKey::from_vec(0, script)
}

/// hash160 of a script, as committed to by pay-to-script-hash outputs
pub fn script_hash(script: &[u8]) -> [u8; HASH160_SIZE] {
    hash160(script)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::{NetworkParams, NetworkType};

    fn pubkey(seed: u8) -> Vec<u8> {
        let mut key = vec![seed; COMPRESSED_PUBKEY_SIZE];
        key[0] = 0x02;
        key
    }

    fn params() -> NetworkParams {
        NetworkParams::new(NetworkType::Simnet)
    }

    #[test]
    fn test_p2pkh_single_address() {
        let spk = pay_to_pubkey_hash_script(&[9u8; HASH160_SIZE]);
        let extracted = extract_spk_addresses(&spk, &params()).unwrap();
        assert_eq!(extracted.class, ScriptClass::PubKeyHash);
        assert_eq!(extracted.single(), Some(&Address::new(params().pubkey_hash_addr_id, [9u8; HASH160_SIZE])));
    }

    #[test]
    fn test_p2pk_resolves_to_key_hash_address() {
        let key = pubkey(3);
        let from_pk = extract_spk_addresses(&pay_to_pubkey_script(&key), &params()).unwrap();
        let from_pkh = extract_spk_addresses(&pay_to_pubkey_hash_script(&hash160(&key)), &params()).unwrap();
        assert_eq!(from_pk.class, ScriptClass::PubKey);
        assert_eq!(from_pk.addresses, from_pkh.addresses);
    }

    #[test]
    fn test_p2sh_uses_script_hash_version() {
        let spk = pay_to_script_hash_script(&script_hash(&[0x51]));
        let extracted = extract_spk_addresses(&spk, &params()).unwrap();
        assert_eq!(extracted.class, ScriptClass::ScriptHash);
        assert_eq!(extracted.addresses[0].version, params().script_hash_addr_id);
    }

    #[test]
    fn test_multisig_yields_every_key() {
        let (a, b) = (pubkey(1), pubkey(2));
        let spk = multisig_script(1, &[&a, &b]);
        let extracted = extract_spk_addresses(&spk, &params()).unwrap();
        assert_eq!(extracted.class, ScriptClass::MultiSig);
        assert_eq!(extracted.required_sigs, 1);
        assert_eq!(extracted.addresses.len(), 2);
        assert!(extracted.single().is_none());
    }

    #[test]
    fn test_null_data_and_nonstandard_have_no_address() {
        let extracted = extract_spk_addresses(&null_data_script(b"memo"), &params()).unwrap();
        assert_eq!(extracted.class, ScriptClass::NullData);
        assert!(extracted.addresses.is_empty());

        let extracted = extract_script_addresses(&[0x51, 0x51, 0x87], &params()).unwrap();
        assert_eq!(extracted.class, ScriptClass::NonStandard);
        assert!(extract_script_addresses(&[], &params()).unwrap().addresses.is_empty());
    }

    #[test]
    fn test_overrunning_push_is_an_error() {
        let err = extract_script_addresses(&[0x76, 0xa9, 0x14, 1, 2, 3], &params()).unwrap_err();
        assert_eq!(err, ScriptError::PushPastEnd { offset: 2, needed: 20, len: 6 });
        assert_eq!(parse_script(&[0x4d, 0x01]).unwrap_err(), ScriptError::TruncatedPushLength(0));
    }

    #[test]
    fn test_pushdata_opcodes_parse() {
        let mut script = vec![0x4c, 3, 1, 2, 3, 0x4d, 2, 0, 9, 9];
        script.push(0xac);
        let ops = parse_script(&script).unwrap();
        assert_eq!(ops.len(), 3);
        assert_eq!(ops[0].data, &[1, 2, 3]);
        assert_eq!(ops[1].data, &[9, 9]);
    }
}
