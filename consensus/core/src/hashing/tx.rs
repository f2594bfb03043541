use crypto_hashes::HashWriter;

use crate::tx::{Transaction, TransactionId};
use crate::Hash;

/// Short transaction hash: every field except input signature scripts
pub fn id(tx: &Transaction) -> TransactionId {
    let mut writer = HashWriter::new();
    write_transaction(&mut writer, tx, false);
    writer.finalize_double()
}

/// Full transaction hash, signature scripts included
pub fn full_hash(tx: &Transaction) -> Hash {
    let mut writer = HashWriter::new();
    write_transaction(&mut writer, tx, true);
    writer.finalize_double()
}

fn write_var_bytes(writer: &mut HashWriter, bytes: &[u8]) {
    writer.update((bytes.len() as u64).to_le_bytes()).update(bytes);
}

fn write_transaction(writer: &mut HashWriter, tx: &Transaction, include_signatures: bool) {
    writer.update(tx.version.to_le_bytes());
    writer.update((tx.inputs.len() as u64).to_le_bytes());
    for input in &tx.inputs {
        writer.update(input.previous_outpoint.transaction_id).update(input.previous_outpoint.index.to_le_bytes());
        if include_signatures {
            write_var_bytes(writer, &input.signature_script);
        } else {
            write_var_bytes(writer, &[]);
        }
        writer.update(input.sequence.to_le_bytes()).update([input.sig_op_count]);
    }
    writer.update((tx.outputs.len() as u64).to_le_bytes());
    for output in &tx.outputs {
        writer.update(output.value.to_le_bytes()).update(output.script_public_key.version().to_le_bytes());
        write_var_bytes(writer, output.script_public_key.script());
    }
    writer.update(tx.lock_time.to_le_bytes()).update(tx.subnetwork_id.as_bytes()).update(tx.gas.to_le_bytes());
    write_var_bytes(writer, &tx.payload);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subnets::SUBNETWORK_ID_COINBASE;

    #[test]
    fn test_hashes_agree_without_inputs() {
        let tx = Transaction::new(0, vec![], vec![], 0, SUBNETWORK_ID_COINBASE, 0, b"height 0".to_vec());
        assert_eq!(id(&tx), full_hash(&tx));
        assert_eq!(tx.id(), id(&tx));
    }
}
