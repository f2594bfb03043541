use consensus_core::block::Block;
use consensus_core::block_index::BlockStatus;
use consensus_core::constants::MIN_DIFFICULTY_BITS;
use consensus_core::subnets::{SUBNETWORK_ID_COINBASE, SUBNETWORK_ID_NATIVE};
use consensus_core::tx::{ScriptPublicKey, Transaction, TransactionInput, TransactionOutput};
use consensus_core::utxo::UtxoDiff;
use consensus_core::Hash;
use database::stores::{BlockIndexEntry, BlockIndexStore, BlockStore, MetadataStore, TxIndexStore, UtxoStore};
use database::{Database, DbError};
use std::sync::Arc;
use tempfile::TempDir;

fn coinbase(tag: u8, value: u64) -> Transaction {
    Transaction::new(0, vec![], vec![TransactionOutput::new(value, ScriptPublicKey::from_vec(0, vec![0x51]))], 0, SUBNETWORK_ID_COINBASE, 0, vec![tag])
}

fn open() -> (TempDir, Arc<Database>) {
    let tmp = TempDir::new().unwrap();
    let db = Arc::new(Database::open(tmp.path()).unwrap());
    (tmp, db)
}

#[test]
fn test_block_and_index_persist_across_reopen() {
    let tmp = TempDir::new().unwrap();
    let block = Block::from_transactions(vec![], 1, MIN_DIFFICULTY_BITS, 0, vec![coinbase(0, 50)]);
    {
        let db = Arc::new(Database::open(tmp.path()).unwrap());
        let blocks = BlockStore::new(db.clone(), 8);
        let index = BlockIndexStore::new(db.clone());
        let meta = MetadataStore::new(db.clone());
        let mut batch = db.batch();
        blocks.put_block(&mut batch, &block).unwrap();
        index.put(&mut batch, 1, &BlockIndexEntry { hash: Hash::from_u64_word(2), parents: vec![block.hash()], bits: block.header.bits, status: BlockStatus::valid() }).unwrap();
        index.put(&mut batch, 0, &BlockIndexEntry { hash: block.hash(), parents: vec![], bits: block.header.bits, status: BlockStatus::valid() }).unwrap();
        meta.set_network(&mut batch, "simnet").unwrap();
        meta.set_ghostdag_k(&mut batch, 3).unwrap();
        db.write_batch(batch).unwrap();
    }

    let db = Arc::new(Database::open_read_only(tmp.path()).unwrap());
    let blocks = BlockStore::new(db.clone(), 8);
    let stored = blocks.get_block(db.as_ref(), &block.hash()).unwrap().unwrap();
    assert_eq!(*stored, block);

    let entries = BlockIndexStore::new(db.clone()).entries(db.as_ref()).unwrap();
    assert_eq!(entries.iter().map(|(id, _)| *id).collect::<Vec<_>>(), vec![0, 1]);
    assert_eq!(entries[1].1.parents, vec![block.hash()]);

    let meta = MetadataStore::new(db.clone());
    assert_eq!(meta.network(db.as_ref()).unwrap().as_deref(), Some("simnet"));
    assert_eq!(meta.ghostdag_k(db.as_ref()).unwrap(), Some(3));
}

#[test]
fn test_tx_index_keeps_first_location() {
    let (_tmp, db) = open();
    let tx_index = TxIndexStore::new(db.clone());
    let first = Block::from_transactions(vec![], 1, MIN_DIFFICULTY_BITS, 0, vec![coinbase(0, 50)]);
    let second = Block::from_transactions(vec![first.hash()], 2, MIN_DIFFICULTY_BITS, 0, vec![coinbase(0, 50)]);
    assert_eq!(first.transactions[0].id(), second.transactions[0].id());

    let mut batch = db.batch();
    assert_eq!(tx_index.index_block(db.as_ref(), &mut batch, &first).unwrap(), 1);
    db.write_batch(batch).unwrap();

    let mut batch = db.batch();
    assert_eq!(tx_index.index_block(db.as_ref(), &mut batch, &second).unwrap(), 0);
    db.write_batch(batch).unwrap();

    let location = tx_index.get(db.as_ref(), &first.transactions[0].id()).unwrap().unwrap();
    assert_eq!(location.block_hash, first.hash());
    assert_eq!(location.index_in_block, 0);
}

#[test]
fn test_utxo_snapshot_isolation_and_close() {
    let (_tmp, db) = open();
    let utxos = UtxoStore::new(db.clone());
    let cb = coinbase(1, 50);
    let block_hash = Hash::from_u64_word(1);

    let diff = UtxoDiff::from_block(std::slice::from_ref(&cb), block_hash, |_| Ok(None)).unwrap();
    let mut batch = db.batch();
    utxos.apply_diff(&mut batch, &diff).unwrap();
    db.write_batch(batch).unwrap();

    let snapshot = db.snapshot();

    let spend = Transaction::new(
        0,
        vec![TransactionInput::new(cb.outpoint(0), vec![], 0, 1)],
        vec![TransactionOutput::new(20, ScriptPublicKey::default()), TransactionOutput::new(30, ScriptPublicKey::default())],
        0,
        SUBNETWORK_ID_NATIVE,
        0,
        vec![],
    );
    let diff = UtxoDiff::from_block(std::slice::from_ref(&spend), Hash::from_u64_word(2), |o| {
        utxos.get_utxo(db.as_ref(), o).map_err(|e| consensus_core::errors::ConsensusError::DatabaseError(e.to_string()))
    })
    .unwrap();
    let mut batch = db.batch();
    utxos.apply_diff(&mut batch, &diff).unwrap();
    db.write_batch(batch).unwrap();

    assert_eq!(utxos.count(db.as_ref()).unwrap(), 2);
    let seen: Vec<_> = utxos.iter(&snapshot).unwrap().map(|r| r.unwrap()).collect();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].0, cb.outpoint(0));
    assert!(seen[0].1.is_coinbase);
    assert_eq!(seen[0].1.block_hash, block_hash);

    db.close();
    assert!(matches!(utxos.iter(&snapshot), Err(DbError::DatabaseClosed)));
}
