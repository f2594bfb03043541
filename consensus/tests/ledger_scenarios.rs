mod common;

use common::*;
use consensus::ledger::{reconcile, BlueState, Direction, LedgerError};
use consensus_core::api::ChainStateProvider;
use std::collections::HashSet;
use tempfile::TempDir;

#[test]
fn test_three_block_scenario() {
    let dir = TempDir::new().unwrap();
    let params = params(0);
    let state = open_state(dir.path(), params.clone());
    let a = address(1);
    let [b0, b1, b2] = three_block_scenario(&state, &a);

    let view = state.read_view();
    assert_eq!(view.block_count(), 3);
    let orders: Vec<_> = (0..3).map(|o| view.block_by_order(o).unwrap().hash).collect();
    assert_eq!(orders, vec![b0.hash(), b1.hash(), b2.hash()]);
    assert_eq!(view.main_chain_tip().unwrap().hash, b1.hash());
    assert_eq!(view.confirmations(0), Some(2));
    let b2_id = view.block_by_hash(&b2.hash()).unwrap().id;
    assert_eq!(view.is_blue(b2_id), Some(false));

    let report = reconcile(&view, &a, &params).unwrap();
    let trail: Vec<_> = report.entries.iter().map(|e| (e.direction, e.amount, e.is_coinbase)).collect();
    assert_eq!(
        trail,
        vec![(Direction::Credit, 50, true), (Direction::Debit, 50, false), (Direction::Credit, 50, false), (Direction::Credit, 30, true)]
    );
    let red_coinbase = &report.entries[3];
    assert_eq!(red_coinbase.blue_state, BlueState::Red);
    assert!(red_coinbase.tx_valid);
    assert!(!red_coinbase.counted);
    assert!(report.entries.iter().all(|e| e.tx_valid));

    assert_eq!(report.ledger_balance, 50);
    assert_eq!(report.utxo_balance, 50);
    assert!(report.is_consistent());
    assert_eq!(report.tip_hash, Some(b1.hash()));
    assert_eq!(report.entries[0].confirmations, 2);
}

#[test]
fn test_order_is_complete_and_causal() {
    let dir = TempDir::new().unwrap();
    let state = open_state(dir.path(), params(3));
    let miner = address(9);

    let genesis = block(&[], 0, vec![coinbase(&[(1, &miner)], 0)]);
    state.add_block(&genesis).unwrap();
    let mut tips = vec![genesis.hash()];
    for i in 1..30u64 {
        // Alternate between extending one tip and merging up to three
        let take = 1 + (i as usize % 3).min(tips.len() - 1);
        let parents: Vec<_> = tips.iter().rev().take(take).copied().collect();
        let b = block(&parents, i, vec![coinbase(&[(1, &miner)], i)]);
        state.add_block(&b).unwrap();
        tips.retain(|t| !parents.contains(t));
        tips.push(b.hash());
        if i % 4 == 0 {
            // A side block off genesis' child keeps the DAG wide
            let side = block(&[parents[0]], 1000 + i, vec![coinbase(&[(1, &miner)], 1000 + i)]);
            state.add_block(&side).unwrap();
            tips.push(side.hash());
        }
    }

    let view = state.read_view();
    let count = view.block_count();
    assert_eq!(count as usize, view.dag().len());
    let mut seen = HashSet::new();
    for order in 0..count {
        let record = view.block_by_order(order).unwrap();
        assert_eq!(record.order, Some(order));
        assert!(seen.insert(record.id));
        for parent in &record.parents {
            let parent_order = view.block_by_id(*parent).unwrap().order.unwrap();
            assert!(parent_order < order, "parent {} ordered at {} after child at {}", parent, parent_order, order);
        }
    }
    assert_eq!(seen.len() as u64, count);
    assert_eq!(view.confirmations(view.main_chain_tip().unwrap().id), Some(0));
}

#[test]
fn test_clean_chain_balances_agree() {
    let dir = TempDir::new().unwrap();
    let params = params(18);
    let state = open_state(dir.path(), params.clone());
    let (a, b) = (address(1), address(2));

    let cb0 = coinbase(&[(100, &a)], 0);
    let b0 = block(&[], 0, vec![cb0.clone()]);
    state.add_block(&b0).unwrap();

    let pay_b = transfer(&[cb0.outpoint(0)], &[(30, &b), (70, &a)]);
    let b1 = block(&[b0.hash()], 1, vec![coinbase(&[(10, &a)], 1), pay_b.clone()]);
    state.add_block(&b1).unwrap();

    let pay_back = transfer(&[pay_b.outpoint(0)], &[(30, &a)]);
    let b2 = block(&[b1.hash()], 2, vec![coinbase(&[], 2), pay_back]);
    state.add_block(&b2).unwrap();

    let view = state.read_view();
    let report = reconcile(&view, &a, &params).unwrap();
    let credits: i64 = report.entries.iter().filter(|e| e.direction == Direction::Credit).map(|e| e.amount as i64).sum();
    let debits: i64 = report.entries.iter().filter(|e| e.direction == Direction::Debit).map(|e| e.amount as i64).sum();
    assert_eq!(report.ledger_balance, credits - debits);
    assert_eq!(report.ledger_balance, 110);
    assert_eq!(report.utxo_balance, 110);
    assert!(report.is_consistent());

    // Every debit follows the credit it spends
    for (i, entry) in report.entries.iter().enumerate().filter(|(_, e)| e.direction == Direction::Debit) {
        assert!(report.entries[..i].iter().any(|c| c.direction == Direction::Credit && c.outpoint == entry.outpoint));
    }

    let other = reconcile(&view, &b, &params).unwrap();
    assert_eq!(other.ledger_balance, 0);
    assert_eq!(other.utxo_balance, 0);
    assert_eq!(other.entries.len(), 2);
}

#[test]
fn test_invalid_block_is_excluded() {
    let dir = TempDir::new().unwrap();
    let params = params(18);
    let state = open_state(dir.path(), params.clone());
    let a = address(1);

    let cb0 = coinbase(&[(40, &a)], 0);
    let b0 = block(&[], 0, vec![cb0.clone()]);
    state.add_block(&b0).unwrap();
    let spend = transfer(&[cb0.outpoint(0)], &[(40, &a)]);
    let b1 = block(&[b0.hash()], 1, vec![coinbase(&[], 1), spend]);
    state.add_block(&b1).unwrap();
    // Double spend of the genesis output, paying 25 to a and carrying a 5 coinbase
    let b2 = block(&[b1.hash()], 2, vec![coinbase(&[(5, &a)], 2), transfer(&[cb0.outpoint(0)], &[(25, &a)])]);
    state.add_block(&b2).unwrap();

    let view = state.read_view();
    assert!(view.block_by_hash(&b2.hash()).unwrap().status.is_known_invalid());
    let report = reconcile(&view, &a, &params).unwrap();
    let from_invalid: Vec<_> = report.entries.iter().filter(|e| e.block_hash == b2.hash()).collect();
    assert_eq!(from_invalid.len(), 3);
    assert!(from_invalid.iter().all(|e| !e.counted && e.blue_state == BlueState::Undetermined));
    assert_eq!(report.ledger_balance, 40);
    assert_eq!(report.utxo_balance, 40);
}

#[test]
fn test_closed_database_fails_the_scan() {
    let dir = TempDir::new().unwrap();
    let params = params(0);
    let state = open_state(dir.path(), params.clone());
    let a = address(1);
    three_block_scenario(&state, &a);

    let view = state.read_view();
    state.close();
    let err = reconcile(&view, &a, &params).unwrap_err();
    assert!(matches!(err, LedgerError::Store(_)), "unexpected error {err}");
}

#[test]
fn test_concurrent_scans_match_serial_scans() {
    let dir = TempDir::new().unwrap();
    let params = params(18);
    let state = open_state(dir.path(), params.clone());
    let addresses: Vec<_> = (1..=4).map(address).collect();

    let genesis = block(&[], 0, vec![coinbase(&[(10, &addresses[0]), (20, &addresses[1])], 0)]);
    state.add_block(&genesis).unwrap();
    let mut parent = genesis.hash();
    for i in 1..8u64 {
        let to = &addresses[i as usize % addresses.len()];
        let b = block(&[parent], i, vec![coinbase(&[(i * 10, to)], i)]);
        state.add_block(&b).unwrap();
        parent = b.hash();
    }

    let serial: Vec<_> = addresses
        .iter()
        .map(|a| {
            let view = state.read_view();
            reconcile(&view, a, &params).unwrap()
        })
        .collect();

    let concurrent: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = addresses
            .iter()
            .map(|a| {
                let (state, params) = (&state, &params);
                scope.spawn(move || {
                    let view = state.read_view();
                    reconcile(&view, a, params).unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for (s, c) in serial.iter().zip(&concurrent) {
        assert_eq!(s.entries, c.entries);
        assert_eq!(s.ledger_balance, c.ledger_balance);
        assert_eq!(s.utxo_balance, c.utxo_balance);
        assert!(c.is_consistent());
    }
}

#[test]
fn test_read_only_reopen_reproduces_report() {
    let dir = TempDir::new().unwrap();
    let params = params(0);
    let a = address(1);
    let before = {
        let state = open_state(dir.path(), params.clone());
        three_block_scenario(&state, &a);
        let view = state.read_view();
        reconcile(&view, &a, &params).unwrap()
    };

    let state = open_state_read_only(dir.path(), params.clone());
    let view = state.read_view();
    let after = reconcile(&view, &a, &params).unwrap();
    assert_eq!(before.entries, after.entries);
    assert_eq!(after.ledger_balance, 50);
    assert_eq!(after.utxo_balance, 50);
}

#[test]
fn test_spend_from_outside_past_is_invalid() {
    let dir = TempDir::new().unwrap();
    let params = params(18);
    let state = open_state(dir.path(), params.clone());
    let (a, b) = (address(1), address(2));

    let b0 = block(&[], 0, vec![coinbase(&[(50, &a)], 0)]);
    state.add_block(&b0).unwrap();
    let cb1 = coinbase(&[(20, &a)], 1);
    let b1 = block(&[b0.hash()], 1, vec![cb1.clone()]);
    state.add_block(&b1).unwrap();
    // Sibling of B1 spending B1's coinbase, heavier so it is ordered first
    let b2 = hard_block(&[b0.hash()], 2, vec![coinbase(&[], 2), transfer(&[cb1.outpoint(0)], &[(20, &a)])]);
    state.add_block(&b2).unwrap();
    // Merging both, so B1 is in the past
    let b3 = block(&[b1.hash(), b2.hash()], 3, vec![coinbase(&[], 3), transfer(&[cb1.outpoint(0)], &[(20, &b)])]);
    state.add_block(&b3).unwrap();

    let view = state.read_view();
    let orders: Vec<_> = (0..4).map(|o| view.block_by_order(o).unwrap().hash).collect();
    assert_eq!(orders, vec![b0.hash(), b2.hash(), b1.hash(), b3.hash()]);
    assert!(view.block_by_hash(&b2.hash()).unwrap().status.is_known_invalid());
    assert!(!view.block_by_hash(&b3.hash()).unwrap().status.is_known_invalid());

    let report = reconcile(&view, &a, &params).unwrap();
    for (i, entry) in report.entries.iter().enumerate().filter(|(_, e)| e.direction == Direction::Debit) {
        assert!(report.entries[..i].iter().any(|c| c.direction == Direction::Credit && c.outpoint == entry.outpoint));
        assert!(entry.counted);
    }
    let trail: Vec<_> = report.entries.iter().map(|e| (e.direction, e.amount, e.counted)).collect();
    assert_eq!(
        trail,
        vec![(Direction::Credit, 50, true), (Direction::Credit, 20, false), (Direction::Credit, 20, true), (Direction::Debit, 20, true)]
    );
    assert_eq!(report.ledger_balance, 50);
    assert_eq!(report.utxo_balance, 50);
    assert!(report.is_consistent());

    let other = reconcile(&view, &b, &params).unwrap();
    assert_eq!(other.ledger_balance, 20);
    assert_eq!(other.utxo_balance, 20);
}

#[test]
fn test_red_coinbase_spend_is_invalid() {
    let dir = TempDir::new().unwrap();
    let params = params(0);
    let state = open_state(dir.path(), params.clone());
    let a = address(1);
    let [_, b1, b2] = three_block_scenario(&state, &a);

    let red_output = b2.transactions[0].outpoint(0);
    let b3 = block(&[b1.hash(), b2.hash()], 3, vec![coinbase(&[], 3), transfer(&[red_output], &[(30, &a)])]);
    state.add_block(&b3).unwrap();

    let view = state.read_view();
    assert!(view.block_by_hash(&b3.hash()).unwrap().status.is_known_invalid());
    let report = reconcile(&view, &a, &params).unwrap();
    assert!(report.entries.iter().filter(|e| e.block_hash == b3.hash()).all(|e| !e.counted));
    assert_eq!(report.ledger_balance, 50);
    assert_eq!(report.utxo_balance, 50);
    assert!(report.is_consistent());
}

#[test]
fn test_blue_coinbase_spend_is_accepted() {
    let dir = TempDir::new().unwrap();
    let params = params(18);
    let state = open_state(dir.path(), params.clone());
    let a = address(1);
    let [_, b1, b2] = three_block_scenario(&state, &a);

    let merged_output = b2.transactions[0].outpoint(0);
    let b3 = block(&[b1.hash(), b2.hash()], 3, vec![coinbase(&[], 3), transfer(&[merged_output], &[(30, &a)])]);
    state.add_block(&b3).unwrap();

    let view = state.read_view();
    assert!(!view.block_by_hash(&b3.hash()).unwrap().status.is_known_invalid());
    let report = reconcile(&view, &a, &params).unwrap();
    assert_eq!(report.ledger_balance, 80);
    assert_eq!(report.utxo_balance, 80);
    assert!(report.is_consistent());
}
