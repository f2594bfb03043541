use super::audit::{AuditEntry, BlueState, Direction, ReconciliationReport, ScanWarning, UtxoAuditEntry};
use super::context::ScanContext;
use super::errors::{Corruption, LedgerError};
use consensus_core::address::Address;
use consensus_core::api::{ChainStateProvider, ScriptAddressResolver, TransactionLocator, UtxoSource};
use consensus_core::block_index::{BlockOrder, BlockRecord};
use consensus_core::network::NetworkParams;
use consensus_core::tx::{Transaction, TransactionOutpoint};
use consensus_core::Hash;
use tracing::{debug, info, trace, warn};

/// Index consistency of one scanned transaction, computed on first use
struct TxCheck {
    full_hash: Hash,
    valid: bool,
}

/// Replays every credit and debit of one address in DAG order and compares
/// the resulting balance with the address's share of the UTXO set.
///
/// All reads go through the given interfaces, which are expected to answer
/// from one consistent snapshot for the whole run.
pub struct Reconciler<P, L, U, R> {
    provider: P,
    locator: L,
    utxos: U,
    resolver: R,
    params: NetworkParams,
}

impl<P, L, U, R> Reconciler<P, L, U, R>
where
    P: ChainStateProvider,
    L: TransactionLocator,
    U: UtxoSource,
    R: ScriptAddressResolver,
{
    pub fn new(provider: P, locator: L, utxos: U, resolver: R, params: NetworkParams) -> Self {
        Self { provider, locator, utxos, resolver, params }
    }

    pub fn reconcile(&self, address: &Address) -> Result<ReconciliationReport, LedgerError> {
        let block_count = self.provider.block_count();
        let tip = self.provider.main_chain_tip();
        info!("reconciling {} over {} blocks", address, block_count);

        let mut ctx = ScanContext::new();
        for order in 0..block_count {
            self.scan_block(&mut ctx, address, order, block_count)?;
        }
        let (utxo_entries, utxo_balance) = self.scan_utxos(&mut ctx, address)?;

        let (mut entries, warnings) = ctx.into_parts();
        let ledger_balance = apply_balance(&mut entries);

        let report = ReconciliationReport {
            address: *address,
            network: self.params.network_type,
            tip_hash: tip.as_ref().map(|t| t.hash),
            tip_order: tip.as_ref().and_then(|t| t.order),
            block_count,
            entries,
            ledger_balance,
            utxo_entries,
            utxo_balance,
            warnings,
        };

        match report.divergence() {
            Some(divergence) => warn!("{}: {}", address, divergence),
            None => info!(
                "{}: {} audit entries, {} utxos, balance {}",
                address,
                report.entries.len(),
                report.utxo_entries.len(),
                report.utxo_balance
            ),
        }
        Ok(report)
    }

    fn scan_block(&self, ctx: &mut ScanContext, address: &Address, order: BlockOrder, block_count: u64) -> Result<(), LedgerError> {
        let record = self.provider.block_by_order(order).ok_or(Corruption::MissingOrderedBlock { order, block_count })?;
        let transactions = self
            .provider
            .block_transactions(&record.hash)
            .map_err(|err| LedgerError::from_read(err, |source| Corruption::BlockRead { block: record.hash, source }))?
            .ok_or(Corruption::MissingBlockBody(record.hash))?;
        let confirmations = self.provider.confirmations(record.id).ok_or(Corruption::MissingConfirmations(record.hash))?;

        for tx in &transactions {
            let mut check: Option<TxCheck> = None;

            if !tx.is_coinbase() {
                for (input_index, input) in tx.inputs.iter().enumerate() {
                    let outpoint = input.previous_outpoint;
                    let Some(amount) = ctx.credit_for(&outpoint).map(|credit| credit.amount) else {
                        continue;
                    };
                    let (full_hash, tx_valid) = self.tx_check(&mut check, tx, &record.hash)?;
                    let blue_state = self.blue_state(ctx, &record);
                    ctx.push_debit(AuditEntry {
                        block_id: record.id,
                        block_hash: record.hash,
                        block_order: order,
                        height: record.height,
                        status: record.status,
                        confirmations,
                        blue_state,
                        tx_id: tx.id(),
                        tx_full_hash: full_hash,
                        outpoint,
                        io_index: input_index as u32,
                        direction: Direction::Debit,
                        amount,
                        is_coinbase: false,
                        tx_valid,
                        counted: false,
                        balance_after: 0,
                    });
                }
            }

            for (output_index, output) in tx.outputs.iter().enumerate() {
                let outpoint = tx.outpoint(output_index as u32);
                let addresses = self.resolver.extract_addresses(&output.script_public_key, &self.params).map_err(|source| {
                    LedgerError::ScriptDecode { block: record.hash, tx: tx.id(), output_index: outpoint.index, source }
                })?;
                match addresses.len() {
                    1 => {}
                    0 => {
                        trace!("output {} pays no address", outpoint);
                        continue;
                    }
                    address_count => {
                        warn!("output {} in block {} pays {} addresses, skipped", outpoint, record.hash, address_count);
                        ctx.warn(ScanWarning::AmbiguousScript { block_hash: record.hash, outpoint, address_count });
                        continue;
                    }
                }
                if addresses[0] != *address {
                    continue;
                }

                let (full_hash, tx_valid) = self.tx_check(&mut check, tx, &record.hash)?;
                let blue_state = self.blue_state(ctx, &record);
                ctx.push_credit(AuditEntry {
                    block_id: record.id,
                    block_hash: record.hash,
                    block_order: order,
                    height: record.height,
                    status: record.status,
                    confirmations,
                    blue_state,
                    tx_id: tx.id(),
                    tx_full_hash: full_hash,
                    outpoint,
                    io_index: outpoint.index,
                    direction: Direction::Credit,
                    amount: output.value,
                    is_coinbase: tx.is_coinbase(),
                    tx_valid,
                    counted: false,
                    balance_after: 0,
                });
            }
        }
        Ok(())
    }

    /// Known-invalid blocks are never classified
    fn blue_state(&self, ctx: &mut ScanContext, record: &BlockRecord) -> BlueState {
        if record.status.is_known_invalid() {
            BlueState::Undetermined
        } else {
            ctx.blue_state(&self.provider, record.id)
        }
    }

    /// A transaction is valid for the ledger only when the index maps its id
    /// to this very block and to identical bytes
    fn tx_check(&self, check: &mut Option<TxCheck>, tx: &Transaction, block_hash: &Hash) -> Result<(Hash, bool), LedgerError> {
        if let Some(check) = check {
            return Ok((check.full_hash, check.valid));
        }
        let full_hash = tx.full_hash();
        let valid = match self.locator.find_transaction(&tx.id()) {
            Ok(Some((indexed, containing))) => containing == *block_hash && indexed.full_hash() == full_hash,
            Ok(None) => false,
            Err(err) => {
                return Err(LedgerError::from_read(err, |source| Corruption::Locator { tx: tx.id(), block: *block_hash, source }))
            }
        };
        if !valid {
            debug!("transaction {} in block {} does not match the transaction index", tx.id(), block_hash);
        }
        *check = Some(TxCheck { full_hash, valid });
        Ok((full_hash, valid))
    }

    fn scan_utxos(&self, ctx: &mut ScanContext, address: &Address) -> Result<(Vec<UtxoAuditEntry>, u64), LedgerError> {
        let mut entries = Vec::new();
        let mut balance: u64 = 0;

        for item in self.utxos.utxo_entries().map_err(LedgerError::from_utxo_read)? {
            let (outpoint, utxo) = item.map_err(LedgerError::from_utxo_read)?;
            if utxo.is_spent {
                continue;
            }
            let record = self
                .provider
                .block_by_hash(&utxo.block_hash)
                .ok_or(Corruption::MissingOriginBlock { outpoint, block: utxo.block_hash })?;
            let addresses = self.resolver.extract_addresses(&utxo.script_public_key, &self.params).map_err(|source| {
                LedgerError::ScriptDecode { block: utxo.block_hash, tx: outpoint.transaction_id, output_index: outpoint.index, source }
            })?;
            // Ambiguous outputs were already reported by the block walk
            if addresses.len() != 1 || addresses[0] != *address {
                continue;
            }
            if record.order.is_none() {
                ctx.warn(unordered_warning(outpoint, utxo.block_hash));
                continue;
            }

            let blue_state = self.blue_state(ctx, &record);
            let counted = !record.status.is_known_invalid() && (!utxo.is_coinbase || blue_state == BlueState::Blue);
            if counted {
                balance = balance.saturating_add(utxo.amount);
            }
            debug!("utxo {} amount {} coinbase {} {} counted {}", outpoint, utxo.amount, utxo.is_coinbase, blue_state, counted);
            entries.push(UtxoAuditEntry {
                outpoint,
                amount: utxo.amount,
                block_hash: utxo.block_hash,
                block_order: record.order,
                is_coinbase: utxo.is_coinbase,
                blue_state,
                counted,
            });
        }
        Ok((entries, balance))
    }
}

fn unordered_warning(outpoint: TransactionOutpoint, block_hash: Hash) -> ScanWarning {
    warn!("utxo {} belongs to unordered block {}, skipped", outpoint, block_hash);
    ScanWarning::UnorderedUtxoBlock { outpoint, block_hash }
}

/// Walks the entries in emission order, fills in `counted` and
/// `balance_after`, and returns the final balance
fn apply_balance(entries: &mut [AuditEntry]) -> i64 {
    let mut balance: i64 = 0;
    for entry in entries.iter_mut() {
        entry.counted = entry.contributes();
        if entry.counted {
            balance = balance.saturating_add(entry.signed_amount());
        }
        entry.balance_after = balance;
        debug!(
            "order {} tx {} {} {} coinbase {} {} valid {} balance {}",
            entry.block_order, entry.tx_id, entry.direction, entry.amount, entry.is_coinbase, entry.blue_state, entry.tx_valid, balance
        );
    }
    balance
}
