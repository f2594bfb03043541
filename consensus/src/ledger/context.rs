use super::audit::{AuditEntry, BlueState, ScanWarning};
use consensus_core::api::ChainStateProvider;
use consensus_core::block_index::BlockId;
use consensus_core::tx::TransactionOutpoint;
use std::collections::HashMap;

/// State owned by a single reconciliation run.
///
/// Nothing in here is shared between runs, so scans of different addresses
/// can proceed concurrently over their own views.
#[derive(Default)]
pub struct ScanContext {
    /// Outpoint -> index into `entries` of the last credit that created it
    spend_map: HashMap<TransactionOutpoint, usize>,
    blue_cache: HashMap<BlockId, BlueState>,
    entries: Vec<AuditEntry>,
    warnings: Vec<ScanWarning>,
}

impl ScanContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Blue state of a block, asking the classifier once per block
    pub fn blue_state<P: ChainStateProvider + ?Sized>(&mut self, provider: &P, id: BlockId) -> BlueState {
        *self.blue_cache.entry(id).or_insert_with(|| BlueState::from(provider.is_blue(id)))
    }

    /// The credit entry that created `outpoint`, if it paid the target address
    pub fn credit_for(&self, outpoint: &TransactionOutpoint) -> Option<&AuditEntry> {
        self.spend_map.get(outpoint).map(|index| &self.entries[*index])
    }

    pub fn push_credit(&mut self, entry: AuditEntry) {
        self.spend_map.insert(entry.outpoint, self.entries.len());
        self.entries.push(entry);
    }

    pub fn push_debit(&mut self, entry: AuditEntry) {
        self.entries.push(entry);
    }

    pub fn warn(&mut self, warning: ScanWarning) {
        self.warnings.push(warning);
    }

    pub fn entries(&self) -> &[AuditEntry] {
        &self.entries
    }

    pub fn into_parts(self) -> (Vec<AuditEntry>, Vec<ScanWarning>) {
        (self.entries, self.warnings)
    }
}
