use anyhow::{bail, Context};
use consensus::{reconcile, ChainState, ReconciliationReport};
use consensus_core::address::Address;
use consensus_core::api::ChainStateProvider;
use consensus_core::block_index::BlockOrder;
use consensus_core::network::{NetworkParams, NetworkType};
use consensus_core::Hash;
use database::Database;
use serde::Serialize;
use std::io::Write;
use std::sync::Arc;
use tracing::{info, warn};

use crate::cli::{Args, Command};
use crate::config::Config;
use crate::ui::Console;

/// Outcome of a command that ran to completion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Ok,
    /// The ledger replay and the UTXO set disagree
    Diverged,
}

impl Verdict {
    pub fn exit_code(self) -> u8 {
        match self {
            Verdict::Ok => 0,
            Verdict::Diverged => 2,
        }
    }

    pub fn of(report: &ReconciliationReport) -> Self {
        if report.is_consistent() {
            Verdict::Ok
        } else {
            Verdict::Diverged
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainInfo {
    pub network: NetworkType,
    pub tip_hash: Option<Hash>,
    pub tip_order: Option<BlockOrder>,
    pub block_count: u64,
    pub utxo_count: usize,
}

/// Loads the configuration file named by `args` and applies the CLI overrides
pub fn resolve_config(args: &Args) -> anyhow::Result<Config> {
    let mut config = match &args.config_path {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    config.apply_cli_overrides(args);
    Ok(config)
}

/// Opens the chain state under `config.storage.data_dir` without write access
pub fn open_chain_state(config: &Config) -> anyhow::Result<ChainState> {
    let params = config.network_params()?;
    let path = &config.storage.data_dir;
    let db = Database::open_read_only(path).with_context(|| format!("failed to open database at {}", path.display()))?;
    let state = ChainState::open(Arc::new(db), params, config.storage.db_cache_size)
        .with_context(|| format!("failed to load chain state from {}", path.display()))?;
    Ok(state)
}

/// Parses a base58 address and checks it belongs to the active network
pub fn parse_address(text: &str, params: &NetworkParams) -> anyhow::Result<Address> {
    let address: Address = text.parse().with_context(|| format!("invalid address '{}'", text))?;
    if !params.is_address_version(address.version) {
        bail!("address {} has version {:#04x}, which is not a {} address", address, address.version, params.network_type);
    }
    Ok(address)
}

pub fn debug_address(state: &ChainState, address: &str) -> anyhow::Result<ReconciliationReport> {
    let address = parse_address(address, state.params())?;
    let view = state.read_view();
    let report = reconcile(&view, &address, state.params()).with_context(|| format!("reconciliation of {} failed", address))?;
    Ok(report)
}

pub fn chain_info(state: &ChainState) -> anyhow::Result<ChainInfo> {
    let view = state.read_view();
    let tip = view.main_chain_tip();
    Ok(ChainInfo {
        network: state.params().network_type,
        tip_hash: tip.as_ref().map(|t| t.hash),
        tip_order: tip.and_then(|t| t.order),
        block_count: view.block_count(),
        utxo_count: view.utxo_count().context("failed to count unspent outputs")?,
    })
}

/// Runs the command selected by `args`, writing its output to `console`.
///
/// The database is closed before returning, whether the command succeeded or not.
pub fn execute<W: Write>(args: &Args, console: &mut Console<W>) -> anyhow::Result<Verdict> {
    let config = resolve_config(args)?;
    let state = open_chain_state(&config)?;
    info!("opened {} chain state at {}", state.params().network_type, config.storage.data_dir.display());

    let result = run_command(&args.command, &state, console);
    state.close();
    result
}

fn run_command<W: Write>(command: &Command, state: &ChainState, console: &mut Console<W>) -> anyhow::Result<Verdict> {
    match command {
        Command::DebugAddress { address, json } => {
            let report = debug_address(state, address)?;
            let verdict = Verdict::of(&report);
            if verdict == Verdict::Diverged {
                warn!("{} is inconsistent with the UTXO set", report.address);
            }
            if *json {
                console.json(&report)?;
            } else {
                console.report(&report)?;
            }
            Ok(verdict)
        }
        Command::ChainInfo => {
            let info = chain_info(state)?;
            console.chain_info(&info)?;
            Ok(Verdict::Ok)
        }
    }
}
