//! PayLedger - ledger reconciliation diagnostics
//!
//! Opens a JIO chain state read-only, replays an address's credits and debits
//! over the DAG total order and compares the result with the UTXO set.

pub mod cli;
pub mod commands;
pub mod config;
pub mod ui;

pub use cli::{Args, Command};
pub use commands::{execute, Verdict};
pub use config::Config;
