//! Console rendering of reconciliation reports and chain summaries

use consensus::ledger::{AuditEntry, ReconciliationReport, UtxoAuditEntry};
use consensus_core::Hash;
use serde::Serialize;
use std::io::{self, Write};

use crate::commands::ChainInfo;

/// ANSI color codes for terminal output
pub mod colors {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const DIM: &str = "\x1b[2m";

    pub const BRIGHT_RED: &str = "\x1b[91m";
    pub const BRIGHT_GREEN: &str = "\x1b[92m";
    pub const BRIGHT_YELLOW: &str = "\x1b[93m";
    pub const BRIGHT_CYAN: &str = "\x1b[96m";
    pub const BRIGHT_WHITE: &str = "\x1b[97m";
}

/// Status types for colored output
#[derive(Debug, Clone, Copy)]
pub enum StatusType {
    Success,
    Info,
    Warning,
    Error,
}

/// Writes report text, optionally with ANSI colors
pub struct Console<W> {
    out: W,
    color: bool,
}

impl<W: Write> Console<W> {
    pub fn new(out: W, color: bool) -> Self {
        Self { out, color }
    }

    /// Plain output, for tests and redirected streams
    pub fn plain(out: W) -> Self {
        Self::new(out, false)
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn paint(&self, code: &'static str, text: &str) -> String {
        if self.color {
            format!("{}{}{}", code, text, colors::RESET)
        } else {
            text.to_string()
        }
    }

    /// Print status line with icon and color
    pub fn status(&mut self, icon: &str, message: &str, status: StatusType) -> io::Result<()> {
        let color = match status {
            StatusType::Success => colors::BRIGHT_GREEN,
            StatusType::Info => colors::BRIGHT_CYAN,
            StatusType::Warning => colors::BRIGHT_YELLOW,
            StatusType::Error => colors::BRIGHT_RED,
        };
        let line = self.paint(color, &format!("[{}] {}", icon, message));
        writeln!(self.out, "{}", line)
    }

    /// Print a section header
    pub fn section(&mut self, title: &str) -> io::Result<()> {
        let rule = self.paint(colors::DIM, &"━".repeat(64));
        let title = self.paint(colors::BOLD, title);
        writeln!(self.out)?;
        writeln!(self.out, "{}", rule)?;
        writeln!(self.out, "  {}", title)?;
        writeln!(self.out, "{}", rule)
    }

    /// Print key-value pair in a formatted way
    pub fn kv(&mut self, key: &str, value: &str) -> io::Result<()> {
        let key = self.paint(colors::BRIGHT_WHITE, &format!("{}:", key));
        let value = self.paint(colors::BRIGHT_CYAN, value);
        writeln!(self.out, "  {:<24} {}", key, value)
    }

    /// Pretty-printed JSON, for scripts consuming the output
    pub fn json<T: Serialize>(&mut self, value: &T) -> io::Result<()> {
        serde_json::to_writer_pretty(&mut self.out, value)?;
        writeln!(self.out)
    }

    pub fn chain_info(&mut self, info: &ChainInfo) -> io::Result<()> {
        self.section("Chain State")?;
        self.kv("Network", &info.network.to_string())?;
        self.kv("Tip", &info.tip_hash.map_or_else(|| "none".to_string(), |h| h.to_string()))?;
        self.kv("Tip Order", &info.tip_order.map_or_else(|| "none".to_string(), |o| o.to_string()))?;
        self.kv("Ordered Blocks", &info.block_count.to_string())?;
        self.kv("Unspent Outputs", &info.utxo_count.to_string())
    }

    /// Full reconciliation report: both tables, the balances and the verdict
    pub fn report(&mut self, report: &ReconciliationReport) -> io::Result<()> {
        self.section(&format!("Ledger of {}", report.address))?;
        self.kv("Network", &report.network.to_string())?;
        self.kv("Tip", &report.tip_hash.map_or_else(|| "none".to_string(), |h| h.to_string()))?;
        self.kv("Ordered Blocks", &report.block_count.to_string())?;
        writeln!(self.out)?;

        writeln!(
            self.out,
            "  {:>6} {:<16} {:>6} {:>5} {:<5} {:<7} {:<16} {:>4} {:<3} {:>14} {:<2} {:<5} {:<7} {:>14}",
            "order", "block", "height", "conf", "blue", "block", "tx", "io", "dir", "amount", "cb", "valid", "counted", "balance"
        )?;
        for entry in &report.entries {
            let line = ledger_row(entry);
            let line = if entry.counted { line } else { self.paint(colors::DIM, &line) };
            writeln!(self.out, "{}", line)?;
        }
        if report.entries.is_empty() {
            writeln!(self.out, "  (no transactions touch this address)")?;
        }

        self.section("Unspent Outputs")?;
        writeln!(self.out, "  {:<16} {:>4} {:>6} {:<16} {:>14} {:<2} {:<5} {:<7}", "tx", "idx", "order", "block", "amount", "cb", "blue", "counted")?;
        for utxo in &report.utxo_entries {
            let line = utxo_row(utxo);
            let line = if utxo.counted { line } else { self.paint(colors::DIM, &line) };
            writeln!(self.out, "{}", line)?;
        }
        if report.utxo_entries.is_empty() {
            writeln!(self.out, "  (no unspent outputs)")?;
        }

        if !report.warnings.is_empty() {
            self.section("Warnings")?;
            for warning in &report.warnings {
                let line = self.paint(colors::BRIGHT_YELLOW, &format!("  {}", warning));
                writeln!(self.out, "{}", line)?;
            }
        }

        self.section("Balances")?;
        self.kv("Ledger Balance", &report.ledger_balance.to_string())?;
        self.kv("UTXO Balance", &report.utxo_balance.to_string())?;
        writeln!(self.out)?;
        match report.divergence() {
            None => self.status("✓", "ledger and UTXO set agree", StatusType::Success),
            Some(divergence) => self.status("✗", &divergence.to_string(), StatusType::Error),
        }
    }
}

fn short(hash: &Hash) -> String {
    let mut text = hash.to_string();
    text.truncate(16);
    text
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

fn ledger_row(entry: &AuditEntry) -> String {
    format!(
        "  {:>6} {:<16} {:>6} {:>5} {:<5} {:<7} {:<16} {:>4} {:<3} {:>14} {:<2} {:<5} {:<7} {:>14}",
        entry.block_order,
        short(&entry.block_hash),
        entry.height,
        entry.confirmations,
        entry.blue_state.to_string(),
        if entry.status.is_known_invalid() { "invalid" } else { "valid" },
        short(&entry.tx_id),
        entry.io_index,
        entry.direction.to_string(),
        entry.signed_amount(),
        if entry.is_coinbase { "cb" } else { "" },
        yes_no(entry.tx_valid),
        yes_no(entry.counted),
        entry.balance_after,
    )
}

fn utxo_row(utxo: &UtxoAuditEntry) -> String {
    format!(
        "  {:<16} {:>4} {:>6} {:<16} {:>14} {:<2} {:<5} {:<7}",
        short(&utxo.outpoint.transaction_id),
        utxo.outpoint.index,
        utxo.block_order.map_or_else(|| "-".to_string(), |o| o.to_string()),
        short(&utxo.block_hash),
        utxo.amount,
        if utxo.is_coinbase { "cb" } else { "" },
        utxo.blue_state.to_string(),
        yes_no(utxo.counted),
    )
}

/// Check if terminal supports colors
pub fn supports_colors() -> bool {
    std::env::var_os("NO_COLOR").is_none() && std::env::var("TERM").map_or(false, |term| term != "dumb")
}
