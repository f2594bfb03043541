use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "payledger")]
#[command(about = "Reconciles address balances against the UTXO set of a JIO chain state", long_about = None)]
pub struct Args {
    /// Path to configuration file (optional, uses defaults if not provided)
    #[arg(short, long, global = true)]
    pub config_path: Option<PathBuf>,

    /// Data directory holding the chain state database
    #[arg(short, long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Network (mainnet, testnet, devnet, simnet)
    #[arg(short, long, global = true)]
    pub network: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Replay an address's history and compare it with the UTXO set
    DebugAddress {
        /// Base58 address on the configured network
        address: String,

        /// Print the report as JSON instead of tables
        #[arg(long)]
        json: bool,
    },
    /// Show the tip and size of the chain state
    ChainInfo,
}

pub fn parse_args() -> Args {
    Args::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_flags_after_subcommand() {
        let args = Args::try_parse_from(["payledger", "debug-address", "1abc", "--network", "simnet", "-d", "/tmp/x"]).unwrap();
        assert_eq!(args.network.as_deref(), Some("simnet"));
        assert_eq!(args.data_dir, Some(PathBuf::from("/tmp/x")));
        assert_eq!(args.log_level, "info");
        assert_eq!(args.command, Command::DebugAddress { address: "1abc".to_string(), json: false });
    }

    #[test]
    fn test_chain_info_with_json_flag_is_rejected() {
        assert!(Args::try_parse_from(["payledger", "chain-info", "--json"]).is_err());
        assert!(Args::try_parse_from(["payledger"]).is_err());
    }
}
