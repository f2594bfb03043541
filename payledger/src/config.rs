use anyhow::Context;
use consensus_core::constants::GHOSTDAG_K;
use consensus_core::network::NetworkParams;
use consensus_core::KType;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub network: NetworkConfig,
    pub consensus: ConsensusConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub network_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsensusConfig {
    pub ghostdag_k: KType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    /// Number of block bodies kept in the read cache
    pub db_cache_size: usize,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self { network_id: "mainnet".to_string() }
    }
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self { ghostdag_k: GHOSTDAG_K }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { data_dir: PathBuf::from("./data"), db_cache_size: 1024 }
    }
}

impl Config {
    /// Load configuration from file if it exists, otherwise use defaults
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            warn!("config file {} not found, using defaults", path.display());
            return Ok(Config::default());
        }
        let content = fs::read_to_string(path).with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("failed to parse config file {}", path.display()))
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Override config with CLI arguments
    pub fn apply_cli_overrides(&mut self, args: &crate::cli::Args) {
        if let Some(data_dir) = &args.data_dir {
            self.storage.data_dir = data_dir.clone();
        }
        if let Some(network) = &args.network {
            self.network.network_id = network.clone();
        }
    }

    /// Network parameters selected by `network_id`, with the configured GHOSTDAG k
    pub fn network_params(&self) -> anyhow::Result<NetworkParams> {
        let params = NetworkParams::from_name(&self.network.network_id)?;
        Ok(params.with_ghostdag_k(self.consensus.ghostdag_k))
    }
}
