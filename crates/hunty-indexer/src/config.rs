use alloy::primitives::Address;
use clap::Args;
use std::time::Duration;

/// How far back from the head block events are read. Bounds query cost.
pub const DEFAULT_LOOKBACK_BLOCKS: u64 = 200_000;
/// Blocks per `eth_getLogs` call, to stay under provider range limits.
pub const LOG_QUERY_CHUNK_SIZE: u64 = 5_000;
pub const DEFAULT_RPC_URL: &str = "https://forno.celo.org";

#[derive(Args, Debug, Clone)]
pub struct IndexerConfig {
    /// JSON-RPC endpoint of the chain the hunt contract lives on
    #[arg(long, env = "HUNTY_RPC_URL", default_value = DEFAULT_RPC_URL)]
    pub rpc_url: String,

    /// Address of the treasure hunt contract
    #[arg(long, env = "HUNTY_CONTRACT")]
    pub contract: Address,

    /// Number of blocks before the head to scan for events
    #[arg(long, env = "HUNTY_LOOKBACK_BLOCKS", default_value_t = DEFAULT_LOOKBACK_BLOCKS)]
    pub lookback_blocks: u64,

    /// Blocks per log query
    #[arg(long, env = "HUNTY_CHUNK_SIZE", default_value_t = LOG_QUERY_CHUNK_SIZE)]
    pub chunk_size: u64,

    /// Give up on a fetch after this many seconds (no limit when unset)
    #[arg(long, env = "HUNTY_FETCH_TIMEOUT_SECS")]
    pub fetch_timeout_secs: Option<u64>,
}

impl IndexerConfig {
    pub fn new(contract: Address) -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            contract,
            lookback_blocks: DEFAULT_LOOKBACK_BLOCKS,
            chunk_size: LOG_QUERY_CHUNK_SIZE,
            fetch_timeout_secs: None,
        }
    }

    pub fn fetch_timeout(&self) -> Option<Duration> {
        self.fetch_timeout_secs.map(Duration::from_secs)
    }

    /// Rejects settings that would make the fetcher loop or query nothing.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size == 0 {
            return Err(ConfigError::ZeroChunkSize);
        }
        if self.fetch_timeout_secs == Some(0) {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("chunk size must be at least one block")]
    ZeroChunkSize,
    #[error("fetch timeout must be at least one second")]
    ZeroTimeout,
}
