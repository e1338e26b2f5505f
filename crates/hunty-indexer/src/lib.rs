//! Reads Hunty contract events over JSON-RPC and serves leaderboards built
//! from them.

pub use crate::config::{ConfigError, IndexerConfig, DEFAULT_LOOKBACK_BLOCKS, LOG_QUERY_CHUNK_SIZE};
pub use crate::events::{decode_log, decode_logs, hunt_topic, ITreasureHunt, LedgerEvent};
pub use crate::feed::{LeaderboardFeed, LeaderboardState, RequestTicket};
pub use crate::fetcher::{BlockWindow, EventFetcher};
pub use crate::service::{unix_now, LeaderboardService};
pub use crate::source::{LogQuery, LogSource, RpcLogSource};

mod config;
mod events;
mod feed;
mod fetcher;
mod service;
mod source;

#[cfg(test)]
mod test;
