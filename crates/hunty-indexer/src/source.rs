use crate::events::hunt_topic;
use alloy::primitives::{Address, B256};
use alloy::providers::Provider;
use alloy::rpc::types::{BlockNumberOrTag, Filter, Log};
use async_trait::async_trait;
use hunty_leaderboard::LeaderboardError;

/// Logs of one event type from one contract, optionally narrowed to a hunt,
/// within an inclusive block range.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogQuery {
    pub contract: Address,
    /// Event name, for errors and logging.
    pub event: &'static str,
    /// Topic 0 of the event.
    pub signature: B256,
    /// Matched against the indexed `huntId` (topic 1).
    pub hunt_id: Option<u64>,
    pub from_block: u64,
    pub to_block: u64,
}

impl LogQuery {
    /// Same query restricted to `[from_block, to_block]`.
    pub fn with_range(&self, from_block: u64, to_block: u64) -> Self {
        Self {
            from_block,
            to_block,
            ..self.clone()
        }
    }

    pub fn to_filter(&self) -> Filter {
        let filter = Filter::new()
            .address(self.contract)
            .event_signature(self.signature)
            .from_block(BlockNumberOrTag::Number(self.from_block))
            .to_block(BlockNumberOrTag::Number(self.to_block));
        match self.hunt_id {
            Some(hunt_id) => filter.topic1(hunt_topic(hunt_id)),
            None => filter,
        }
    }
}

/// Read-only access to ledger logs.
#[async_trait]
pub trait LogSource: Send + Sync {
    /// Latest block number.
    async fn block_number(&self) -> Result<u64, LeaderboardError>;

    async fn logs(&self, query: &LogQuery) -> Result<Vec<Log>, LeaderboardError>;
}

/// `LogSource` backed by a JSON-RPC provider.
pub struct RpcLogSource<P> {
    provider: P,
}

impl<P: Provider> RpcLogSource<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<P: Provider> LogSource for RpcLogSource<P> {
    async fn block_number(&self) -> Result<u64, LeaderboardError> {
        self.provider
            .get_block_number()
            .await
            .map_err(|err| LeaderboardError::Fetch {
                what: "head block number".into(),
                message: err.to_string(),
            })
    }

    async fn logs(&self, query: &LogQuery) -> Result<Vec<Log>, LeaderboardError> {
        self.provider
            .get_logs(&query.to_filter())
            .await
            .map_err(|err| LeaderboardError::Fetch {
                what: format!("{} logs", query.event),
                message: err.to_string(),
            })
    }
}
