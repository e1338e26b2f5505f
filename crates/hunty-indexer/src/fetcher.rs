use crate::config::IndexerConfig;
use crate::events::{decode_logs, LedgerEvent};
use crate::source::{LogQuery, LogSource};
use alloy::primitives::Address;
use alloy::rpc::types::Log;
use alloy::sol_types::SolEvent;
use hunty_leaderboard::{
    AnswerSubmitted, HuntCompleted, HuntEvents, HuntStarted, LeaderboardError,
};

/// Inclusive block range scanned by one fetch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockWindow {
    pub from_block: u64,
    pub to_block: u64,
}

impl BlockWindow {
    /// The `lookback` blocks ending at `head`, clamped at genesis.
    pub fn ending_at(head: u64, lookback: u64) -> Self {
        Self {
            from_block: head.saturating_sub(lookback),
            to_block: head,
        }
    }

    pub fn block_count(&self) -> u64 {
        self.to_block - self.from_block + 1
    }

    /// Splits the window into consecutive ranges of at most `chunk_size` blocks.
    pub fn chunks(&self, chunk_size: u64) -> Vec<BlockWindow> {
        let chunk_size = chunk_size.max(1);
        let mut chunks = Vec::new();
        let mut current_from = self.from_block;

        while current_from <= self.to_block {
            let current_to = current_from
                .saturating_add(chunk_size - 1)
                .min(self.to_block);
            chunks.push(BlockWindow {
                from_block: current_from,
                to_block: current_to,
            });
            if current_to == u64::MAX {
                break;
            }
            current_from = current_to + 1;
        }

        chunks
    }
}

/// Reads hunt events for a bounded recent block window.
pub struct EventFetcher<S> {
    source: S,
    contract: Address,
    lookback_blocks: u64,
    chunk_size: u64,
}

impl<S: LogSource> EventFetcher<S> {
    pub fn new(source: S, config: &IndexerConfig) -> Self {
        Self {
            source,
            contract: config.contract,
            lookback_blocks: config.lookback_blocks,
            chunk_size: config.chunk_size,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// The window a fetch started now would scan.
    pub async fn window(&self) -> Result<BlockWindow, LeaderboardError> {
        let head = self.source.block_number().await?;
        Ok(BlockWindow::ending_at(head, self.lookback_blocks))
    }

    /// Fetches and decodes all three event streams, optionally for one hunt.
    ///
    /// The streams are queried concurrently. Any RPC error or undecodable log
    /// fails the whole fetch; a partial set of events is never returned.
    pub async fn fetch(&self, hunt_id: Option<u64>) -> Result<HuntEvents, LeaderboardError> {
        let window = self.window().await?;
        tracing::info!(
            hunt_id = ?hunt_id,
            from_block = window.from_block,
            to_block = window.to_block,
            "Fetching hunt events ({} blocks)",
            window.block_count()
        );

        let (started, answers, completed) = tokio::join!(
            self.fetch_events::<HuntStarted>(hunt_id, window),
            self.fetch_events::<AnswerSubmitted>(hunt_id, window),
            self.fetch_events::<HuntCompleted>(hunt_id, window),
        );

        let events = HuntEvents {
            started: started?,
            answers: answers?,
            completed: completed?,
        };
        tracing::info!(
            started = events.started.len(),
            answers = events.answers.len(),
            completed = events.completed.len(),
            "Hunt events fetched"
        );
        Ok(events)
    }

    async fn fetch_events<E: LedgerEvent>(
        &self,
        hunt_id: Option<u64>,
        window: BlockWindow,
    ) -> Result<Vec<E>, LeaderboardError> {
        let query = LogQuery {
            contract: self.contract,
            event: E::NAME,
            signature: <E::Abi as SolEvent>::SIGNATURE_HASH,
            hunt_id,
            from_block: window.from_block,
            to_block: window.to_block,
        };
        let logs = self.query_logs_chunked(&query).await?;
        decode_logs::<E>(&logs)
    }

    /// Runs `query` one chunk at a time, keeping logs in block order.
    async fn query_logs_chunked(&self, query: &LogQuery) -> Result<Vec<Log>, LeaderboardError> {
        let window = BlockWindow {
            from_block: query.from_block,
            to_block: query.to_block,
        };
        let mut all_logs = Vec::new();

        for chunk in window.chunks(self.chunk_size) {
            let logs = self
                .source
                .logs(&query.with_range(chunk.from_block, chunk.to_block))
                .await?;
            tracing::debug!(
                event = query.event,
                from_block = chunk.from_block,
                to_block = chunk.to_block,
                count = logs.len(),
                "Fetched log chunk"
            );
            all_logs.extend(logs);
        }

        Ok(all_logs)
    }
}
