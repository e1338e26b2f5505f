use super::*;
use alloy::primitives::{Address, Bytes, LogData, U256};
use alloy::rpc::types::Log;
use alloy::sol_types::SolEvent;
use async_trait::async_trait;
use hunty_leaderboard::{
    AnswerSubmitted, ErrorKind, HuntCompleted, HuntEvents, HuntLeaderboardEntry, HuntStarted,
    LeaderboardError,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

const CONTRACT: Address = Address::repeat_byte(0xcc);
const PLAYER_A: Address = Address::repeat_byte(0x0a);
const PLAYER_B: Address = Address::repeat_byte(0x0b);

fn cusd(whole: u64) -> U256 {
    U256::from(whole) * U256::from(10u64).pow(U256::from(18u64))
}

/// In-memory chain serving pre-encoded logs.
#[derive(Default)]
struct FakeChain {
    head: u64,
    logs: Vec<Log>,
    queries: Mutex<Vec<LogQuery>>,
    failing_event: Option<&'static str>,
    /// When set, the first head lookup waits for a notification.
    gate: Option<Arc<Notify>>,
    head_calls: AtomicUsize,
}

impl FakeChain {
    fn new(head: u64) -> Self {
        Self {
            head,
            ..Default::default()
        }
    }

    fn with_log(mut self, block: u64, event: &impl SolEvent) -> Self {
        self.logs.push(log_at(block, event.encode_log_data()));
        self
    }

    fn with_raw_log(mut self, log: Log) -> Self {
        self.logs.push(log);
        self
    }

    fn queries_for(&self, event: &str) -> Vec<LogQuery> {
        self.queries
            .lock()
            .unwrap()
            .iter()
            .filter(|query| query.event == event)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl LogSource for FakeChain {
    async fn block_number(&self) -> Result<u64, LeaderboardError> {
        if self.head_calls.fetch_add(1, Ordering::SeqCst) == 0 {
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
        }
        Ok(self.head)
    }

    async fn logs(&self, query: &LogQuery) -> Result<Vec<Log>, LeaderboardError> {
        self.queries.lock().unwrap().push(query.clone());
        if self.failing_event == Some(query.event) {
            return Err(LeaderboardError::Fetch {
                what: format!("{} logs", query.event),
                message: "connection reset".into(),
            });
        }
        Ok(self
            .logs
            .iter()
            .filter(|log| {
                let topics = log.inner.data.topics();
                let block = log.block_number.unwrap_or_default();
                log.inner.address == query.contract
                    && topics.first() == Some(&query.signature)
                    && query
                        .hunt_id
                        .map_or(true, |hunt_id| topics.get(1) == Some(&hunt_topic(hunt_id)))
                    && (query.from_block..=query.to_block).contains(&block)
            })
            .cloned()
            .collect())
    }
}

/// A source whose head lookup never resolves.
struct StalledChain;

#[async_trait]
impl LogSource for StalledChain {
    async fn block_number(&self) -> Result<u64, LeaderboardError> {
        std::future::pending().await
    }

    async fn logs(&self, _query: &LogQuery) -> Result<Vec<Log>, LeaderboardError> {
        std::future::pending().await
    }
}

fn log_at(block: u64, data: LogData) -> Log {
    Log {
        inner: alloy::primitives::Log {
            address: CONTRACT,
            data,
        },
        block_number: Some(block),
        ..Default::default()
    }
}

fn started(hunt_id: u64, player: Address, timestamp: u64) -> ITreasureHunt::HuntStarted {
    ITreasureHunt::HuntStarted {
        huntId: U256::from(hunt_id),
        player,
        timestamp: U256::from(timestamp),
    }
}

fn answered(hunt_id: u64, player: Address, clue_index: u64, correct: bool) -> ITreasureHunt::AnswerSubmitted {
    ITreasureHunt::AnswerSubmitted {
        huntId: U256::from(hunt_id),
        player,
        clueIndex: U256::from(clue_index),
        correct,
        timestamp: U256::from(0u64),
    }
}

fn completed(hunt_id: u64, player: Address, completion_time: u64, reward: U256) -> ITreasureHunt::HuntCompleted {
    ITreasureHunt::HuntCompleted {
        huntId: U256::from(hunt_id),
        player,
        completionTime: U256::from(completion_time),
        totalReward: reward,
        leaderboardPosition: U256::from(1u64),
    }
}

fn config(lookback_blocks: u64, chunk_size: u64) -> IndexerConfig {
    IndexerConfig {
        lookback_blocks,
        chunk_size,
        ..IndexerConfig::new(CONTRACT)
    }
}

/// Hunt 1: A finishes in 300s, B solves one clue. Hunt 2: B finishes.
fn two_hunt_chain() -> FakeChain {
    FakeChain::new(1_000)
        .with_log(10, &started(1, PLAYER_A, 100))
        .with_log(11, &started(1, PLAYER_B, 150))
        .with_log(12, &answered(1, PLAYER_A, 0, true))
        .with_log(13, &answered(1, PLAYER_B, 0, true))
        .with_log(14, &answered(1, PLAYER_B, 1, false))
        .with_log(15, &answered(1, PLAYER_A, 1, true))
        .with_log(16, &completed(1, PLAYER_A, 400, cusd(5)))
        .with_log(20, &started(2, PLAYER_B, 300))
        .with_log(21, &answered(2, PLAYER_B, 0, true))
        .with_log(22, &completed(2, PLAYER_B, 390, cusd(2)))
}

// ========== Decoding Tests ==========

#[test]
fn test_decode_hunt_started() {
    let log = log_at(42, started(7, PLAYER_A, 1_700_000_000).encode_log_data());
    let event = decode_log::<HuntStarted>(&log).unwrap();
    assert_eq!(
        event,
        HuntStarted {
            hunt_id: 7,
            player: PLAYER_A,
            timestamp: 1_700_000_000,
        }
    );
}

#[test]
fn test_decode_answer_submitted() {
    let log = log_at(42, answered(7, PLAYER_B, 3, false).encode_log_data());
    let event = decode_log::<AnswerSubmitted>(&log).unwrap();
    assert_eq!(event.hunt_id, 7);
    assert_eq!(event.player, PLAYER_B);
    assert_eq!(event.clue_index, 3);
    assert!(!event.correct);
}

#[test]
fn test_decode_hunt_completed_keeps_full_reward() {
    let reward = U256::from(u128::MAX) * U256::from(1_000u64);
    let log = log_at(42, completed(7, PLAYER_A, 3_600, reward).encode_log_data());
    let event = decode_log::<HuntCompleted>(&log).unwrap();
    assert_eq!(event.completion_time, 3_600);
    assert_eq!(event.total_reward, reward);
    assert_eq!(event.leaderboard_position, 1);
}

#[test]
fn test_decode_truncated_data_is_malformed() {
    let valid = started(1, PLAYER_A, 100).encode_log_data();
    let truncated = LogData::new_unchecked(valid.topics().to_vec(), Bytes::new());
    let err = decode_log::<HuntStarted>(&log_at(99, truncated)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedEvent);
    match err {
        LeaderboardError::MalformedEvent { event, block, .. } => {
            assert_eq!(event, "HuntStarted");
            assert_eq!(block, 99);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_decode_oversized_number_is_malformed() {
    let mut event = started(1, PLAYER_A, 0);
    event.timestamp = U256::MAX;
    let err = decode_log::<HuntStarted>(&log_at(5, event.encode_log_data())).unwrap_err();
    assert_eq!(
        err,
        LeaderboardError::MalformedEvent {
            event: "HuntStarted",
            block: 5,
            reason: "timestamp does not fit in u64".into(),
        }
    );
}

#[test]
fn test_decode_wrong_event_is_malformed() {
    let log = log_at(5, started(1, PLAYER_A, 0).encode_log_data());
    let err = decode_log::<HuntCompleted>(&log).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedEvent);
}

#[test]
fn test_hunt_topic_is_big_endian_word() {
    let topic = hunt_topic(1);
    assert_eq!(topic[31], 1);
    assert!(topic[..31].iter().all(|byte| *byte == 0));
}

// ========== Query Tests ==========

#[test]
fn test_query_filter_narrows_to_hunt() {
    let query = LogQuery {
        contract: CONTRACT,
        event: "HuntStarted",
        signature: ITreasureHunt::HuntStarted::SIGNATURE_HASH,
        hunt_id: Some(4),
        from_block: 10,
        to_block: 20,
    };
    let filter = query.to_filter();
    assert_eq!(filter.get_from_block(), Some(10));
    assert_eq!(filter.get_to_block(), Some(20));
    assert!(filter.topics[0].matches(&ITreasureHunt::HuntStarted::SIGNATURE_HASH));
    assert!(filter.topics[1].matches(&hunt_topic(4)));
    assert!(!filter.topics[1].matches(&hunt_topic(5)));

    let narrowed = query.with_range(15, 16);
    assert_eq!((narrowed.from_block, narrowed.to_block), (15, 16));
    assert_eq!(narrowed.hunt_id, Some(4));
}

// ========== Window Tests ==========

#[test]
fn test_window_ends_at_head() {
    let window = BlockWindow::ending_at(1_000_000, DEFAULT_LOOKBACK_BLOCKS);
    assert_eq!(window.from_block, 800_000);
    assert_eq!(window.to_block, 1_000_000);
    assert_eq!(window.block_count(), 200_001);
}

#[test]
fn test_window_saturates_at_genesis() {
    let window = BlockWindow::ending_at(1_234, DEFAULT_LOOKBACK_BLOCKS);
    assert_eq!(window.from_block, 0);
    assert_eq!(window.to_block, 1_234);
}

#[test]
fn test_window_chunks_cover_range() {
    let window = BlockWindow {
        from_block: 0,
        to_block: 12_000,
    };
    let chunks = window.chunks(LOG_QUERY_CHUNK_SIZE);
    let ranges: Vec<_> = chunks
        .iter()
        .map(|chunk| (chunk.from_block, chunk.to_block))
        .collect();
    assert_eq!(ranges, vec![(0, 4_999), (5_000, 9_999), (10_000, 12_000)]);
}

#[test]
fn test_window_single_block() {
    let window = BlockWindow::ending_at(0, 10);
    assert_eq!(window.chunks(5), vec![window]);
}

// ========== Fetcher Tests ==========

#[tokio::test]
async fn test_fetch_decodes_all_streams() {
    let fetcher = EventFetcher::new(two_hunt_chain(), &config(DEFAULT_LOOKBACK_BLOCKS, 5_000));
    let events = fetcher.fetch(None).await.unwrap();
    assert_eq!(events.started.len(), 3);
    assert_eq!(events.answers.len(), 5);
    assert_eq!(events.completed.len(), 2);
}

#[tokio::test]
async fn test_fetch_filters_by_hunt() {
    let fetcher = EventFetcher::new(two_hunt_chain(), &config(DEFAULT_LOOKBACK_BLOCKS, 5_000));
    let events = fetcher.fetch(Some(2)).await.unwrap();
    assert_eq!(events.started.len(), 1);
    assert_eq!(events.answers.len(), 1);
    assert_eq!(events.completed.len(), 1);
    assert!(events.started.iter().all(|event| event.hunt_id == 2));
    assert!(fetcher
        .source()
        .queries
        .lock()
        .unwrap()
        .iter()
        .all(|query| query.hunt_id == Some(2)));
}

#[tokio::test]
async fn test_fetch_ignores_events_before_window() {
    let chain = FakeChain::new(10_000)
        .with_log(100, &started(1, PLAYER_A, 1))
        .with_log(9_500, &started(1, PLAYER_B, 2));
    let fetcher = EventFetcher::new(chain, &config(1_000, 5_000));
    let events = fetcher.fetch(Some(1)).await.unwrap();
    assert_eq!(events.started.len(), 1);
    assert_eq!(events.started[0].player, PLAYER_B);
}

#[tokio::test]
async fn test_fetch_queries_in_chunks() {
    let chain = FakeChain::new(12_000).with_log(7_000, &started(1, PLAYER_A, 1));
    let fetcher = EventFetcher::new(chain, &config(12_000, 5_000));
    let events = fetcher.fetch(None).await.unwrap();
    assert_eq!(events.started.len(), 1);

    for event in ["HuntStarted", "AnswerSubmitted", "HuntCompleted"] {
        let ranges: Vec<_> = fetcher
            .source()
            .queries_for(event)
            .iter()
            .map(|query| (query.from_block, query.to_block))
            .collect();
        assert_eq!(ranges, vec![(0, 4_999), (5_000, 9_999), (10_000, 12_000)]);
    }
}

#[tokio::test]
async fn test_fetch_failure_returns_no_partial_events() {
    let chain = FakeChain {
        failing_event: Some("AnswerSubmitted"),
        ..two_hunt_chain()
    };
    let fetcher = EventFetcher::new(chain, &config(DEFAULT_LOOKBACK_BLOCKS, 5_000));
    let err = fetcher.fetch(Some(1)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Fetch);
    assert!(err.is_retryable());
    assert_eq!(
        err.to_string(),
        "Failed to fetch AnswerSubmitted logs: connection reset"
    );
}

#[tokio::test]
async fn test_fetch_fails_on_malformed_log() {
    let valid = completed(1, PLAYER_A, 400, cusd(1)).encode_log_data();
    let truncated = LogData::new_unchecked(valid.topics().to_vec(), Bytes::from(vec![0u8; 31]));
    let chain = two_hunt_chain().with_raw_log(log_at(30, truncated));
    let fetcher = EventFetcher::new(chain, &config(DEFAULT_LOOKBACK_BLOCKS, 5_000));
    let err = fetcher.fetch(Some(1)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedEvent);
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_fetch_empty_chain_is_ok() {
    let fetcher = EventFetcher::new(FakeChain::new(500), &config(DEFAULT_LOOKBACK_BLOCKS, 5_000));
    let events = fetcher.fetch(Some(1)).await.unwrap();
    assert!(events.is_empty());
    assert_eq!(events, HuntEvents::default());
}

// ========== Feed Tests ==========

#[test]
fn test_feed_starts_idle() {
    let feed = LeaderboardFeed::<HuntLeaderboardEntry>::new();
    assert_eq!(feed.snapshot(), LeaderboardState::Idle);
    assert_eq!(feed.generation(), 0);
}

#[test]
fn test_feed_loading_then_ready() {
    let feed = LeaderboardFeed::<u32>::new();
    let rx = feed.subscribe();
    let ticket = feed.begin();
    assert!(rx.borrow().is_loading());

    assert!(feed.complete(ticket, Ok(vec![1, 2])));
    assert_eq!(*rx.borrow(), LeaderboardState::Ready(vec![1, 2]));
    assert_eq!(feed.snapshot().entries(), Some(&[1, 2][..]));
}

#[test]
fn test_feed_discards_superseded_result() {
    let feed = LeaderboardFeed::<u32>::new();
    let first = feed.begin();
    let second = feed.begin();
    assert!(!feed.is_current(first));

    assert!(!feed.complete(first, Ok(vec![1])));
    assert_eq!(feed.snapshot(), LeaderboardState::Loading);

    assert!(feed.complete(second, Ok(vec![2])));
    assert_eq!(feed.snapshot(), LeaderboardState::Ready(vec![2]));

    // A late completion of the first request still cannot overwrite.
    assert!(!feed.complete(first, Ok(vec![1])));
    assert_eq!(feed.snapshot(), LeaderboardState::Ready(vec![2]));
}

#[test]
fn test_feed_publishes_failure() {
    let feed = LeaderboardFeed::<u32>::new();
    let ticket = feed.begin();
    let err = LeaderboardError::Timeout { seconds: 3 };
    assert!(feed.complete(ticket, Err(err.clone())));
    assert_eq!(feed.snapshot(), LeaderboardState::Failed(err));
}

// ========== Service Tests ==========

#[tokio::test]
async fn test_service_hunt_leaderboard() {
    let service =
        LeaderboardService::from_config(two_hunt_chain(), &config(DEFAULT_LOOKBACK_BLOCKS, 5_000));
    let entries = service.hunt_leaderboard(1).await.unwrap();
    assert_eq!(entries.len(), 2);

    assert_eq!(entries[0].rank, 1);
    assert_eq!(entries[0].player, PLAYER_A);
    assert!(entries[0].is_completed);
    assert_eq!(entries[0].total_time, Some(300));
    assert_eq!(entries[0].clues_completed, 2);
    assert_eq!(entries[0].reward, cusd(5));

    assert_eq!(entries[1].rank, 2);
    assert_eq!(entries[1].player, PLAYER_B);
    assert!(!entries[1].is_completed);
    assert_eq!(entries[1].clues_completed, 1);
    assert!(entries[1].total_time.is_some());
}

#[tokio::test]
async fn test_service_global_leaderboard() {
    let service =
        LeaderboardService::from_config(two_hunt_chain(), &config(DEFAULT_LOOKBACK_BLOCKS, 5_000));
    let entries = service.global_leaderboard().await.unwrap();
    assert_eq!(entries.len(), 2);

    // Both finished one hunt; A earned more.
    assert_eq!(entries[0].player, PLAYER_A);
    assert_eq!(entries[0].total_rewards, cusd(5));
    assert_eq!(entries[1].player, PLAYER_B);
    assert_eq!(entries[1].hunts_completed, 1);
    assert_eq!(entries[1].total_clues_solved, 2);
    assert_eq!(entries[1].best_completion_time, Some(390));
}

#[tokio::test]
async fn test_service_unknown_hunt_is_empty() {
    let service =
        LeaderboardService::from_config(two_hunt_chain(), &config(DEFAULT_LOOKBACK_BLOCKS, 5_000));
    assert_eq!(service.hunt_leaderboard(9).await.unwrap(), vec![]);
}

#[tokio::test]
async fn test_refresh_publishes_ready() {
    let service =
        LeaderboardService::from_config(two_hunt_chain(), &config(DEFAULT_LOOKBACK_BLOCKS, 5_000));
    let feed = LeaderboardFeed::new();
    let entries = service.refresh_hunt(&feed, 1).await.unwrap();
    assert_eq!(feed.snapshot(), LeaderboardState::Ready(entries));
}

#[tokio::test]
async fn test_refresh_publishes_failure() {
    let chain = FakeChain {
        failing_event: Some("HuntCompleted"),
        ..two_hunt_chain()
    };
    let service = LeaderboardService::from_config(chain, &config(DEFAULT_LOOKBACK_BLOCKS, 5_000));
    let feed = LeaderboardFeed::new();
    let err = service.refresh_global(&feed).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Fetch);
    assert_eq!(feed.snapshot(), LeaderboardState::Failed(err));
}

#[tokio::test]
async fn test_refresh_superseded_by_newer_request() {
    let gate = Arc::new(Notify::new());
    let chain = FakeChain {
        gate: Some(gate.clone()),
        ..two_hunt_chain()
    };
    let service = LeaderboardService::from_config(chain, &config(DEFAULT_LOOKBACK_BLOCKS, 5_000));
    let feed = LeaderboardFeed::new();

    // The first refresh stalls on its head lookup until the second finishes.
    let (first, second) = tokio::join!(service.refresh_hunt(&feed, 1), async {
        tokio::task::yield_now().await;
        let result = service.refresh_hunt(&feed, 1).await;
        gate.notify_one();
        result
    });

    assert_eq!(
        first.unwrap_err(),
        LeaderboardError::Superseded { generation: 1 }
    );
    let entries = second.unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(feed.generation(), 2);
    assert_eq!(feed.snapshot(), LeaderboardState::Ready(entries));
}

#[tokio::test(start_paused = true)]
async fn test_fetch_timeout() {
    let service = LeaderboardService::new(
        EventFetcher::new(StalledChain, &config(DEFAULT_LOOKBACK_BLOCKS, 5_000)),
        Some(Duration::from_secs(30)),
    );
    let err = service.hunt_leaderboard(1).await.unwrap_err();
    assert_eq!(err, LeaderboardError::Timeout { seconds: 30 });
    assert_eq!(err.kind(), ErrorKind::Timeout);
    assert!(err.is_retryable());
}

#[tokio::test(start_paused = true)]
async fn test_refresh_timeout_publishes_failure() {
    let service = LeaderboardService::new(
        EventFetcher::new(StalledChain, &config(DEFAULT_LOOKBACK_BLOCKS, 5_000)),
        Some(Duration::from_secs(5)),
    );
    let feed = LeaderboardFeed::new();
    let err = service.refresh_global(&feed).await.unwrap_err();
    assert_eq!(feed.snapshot(), LeaderboardState::Failed(err));
}

// ========== Config Tests ==========

#[test]
fn test_config_defaults() {
    let config = IndexerConfig::new(CONTRACT);
    assert_eq!(config.lookback_blocks, DEFAULT_LOOKBACK_BLOCKS);
    assert_eq!(config.chunk_size, LOG_QUERY_CHUNK_SIZE);
    assert_eq!(config.fetch_timeout(), None);
    assert_eq!(config.validate(), Ok(()));
}

#[test]
fn test_config_rejects_zero_values() {
    let zero_chunk = config(DEFAULT_LOOKBACK_BLOCKS, 0);
    assert_eq!(zero_chunk.validate(), Err(ConfigError::ZeroChunkSize));

    let zero_timeout = IndexerConfig {
        fetch_timeout_secs: Some(0),
        ..IndexerConfig::new(CONTRACT)
    };
    assert_eq!(zero_timeout.validate(), Err(ConfigError::ZeroTimeout));
}

#[test]
fn test_config_parses_flags() {
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        config: IndexerConfig,
    }

    let cli = TestCli::try_parse_from([
        "hunty-leaderboard",
        "--contract",
        "0xcccccccccccccccccccccccccccccccccccccccc",
        "--lookback-blocks",
        "50000",
        "--fetch-timeout-secs",
        "10",
    ])
    .unwrap();
    assert_eq!(cli.config.contract, CONTRACT);
    assert_eq!(cli.config.lookback_blocks, 50_000);
    assert_eq!(cli.config.fetch_timeout(), Some(Duration::from_secs(10)));
}
