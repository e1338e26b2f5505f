use alloy::primitives::{B256, U256};
use alloy::rpc::types::Log;
use alloy::sol_types::SolEvent;
use hunty_leaderboard::{AnswerSubmitted, HuntCompleted, HuntStarted, LeaderboardError};

alloy::sol! {
    /// Leaderboard-relevant events of the treasure hunt contract.
    interface ITreasureHunt {
        event HuntStarted(uint256 indexed huntId, address indexed player, uint256 timestamp);
        event AnswerSubmitted(
            uint256 indexed huntId,
            address indexed player,
            uint256 clueIndex,
            bool correct,
            uint256 timestamp
        );
        event HuntCompleted(
            uint256 indexed huntId,
            address indexed player,
            uint256 completionTime,
            uint256 totalReward,
            uint256 leaderboardPosition
        );
    }
}

/// A decoded contract event paired with its ABI definition.
pub trait LedgerEvent: Sized + Send {
    type Abi: SolEvent;

    const NAME: &'static str;

    fn from_abi(event: Self::Abi, block: u64) -> Result<Self, LeaderboardError>;
}

impl LedgerEvent for HuntStarted {
    type Abi = ITreasureHunt::HuntStarted;

    const NAME: &'static str = "HuntStarted";

    fn from_abi(event: Self::Abi, block: u64) -> Result<Self, LeaderboardError> {
        Ok(HuntStarted {
            hunt_id: narrow::<Self>(block, "huntId", event.huntId)?,
            player: event.player,
            timestamp: narrow::<Self>(block, "timestamp", event.timestamp)?,
        })
    }
}

impl LedgerEvent for AnswerSubmitted {
    type Abi = ITreasureHunt::AnswerSubmitted;

    const NAME: &'static str = "AnswerSubmitted";

    fn from_abi(event: Self::Abi, block: u64) -> Result<Self, LeaderboardError> {
        Ok(AnswerSubmitted {
            hunt_id: narrow::<Self>(block, "huntId", event.huntId)?,
            player: event.player,
            clue_index: narrow::<Self>(block, "clueIndex", event.clueIndex)?,
            correct: event.correct,
            timestamp: narrow::<Self>(block, "timestamp", event.timestamp)?,
        })
    }
}

impl LedgerEvent for HuntCompleted {
    type Abi = ITreasureHunt::HuntCompleted;

    const NAME: &'static str = "HuntCompleted";

    fn from_abi(event: Self::Abi, block: u64) -> Result<Self, LeaderboardError> {
        Ok(HuntCompleted {
            hunt_id: narrow::<Self>(block, "huntId", event.huntId)?,
            player: event.player,
            completion_time: narrow::<Self>(block, "completionTime", event.completionTime)?,
            total_reward: event.totalReward,
            leaderboard_position: narrow::<Self>(
                block,
                "leaderboardPosition",
                event.leaderboardPosition,
            )?,
        })
    }
}

/// Decodes one log. Wrong topics, short data or oversized numbers are all
/// reported as `MalformedEvent`.
pub fn decode_log<E: LedgerEvent>(log: &Log) -> Result<E, LeaderboardError> {
    let block = log.block_number.unwrap_or_default();
    let decoded = log
        .log_decode::<E::Abi>()
        .map_err(|err| LeaderboardError::MalformedEvent {
            event: E::NAME,
            block,
            reason: err.to_string(),
        })?;
    E::from_abi(decoded.inner.data, block)
}

/// Decodes every log, failing on the first malformed one.
pub fn decode_logs<E: LedgerEvent>(logs: &[Log]) -> Result<Vec<E>, LeaderboardError> {
    logs.iter().map(decode_log::<E>).collect()
}

/// Topic value of an indexed `uint256 huntId`.
pub fn hunt_topic(hunt_id: u64) -> B256 {
    B256::from(U256::from(hunt_id))
}

fn narrow<E: LedgerEvent>(block: u64, field: &str, value: U256) -> Result<u64, LeaderboardError> {
    u64::try_from(value).map_err(|_| LeaderboardError::MalformedEvent {
        event: E::NAME,
        block,
        reason: format!("{field} does not fit in u64"),
    })
}
