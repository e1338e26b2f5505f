use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

// ========== Decoded Events ==========

/// A player began a hunt. The contract emits this once per (hunt, player), but
/// overlapping log queries can deliver it more than once.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HuntStarted {
    pub hunt_id: u64,
    pub player: Address,
    pub timestamp: u64,
}

/// One answer attempt, correct or not.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerSubmitted {
    pub hunt_id: u64,
    pub player: Address,
    pub clue_index: u64,
    pub correct: bool,
    pub timestamp: u64,
}

/// A player solved every clue of a hunt and was paid out.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HuntCompleted {
    pub hunt_id: u64,
    pub player: Address,
    pub completion_time: u64,
    /// Reward in cUSD base units (18 decimals).
    pub total_reward: U256,
    pub leaderboard_position: u64,
}

/// Everything one fetch produced, each sequence in emission order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HuntEvents {
    pub started: Vec<HuntStarted>,
    pub answers: Vec<AnswerSubmitted>,
    pub completed: Vec<HuntCompleted>,
}

impl HuntEvents {
    pub fn is_empty(&self) -> bool {
        self.started.is_empty() && self.answers.is_empty() && self.completed.is_empty()
    }

    pub fn len(&self) -> usize {
        self.started.len() + self.answers.len() + self.completed.len()
    }
}

// ========== Leaderboard Entries ==========

/// One row of a single hunt's leaderboard.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HuntLeaderboardEntry {
    pub rank: u32,
    pub player: Address,
    pub clues_completed: u32,
    /// Seconds from start to completion, or elapsed so far while in progress.
    /// `None` when a completion was seen without any start event.
    pub total_time: Option<u64>,
    pub is_completed: bool,
    /// Reward paid on completion; zero while in progress.
    pub reward: U256,
}

/// One row of the cross-hunt leaderboard.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalLeaderboardEntry {
    pub rank: u32,
    pub player: Address,
    pub hunts_completed: u32,
    pub total_rewards: U256,
    pub total_clues_solved: u32,
    pub best_completion_time: Option<u64>,
}

/// Aggregate numbers for one hunt, derived from its leaderboard.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HuntStatistics {
    pub total_players: u32,
    pub completed_count: u32,
    pub completion_rate_percent: u32,
    pub total_clues_solved: u64,
    pub average_clues_solved: u32,
    pub total_rewards_paid: U256,
    pub fastest_time: Option<u64>,
}
