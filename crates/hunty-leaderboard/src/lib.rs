//! Event-derived leaderboards for Hunty treasure hunts.
//!
//! Folds decoded contract events into per-player accumulators and ranks them.
//! Nothing here performs I/O; fetching lives in `hunty-indexer`.

use crate::progress::Participants;
use crate::ranking::{compare_global_entries, compare_hunt_entries, rank_by, Ranked};
use alloy_primitives::{Address, U256};

pub use crate::amount::{format_cusd, CUSD_DECIMALS};
pub use crate::errors::{ErrorKind, LeaderboardError};
pub use crate::progress::ParticipantAccumulator;
pub use crate::types::{
    AnswerSubmitted, GlobalLeaderboardEntry, HuntCompleted, HuntEvents, HuntLeaderboardEntry,
    HuntStarted, HuntStatistics,
};

/// Maximum number of entries `top` will return.
pub const MAX_LEADERBOARD_SIZE: usize = 100;

pub struct Leaderboard;

impl Leaderboard {
    /// Builds the ranked leaderboard for one hunt.
    ///
    /// # Arguments
    /// * `hunt_id` - The hunt to rank; events for other hunts are ignored
    /// * `events` - Events fetched for the lookback window
    /// * `now` - Unix seconds used as the end time of unfinished runs
    ///
    /// # Returns
    /// Entries sorted by rank. Completed players come first, fastest first;
    /// players still in progress follow, most clues first. An in-progress
    /// `total_time` depends on `now`, so it changes between live calls.
    pub fn hunt_leaderboard(
        hunt_id: u64,
        events: &HuntEvents,
        now: u64,
    ) -> Vec<HuntLeaderboardEntry> {
        let participants = Self::accumulate_hunt(hunt_id, events);

        let mut entries: Vec<HuntLeaderboardEntry> = participants
            .iter()
            .map(|p| HuntLeaderboardEntry {
                rank: 0,
                player: p.player,
                clues_completed: p.clues_solved(),
                total_time: p.total_time(now),
                is_completed: p.is_completed(),
                reward: p.total_rewards(),
            })
            .collect();
        rank_by(&mut entries, compare_hunt_entries);
        entries
    }

    /// Builds the ranked leaderboard across every hunt in `events`.
    ///
    /// Ranking is by hunts completed, then total rewards, then best
    /// completion time; players without a completion sort after those with one.
    pub fn global_leaderboard(events: &HuntEvents) -> Vec<GlobalLeaderboardEntry> {
        let participants = Self::accumulate_global(events);

        let mut entries: Vec<GlobalLeaderboardEntry> = participants
            .iter()
            .map(|p| GlobalLeaderboardEntry {
                rank: 0,
                player: p.player,
                hunts_completed: p.hunts_completed(),
                total_rewards: p.total_rewards(),
                total_clues_solved: p.clues_solved(),
                best_completion_time: p.completion_time,
            })
            .collect();
        rank_by(&mut entries, compare_global_entries);
        entries
    }

    /// Folds one hunt's events into accumulators.
    ///
    /// Starts come first so that answers only count for players who began the
    /// hunt; completions create a missing accumulator rather than drop it.
    pub fn accumulate_hunt(hunt_id: u64, events: &HuntEvents) -> Participants {
        let mut participants = Participants::new();

        for started in events.started.iter().filter(|e| e.hunt_id == hunt_id) {
            participants
                .get_or_insert(started.player)
                .record_start(started.timestamp);
        }

        for answer in events
            .answers
            .iter()
            .filter(|e| e.hunt_id == hunt_id && e.correct)
        {
            if let Some(progress) = participants.get_mut(&answer.player) {
                progress.complete_clue(answer.hunt_id, answer.clue_index);
            }
        }

        for completed in events.completed.iter().filter(|e| e.hunt_id == hunt_id) {
            participants.get_or_insert(completed.player).complete_hunt(
                completed.hunt_id,
                completed.completion_time,
                completed.total_reward,
            );
        }

        participants
    }

    /// Folds events from every hunt into accumulators. Any event creates the
    /// player's accumulator.
    pub fn accumulate_global(events: &HuntEvents) -> Participants {
        let mut participants = Participants::new();

        for started in &events.started {
            participants
                .get_or_insert(started.player)
                .record_start(started.timestamp);
        }

        for answer in &events.answers {
            let progress = participants.get_or_insert(answer.player);
            if answer.correct {
                progress.complete_clue(answer.hunt_id, answer.clue_index);
            }
        }

        for completed in &events.completed {
            participants.get_or_insert(completed.player).complete_hunt(
                completed.hunt_id,
                completed.completion_time,
                completed.total_reward,
            );
        }

        participants
    }

    /// Returns at most `limit` leading entries, capped at `MAX_LEADERBOARD_SIZE`.
    pub fn top<T: Clone>(entries: &[T], limit: usize) -> Vec<T> {
        let effective_limit = core::cmp::min(limit, MAX_LEADERBOARD_SIZE);
        entries.iter().take(effective_limit).cloned().collect()
    }

    /// Returns the 1-based rank of `player`, or `None` if they are not on the board.
    pub fn player_rank<T: Ranked>(entries: &[T], player: &Address) -> Option<u32> {
        entries
            .iter()
            .find(|entry| entry.player() == player)
            .map(Ranked::rank)
    }

    /// Aggregate statistics for a hunt: players, completion rate, clues, rewards.
    pub fn hunt_statistics(entries: &[HuntLeaderboardEntry]) -> HuntStatistics {
        let total_players = u32::try_from(entries.len()).unwrap_or(u32::MAX);
        let mut completed_count: u32 = 0;
        let mut total_clues_solved: u64 = 0;
        let mut total_rewards_paid = U256::ZERO;
        let mut fastest_time: Option<u64> = None;

        for entry in entries {
            total_clues_solved += u64::from(entry.clues_completed);
            if entry.is_completed {
                completed_count += 1;
                total_rewards_paid = total_rewards_paid.saturating_add(entry.reward);
                if let Some(time) = entry.total_time {
                    fastest_time = Some(fastest_time.map_or(time, |best| best.min(time)));
                }
            }
        }

        let completion_rate_percent = if total_players > 0 {
            (u64::from(completed_count) * 100 / u64::from(total_players)) as u32
        } else {
            0
        };
        let average_clues_solved = if total_players > 0 {
            (total_clues_solved / u64::from(total_players)) as u32
        } else {
            0
        };

        HuntStatistics {
            total_players,
            completed_count,
            completion_rate_percent,
            total_clues_solved,
            average_clues_solved,
            total_rewards_paid,
            fastest_time,
        }
    }
}

pub mod amount;
mod errors;
pub mod progress;
pub mod ranking;
mod types;
