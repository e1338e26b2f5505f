use alloy_primitives::{Address, U256};
use std::collections::{BTreeMap, BTreeSet};

/// Running totals for one player, rebuilt from events on every computation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParticipantAccumulator {
    pub player: Address,
    /// Earliest `HuntStarted` timestamp observed.
    pub start_time: Option<u64>,
    /// Distinct `(hunt_id, clue_index)` pairs answered correctly. Clue indices
    /// repeat across hunts, so the hunt id is part of the key.
    pub solved_clues: BTreeSet<(u64, u64)>,
    /// Earliest completion timestamp observed.
    pub completion_time: Option<u64>,
    /// Reward per distinct completed hunt.
    pub completed_hunts: BTreeMap<u64, U256>,
}

impl ParticipantAccumulator {
    pub fn new(player: Address) -> Self {
        Self {
            player,
            start_time: None,
            solved_clues: BTreeSet::new(),
            completion_time: None,
            completed_hunts: BTreeMap::new(),
        }
    }

    pub fn record_start(&mut self, timestamp: u64) {
        self.start_time = Some(earliest(self.start_time, timestamp));
    }

    /// Returns false if the clue was already counted.
    pub fn complete_clue(&mut self, hunt_id: u64, clue_index: u64) -> bool {
        self.solved_clues.insert((hunt_id, clue_index))
    }

    pub fn has_completed_clue(&self, hunt_id: u64, clue_index: u64) -> bool {
        self.solved_clues.contains(&(hunt_id, clue_index))
    }

    /// Records a completion. A repeated completion of the same hunt only moves
    /// the completion time earlier; its reward is not counted twice.
    pub fn complete_hunt(&mut self, hunt_id: u64, completion_time: u64, reward: U256) -> bool {
        self.completion_time = Some(earliest(self.completion_time, completion_time));
        if self.completed_hunts.contains_key(&hunt_id) {
            return false;
        }
        self.completed_hunts.insert(hunt_id, reward);
        true
    }

    pub fn is_completed(&self) -> bool {
        self.completion_time.is_some()
    }

    pub fn clues_solved(&self) -> u32 {
        saturating_u32(self.solved_clues.len())
    }

    pub fn hunts_completed(&self) -> u32 {
        saturating_u32(self.completed_hunts.len())
    }

    pub fn total_rewards(&self) -> U256 {
        self.completed_hunts
            .values()
            .fold(U256::ZERO, |acc, reward| acc.saturating_add(*reward))
    }

    /// Completion minus start when finished, otherwise time elapsed at `now`.
    pub fn total_time(&self, now: u64) -> Option<u64> {
        let start = self.start_time?;
        let end = self.completion_time.unwrap_or(now);
        Some(end.saturating_sub(start))
    }
}

/// Accumulators keyed by player address. Iteration is in address order.
#[derive(Clone, Debug, Default)]
pub struct Participants {
    entries: BTreeMap<Address, ParticipantAccumulator>,
}

impl Participants {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, player: &Address) -> Option<&ParticipantAccumulator> {
        self.entries.get(player)
    }

    pub fn get_mut(&mut self, player: &Address) -> Option<&mut ParticipantAccumulator> {
        self.entries.get_mut(player)
    }

    pub fn get_or_insert(&mut self, player: Address) -> &mut ParticipantAccumulator {
        self.entries
            .entry(player)
            .or_insert_with(|| ParticipantAccumulator::new(player))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParticipantAccumulator> {
        self.entries.values()
    }
}

fn earliest(current: Option<u64>, candidate: u64) -> u64 {
    current.map_or(candidate, |existing| existing.min(candidate))
}

fn saturating_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}
