use crate::types::{GlobalLeaderboardEntry, HuntLeaderboardEntry};
use alloy_primitives::Address;
use core::cmp::Ordering;

/// Rows that carry a rank and a player used as the final tie-break.
pub trait Ranked {
    fn player(&self) -> &Address;
    fn rank(&self) -> u32;
    fn set_rank(&mut self, rank: u32);
}

impl Ranked for HuntLeaderboardEntry {
    fn player(&self) -> &Address {
        &self.player
    }

    fn rank(&self) -> u32 {
        self.rank
    }

    fn set_rank(&mut self, rank: u32) {
        self.rank = rank;
    }
}

impl Ranked for GlobalLeaderboardEntry {
    fn player(&self) -> &Address {
        &self.player
    }

    fn rank(&self) -> u32 {
        self.rank
    }

    fn set_rank(&mut self, rank: u32) {
        self.rank = rank;
    }
}

/// Order: completed first; completed by total time asc (unknown last);
/// in progress by clues completed desc.
pub fn compare_hunt_entries(a: &HuntLeaderboardEntry, b: &HuntLeaderboardEntry) -> Ordering {
    b.is_completed
        .cmp(&a.is_completed)
        .then_with(|| {
            if a.is_completed {
                none_last(a.total_time, b.total_time)
            } else {
                b.clues_completed.cmp(&a.clues_completed)
            }
        })
        .then_with(|| a.player.cmp(&b.player))
}

/// Order: hunts completed desc, total rewards desc, best completion time asc
/// (no completion last).
pub fn compare_global_entries(a: &GlobalLeaderboardEntry, b: &GlobalLeaderboardEntry) -> Ordering {
    b.hunts_completed
        .cmp(&a.hunts_completed)
        .then_with(|| b.total_rewards.cmp(&a.total_rewards))
        .then_with(|| none_last(a.best_completion_time, b.best_completion_time))
        .then_with(|| a.player.cmp(&b.player))
}

/// Sorts `entries` with `compare` and stamps ranks 1..=N.
pub fn rank_by<T, F>(entries: &mut [T], compare: F)
where
    T: Ranked,
    F: FnMut(&T, &T) -> Ordering,
{
    entries.sort_by(compare);
    for (position, entry) in entries.iter_mut().enumerate() {
        entry.set_rank(u32::try_from(position + 1).unwrap_or(u32::MAX));
    }
}

fn none_last(a: Option<u64>, b: Option<u64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
