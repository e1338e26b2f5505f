use hunty_leaderboard::LeaderboardError;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;

/// What a leaderboard view currently shows.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LeaderboardState<T> {
    Idle,
    Loading,
    Ready(Vec<T>),
    Failed(LeaderboardError),
}

impl<T> LeaderboardState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, LeaderboardState::Loading)
    }

    pub fn entries(&self) -> Option<&[T]> {
        match self {
            LeaderboardState::Ready(entries) => Some(entries),
            _ => None,
        }
    }
}

/// Issued by [`LeaderboardFeed::begin`]; identifies one refresh.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RequestTicket {
    pub generation: u64,
}

/// Publishes leaderboard results to subscribers, newest request wins.
///
/// Every refresh takes a ticket. A result is published only while its
/// ticket is still the latest one issued; older results are dropped, so a
/// slow earlier fetch can never overwrite a newer view.
pub struct LeaderboardFeed<T> {
    generation: AtomicU64,
    tx: watch::Sender<LeaderboardState<T>>,
}

impl<T: Clone> LeaderboardFeed<T> {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(LeaderboardState::Idle);
        Self {
            generation: AtomicU64::new(0),
            tx,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<LeaderboardState<T>> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> LeaderboardState<T> {
        self.tx.borrow().clone()
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Starts a refresh: supersedes any in-flight request and shows `Loading`.
    pub fn begin(&self) -> RequestTicket {
        let mut generation = 0;
        self.tx.send_modify(|state| {
            generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            *state = LeaderboardState::Loading;
        });
        tracing::debug!(generation, "Leaderboard refresh started");
        RequestTicket { generation }
    }

    pub fn is_current(&self, ticket: RequestTicket) -> bool {
        self.generation() == ticket.generation
    }

    /// Publishes the outcome of `ticket`'s request. Returns false and leaves
    /// the view untouched when a newer request has begun since.
    pub fn complete(
        &self,
        ticket: RequestTicket,
        result: Result<Vec<T>, LeaderboardError>,
    ) -> bool {
        // Checked under the channel lock so `begin` cannot interleave.
        let published = self.tx.send_if_modified(|state| {
            if !self.is_current(ticket) {
                return false;
            }
            *state = match result {
                Ok(entries) => LeaderboardState::Ready(entries),
                Err(err) => LeaderboardState::Failed(err),
            };
            true
        });
        if !published {
            tracing::warn!(
                generation = ticket.generation,
                latest = self.generation(),
                "Discarding superseded leaderboard result"
            );
        }
        published
    }
}

impl<T: Clone> Default for LeaderboardFeed<T> {
    fn default() -> Self {
        Self::new()
    }
}
