use crate::config::IndexerConfig;
use crate::feed::LeaderboardFeed;
use crate::fetcher::EventFetcher;
use crate::source::LogSource;
use hunty_leaderboard::{
    GlobalLeaderboardEntry, HuntEvents, HuntLeaderboardEntry, Leaderboard, LeaderboardError,
};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Fetches events and turns them into ranked leaderboards.
///
/// Nothing is cached: every call reads the chain again.
pub struct LeaderboardService<S> {
    fetcher: EventFetcher<S>,
    fetch_timeout: Option<Duration>,
}

impl<S: LogSource> LeaderboardService<S> {
    pub fn new(fetcher: EventFetcher<S>, fetch_timeout: Option<Duration>) -> Self {
        Self {
            fetcher,
            fetch_timeout,
        }
    }

    pub fn from_config(source: S, config: &IndexerConfig) -> Self {
        Self::new(EventFetcher::new(source, config), config.fetch_timeout())
    }

    pub fn fetcher(&self) -> &EventFetcher<S> {
        &self.fetcher
    }

    pub async fn hunt_leaderboard(
        &self,
        hunt_id: u64,
    ) -> Result<Vec<HuntLeaderboardEntry>, LeaderboardError> {
        let events = self.fetch(Some(hunt_id)).await?;
        Ok(Leaderboard::hunt_leaderboard(hunt_id, &events, unix_now()))
    }

    pub async fn global_leaderboard(&self) -> Result<Vec<GlobalLeaderboardEntry>, LeaderboardError> {
        let events = self.fetch(None).await?;
        Ok(Leaderboard::global_leaderboard(&events))
    }

    /// Recomputes one hunt's board into `feed`.
    pub async fn refresh_hunt(
        &self,
        feed: &LeaderboardFeed<HuntLeaderboardEntry>,
        hunt_id: u64,
    ) -> Result<Vec<HuntLeaderboardEntry>, LeaderboardError> {
        self.refresh(feed, Some(hunt_id), |events| {
            Leaderboard::hunt_leaderboard(hunt_id, events, unix_now())
        })
        .await
    }

    /// Recomputes the global board into `feed`.
    pub async fn refresh_global(
        &self,
        feed: &LeaderboardFeed<GlobalLeaderboardEntry>,
    ) -> Result<Vec<GlobalLeaderboardEntry>, LeaderboardError> {
        self.refresh(feed, None, Leaderboard::global_leaderboard).await
    }

    async fn refresh<T, F>(
        &self,
        feed: &LeaderboardFeed<T>,
        hunt_id: Option<u64>,
        build: F,
    ) -> Result<Vec<T>, LeaderboardError>
    where
        T: Clone,
        F: FnOnce(&HuntEvents) -> Vec<T>,
    {
        let ticket = feed.begin();
        let superseded = LeaderboardError::Superseded {
            generation: ticket.generation,
        };

        let result = match self.fetch(hunt_id).await {
            Ok(events) => {
                // A newer refresh owns the feed now; skip the aggregation.
                if !feed.is_current(ticket) {
                    tracing::warn!(
                        generation = ticket.generation,
                        "Leaderboard refresh superseded before aggregation"
                    );
                    return Err(superseded);
                }
                Ok(build(&events))
            }
            Err(err) => {
                tracing::warn!(generation = ticket.generation, "Leaderboard refresh failed: {err}");
                Err(err)
            }
        };

        if feed.complete(ticket, result.clone()) {
            result
        } else {
            Err(superseded)
        }
    }

    async fn fetch(&self, hunt_id: Option<u64>) -> Result<HuntEvents, LeaderboardError> {
        match self.fetch_timeout {
            Some(limit) => tokio::time::timeout(limit, self.fetcher.fetch(hunt_id))
                .await
                .map_err(|_| LeaderboardError::Timeout {
                    seconds: limit.as_secs(),
                })?,
            None => self.fetcher.fetch(hunt_id).await,
        }
    }
}

/// Seconds since the Unix epoch, used as `now` for unfinished players.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default()
}
