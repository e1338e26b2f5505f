use thiserror::Error;

/// Numeric error kind handed to the presentation layer.
#[derive(Clone, Copy, Debug, Eq, PartialEq, PartialOrd, Ord, Hash)]
#[repr(u32)]
pub enum ErrorKind {
    Fetch = 1,
    MalformedEvent = 2,
    Timeout = 3,
    Superseded = 4,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LeaderboardError {
    #[error("Failed to fetch {what}: {message}")]
    Fetch { what: String, message: String },
    #[error("Malformed {event} event at block {block}: {reason}")]
    MalformedEvent {
        event: &'static str,
        block: u64,
        reason: String,
    },
    #[error("Leaderboard fetch timed out after {seconds}s")]
    Timeout { seconds: u64 },
    #[error("Leaderboard request {generation} was superseded")]
    Superseded { generation: u64 },
}

impl LeaderboardError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::from(self)
    }

    /// True for errors the user can clear by refreshing the view.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LeaderboardError::Fetch { .. } | LeaderboardError::Timeout { .. }
        )
    }
}

impl From<&LeaderboardError> for ErrorKind {
    fn from(err: &LeaderboardError) -> Self {
        match err {
            LeaderboardError::Fetch { .. } => ErrorKind::Fetch,
            LeaderboardError::MalformedEvent { .. } => ErrorKind::MalformedEvent,
            LeaderboardError::Timeout { .. } => ErrorKind::Timeout,
            LeaderboardError::Superseded { .. } => ErrorKind::Superseded,
        }
    }
}

impl From<LeaderboardError> for ErrorKind {
    fn from(err: LeaderboardError) -> Self {
        ErrorKind::from(&err)
    }
}
