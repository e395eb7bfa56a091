// ⚠️ Error Taxonomy - per-feed fatal conditions
//
// Transport and schema failures are fatal for the feed they belong to.
// Value failures never reach this type (they resolve to defaults in the
// decoder) and lookup misses are plain `None`.

use crate::decoder::FeedKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FeedError {
    /// Feed unreachable, or the server answered with a non-success status
    #[error("Failed to fetch {feed} feed from {url}: {message}")]
    Transport {
        feed: FeedKind,
        url: String,
        message: String,
    },

    /// Body could not be tokenized into CSV records
    #[error("Malformed {feed} feed at line {line}: {message}")]
    Malformed {
        feed: FeedKind,
        line: u64,
        message: String,
    },

    #[error("{feed} feed has no header row")]
    MissingHeader { feed: FeedKind },

    #[error("{feed} feed is missing required column '{column}'")]
    MissingColumn { feed: FeedKind, column: String },
}

impl FeedError {
    /// Which feed failed
    pub fn feed(&self) -> FeedKind {
        match self {
            FeedError::Transport { feed, .. }
            | FeedError::Malformed { feed, .. }
            | FeedError::MissingHeader { feed }
            | FeedError::MissingColumn { feed, .. } => *feed,
        }
    }

    /// Schema failures are handled exactly like transport failures by
    /// callers, but it is still useful to tell them apart in logs.
    pub fn is_schema_failure(&self) -> bool {
        matches!(
            self,
            FeedError::MissingHeader { .. } | FeedError::MissingColumn { .. }
        )
    }
}

pub type FeedResult<T> = Result<T, FeedError>;
