//! Repository error type.

use radar_core::db::DatabaseError;
use thiserror::Error;

use crate::nasa::NasaError;

/// Failure of one refresh or eviction.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("network: {0}")]
    Network(#[from] NasaError),

    #[error("parse: {0}")]
    Parse(#[from] radar_core::Error),

    #[error("store: {0}")]
    Store(#[from] DatabaseError),
}

/// Coarse category of a [`SyncError`], for logs and staleness indicators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncErrorKind {
    Network,
    Parse,
    Store,
}

impl SyncErrorKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Parse => "parse",
            Self::Store => "store",
        }
    }
}

impl std::fmt::Display for SyncErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl SyncError {
    pub const fn kind(&self) -> SyncErrorKind {
        match self {
            Self::Network(_) => SyncErrorKind::Network,
            Self::Parse(_) => SyncErrorKind::Parse,
            Self::Store(_) => SyncErrorKind::Store,
        }
    }
}
