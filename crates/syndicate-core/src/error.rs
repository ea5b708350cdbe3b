//! Error types for the syndicate-core crate.
//!
//! [`StoreError`] is what every store implementation reports;
//! [`EngineError`] is what callers of the crime engine see. Gate
//! rejections (jail, cooldown) are not errors: they are ordinary
//! [`AttemptOutcome`](syndicate_types::AttemptOutcome) variants.

use syndicate_types::{CrimeId, PlayerId};

/// Errors reported by a persistence backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backend could not be reached or timed out. Safe to retry.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Stored data violates a documented invariant.
    #[error("corrupt stored data: {0}")]
    Corrupt(String),

    /// A uniqueness constraint rejected the write.
    #[error("duplicate entry: {0}")]
    Duplicate(String),
}

/// Errors returned by the crime engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// No player with this ID exists.
    #[error("player not found: {0}")]
    PlayerNotFound(PlayerId),

    /// No crime with this ID exists in the catalog.
    #[error("crime not found: {0}")]
    CrimeNotFound(CrimeId),

    /// A player with this name is already registered.
    #[error("player name already taken: {0}")]
    DuplicatePlayer(String),

    /// A client-supplied value was rejected before touching the store.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Stored data violates an invariant (negative cooldown, inconsistent
    /// counters, overflow). The request fails and nothing is repaired.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// A concurrent write won the race twice in a row.
    #[error("persistence conflict for player {player_id}")]
    PersistenceConflict {
        /// The contended player.
        player_id: PlayerId,
    },

    /// The store was unreachable or timed out. Nothing was applied.
    #[error("persistence unavailable: {0}")]
    PersistenceUnavailable(String),

    /// An internal invariant of the engine itself broke.
    #[error("internal error: {0}")]
    Internal(String),
}

impl EngineError {
    /// Whether the caller may safely retry the whole request.
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::PersistenceConflict { .. } | Self::PersistenceUnavailable(_)
        )
    }
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(msg) => Self::PersistenceUnavailable(msg),
            StoreError::Corrupt(msg) => Self::InvalidState(msg),
            StoreError::Duplicate(msg) => Self::DuplicatePlayer(msg),
        }
    }
}
