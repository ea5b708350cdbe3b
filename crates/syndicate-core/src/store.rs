//! Persistence contracts consumed by the crime engine.
//!
//! The engine is generic over these traits so it runs unchanged against
//! the in-memory store ([`crate::memory::InMemoryStore`]) and the
//! `PostgreSQL` store in `syndicate-db`. Every returned future is `Send`
//! so engine calls can be driven from multi-threaded HTTP handlers.
//!
//! # Write model
//!
//! A resolved attempt produces exactly one [`PlayerDelta`]. Stores apply
//! it atomically and only if the player's `version` still matches the
//! version the delta was computed from; otherwise they report
//! [`CommitResult::Conflict`] and apply nothing. The delta touches a
//! single cooldown entry, so sibling entries for other crimes are never
//! rewritten.

use std::future::Future;

use chrono::{DateTime, Utc};
use syndicate_types::{
    CrimeDefinition, CrimeId, LeaderboardEntry, LeaderboardKind, Player, PlayerId,
};

use crate::error::StoreError;
use crate::rank::RankTable;

/// The single mutation produced by a resolved crime attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerDelta {
    /// The player version this delta was computed against.
    pub expected_version: u64,
    /// Cash to add to cash on hand.
    pub cash_gained: i64,
    /// Experience to add.
    pub xp_gained: u64,
    /// Selects which outcome counter is incremented.
    pub succeeded: bool,
    /// New jail expiry. `None` leaves the stored value untouched.
    pub jailed_until: Option<DateTime<Utc>>,
    /// The crime whose cooldown entry is upserted.
    pub crime_id: CrimeId,
    /// The new last-attempt timestamp for `crime_id`.
    pub attempted_at: DateTime<Utc>,
    /// Rank label recomputed from the post-delta XP.
    pub rank: String,
}

impl PlayerDelta {
    /// Apply the delta to an in-memory player record and bump its version.
    ///
    /// Does not check `expected_version`; that is the store's job.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Corrupt`] if a balance or counter would
    /// overflow.
    pub fn apply(&self, player: &mut Player) -> Result<(), StoreError> {
        let overflow =
            |field: &str| StoreError::Corrupt(format!("{field} overflow for player {}", player.id));

        let cash = player
            .cash
            .checked_add(self.cash_gained)
            .ok_or_else(|| overflow("cash"))?;
        let xp = player
            .xp
            .checked_add(self.xp_gained)
            .ok_or_else(|| overflow("xp"))?;
        let counters = player
            .counters
            .after_attempt(self.succeeded)
            .ok_or_else(|| overflow("attempt counter"))?;
        let version = player
            .version
            .checked_add(1)
            .ok_or_else(|| overflow("version"))?;

        player.cash = cash;
        player.xp = xp;
        player.counters = counters;
        player.rank.clone_from(&self.rank);
        if let Some(until) = self.jailed_until {
            player.jailed_until = Some(until);
        }
        player
            .cooldowns
            .insert(self.crime_id.clone(), self.attempted_at);
        player.version = version;
        Ok(())
    }
}

/// Result of [`PlayerStore::commit_delta`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitResult {
    /// The delta was applied; carries the updated record.
    Committed(Player),
    /// The stored version moved on; nothing was applied.
    Conflict,
}

/// Read and write access to player records.
pub trait PlayerStore: Send + Sync {
    /// Load a full player record, including its cooldown map.
    fn load_player(
        &self,
        id: PlayerId,
    ) -> impl Future<Output = Result<Option<Player>, StoreError>> + Send;

    /// Point read of one crime's last-attempt timestamp.
    fn last_attempt(
        &self,
        id: PlayerId,
        crime_id: &CrimeId,
    ) -> impl Future<Output = Result<Option<DateTime<Utc>>, StoreError>> + Send;

    /// Atomically apply `delta` if the stored version matches.
    ///
    /// Returns [`StoreError::Corrupt`] if the player has vanished.
    fn commit_delta(
        &self,
        id: PlayerId,
        delta: &PlayerDelta,
    ) -> impl Future<Output = Result<CommitResult, StoreError>> + Send;
}

/// Player lifecycle and ranking reads.
pub trait PlayerRegistry: Send + Sync {
    /// Create a new player with zeroed counters holding `rank`.
    ///
    /// Returns [`StoreError::Duplicate`] if the name is taken.
    fn register_player(
        &self,
        name: &str,
        rank: &str,
        now: DateTime<Utc>,
    ) -> impl Future<Output = Result<Player, StoreError>> + Send;

    /// The top `limit` players ordered by `kind`, highest first.
    fn leaderboard(
        &self,
        kind: LeaderboardKind,
        limit: u32,
    ) -> impl Future<Output = Result<Vec<LeaderboardEntry>, StoreError>> + Send;
}

/// Read access to crime definitions, plus the seeding upsert.
pub trait CrimeCatalog: Send + Sync {
    /// Load one crime definition.
    fn load_crime(
        &self,
        id: &CrimeId,
    ) -> impl Future<Output = Result<Option<CrimeDefinition>, StoreError>> + Send;

    /// All crime definitions, ordered by ID.
    fn list_crimes(&self) -> impl Future<Output = Result<Vec<CrimeDefinition>, StoreError>> + Send;

    /// Insert or replace a crime definition.
    fn upsert_crime(
        &self,
        crime: &CrimeDefinition,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Read access to the rank ladder, plus the seeding replace.
pub trait RankTableSource: Send + Sync {
    /// Load and validate the rank table.
    fn load_rank_table(&self) -> impl Future<Output = Result<RankTable, StoreError>> + Send;

    /// Replace the whole rank table.
    fn replace_rank_table(
        &self,
        table: &RankTable,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Everything the engine and API need from one backend.
pub trait GameStore: PlayerStore + PlayerRegistry + CrimeCatalog + RankTableSource + 'static {}

impl<T> GameStore for T where
    T: PlayerStore + PlayerRegistry + CrimeCatalog + RankTableSource + 'static
{
}
