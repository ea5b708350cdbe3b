//! In-process implementation of every store trait.
//!
//! Used by the server when no database is configured, and by tests. All
//! state lives behind `tokio` read-write locks; the version check in
//! [`PlayerStore::commit_delta`] runs under the write lock so it is
//! atomic with the apply.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use syndicate_types::{
    CrimeDefinition, CrimeId, LeaderboardEntry, LeaderboardKind, Player, PlayerId,
};
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::rank::RankTable;
use crate::store::{
    CommitResult, CrimeCatalog, PlayerDelta, PlayerRegistry, PlayerStore, RankTableSource,
};

/// A complete game store held in memory.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    players: RwLock<BTreeMap<PlayerId, Player>>,
    crimes: RwLock<BTreeMap<CrimeId, CrimeDefinition>>,
    ranks: RwLock<RankTable>,
}

impl InMemoryStore {
    /// Create an empty store with the default rank ladder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-loaded with a catalog and rank ladder.
    pub fn with_catalog(crimes: Vec<CrimeDefinition>, ranks: RankTable) -> Self {
        let crimes = crimes
            .into_iter()
            .map(|crime| (crime.id.clone(), crime))
            .collect();
        Self {
            players: RwLock::new(BTreeMap::new()),
            crimes: RwLock::new(crimes),
            ranks: RwLock::new(ranks),
        }
    }

    /// Insert or overwrite a player record verbatim.
    ///
    /// Bypasses the engine; used for seeding fixtures and by the
    /// collaborators that own cash (bank, casino) in tests.
    pub async fn put_player(&self, player: Player) {
        self.players.write().await.insert(player.id, player);
    }
}

impl PlayerStore for InMemoryStore {
    async fn load_player(&self, id: PlayerId) -> Result<Option<Player>, StoreError> {
        Ok(self.players.read().await.get(&id).cloned())
    }

    async fn last_attempt(
        &self,
        id: PlayerId,
        crime_id: &CrimeId,
    ) -> Result<Option<DateTime<Utc>>, StoreError> {
        Ok(self
            .players
            .read()
            .await
            .get(&id)
            .and_then(|player| player.last_attempt(crime_id)))
    }

    async fn commit_delta(
        &self,
        id: PlayerId,
        delta: &PlayerDelta,
    ) -> Result<CommitResult, StoreError> {
        let mut players = self.players.write().await;
        let player = players
            .get_mut(&id)
            .ok_or_else(|| StoreError::Corrupt(format!("player {id} vanished before commit")))?;

        if player.version != delta.expected_version {
            tracing::debug!(
                player_id = %id,
                stored = player.version,
                expected = delta.expected_version,
                "Version mismatch on commit"
            );
            return Ok(CommitResult::Conflict);
        }

        let mut updated = player.clone();
        delta.apply(&mut updated)?;
        player.clone_from(&updated);
        Ok(CommitResult::Committed(updated))
    }
}

impl PlayerRegistry for InMemoryStore {
    async fn register_player(
        &self,
        name: &str,
        rank: &str,
        now: DateTime<Utc>,
    ) -> Result<Player, StoreError> {
        let mut players = self.players.write().await;
        if players.values().any(|p| p.name.eq_ignore_ascii_case(name)) {
            return Err(StoreError::Duplicate(format!("player name {name:?}")));
        }
        let player = Player::new(PlayerId::new(), name.to_owned(), rank.to_owned(), now);
        players.insert(player.id, player.clone());
        Ok(player)
    }

    async fn leaderboard(
        &self,
        kind: LeaderboardKind,
        limit: u32,
    ) -> Result<Vec<LeaderboardEntry>, StoreError> {
        let players = self.players.read().await;
        let mut ranked: Vec<&Player> = players.values().collect();
        match kind {
            LeaderboardKind::Xp => ranked.sort_by(|a, b| {
                b.xp.cmp(&a.xp)
                    .then_with(|| a.created_at.cmp(&b.created_at))
            }),
            LeaderboardKind::Cash => ranked.sort_by(|a, b| {
                b.cash
                    .cmp(&a.cash)
                    .then_with(|| a.created_at.cmp(&b.created_at))
            }),
        }

        let take = usize::try_from(limit).unwrap_or(usize::MAX);
        Ok(ranked
            .into_iter()
            .take(take)
            .zip(1_u32..)
            .map(|(player, position)| LeaderboardEntry {
                position,
                player_id: player.id,
                name: player.name.clone(),
                rank: player.rank.clone(),
                xp: player.xp,
                cash: player.cash,
            })
            .collect())
    }
}

impl CrimeCatalog for InMemoryStore {
    async fn load_crime(&self, id: &CrimeId) -> Result<Option<CrimeDefinition>, StoreError> {
        Ok(self.crimes.read().await.get(id).cloned())
    }

    async fn list_crimes(&self) -> Result<Vec<CrimeDefinition>, StoreError> {
        Ok(self.crimes.read().await.values().cloned().collect())
    }

    async fn upsert_crime(&self, crime: &CrimeDefinition) -> Result<(), StoreError> {
        self.crimes
            .write()
            .await
            .insert(crime.id.clone(), crime.clone());
        Ok(())
    }
}

impl RankTableSource for InMemoryStore {
    async fn load_rank_table(&self) -> Result<RankTable, StoreError> {
        Ok(self.ranks.read().await.clone())
    }

    async fn replace_rank_table(&self, table: &RankTable) -> Result<(), StoreError> {
        *self.ranks.write().await = table.clone();
        Ok(())
    }
}
