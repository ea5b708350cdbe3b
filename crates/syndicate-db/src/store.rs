//! [`PgStore`]: the engine's store traits over `PostgreSQL`.
//!
//! A committed attempt is one transaction: a guarded `UPDATE` of the
//! player row (`WHERE id = $1 AND version = $2`) plus a keyed upsert of
//! the single `crime_cooldowns` row it touched. If the guarded update
//! matches nothing, the transaction is rolled back and the store reports
//! a conflict (or corruption, if the player row is gone).

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use syndicate_core::RankTable;
use syndicate_core::StoreError;
use syndicate_core::store::{
    CommitResult, CrimeCatalog, PlayerDelta, PlayerRegistry, PlayerStore, RankTableSource,
};
use syndicate_types::{
    CrimeDefinition, CrimeId, LeaderboardEntry, LeaderboardKind, Player, PlayerId,
};
use uuid::Uuid;

use crate::error::DbError;
use crate::postgres::PostgresPool;
use crate::rows::{
    CooldownRow, CrimeRow, LeaderboardRow, PLAYER_COLUMNS, PlayerRow, RankRow,
    rank_table_from_rows, to_bigint,
};

/// A complete game store backed by `PostgreSQL`.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Create a store sharing `pool`'s connections.
    pub fn new(pool: &PostgresPool) -> Self {
        Self {
            pool: pool.pool().clone(),
        }
    }

    async fn fetch_player(&self, id: PlayerId) -> Result<Option<Player>, DbError> {
        let row = sqlx::query_as::<_, PlayerRow>(&format!(
            "SELECT {PLAYER_COLUMNS} FROM players WHERE id = $1"
        ))
        .bind(id.into_inner())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let cooldowns = fetch_cooldowns(&self.pool, row.id).await?;
        row.into_player(cooldowns).map(Some)
    }

    async fn apply_delta(&self, id: PlayerId, delta: &PlayerDelta) -> Result<CommitResult, DbError> {
        let uuid = id.into_inner();
        let (successful, unsuccessful): (i64, i64) = if delta.succeeded { (1, 0) } else { (0, 1) };

        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query_as::<_, PlayerRow>(&format!(
            r"UPDATE players SET
                cash = cash + $3,
                xp = xp + $4,
                attempts_total = attempts_total + 1,
                attempts_successful = attempts_successful + $5,
                attempts_unsuccessful = attempts_unsuccessful + $6,
                jailed_until = COALESCE($7, jailed_until),
                rank = $8,
                version = version + 1
              WHERE id = $1 AND version = $2
              RETURNING {PLAYER_COLUMNS}"
        ))
        .bind(uuid)
        .bind(to_bigint("expected_version", delta.expected_version)?)
        .bind(delta.cash_gained)
        .bind(to_bigint("xp_gained", delta.xp_gained)?)
        .bind(successful)
        .bind(unsuccessful)
        .bind(delta.jailed_until)
        .bind(&delta.rank)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = updated else {
            tx.rollback().await?;
            let exists: Option<i64> =
                sqlx::query_scalar("SELECT version FROM players WHERE id = $1")
                    .bind(uuid)
                    .fetch_optional(&self.pool)
                    .await?;
            return match exists {
                Some(stored) => {
                    tracing::debug!(
                        player_id = %id,
                        stored,
                        expected = delta.expected_version,
                        "Version mismatch on commit"
                    );
                    Ok(CommitResult::Conflict)
                }
                None => Err(DbError::InvalidRow(format!(
                    "player {id} vanished before commit"
                ))),
            };
        };

        sqlx::query(
            r"INSERT INTO crime_cooldowns (player_id, crime_id, last_attempt_at)
              VALUES ($1, $2, $3)
              ON CONFLICT (player_id, crime_id) DO UPDATE SET
                last_attempt_at = EXCLUDED.last_attempt_at",
        )
        .bind(uuid)
        .bind(delta.crime_id.as_str())
        .bind(delta.attempted_at)
        .execute(&mut *tx)
        .await?;

        let cooldowns = fetch_cooldowns(&mut *tx, uuid).await?;
        tx.commit().await?;

        tracing::debug!(player_id = %id, version = row.version, "Committed attempt delta");
        row.into_player(cooldowns).map(CommitResult::Committed)
    }

    async fn insert_player(
        &self,
        name: &str,
        rank: &str,
        now: DateTime<Utc>,
    ) -> Result<Player, DbError> {
        let player = Player::new(PlayerId::new(), name.to_owned(), rank.to_owned(), now);
        sqlx::query(
            r"INSERT INTO players (id, name, rank, created_at)
              VALUES ($1, $2, $3, $4)",
        )
        .bind(player.id.into_inner())
        .bind(&player.name)
        .bind(&player.rank)
        .bind(player.created_at)
        .execute(&self.pool)
        .await?;
        Ok(player)
    }

    async fn top_players(
        &self,
        kind: LeaderboardKind,
        limit: u32,
    ) -> Result<Vec<LeaderboardEntry>, DbError> {
        let query = match kind {
            LeaderboardKind::Xp => {
                r"SELECT id, name, rank, xp, cash FROM players
                  ORDER BY xp DESC, created_at ASC
                  LIMIT $1"
            }
            LeaderboardKind::Cash => {
                r"SELECT id, name, rank, xp, cash FROM players
                  ORDER BY cash DESC, created_at ASC
                  LIMIT $1"
            }
        };
        let rows = sqlx::query_as::<_, LeaderboardRow>(query)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter()
            .zip(1_u32..)
            .map(|(row, position)| row.into_entry(position))
            .collect()
    }

    async fn fetch_crime(&self, id: &CrimeId) -> Result<Option<CrimeDefinition>, DbError> {
        let row = sqlx::query_as::<_, CrimeRow>(
            r"SELECT id, name, description, min_reward, max_reward,
                     success_rate, cooldown_secs, xp_award
              FROM crimes
              WHERE id = $1",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;
        row.map(CrimeDefinition::try_from).transpose()
    }

    async fn fetch_crimes(&self) -> Result<Vec<CrimeDefinition>, DbError> {
        let rows = sqlx::query_as::<_, CrimeRow>(
            r"SELECT id, name, description, min_reward, max_reward,
                     success_rate, cooldown_secs, xp_award
              FROM crimes
              ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(CrimeDefinition::try_from).collect()
    }

    async fn write_crime(&self, crime: &CrimeDefinition) -> Result<(), DbError> {
        sqlx::query(
            r"INSERT INTO crimes
              (id, name, description, min_reward, max_reward, success_rate, cooldown_secs, xp_award)
              VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
              ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                description = EXCLUDED.description,
                min_reward = EXCLUDED.min_reward,
                max_reward = EXCLUDED.max_reward,
                success_rate = EXCLUDED.success_rate,
                cooldown_secs = EXCLUDED.cooldown_secs,
                xp_award = EXCLUDED.xp_award",
        )
        .bind(crime.id.as_str())
        .bind(&crime.name)
        .bind(&crime.description)
        .bind(crime.min_reward)
        .bind(crime.max_reward)
        .bind(crime.success_rate)
        .bind(to_bigint("cooldown_secs", crime.cooldown_secs)?)
        .bind(to_bigint("xp_award", crime.xp_award)?)
        .execute(&self.pool)
        .await?;

        tracing::debug!(crime_id = %crime.id, "Upserted crime definition");
        Ok(())
    }

    async fn fetch_rank_table(&self) -> Result<RankTable, DbError> {
        let rows = sqlx::query_as::<_, RankRow>(
            r"SELECT label, min_xp FROM ranks ORDER BY position",
        )
        .fetch_all(&self.pool)
        .await?;

        if rows.is_empty() {
            tracing::warn!("Rank table is empty, using the built-in ladder");
            return Ok(RankTable::default());
        }
        rank_table_from_rows(rows)
    }

    async fn write_rank_table(&self, table: &RankTable) -> Result<(), DbError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM ranks").execute(&mut *tx).await?;
        for (position, tier) in (0_i32..).zip(table.tiers()) {
            sqlx::query("INSERT INTO ranks (position, label, min_xp) VALUES ($1, $2, $3)")
                .bind(position)
                .bind(&tier.label)
                .bind(to_bigint("min_xp", tier.min_xp)?)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        tracing::debug!(tiers = table.tiers().len(), "Replaced rank table");
        Ok(())
    }
}

async fn fetch_cooldowns<'e, E>(executor: E, id: Uuid) -> Result<Vec<CooldownRow>, DbError>
where
    E: sqlx::PgExecutor<'e>,
{
    let rows = sqlx::query_as::<_, CooldownRow>(
        r"SELECT crime_id, last_attempt_at
          FROM crime_cooldowns
          WHERE player_id = $1",
    )
    .bind(id)
    .fetch_all(executor)
    .await?;
    Ok(rows)
}

impl PlayerStore for PgStore {
    async fn load_player(&self, id: PlayerId) -> Result<Option<Player>, StoreError> {
        Ok(self.fetch_player(id).await?)
    }

    async fn last_attempt(
        &self,
        id: PlayerId,
        crime_id: &CrimeId,
    ) -> Result<Option<DateTime<Utc>>, StoreError> {
        let last = sqlx::query_scalar::<_, DateTime<Utc>>(
            r"SELECT last_attempt_at
              FROM crime_cooldowns
              WHERE player_id = $1 AND crime_id = $2",
        )
        .bind(id.into_inner())
        .bind(crime_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::from)?;
        Ok(last)
    }

    async fn commit_delta(
        &self,
        id: PlayerId,
        delta: &PlayerDelta,
    ) -> Result<CommitResult, StoreError> {
        Ok(self.apply_delta(id, delta).await?)
    }
}

impl PlayerRegistry for PgStore {
    async fn register_player(
        &self,
        name: &str,
        rank: &str,
        now: DateTime<Utc>,
    ) -> Result<Player, StoreError> {
        Ok(self.insert_player(name, rank, now).await?)
    }

    async fn leaderboard(
        &self,
        kind: LeaderboardKind,
        limit: u32,
    ) -> Result<Vec<LeaderboardEntry>, StoreError> {
        Ok(self.top_players(kind, limit).await?)
    }
}

impl CrimeCatalog for PgStore {
    async fn load_crime(&self, id: &CrimeId) -> Result<Option<CrimeDefinition>, StoreError> {
        Ok(self.fetch_crime(id).await?)
    }

    async fn list_crimes(&self) -> Result<Vec<CrimeDefinition>, StoreError> {
        Ok(self.fetch_crimes().await?)
    }

    async fn upsert_crime(&self, crime: &CrimeDefinition) -> Result<(), StoreError> {
        Ok(self.write_crime(crime).await?)
    }
}

impl RankTableSource for PgStore {
    async fn load_rank_table(&self) -> Result<RankTable, StoreError> {
        Ok(self.fetch_rank_table().await?)
    }

    async fn replace_rank_table(&self, table: &RankTable) -> Result<(), StoreError> {
        Ok(self.write_rank_table(table).await?)
    }
}
