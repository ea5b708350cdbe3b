//! Row types and their conversion into domain values.
//!
//! `PostgreSQL` has no unsigned integers, so XP, counters, versions,
//! cooldowns, and awards are stored as `BIGINT`. Converting back rejects
//! negative values as [`DbError::InvalidRow`] instead of clamping them.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use syndicate_core::RankTable;
use syndicate_types::{
    AttemptCounters, CrimeDefinition, CrimeId, LeaderboardEntry, Player, PlayerId, RankTier,
};
use uuid::Uuid;

use crate::error::DbError;

/// Column list matching [`PlayerRow`].
pub(crate) const PLAYER_COLUMNS: &str = "id, name, cash, bank, xp, rank, attempts_total, \
     attempts_successful, attempts_unsuccessful, jailed_until, version, created_at";

/// A row from the `players` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PlayerRow {
    /// Player ID.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Cash on hand.
    pub cash: i64,
    /// Banked cash.
    pub bank: i64,
    /// Experience.
    pub xp: i64,
    /// Rank label.
    pub rank: String,
    /// Total attempts.
    pub attempts_total: i64,
    /// Successful attempts.
    pub attempts_successful: i64,
    /// Failed attempts.
    pub attempts_unsuccessful: i64,
    /// Jail expiry.
    pub jailed_until: Option<DateTime<Utc>>,
    /// Optimistic concurrency version.
    pub version: i64,
    /// Registration time.
    pub created_at: DateTime<Utc>,
}

impl PlayerRow {
    /// Assemble a [`Player`] from this row and its cooldown rows.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::InvalidRow`] if a counter is negative.
    pub fn into_player(self, cooldowns: Vec<CooldownRow>) -> Result<Player, DbError> {
        let id = PlayerId::from(self.id);
        let unsigned = |field: &str, value: i64| {
            u64::try_from(value).map_err(|e| {
                DbError::InvalidRow(format!("player {id} has {field} {value}: {e}"))
            })
        };

        Ok(Player {
            id,
            name: self.name,
            cash: self.cash,
            bank: self.bank,
            xp: unsigned("xp", self.xp)?,
            rank: self.rank,
            counters: AttemptCounters {
                total: unsigned("attempts_total", self.attempts_total)?,
                successful: unsigned("attempts_successful", self.attempts_successful)?,
                unsuccessful: unsigned("attempts_unsuccessful", self.attempts_unsuccessful)?,
            },
            jailed_until: self.jailed_until,
            cooldowns: cooldowns
                .into_iter()
                .map(|row| (CrimeId::from(row.crime_id), row.last_attempt_at))
                .collect::<BTreeMap<_, _>>(),
            version: unsigned("version", self.version)?,
            created_at: self.created_at,
        })
    }
}

/// A row from the `crime_cooldowns` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CooldownRow {
    /// The crime attempted.
    pub crime_id: String,
    /// When it was last attempted.
    pub last_attempt_at: DateTime<Utc>,
}

/// A row from the `crimes` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CrimeRow {
    /// Crime slug.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Flavour text.
    pub description: String,
    /// Minimum reward.
    pub min_reward: i64,
    /// Maximum reward.
    pub max_reward: i64,
    /// Success probability.
    pub success_rate: f64,
    /// Cooldown and jail duration in seconds.
    pub cooldown_secs: i64,
    /// XP awarded on success.
    pub xp_award: i64,
}

impl TryFrom<CrimeRow> for CrimeDefinition {
    type Error = DbError;

    fn try_from(row: CrimeRow) -> Result<Self, Self::Error> {
        let cooldown_secs = u64::try_from(row.cooldown_secs).map_err(|e| {
            DbError::InvalidRow(format!(
                "crime {} has negative cooldown {}: {e}",
                row.id, row.cooldown_secs
            ))
        })?;
        let xp_award = u64::try_from(row.xp_award).map_err(|e| {
            DbError::InvalidRow(format!(
                "crime {} has negative xp_award {}: {e}",
                row.id, row.xp_award
            ))
        })?;
        Ok(Self {
            id: CrimeId::from(row.id),
            name: row.name,
            description: row.description,
            min_reward: row.min_reward,
            max_reward: row.max_reward,
            success_rate: row.success_rate,
            cooldown_secs,
            xp_award,
        })
    }
}

/// A row from the `ranks` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RankRow {
    /// Rank label.
    pub label: String,
    /// XP threshold.
    pub min_xp: i64,
}

/// Build a validated ladder from rows in ascending `position` order.
///
/// # Errors
///
/// Returns [`DbError::InvalidRow`] if a threshold is negative or the
/// ladder shape is wrong.
pub fn rank_table_from_rows(rows: Vec<RankRow>) -> Result<RankTable, DbError> {
    let tiers = rows
        .into_iter()
        .map(|row| {
            u64::try_from(row.min_xp)
                .map(|min_xp| RankTier::new(row.label.clone(), min_xp))
                .map_err(|e| {
                    DbError::InvalidRow(format!(
                        "rank {:?} has negative threshold {}: {e}",
                        row.label, row.min_xp
                    ))
                })
        })
        .collect::<Result<Vec<_>, _>>()?;
    RankTable::new(tiers).map_err(|e| DbError::InvalidRow(format!("rank table: {e}")))
}

/// A row from a leaderboard query.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LeaderboardRow {
    /// Player ID.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Rank label.
    pub rank: String,
    /// Experience.
    pub xp: i64,
    /// Cash on hand.
    pub cash: i64,
}

impl LeaderboardRow {
    /// Convert into an entry at 1-based `position`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::InvalidRow`] if XP is negative.
    pub fn into_entry(self, position: u32) -> Result<LeaderboardEntry, DbError> {
        let xp = u64::try_from(self.xp).map_err(|e| {
            DbError::InvalidRow(format!("player {} has xp {}: {e}", self.id, self.xp))
        })?;
        Ok(LeaderboardEntry {
            position,
            player_id: PlayerId::from(self.id),
            name: self.name,
            rank: self.rank,
            xp,
            cash: self.cash,
        })
    }
}

/// Convert an unsigned domain value for a `BIGINT` column.
///
/// # Errors
///
/// Returns [`DbError::InvalidRow`] if `value` exceeds `i64::MAX`.
pub fn to_bigint(field: &str, value: u64) -> Result<i64, DbError> {
    i64::try_from(value)
        .map_err(|e| DbError::InvalidRow(format!("{field} {value} exceeds BIGINT: {e}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn crime_row(cooldown_secs: i64) -> CrimeRow {
        CrimeRow {
            id: "mugging".to_owned(),
            name: "Mugging".to_owned(),
            description: String::new(),
            min_reward: 10,
            max_reward: 20,
            success_rate: 0.5,
            cooldown_secs,
            xp_award: 4,
        }
    }

    fn player_row() -> PlayerRow {
        PlayerRow {
            id: Uuid::now_v7(),
            name: "Dom".to_owned(),
            cash: 10,
            bank: 0,
            xp: 3,
            rank: "Street Rat".to_owned(),
            attempts_total: 2,
            attempts_successful: 1,
            attempts_unsuccessful: 1,
            jailed_until: None,
            version: 2,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn negative_cooldown_is_invalid() {
        let result = CrimeDefinition::try_from(crime_row(-5));
        assert!(matches!(result, Err(DbError::InvalidRow(_))));
    }

    #[test]
    fn crime_row_converts() {
        let crime = CrimeDefinition::try_from(crime_row(60)).unwrap();
        assert_eq!(crime.cooldown_secs, 60);
        assert_eq!(crime.id.as_str(), "mugging");
    }

    #[test]
    fn player_row_assembles_cooldowns() {
        let now = Utc::now();
        let player = player_row()
            .into_player(vec![CooldownRow {
                crime_id: "mugging".to_owned(),
                last_attempt_at: now,
            }])
            .unwrap();
        assert_eq!(player.counters.total, 2);
        assert_eq!(player.version, 2);
        assert_eq!(player.last_attempt(&CrimeId::from("mugging")), Some(now));
    }

    #[test]
    fn negative_xp_is_invalid() {
        let mut row = player_row();
        row.xp = -1;
        assert!(matches!(
            row.into_player(Vec::new()),
            Err(DbError::InvalidRow(_))
        ));
    }

    #[test]
    fn rank_rows_are_validated() {
        let ok = rank_table_from_rows(vec![
            RankRow { label: "A".to_owned(), min_xp: 0 },
            RankRow { label: "B".to_owned(), min_xp: 50 },
        ])
        .unwrap();
        assert_eq!(ok.evaluate(50), "B");

        let unordered = rank_table_from_rows(vec![
            RankRow { label: "A".to_owned(), min_xp: 0 },
            RankRow { label: "B".to_owned(), min_xp: 0 },
        ]);
        assert!(unordered.is_err());
    }

    #[test]
    fn oversized_values_do_not_fit_bigint() {
        assert!(to_bigint("xp", u64::MAX).is_err());
        assert_eq!(to_bigint("xp", 7).unwrap(), 7);
    }
}
