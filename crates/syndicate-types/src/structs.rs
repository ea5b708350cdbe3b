//! Core entity structs for the Syndicate game backend.
//!
//! Covers the persistent [`Player`] record, the read-only
//! [`CrimeDefinition`] catalog entry, rank ladder tiers, and the
//! read-model projections served to clients.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::{CrimeId, PlayerId};

// ---------------------------------------------------------------------------
// AttemptCounters
// ---------------------------------------------------------------------------

/// Lifetime crime attempt counters for a player.
///
/// `total` always equals `successful + unsuccessful`; the counters only
/// move through [`AttemptCounters::after_attempt`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct AttemptCounters {
    /// Every resolved attempt (gated calls do not count).
    pub total: u64,
    /// Attempts that rolled a success.
    pub successful: u64,
    /// Attempts that rolled a failure.
    pub unsuccessful: u64,
}

impl AttemptCounters {
    /// Return the counters after one more resolved attempt.
    ///
    /// Returns `None` if any counter would overflow.
    pub fn after_attempt(self, succeeded: bool) -> Option<Self> {
        let total = self.total.checked_add(1)?;
        if succeeded {
            Some(Self {
                total,
                successful: self.successful.checked_add(1)?,
                unsuccessful: self.unsuccessful,
            })
        } else {
            Some(Self {
                total,
                successful: self.successful,
                unsuccessful: self.unsuccessful.checked_add(1)?,
            })
        }
    }

    /// Check the `total == successful + unsuccessful` invariant.
    pub fn is_consistent(&self) -> bool {
        self.successful
            .checked_add(self.unsuccessful)
            .is_some_and(|sum| sum == self.total)
    }
}

// ---------------------------------------------------------------------------
// Player
// ---------------------------------------------------------------------------

/// The persistent record of a registered player.
///
/// The crime engine owns `xp`, `rank`, `counters`, `jailed_until`, and
/// `cooldowns`. Cash and bank balances are shared with the economy
/// collaborators (bank, property, casino). `version` increments on every
/// committed change and backs optimistic concurrency in the stores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Player {
    /// Unique player identifier.
    pub id: PlayerId,
    /// Display name chosen at registration.
    pub name: String,
    /// Cash on hand.
    pub cash: i64,
    /// Bank balance.
    pub bank: i64,
    /// Accumulated experience. Never decreases.
    pub xp: u64,
    /// Rank label derived from `xp`; always recomputed, never patched.
    pub rank: String,
    /// Lifetime attempt counters.
    pub counters: AttemptCounters,
    /// When the current jail sentence ends. `None` means never jailed.
    /// A value in the past is a served sentence and no longer blocks.
    pub jailed_until: Option<DateTime<Utc>>,
    /// Timestamp of the last attempt of each crime. A missing entry means
    /// the crime has never been attempted.
    pub cooldowns: BTreeMap<CrimeId, DateTime<Utc>>,
    /// Optimistic concurrency version.
    pub version: u64,
    /// When the player registered.
    pub created_at: DateTime<Utc>,
}

impl Player {
    /// Create a freshly registered player with zeroed counters, no
    /// cooldowns, and no jail sentence.
    pub fn new(id: PlayerId, name: String, rank: String, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name,
            cash: 0,
            bank: 0,
            xp: 0,
            rank,
            counters: AttemptCounters::default(),
            jailed_until: None,
            cooldowns: BTreeMap::new(),
            version: 0,
            created_at,
        }
    }

    /// When the given crime was last attempted, if ever.
    pub fn last_attempt(&self, crime_id: &CrimeId) -> Option<DateTime<Utc>> {
        self.cooldowns.get(crime_id).copied()
    }

    /// Whether a jail sentence is still being served at `now`.
    pub fn is_jailed(&self, now: DateTime<Utc>) -> bool {
        self.jailed_until.is_some_and(|until| until > now)
    }
}

// ---------------------------------------------------------------------------
// CrimeDefinition
// ---------------------------------------------------------------------------

/// A crime players can attempt, as authored in the catalog.
///
/// Read-only from the engine's perspective: a snapshot is loaded at the
/// start of each attempt and never written back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct CrimeDefinition {
    /// Catalog slug.
    pub id: CrimeId,
    /// Display name.
    pub name: String,
    /// Flavour text shown in the catalog.
    #[serde(default)]
    pub description: String,
    /// Smallest cash reward on success (inclusive).
    pub min_reward: i64,
    /// Largest cash reward on success (inclusive).
    pub max_reward: i64,
    /// Probability of success in `[0, 1]`.
    pub success_rate: f64,
    /// Per-crime cooldown, and jail sentence length on failure, in seconds.
    pub cooldown_secs: u64,
    /// Experience awarded on success.
    pub xp_award: u64,
}

// ---------------------------------------------------------------------------
// RankTier
// ---------------------------------------------------------------------------

/// One rung of the rank ladder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct RankTier {
    /// Rank label shown to players.
    pub label: String,
    /// Minimum XP required to hold this rank.
    pub min_xp: u64,
}

impl RankTier {
    /// Convenience constructor.
    pub fn new(label: impl Into<String>, min_xp: u64) -> Self {
        Self {
            label: label.into(),
            min_xp,
        }
    }
}

// ---------------------------------------------------------------------------
// Read models
// ---------------------------------------------------------------------------

/// A single leaderboard row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct LeaderboardEntry {
    /// One-based position on the board.
    pub position: u32,
    /// The ranked player.
    pub player_id: PlayerId,
    /// Player display name.
    pub name: String,
    /// Current rank label.
    pub rank: String,
    /// Accumulated experience.
    pub xp: u64,
    /// Cash on hand.
    pub cash: i64,
}

/// Jail and cooldown status of one player for one crime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TimerStatus {
    /// The player queried.
    pub player_id: PlayerId,
    /// The crime queried.
    pub crime_id: CrimeId,
    /// Active jail expiry, `None` when free.
    pub jailed_until: Option<DateTime<Utc>>,
    /// Whole seconds left in jail (rounded up).
    pub jail_remaining_secs: Option<u64>,
    /// When the crime was last attempted.
    pub last_attempt_at: Option<DateTime<Utc>>,
    /// Whole seconds left on this crime's cooldown (rounded up).
    pub cooldown_remaining_secs: Option<u64>,
    /// Whether an attempt right now would pass both gates.
    pub available: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_track_success_and_failure() {
        let counters = AttemptCounters::default()
            .after_attempt(true)
            .and_then(|c| c.after_attempt(false))
            .and_then(|c| c.after_attempt(true));
        assert_eq!(
            counters,
            Some(AttemptCounters {
                total: 3,
                successful: 2,
                unsuccessful: 1,
            })
        );
        assert!(counters.is_some_and(|c| c.is_consistent()));
    }

    #[test]
    fn counters_refuse_overflow() {
        let counters = AttemptCounters {
            total: u64::MAX,
            successful: u64::MAX,
            unsuccessful: 0,
        };
        assert_eq!(counters.after_attempt(true), None);
    }

    #[test]
    fn inconsistent_counters_detected() {
        let counters = AttemptCounters {
            total: 5,
            successful: 1,
            unsuccessful: 1,
        };
        assert!(!counters.is_consistent());
    }

    #[test]
    fn stale_jail_does_not_block() {
        let now = Utc::now();
        let mut player = Player::new(PlayerId::new(), "Vito".to_owned(), "Thug".to_owned(), now);
        player.jailed_until = Some(now - chrono::TimeDelta::seconds(1));
        assert!(!player.is_jailed(now));

        player.jailed_until = Some(now);
        assert!(!player.is_jailed(now), "expiry equal to now is served");

        player.jailed_until = Some(now + chrono::TimeDelta::seconds(1));
        assert!(player.is_jailed(now));
    }

    #[test]
    fn crime_definition_parses_from_json() {
        let json = r#"{
            "id": "pickpocket",
            "name": "Pickpocket",
            "min_reward": 5,
            "max_reward": 20,
            "success_rate": 0.8,
            "cooldown_secs": 20,
            "xp_award": 3
        }"#;
        let crime: Result<CrimeDefinition, _> = serde_json::from_str(json);
        assert!(crime.is_ok());
        let crime = crime.ok();
        assert_eq!(crime.as_ref().map(|c| c.id.as_str()), Some("pickpocket"));
        assert_eq!(crime.map(|c| c.description), Some(String::new()));
    }
}
