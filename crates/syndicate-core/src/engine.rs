//! The crime engine: orchestration around [`resolve_attempt`].
//!
//! [`CrimeEngine::attempt_crime`] is the single write path for crime
//! attempts. For one call it:
//!
//! 1. loads and validates the crime definition,
//! 2. takes the player's in-process lock,
//! 3. loads the player and the cached rank table,
//! 4. resolves the attempt with the engine's dice,
//! 5. commits the resulting delta under the store's version check.
//!
//! A version conflict means another writer (another process sharing the
//! database) got in first. The whole resolution is retried once against a
//! fresh read, so the retry sees the winner's cooldown or jail; a second
//! conflict is surfaced as [`EngineError::PersistenceConflict`].
//!
//! Every store call is bounded by the configured timeout. The engine never
//! reads the wall clock; `now` is always supplied by the caller.

use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use syndicate_types::{
    AttemptOutcome, AttemptResponse, CrimeDefinition, CrimeId, LeaderboardEntry,
    LeaderboardKind, Player, PlayerId, TimerStatus,
};
use tracing::{debug, error, info, warn};

use crate::dice::Dice;
use crate::error::{EngineError, StoreError};
use crate::locks::PlayerLocks;
use crate::narrative::narrate;
use crate::policy::FailureXpPolicy;
use crate::rank::{RankCache, RankTable};
use crate::resolve::{Resolved, resolve_attempt, validate_crime, validate_player};
use crate::store::{CommitResult, GameStore};
use crate::timers;

/// How many times a conflicting commit is retried before giving up.
pub const MAX_CONFLICT_RETRIES: u32 = 1;

/// Default bound on a single store call.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(2);

/// Leaderboard size when the caller does not ask for one.
pub const DEFAULT_LEADERBOARD_LIMIT: u32 = 10;

/// Largest leaderboard a caller may request.
pub const MAX_LEADERBOARD_LIMIT: u32 = 100;

/// Longest accepted player name, in characters.
pub const MAX_NAME_LEN: usize = 32;

/// Everything a caller needs after an attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// What happened.
    pub outcome: AttemptOutcome,
    /// The player after the attempt (unchanged for gated outcomes).
    pub player: Player,
    /// The crime that was attempted.
    pub crime: CrimeDefinition,
    /// Player-facing narrative line.
    pub message: String,
    /// The `now` the attempt was resolved against.
    pub attempted_at: DateTime<Utc>,
}

impl Resolution {
    /// The player's rank after the attempt.
    pub fn rank(&self) -> &str {
        &self.player.rank
    }

    /// Flatten into the wire response.
    pub fn into_response(self) -> AttemptResponse {
        AttemptResponse::new(&self.outcome, self.message, self.player, self.attempted_at)
    }
}

/// Crime attempt orchestration over a [`GameStore`] and a [`Dice`].
#[derive(Debug)]
pub struct CrimeEngine<S, D> {
    store: Arc<S>,
    dice: Mutex<D>,
    locks: PlayerLocks,
    ranks: RankCache,
    policy: FailureXpPolicy,
    store_timeout: Duration,
}

impl<S: GameStore, D: Dice + Send> CrimeEngine<S, D> {
    /// Create an engine with no failure XP and the default store timeout.
    pub fn new(store: Arc<S>, dice: D) -> Self {
        Self {
            store,
            dice: Mutex::new(dice),
            locks: PlayerLocks::new(),
            ranks: RankCache::new(),
            policy: FailureXpPolicy::default(),
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    /// Set the consolation XP policy for failed attempts.
    #[must_use]
    pub fn with_failure_xp(mut self, policy: FailureXpPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the bound on each store call.
    #[must_use]
    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    /// The backing store.
    pub const fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// The active failure XP policy.
    pub const fn failure_xp(&self) -> FailureXpPolicy {
        self.policy
    }

    /// Attempt `crime_id` as `player_id` at `now`.
    ///
    /// Jail and cooldown rejections are successful calls carrying a gated
    /// [`AttemptOutcome`]; only lookup, data, and persistence failures are
    /// errors.
    ///
    /// # Errors
    ///
    /// - [`EngineError::CrimeNotFound`] / [`EngineError::PlayerNotFound`]
    /// - [`EngineError::InvalidState`] if stored data breaks an invariant
    /// - [`EngineError::PersistenceConflict`] after a repeated version conflict
    /// - [`EngineError::PersistenceUnavailable`] if the store fails or times out
    pub async fn attempt_crime(
        &self,
        player_id: PlayerId,
        crime_id: &CrimeId,
        now: DateTime<Utc>,
    ) -> Result<Resolution, EngineError> {
        self.attempt_inner(player_id, crime_id, now)
            .await
            .inspect_err(|err| log_failure(player_id, crime_id, err))
    }

    async fn attempt_inner(
        &self,
        player_id: PlayerId,
        crime_id: &CrimeId,
        now: DateTime<Utc>,
    ) -> Result<Resolution, EngineError> {
        let crime = self.crime(crime_id).await?;
        validate_crime(&crime)?;

        let _guard = self.locks.acquire(player_id).await;
        let ranks = self.rank_table().await?;

        let mut conflicts: u32 = 0;
        loop {
            let player = self.player(player_id).await?;
            validate_player(&player)?;

            let Resolved { outcome, delta } = self.roll(&player, &crime, &ranks, now)?;
            let Some(delta) = delta else {
                debug!(
                    player_id = %player_id,
                    crime_id = %crime.id,
                    outcome = ?outcome.kind(),
                    remaining_secs = outcome.remaining_secs(),
                    "Attempt gated"
                );
                let message = narrate(&outcome, &crime);
                return Ok(Resolution {
                    outcome,
                    player,
                    crime,
                    message,
                    attempted_at: now,
                });
            };

            match self
                .bounded("commit_delta", self.store.commit_delta(player_id, &delta))
                .await?
            {
                CommitResult::Committed(updated) => {
                    info!(
                        player_id = %player_id,
                        crime_id = %crime.id,
                        outcome = ?outcome.kind(),
                        reward = outcome.reward(),
                        xp_gained = outcome.xp_gained(),
                        rank = %updated.rank,
                        "Crime attempt resolved"
                    );
                    let message = narrate(&outcome, &crime);
                    return Ok(Resolution {
                        outcome,
                        player: updated,
                        crime,
                        message,
                        attempted_at: now,
                    });
                }
                CommitResult::Conflict if conflicts < MAX_CONFLICT_RETRIES => {
                    conflicts = conflicts.saturating_add(1);
                    warn!(
                        player_id = %player_id,
                        crime_id = %crime.id,
                        expected_version = delta.expected_version,
                        "Version conflict on commit, retrying"
                    );
                }
                CommitResult::Conflict => {
                    return Err(EngineError::PersistenceConflict { player_id });
                }
            }
        }
    }

    /// Jail and cooldown status of one crime for one player at `now`.
    ///
    /// # Errors
    ///
    /// Not-found, invalid-state, and persistence errors as for
    /// [`CrimeEngine::attempt_crime`].
    pub async fn timer_status(
        &self,
        player_id: PlayerId,
        crime_id: &CrimeId,
        now: DateTime<Utc>,
    ) -> Result<TimerStatus, EngineError> {
        let crime = self.crime(crime_id).await?;
        let player = self.player(player_id).await?;
        let last = self
            .bounded(
                "last_attempt",
                self.store.last_attempt(player_id, crime_id),
            )
            .await?;
        timers::timer_status(
            player_id,
            crime.id,
            player.jailed_until,
            last,
            crime.cooldown_secs,
            now,
        )
        .inspect_err(|err| log_failure(player_id, crime_id, err))
    }

    /// Register a new player at the lowest rank.
    ///
    /// # Errors
    ///
    /// - [`EngineError::InvalidInput`] if the name is blank, too long, or
    ///   contains characters other than letters, digits, space, `_`, `-`
    /// - [`EngineError::DuplicatePlayer`] if the name is taken
    pub async fn register_player(
        &self,
        name: &str,
        now: DateTime<Utc>,
    ) -> Result<Player, EngineError> {
        let name = validate_name(name)?;
        let ranks = self.rank_table().await?;
        let player = self
            .bounded(
                "register_player",
                self.store.register_player(name, ranks.lowest(), now),
            )
            .await?;
        info!(player_id = %player.id, name = %player.name, "Player registered");
        Ok(player)
    }

    /// Load one player.
    ///
    /// # Errors
    ///
    /// [`EngineError::PlayerNotFound`] or a persistence error.
    pub async fn player(&self, player_id: PlayerId) -> Result<Player, EngineError> {
        self.bounded("load_player", self.store.load_player(player_id))
            .await?
            .ok_or(EngineError::PlayerNotFound(player_id))
    }

    /// Load one crime definition.
    ///
    /// # Errors
    ///
    /// [`EngineError::CrimeNotFound`] or a persistence error.
    pub async fn crime(&self, crime_id: &CrimeId) -> Result<CrimeDefinition, EngineError> {
        self.bounded("load_crime", self.store.load_crime(crime_id))
            .await?
            .ok_or_else(|| EngineError::CrimeNotFound(crime_id.clone()))
    }

    /// The whole crime catalog.
    ///
    /// # Errors
    ///
    /// Persistence errors only.
    pub async fn crimes(&self) -> Result<Vec<CrimeDefinition>, EngineError> {
        self.bounded("list_crimes", self.store.list_crimes()).await
    }

    /// The top players by `kind`.
    ///
    /// `limit` is clamped to `1..=MAX_LEADERBOARD_LIMIT`.
    ///
    /// # Errors
    ///
    /// Persistence errors only.
    pub async fn leaderboard(
        &self,
        kind: LeaderboardKind,
        limit: u32,
    ) -> Result<Vec<LeaderboardEntry>, EngineError> {
        let limit = limit.clamp(1, MAX_LEADERBOARD_LIMIT);
        self.bounded("leaderboard", self.store.leaderboard(kind, limit))
            .await
    }

    /// The rank ladder, loaded once and cached.
    ///
    /// # Errors
    ///
    /// Persistence errors on a cache miss.
    pub async fn rank_table(&self) -> Result<Arc<RankTable>, EngineError> {
        self.bounded("load_rank_table", self.ranks.get(self.store.as_ref()))
            .await
    }

    /// Forget the cached rank ladder so the next read reloads it.
    pub async fn invalidate_ranks(&self) {
        self.ranks.invalidate().await;
    }

    /// Write a catalog and rank ladder into the store.
    ///
    /// Existing crimes with the same IDs are replaced; the rank cache is
    /// invalidated afterwards.
    ///
    /// # Errors
    ///
    /// [`EngineError::InvalidState`] if a crime definition is invalid, or
    /// a persistence error.
    pub async fn seed_catalog(
        &self,
        crimes: &[CrimeDefinition],
        ranks: &RankTable,
    ) -> Result<(), EngineError> {
        for crime in crimes {
            validate_crime(crime)?;
            self.bounded("upsert_crime", self.store.upsert_crime(crime))
                .await?;
        }
        self.bounded("replace_rank_table", self.store.replace_rank_table(ranks))
            .await?;
        self.invalidate_ranks().await;
        info!(
            crimes = crimes.len(),
            ranks = ranks.tiers().len(),
            "Catalog seeded"
        );
        Ok(())
    }

    fn roll(
        &self,
        player: &Player,
        crime: &CrimeDefinition,
        ranks: &RankTable,
        now: DateTime<Utc>,
    ) -> Result<Resolved, EngineError> {
        let mut dice = self
            .dice
            .lock()
            .map_err(|e| EngineError::Internal(format!("dice lock poisoned: {e}")))?;
        resolve_attempt(player, crime, ranks, self.policy, &mut *dice, now)
    }

    async fn bounded<T>(
        &self,
        op: &'static str,
        call: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, EngineError> {
        match tokio::time::timeout(self.store_timeout, call).await {
            Ok(result) => result.map_err(EngineError::from),
            Err(elapsed) => {
                warn!(op, timeout = ?self.store_timeout, "Store call timed out");
                Err(EngineError::PersistenceUnavailable(format!(
                    "{op}: {elapsed}"
                )))
            }
        }
    }
}

fn log_failure(player_id: PlayerId, crime_id: &CrimeId, err: &EngineError) {
    match err {
        EngineError::InvalidState(detail) => {
            error!(player_id = %player_id, crime_id = %crime_id, %detail, "Invalid stored state");
        }
        EngineError::Internal(detail) => {
            error!(player_id = %player_id, crime_id = %crime_id, %detail, "Engine failure");
        }
        EngineError::PersistenceConflict { .. } | EngineError::PersistenceUnavailable(_) => {
            warn!(player_id = %player_id, crime_id = %crime_id, %err, "Attempt not applied");
        }
        _ => debug!(player_id = %player_id, crime_id = %crime_id, %err, "Attempt rejected"),
    }
}

fn validate_name(name: &str) -> Result<&str, EngineError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(EngineError::InvalidInput("name must not be blank".to_owned()));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(EngineError::InvalidInput(format!(
            "name must be at most {MAX_NAME_LEN} characters"
        )));
    }
    if !name
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, ' ' | '_' | '-'))
    {
        return Err(EngineError::InvalidInput(
            "name may only contain letters, digits, spaces, '_' and '-'".to_owned(),
        ));
    }
    Ok(name)
}
