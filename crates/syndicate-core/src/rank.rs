//! Rank ladder and rank evaluation.
//!
//! A player's rank is a pure function of accumulated XP. The ladder is an
//! ascending list of thresholds starting at zero; a player holds the
//! highest rank whose threshold does not exceed their XP. Reaching a
//! threshold exactly earns that rank.
//!
//! The rank label stored on a player is a cache of this function and is
//! recomputed from XP on every resolved attempt.

use std::sync::Arc;

use syndicate_types::RankTier;
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::store::RankTableSource;

/// Errors from building a [`RankTable`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RankTableError {
    /// The ladder has no tiers.
    #[error("rank table is empty")]
    Empty,

    /// The first tier does not start at zero XP.
    #[error("first rank must start at 0 XP, found {0}")]
    FirstThresholdNotZero(u64),

    /// Thresholds are not strictly increasing.
    #[error("rank threshold {threshold} for {label:?} does not exceed the previous threshold")]
    NotIncreasing {
        /// The offending tier's label.
        label: String,
        /// The offending tier's threshold.
        threshold: u64,
    },

    /// A tier has an empty label.
    #[error("rank at {0} XP has an empty label")]
    EmptyLabel(u64),
}

/// A validated rank ladder.
///
/// Construction guarantees the ladder is non-empty, starts at 0 XP, and
/// has strictly increasing thresholds, which makes [`evaluate_rank`]
/// total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankTable {
    tiers: Vec<RankTier>,
}

impl RankTable {
    /// Build a rank table from tiers in ascending threshold order.
    ///
    /// # Errors
    ///
    /// Returns [`RankTableError`] if the tiers violate the ladder shape.
    pub fn new(tiers: Vec<RankTier>) -> Result<Self, RankTableError> {
        let first = tiers.first().ok_or(RankTableError::Empty)?;
        if first.min_xp != 0 {
            return Err(RankTableError::FirstThresholdNotZero(first.min_xp));
        }

        let mut previous: Option<u64> = None;
        for tier in &tiers {
            if tier.label.trim().is_empty() {
                return Err(RankTableError::EmptyLabel(tier.min_xp));
            }
            if previous.is_some_and(|prev| tier.min_xp <= prev) {
                return Err(RankTableError::NotIncreasing {
                    label: tier.label.clone(),
                    threshold: tier.min_xp,
                });
            }
            previous = Some(tier.min_xp);
        }

        Ok(Self { tiers })
    }

    /// The tiers in ascending order.
    pub fn tiers(&self) -> &[RankTier] {
        &self.tiers
    }

    /// The rank every new player starts with.
    pub fn lowest(&self) -> &str {
        self.tiers.first().map_or("", |tier| tier.label.as_str())
    }

    /// Shorthand for [`evaluate_rank`].
    pub fn evaluate(&self, xp: u64) -> &str {
        evaluate_rank(xp, self)
    }
}

impl Default for RankTable {
    fn default() -> Self {
        Self {
            tiers: vec![
                RankTier::new("Street Rat", 0),
                RankTier::new("Thug", 100),
                RankTier::new("Hustler", 500),
                RankTier::new("Enforcer", 2_000),
                RankTier::new("Capo", 10_000),
                RankTier::new("Underboss", 50_000),
                RankTier::new("Godfather", 250_000),
            ],
        }
    }
}

/// Map accumulated XP to a rank label.
///
/// Binary-searches for the highest threshold that does not exceed `xp`.
pub fn evaluate_rank(xp: u64, table: &RankTable) -> &str {
    let reached = table.tiers.partition_point(|tier| tier.min_xp <= xp);
    table
        .tiers
        .get(reached.saturating_sub(1))
        .map_or("", |tier| tier.label.as_str())
}

/// Process-wide cache of the rank table.
///
/// The table is loaded from the store on first use and kept until
/// [`RankCache::invalidate`] is called after an edit.
#[derive(Debug, Default)]
pub struct RankCache {
    cached: RwLock<Option<Arc<RankTable>>>,
}

impl RankCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached table, loading it from `source` on a miss.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the table has to be loaded and the load
    /// fails.
    pub async fn get<S: RankTableSource + ?Sized>(
        &self,
        source: &S,
    ) -> Result<Arc<RankTable>, StoreError> {
        if let Some(table) = self.cached.read().await.as_ref() {
            return Ok(Arc::clone(table));
        }

        let mut slot = self.cached.write().await;
        if let Some(table) = slot.as_ref() {
            return Ok(Arc::clone(table));
        }
        let table = Arc::new(source.load_rank_table().await?);
        tracing::debug!(tiers = table.tiers().len(), "Rank table loaded");
        *slot = Some(Arc::clone(&table));
        Ok(table)
    }

    /// Drop the cached table so the next read reloads it.
    pub async fn invalidate(&self) {
        *self.cached.write().await = None;
        tracing::info!("Rank table cache invalidated");
    }
}
