//! Crime attempt outcome and response types.
//!
//! [`AttemptOutcome`] is what the resolution engine produces for every
//! call. [`AttemptResponse`] is the flattened shape returned to clients:
//! every field is always present so a client never has to match on the
//! outcome tag to find the reward or the jail expiry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::OutcomeKind;
use crate::structs::{AttemptCounters, Player};

/// The result of one crime attempt.
///
/// Gated outcomes (`Jailed`, `OnCooldown`) carry no state change. The
/// resolved outcomes (`Success`, `Failure`) describe a delta that has
/// already been committed by the time the caller sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "outcome", rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum AttemptOutcome {
    /// The player is still serving a jail sentence.
    Jailed {
        /// Whole seconds until release, rounded up.
        remaining_secs: u64,
        /// When the sentence ends.
        jailed_until: DateTime<Utc>,
    },
    /// This crime is not yet available to the player.
    OnCooldown {
        /// Whole seconds until the crime is available, rounded up.
        remaining_secs: u64,
        /// When the crime becomes available.
        available_at: DateTime<Utc>,
    },
    /// The attempt succeeded.
    Success {
        /// Cash awarded.
        reward: i64,
        /// Experience awarded.
        xp_gained: u64,
        /// Counters after this attempt.
        counters: AttemptCounters,
    },
    /// The attempt failed and the player was jailed.
    Failure {
        /// Consolation experience awarded (may be zero).
        xp_gained: u64,
        /// When the new jail sentence ends.
        jailed_until: DateTime<Utc>,
        /// Counters after this attempt.
        counters: AttemptCounters,
    },
}

impl AttemptOutcome {
    /// The outcome's discriminant.
    pub const fn kind(&self) -> OutcomeKind {
        match self {
            Self::Jailed { .. } => OutcomeKind::Jailed,
            Self::OnCooldown { .. } => OutcomeKind::OnCooldown,
            Self::Success { .. } => OutcomeKind::Success,
            Self::Failure { .. } => OutcomeKind::Failure,
        }
    }

    /// Whether the attempt succeeded.
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Whether a gate rejected the attempt before any roll.
    pub const fn is_gated(&self) -> bool {
        matches!(self, Self::Jailed { .. } | Self::OnCooldown { .. })
    }

    /// Cash awarded, zero unless the attempt succeeded.
    pub const fn reward(&self) -> i64 {
        match self {
            Self::Success { reward, .. } => *reward,
            _ => 0,
        }
    }

    /// Experience awarded by this attempt.
    pub const fn xp_gained(&self) -> u64 {
        match self {
            Self::Success { xp_gained, .. } | Self::Failure { xp_gained, .. } => *xp_gained,
            _ => 0,
        }
    }

    /// The jail expiry this outcome reports, if any.
    pub const fn jailed_until(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Jailed { jailed_until, .. } | Self::Failure { jailed_until, .. } => {
                Some(*jailed_until)
            }
            _ => None,
        }
    }

    /// Remaining wait for gated outcomes.
    pub const fn remaining_secs(&self) -> Option<u64> {
        match self {
            Self::Jailed { remaining_secs, .. } | Self::OnCooldown { remaining_secs, .. } => {
                Some(*remaining_secs)
            }
            _ => None,
        }
    }
}

/// Client-facing response for a crime attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct AttemptResponse {
    /// Whether the attempt succeeded.
    pub success: bool,
    /// Which outcome occurred.
    pub outcome: OutcomeKind,
    /// Cash awarded (0 when not applicable).
    pub reward: i64,
    /// Experience awarded (0 when not applicable).
    pub xp_gained: u64,
    /// Jail expiry, null unless it is after the attempt time.
    pub jailed_until: Option<DateTime<Utc>>,
    /// Remaining wait for jailed/cooldown outcomes.
    pub remaining_secs: Option<u64>,
    /// Human-readable narrative of what happened.
    pub message: String,
    /// The player's full state after the attempt.
    pub player: Player,
}

impl AttemptResponse {
    /// Flatten an outcome resolved at `attempted_at` into the response shape.
    ///
    /// A failure with a zero-length sentence stores an expiry equal to the
    /// attempt time; that never blocks, so it is reported as `None`.
    pub fn new(
        outcome: &AttemptOutcome,
        message: String,
        player: Player,
        attempted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            success: outcome.is_success(),
            outcome: outcome.kind(),
            reward: outcome.reward(),
            xp_gained: outcome.xp_gained(),
            jailed_until: outcome
                .jailed_until()
                .filter(|until| *until > attempted_at),
            remaining_secs: outcome.remaining_secs(),
            message,
            player,
        }
    }
}
