//! Consolation experience for failed attempts.
//!
//! Whether a failed crime grants any experience is a tuning decision, so
//! it is expressed as configuration rather than baked into the engine.
//! Whatever the policy says, consolation XP is capped at a quarter of the
//! crime's success award so failing never competes with succeeding.

use serde::Deserialize;

/// Consolation XP is never more than `xp_award / CONSOLATION_CAP_DIVISOR`.
pub const CONSOLATION_CAP_DIVISOR: u64 = 4;

/// How much experience a failed attempt grants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum FailureXpPolicy {
    /// Failures grant nothing.
    #[default]
    None,
    /// Failures grant a fixed amount.
    Flat {
        /// XP granted per failure, before the cap.
        xp: u64,
    },
    /// Failures grant a percentage of the crime's success award.
    Percent {
        /// Whole percent of the success award, before the cap.
        percent: u8,
    },
}

impl FailureXpPolicy {
    /// Consolation XP for failing a crime that awards `xp_award` on success.
    pub fn consolation_xp(self, xp_award: u64) -> u64 {
        let cap = xp_award
            .checked_div(CONSOLATION_CAP_DIVISOR)
            .unwrap_or(0);
        let raw = match self {
            Self::None => 0,
            Self::Flat { xp } => xp,
            Self::Percent { percent } => xp_award
                .checked_mul(u64::from(percent))
                .and_then(|scaled| scaled.checked_div(100))
                .unwrap_or(cap),
        };
        raw.min(cap)
    }

    /// Whether the policy's own parameters are sensible.
    pub const fn is_valid(self) -> bool {
        match self {
            Self::None | Self::Flat { .. } => true,
            Self::Percent { percent } => percent <= 100,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_grants_nothing() {
        assert_eq!(FailureXpPolicy::None.consolation_xp(100), 0);
    }

    #[test]
    fn flat_is_capped_at_a_quarter() {
        assert_eq!(FailureXpPolicy::Flat { xp: 3 }.consolation_xp(100), 3);
        assert_eq!(FailureXpPolicy::Flat { xp: 50 }.consolation_xp(100), 25);
    }

    #[test]
    fn percent_of_award_rounds_down() {
        assert_eq!(FailureXpPolicy::Percent { percent: 10 }.consolation_xp(95), 9);
        assert_eq!(FailureXpPolicy::Percent { percent: 90 }.consolation_xp(100), 25);
    }

    #[test]
    fn tiny_awards_grant_no_consolation() {
        assert_eq!(FailureXpPolicy::Flat { xp: 1 }.consolation_xp(3), 0);
        assert_eq!(FailureXpPolicy::Percent { percent: 20 }.consolation_xp(0), 0);
    }

    #[test]
    fn consolation_always_below_award() {
        for award in [1_u64, 4, 10, 1_000, u64::MAX] {
            for policy in [
                FailureXpPolicy::Flat { xp: u64::MAX },
                FailureXpPolicy::Percent { percent: 100 },
            ] {
                assert!(policy.consolation_xp(award) < award);
            }
        }
    }

    #[test]
    fn percent_above_hundred_is_invalid() {
        assert!(!FailureXpPolicy::Percent { percent: 101 }.is_valid());
        assert!(FailureXpPolicy::Percent { percent: 100 }.is_valid());
    }
}
