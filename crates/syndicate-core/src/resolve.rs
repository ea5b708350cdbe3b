//! Pure crime attempt resolution.
//!
//! [`resolve_attempt`] decides what happens to one player attempting one
//! crime at one instant. It reads nothing ambient: the player snapshot,
//! crime definition, rank table, failure policy, dice, and `now` are all
//! parameters, so every branch can be exercised deterministically.
//!
//! The gates run strictly in order and each short-circuits:
//!
//! 1. Jail: a sentence ending after `now` blocks every crime.
//! 2. Cooldown: `last_attempt + cooldown > now` blocks this crime.
//! 3. Roll: one unit draw; success iff `draw < success_rate`.
//! 4. Success: reward drawn from `[min_reward, max_reward]`, XP awarded.
//! 5. Failure: jailed until `now + cooldown`, consolation XP per policy.
//!
//! Gated outcomes produce no delta. Resolved outcomes produce exactly one
//! [`PlayerDelta`] carrying the recomputed rank.

use chrono::{DateTime, Utc};
use syndicate_types::{AttemptOutcome, CrimeDefinition, Player};

use crate::dice::Dice;
use crate::error::EngineError;
use crate::policy::FailureXpPolicy;
use crate::rank::RankTable;
use crate::store::PlayerDelta;
use crate::timers;

/// What a resolution decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    /// The outcome to report.
    pub outcome: AttemptOutcome,
    /// The mutation to commit, `None` for gated outcomes.
    pub delta: Option<PlayerDelta>,
}

/// Check a crime definition against the catalog invariants.
///
/// # Errors
///
/// Returns [`EngineError::InvalidState`] describing the first violation.
pub fn validate_crime(crime: &CrimeDefinition) -> Result<(), EngineError> {
    if crime.id.as_str().trim().is_empty() {
        return Err(EngineError::InvalidState("crime has an empty id".to_owned()));
    }
    if crime.min_reward < 0 {
        return Err(EngineError::InvalidState(format!(
            "crime {} has negative min_reward {}",
            crime.id, crime.min_reward
        )));
    }
    if crime.min_reward > crime.max_reward {
        return Err(EngineError::InvalidState(format!(
            "crime {} has min_reward {} above max_reward {}",
            crime.id, crime.min_reward, crime.max_reward
        )));
    }
    if !(0.0..=1.0).contains(&crime.success_rate) {
        return Err(EngineError::InvalidState(format!(
            "crime {} has success_rate {} outside [0, 1]",
            crime.id, crime.success_rate
        )));
    }
    if timers::add_secs(DateTime::<Utc>::UNIX_EPOCH, crime.cooldown_secs).is_none() {
        return Err(EngineError::InvalidState(format!(
            "crime {} has unrepresentable cooldown {}s",
            crime.id, crime.cooldown_secs
        )));
    }
    Ok(())
}

/// Check a loaded player record against its invariants.
///
/// # Errors
///
/// Returns [`EngineError::InvalidState`] if the attempt counters disagree.
pub fn validate_player(player: &Player) -> Result<(), EngineError> {
    if !player.counters.is_consistent() {
        return Err(EngineError::InvalidState(format!(
            "player {} has inconsistent counters: total {} != {} + {}",
            player.id,
            player.counters.total,
            player.counters.successful,
            player.counters.unsuccessful
        )));
    }
    Ok(())
}

/// Resolve one attempt of `crime` by `player` at `now`.
///
/// # Errors
///
/// Returns [`EngineError::InvalidState`] if cash, XP, counters, or the
/// jail timestamp would overflow.
pub fn resolve_attempt<D: Dice + ?Sized>(
    player: &Player,
    crime: &CrimeDefinition,
    ranks: &RankTable,
    policy: FailureXpPolicy,
    dice: &mut D,
    now: DateTime<Utc>,
) -> Result<Resolved, EngineError> {
    if let Some(jail) = timers::jail_block(player.jailed_until, now) {
        return Ok(Resolved {
            outcome: AttemptOutcome::Jailed {
                remaining_secs: jail.remaining_secs,
                jailed_until: jail.until,
            },
            delta: None,
        });
    }

    if let Some(cooldown) =
        timers::cooldown_block(player.last_attempt(&crime.id), crime.cooldown_secs, now)?
    {
        return Ok(Resolved {
            outcome: AttemptOutcome::OnCooldown {
                remaining_secs: cooldown.remaining_secs,
                available_at: cooldown.until,
            },
            delta: None,
        });
    }

    let succeeded = dice.unit() < crime.success_rate;
    let counters = player
        .counters
        .after_attempt(succeeded)
        .ok_or_else(|| overflow(player, "attempt counters"))?;

    if succeeded {
        let reward = dice.between(crime.min_reward, crime.max_reward);
        player
            .cash
            .checked_add(reward)
            .ok_or_else(|| overflow(player, "cash"))?;
        let xp = player
            .xp
            .checked_add(crime.xp_award)
            .ok_or_else(|| overflow(player, "xp"))?;

        Ok(Resolved {
            outcome: AttemptOutcome::Success {
                reward,
                xp_gained: crime.xp_award,
                counters,
            },
            delta: Some(PlayerDelta {
                expected_version: player.version,
                cash_gained: reward,
                xp_gained: crime.xp_award,
                succeeded: true,
                jailed_until: None,
                crime_id: crime.id.clone(),
                attempted_at: now,
                rank: ranks.evaluate(xp).to_owned(),
            }),
        })
    } else {
        let jailed_until = timers::add_secs(now, crime.cooldown_secs)
            .ok_or_else(|| overflow(player, "jail expiry"))?;
        let xp_gained = policy.consolation_xp(crime.xp_award);
        let xp = player
            .xp
            .checked_add(xp_gained)
            .ok_or_else(|| overflow(player, "xp"))?;

        Ok(Resolved {
            outcome: AttemptOutcome::Failure {
                xp_gained,
                jailed_until,
                counters,
            },
            delta: Some(PlayerDelta {
                expected_version: player.version,
                cash_gained: 0,
                xp_gained,
                succeeded: false,
                jailed_until: Some(jailed_until),
                crime_id: crime.id.clone(),
                attempted_at: now,
                rank: ranks.evaluate(xp).to_owned(),
            }),
        })
    }
}

fn overflow(player: &Player, field: &str) -> EngineError {
    EngineError::InvalidState(format!("{field} overflow for player {}", player.id))
}

#[cfg(test)]
#[allow(clippy::panic, clippy::arithmetic_side_effects)]
mod tests {
    use chrono::{TimeDelta, TimeZone};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use syndicate_types::{CrimeId, PlayerId, RankTier};

    use super::*;
    use crate::dice::ScriptedDice;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 9, 0, 0)
            .single()
            .unwrap_or_default()
    }

    fn crime(success_rate: f64, cooldown_secs: u64) -> CrimeDefinition {
        CrimeDefinition {
            id: CrimeId::from("shoplift"),
            name: "Shoplift".to_owned(),
            description: String::new(),
            min_reward: 5,
            max_reward: 5,
            success_rate,
            cooldown_secs,
            xp_award: 40,
        }
    }

    fn player() -> Player {
        Player::new(PlayerId::new(), "Rico".to_owned(), "Rookie".to_owned(), t0())
    }

    fn ranks() -> RankTable {
        RankTable::new(vec![RankTier::new("Rookie", 0), RankTier::new("Pro", 40)])
            .unwrap_or_default()
    }

    #[test]
    fn success_builds_full_delta() {
        let now = t0();
        let resolved = resolve_attempt(
            &player(),
            &crime(1.0, 20),
            &ranks(),
            FailureXpPolicy::None,
            &mut ScriptedDice::always(0.99),
            now,
        );
        let Ok(Resolved { outcome, delta: Some(delta) }) = resolved else {
            panic!("expected a resolved success, got {resolved:?}");
        };
        assert_eq!(outcome.reward(), 5);
        assert_eq!(outcome.xp_gained(), 40);
        assert!(outcome.is_success());
        assert_eq!(delta.cash_gained, 5);
        assert_eq!(delta.attempted_at, now);
        assert_eq!(delta.jailed_until, None);
        assert_eq!(delta.rank, "Pro", "rank recomputed from post-attempt XP");
    }

    #[test]
    fn failure_jails_for_cooldown_exactly() {
        let now = t0();
        let resolved = resolve_attempt(
            &player(),
            &crime(0.0, 45),
            &ranks(),
            FailureXpPolicy::Percent { percent: 10 },
            &mut ScriptedDice::always(0.0),
            now,
        );
        let Ok(Resolved { outcome, delta: Some(delta) }) = resolved else {
            panic!("expected a resolved failure, got {resolved:?}");
        };
        let expected = now + TimeDelta::seconds(45);
        assert_eq!(outcome.jailed_until(), Some(expected));
        assert_eq!(delta.jailed_until, Some(expected));
        assert_eq!(delta.xp_gained, 4);
        assert_eq!(delta.cash_gained, 0);
        assert!(!delta.succeeded);
        assert_eq!(delta.rank, "Rookie");
    }

    #[test]
    fn draw_equal_to_rate_fails() {
        let resolved = resolve_attempt(
            &player(),
            &crime(0.5, 10),
            &ranks(),
            FailureXpPolicy::None,
            &mut ScriptedDice::always(0.5),
            t0(),
        );
        assert!(matches!(
            resolved.map(|r| r.outcome),
            Ok(AttemptOutcome::Failure { .. })
        ));
    }

    #[test]
    fn jail_gate_precedes_cooldown_gate() {
        let now = t0();
        let mut p = player();
        p.jailed_until = Some(now + TimeDelta::seconds(30));
        p.cooldowns.insert(CrimeId::from("shoplift"), now);

        let resolved = resolve_attempt(
            &p,
            &crime(1.0, 60),
            &ranks(),
            FailureXpPolicy::None,
            &mut ScriptedDice::always(0.0),
            now,
        );
        assert!(matches!(
            resolved,
            Ok(Resolved {
                outcome: AttemptOutcome::Jailed { remaining_secs: 30, .. },
                delta: None,
            })
        ));
    }

    #[test]
    fn jail_blocks_other_crimes_too() {
        let now = t0();
        let mut p = player();
        p.jailed_until = Some(now + TimeDelta::milliseconds(1_500));
        let mut other = crime(1.0, 0);
        other.id = CrimeId::from("arson");

        let resolved = resolve_attempt(
            &p,
            &other,
            &ranks(),
            FailureXpPolicy::None,
            &mut ScriptedDice::always(0.0),
            now,
        );
        assert_eq!(
            resolved.ok().and_then(|r| r.outcome.remaining_secs()),
            Some(2),
            "partial seconds round up"
        );
    }

    #[test]
    fn cooldown_gate_reports_ceil_remaining() {
        let now = t0();
        let mut p = player();
        p.cooldowns
            .insert(CrimeId::from("shoplift"), now - TimeDelta::milliseconds(2_500));

        let resolved = resolve_attempt(
            &p,
            &crime(1.0, 20),
            &ranks(),
            FailureXpPolicy::None,
            &mut ScriptedDice::always(0.0),
            now,
        );
        assert!(matches!(
            resolved,
            Ok(Resolved {
                outcome: AttemptOutcome::OnCooldown { remaining_secs: 18, .. },
                delta: None,
            })
        ));
    }

    #[test]
    fn cooldown_on_other_crime_does_not_gate() {
        let now = t0();
        let mut p = player();
        p.cooldowns.insert(CrimeId::from("arson"), now);
        let resolved = resolve_attempt(
            &p,
            &crime(1.0, 20),
            &ranks(),
            FailureXpPolicy::None,
            &mut ScriptedDice::always(0.0),
            now,
        );
        assert!(resolved.is_ok_and(|r| r.outcome.is_success()));
    }

    #[test]
    fn reward_within_bounds_for_many_draws() {
        let mut rng = StdRng::seed_from_u64(2026);
        let mut def = crime(1.0, 0);
        def.min_reward = 10;
        def.max_reward = 250;
        for _ in 0..5_000 {
            let resolved = resolve_attempt(
                &player(),
                &def,
                &ranks(),
                FailureXpPolicy::None,
                &mut rng,
                t0(),
            );
            let reward = resolved.map(|r| r.outcome.reward()).unwrap_or(-1);
            assert!((10..=250).contains(&reward), "reward {reward} out of range");
        }
    }

    #[test]
    fn cash_overflow_is_invalid_state() {
        let mut p = player();
        p.cash = i64::MAX;
        let resolved = resolve_attempt(
            &p,
            &crime(1.0, 0),
            &ranks(),
            FailureXpPolicy::None,
            &mut ScriptedDice::always(0.0),
            t0(),
        );
        assert!(matches!(resolved, Err(EngineError::InvalidState(_))));
    }

    #[test]
    fn validate_crime_rejects_bad_definitions() {
        let mut bad_range = crime(0.5, 10);
        bad_range.min_reward = 10;
        bad_range.max_reward = 1;
        assert!(validate_crime(&bad_range).is_err());

        let mut bad_rate = crime(1.5, 10);
        assert!(validate_crime(&bad_rate).is_err());
        bad_rate.success_rate = f64::NAN;
        assert!(validate_crime(&bad_rate).is_err());

        let mut negative = crime(0.5, 10);
        negative.min_reward = -1;
        assert!(validate_crime(&negative).is_err());

        assert!(validate_crime(&crime(0.5, u64::MAX)).is_err());
        assert!(validate_crime(&crime(0.0, 0)).is_ok());
        assert!(validate_crime(&crime(1.0, 86_400)).is_ok());
    }

    #[test]
    fn validate_player_rejects_inconsistent_counters() {
        let mut p = player();
        p.counters.total = 3;
        assert!(matches!(
            validate_player(&p),
            Err(EngineError::InvalidState(_))
        ));
    }
}
