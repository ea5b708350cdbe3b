//! Jail and cooldown arithmetic over a player's temporal fields.
//!
//! Expiry is never scheduled. Every check compares a stored timestamp
//! against the caller-supplied `now`; a timestamp in the past simply no
//! longer blocks. Remaining waits are reported in whole seconds, rounded
//! up, so a client never sees "0 seconds" while still blocked.

use chrono::{DateTime, TimeDelta, Utc};
use syndicate_types::{CrimeId, Player, PlayerId, TimerStatus};

use crate::error::EngineError;

/// An active block and how long it has left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Blocked {
    /// When the block lifts.
    pub until: DateTime<Utc>,
    /// Whole seconds until `until`, rounded up.
    pub remaining_secs: u64,
}

/// Whole seconds in `delta`, rounded up. Non-positive deltas are zero.
pub fn ceil_secs(delta: TimeDelta) -> u64 {
    if delta <= TimeDelta::zero() {
        return 0;
    }
    let whole = u64::try_from(delta.num_seconds()).unwrap_or(0);
    if delta.subsec_nanos() > 0 {
        whole.saturating_add(1)
    } else {
        whole
    }
}

/// `at + secs`, or `None` if the result is out of range.
pub fn add_secs(at: DateTime<Utc>, secs: u64) -> Option<DateTime<Utc>> {
    let delta = i64::try_from(secs).ok().and_then(TimeDelta::try_seconds)?;
    at.checked_add_signed(delta)
}

/// The jail block in force at `now`, if any.
///
/// A stale expiry (at or before `now`) is a served sentence.
pub fn jail_block(jailed_until: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Option<Blocked> {
    let until = jailed_until.filter(|until| *until > now)?;
    Some(Blocked {
        until,
        remaining_secs: ceil_secs(until.signed_duration_since(now)),
    })
}

/// The cooldown block on one crime at `now`, if any.
///
/// A zero cooldown never blocks.
///
/// # Errors
///
/// Returns [`EngineError::InvalidState`] if `last + cooldown` overflows
/// the timestamp range.
pub fn cooldown_block(
    last_attempt: Option<DateTime<Utc>>,
    cooldown_secs: u64,
    now: DateTime<Utc>,
) -> Result<Option<Blocked>, EngineError> {
    let Some(last) = last_attempt else {
        return Ok(None);
    };
    if cooldown_secs == 0 {
        return Ok(None);
    }
    let available_at = add_secs(last, cooldown_secs).ok_or_else(|| {
        EngineError::InvalidState(format!(
            "cooldown of {cooldown_secs}s from {last} overflows the timestamp range"
        ))
    })?;
    if available_at > now {
        Ok(Some(Blocked {
            until: available_at,
            remaining_secs: ceil_secs(available_at.signed_duration_since(now)),
        }))
    } else {
        Ok(None)
    }
}

/// Whole seconds of jail left for `player` at `now`, `None` when free.
pub fn jail_remaining(player: &Player, now: DateTime<Utc>) -> Option<u64> {
    jail_block(player.jailed_until, now).map(|b| b.remaining_secs)
}

/// Whole seconds of cooldown left at `now`, `None` when available.
///
/// # Errors
///
/// Propagates [`cooldown_block`] errors.
pub fn cooldown_remaining(
    last_attempt: Option<DateTime<Utc>>,
    cooldown_secs: u64,
    now: DateTime<Utc>,
) -> Result<Option<u64>, EngineError> {
    Ok(cooldown_block(last_attempt, cooldown_secs, now)?.map(|b| b.remaining_secs))
}

/// Assemble the client-facing timer view for one player and crime.
///
/// # Errors
///
/// Propagates [`cooldown_block`] errors.
pub fn timer_status(
    player_id: PlayerId,
    crime_id: CrimeId,
    jailed_until: Option<DateTime<Utc>>,
    last_attempt: Option<DateTime<Utc>>,
    cooldown_secs: u64,
    now: DateTime<Utc>,
) -> Result<TimerStatus, EngineError> {
    let jail = jail_block(jailed_until, now);
    let cooldown = cooldown_block(last_attempt, cooldown_secs, now)?;
    Ok(TimerStatus {
        player_id,
        crime_id,
        jailed_until: jail.map(|b| b.until),
        jail_remaining_secs: jail.map(|b| b.remaining_secs),
        last_attempt_at: last_attempt,
        cooldown_remaining_secs: cooldown.map(|b| b.remaining_secs),
        available: jail.is_none() && cooldown.is_none(),
    })
}
