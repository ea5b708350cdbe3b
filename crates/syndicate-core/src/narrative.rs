//! Player-facing messages for attempt outcomes.

use syndicate_types::{AttemptOutcome, CrimeDefinition};

/// Render a wait in the largest sensible units, e.g. `1h 5m` or `42s`.
///
/// Waits of an hour or more are shown to the minute, rounded up, so the
/// displayed wait is never shorter than the real one.
pub fn humanize_secs(secs: u64) -> String {
    if secs < 3_600 {
        let minutes = secs / 60;
        let seconds = secs % 60;
        return match (minutes, seconds) {
            (0, s) => format!("{s}s"),
            (m, 0) => format!("{m}m"),
            (m, s) => format!("{m}m {s}s"),
        };
    }
    let total_minutes = secs.div_ceil(60);
    match (total_minutes / 60, total_minutes % 60) {
        (h, 0) => format!("{h}h"),
        (h, m) => format!("{h}h {m}m"),
    }
}

/// One line describing what happened when `crime` was attempted.
pub fn narrate(outcome: &AttemptOutcome, crime: &CrimeDefinition) -> String {
    match outcome {
        AttemptOutcome::Jailed { remaining_secs, .. } => format!(
            "You are behind bars. You can try again in {}.",
            humanize_secs(*remaining_secs)
        ),
        AttemptOutcome::OnCooldown { remaining_secs, .. } => format!(
            "The heat from your last {} hasn't died down. Wait {}.",
            crime.name.to_lowercase(),
            humanize_secs(*remaining_secs)
        ),
        AttemptOutcome::Success {
            reward, xp_gained, ..
        } => format!(
            "{} went off without a hitch. You walked away with ${reward} and {xp_gained} XP.",
            crime.name
        ),
        AttemptOutcome::Failure { xp_gained, .. } if crime.cooldown_secs == 0 => {
            if *xp_gained > 0 {
                format!(
                    "{} went wrong, but you slipped away before the cops arrived ({xp_gained} XP).",
                    crime.name
                )
            } else {
                format!(
                    "{} went wrong, but you slipped away before the cops arrived.",
                    crime.name
                )
            }
        }
        AttemptOutcome::Failure { xp_gained, .. } => {
            let sentence = humanize_secs(crime.cooldown_secs);
            if *xp_gained > 0 {
                format!(
                    "{} went wrong and the cops picked you up. {sentence} in jail, but you learned something ({xp_gained} XP).",
                    crime.name
                )
            } else {
                format!(
                    "{} went wrong and the cops picked you up. {sentence} in jail.",
                    crime.name
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use syndicate_types::{AttemptCounters, CrimeId};

    use super::*;

    fn crime() -> CrimeDefinition {
        CrimeDefinition {
            id: CrimeId::from("car_theft"),
            name: "Car Theft".to_owned(),
            description: String::new(),
            min_reward: 100,
            max_reward: 400,
            success_rate: 0.4,
            cooldown_secs: 300,
            xp_award: 25,
        }
    }

    #[test]
    fn humanize_picks_units() {
        assert_eq!(humanize_secs(0), "0s");
        assert_eq!(humanize_secs(42), "42s");
        assert_eq!(humanize_secs(120), "2m");
        assert_eq!(humanize_secs(125), "2m 5s");
        assert_eq!(humanize_secs(7_200), "2h");
        assert_eq!(humanize_secs(3_900), "1h 5m");
    }

    #[test]
    fn humanize_never_understates_long_waits() {
        assert_eq!(humanize_secs(3_600), "1h");
        assert_eq!(humanize_secs(3_601), "1h 1m");
        assert_eq!(humanize_secs(3_659), "1h 1m");
        assert_eq!(humanize_secs(7_199), "2h");
        assert_eq!(humanize_secs(3_599), "59m 59s");
    }

    #[test]
    fn zero_sentence_failure_mentions_no_jail() {
        let mut quick = crime();
        quick.cooldown_secs = 0;
        let outcome = AttemptOutcome::Failure {
            xp_gained: 0,
            jailed_until: Utc::now(),
            counters: AttemptCounters::default(),
        };
        let message = narrate(&outcome, &quick);
        assert!(!message.contains("in jail"));
        assert!(message.contains("slipped away"));
    }

    #[test]
    fn success_mentions_reward() {
        let outcome = AttemptOutcome::Success {
            reward: 250,
            xp_gained: 25,
            counters: AttemptCounters::default(),
        };
        let message = narrate(&outcome, &crime());
        assert!(message.contains("$250"));
        assert!(message.contains("Car Theft"));
    }

    #[test]
    fn cooldown_mentions_wait() {
        let outcome = AttemptOutcome::OnCooldown {
            remaining_secs: 61,
            available_at: Utc::now(),
        };
        assert!(narrate(&outcome, &crime()).contains("1m 1s"));
    }

    #[test]
    fn failure_mentions_consolation_only_when_granted() {
        let plain = AttemptOutcome::Failure {
            xp_gained: 0,
            jailed_until: Utc::now(),
            counters: AttemptCounters::default(),
        };
        let message = narrate(&plain, &crime());
        assert!(message.contains("5m in jail"));
        assert!(!message.contains("XP"));

        let consoled = AttemptOutcome::Failure {
            xp_gained: 3,
            jailed_until: Utc::now(),
            counters: AttemptCounters::default(),
        };
        assert!(narrate(&consoled, &crime()).contains("3 XP"));
    }
}
