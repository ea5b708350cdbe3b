//! Enumeration types shared across the workspace.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Discriminant of an [`AttemptOutcome`](crate::attempt::AttemptOutcome).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum OutcomeKind {
    /// The player is serving a jail sentence.
    Jailed,
    /// The crime is still cooling down for this player.
    OnCooldown,
    /// The attempt succeeded.
    Success,
    /// The attempt failed and the player was jailed.
    Failure,
}

/// Ordering used by the leaderboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum LeaderboardKind {
    /// Highest accumulated experience first.
    #[default]
    Xp,
    /// Most cash on hand first.
    Cash,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_kind_uses_snake_case() {
        let json = serde_json::to_string(&OutcomeKind::OnCooldown).ok();
        assert_eq!(json.as_deref(), Some("\"on_cooldown\""));
    }

    #[test]
    fn leaderboard_kind_parses_lowercase() {
        let kind: Result<LeaderboardKind, _> = serde_json::from_str("\"cash\"");
        assert_eq!(kind.ok(), Some(LeaderboardKind::Cash));
        assert_eq!(LeaderboardKind::default(), LeaderboardKind::Xp);
    }
}
