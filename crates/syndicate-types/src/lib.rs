//! Shared type definitions for the Syndicate game backend.
//!
//! This crate is the single source of truth for all types used across the
//! Syndicate workspace. Types defined here flow downstream to `TypeScript`
//! via `ts-rs` for the web client.
//!
//! # Modules
//!
//! - [`ids`] -- Player UUID wrapper and crime slug identifiers
//! - [`enums`] -- Outcome discriminants and leaderboard orderings
//! - [`structs`] -- Player, crime definition, rank tier, and read models
//! - [`attempt`] -- Crime attempt outcome and client response

pub mod attempt;
pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use attempt::{AttemptOutcome, AttemptResponse};
pub use enums::{LeaderboardKind, OutcomeKind};
pub use ids::{CrimeId, PlayerId};
pub use structs::{
    AttemptCounters, CrimeDefinition, LeaderboardEntry, Player, RankTier, TimerStatus,
};

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation.

    #[test]
    fn export_bindings() {
        // ts-rs writes the files to the `bindings/` directory relative to
        // the crate root.
        use ts_rs::TS;

        // IDs
        let _ = crate::ids::PlayerId::export_all();
        let _ = crate::ids::CrimeId::export_all();

        // Enums
        let _ = crate::enums::OutcomeKind::export_all();
        let _ = crate::enums::LeaderboardKind::export_all();

        // Structs
        let _ = crate::structs::AttemptCounters::export_all();
        let _ = crate::structs::Player::export_all();
        let _ = crate::structs::CrimeDefinition::export_all();
        let _ = crate::structs::RankTier::export_all();
        let _ = crate::structs::LeaderboardEntry::export_all();
        let _ = crate::structs::TimerStatus::export_all();

        // Attempts
        let _ = crate::attempt::AttemptOutcome::export_all();
        let _ = crate::attempt::AttemptResponse::export_all();
    }
}
