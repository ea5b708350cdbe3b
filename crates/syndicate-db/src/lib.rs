//! `PostgreSQL` data layer for the Syndicate game backend.
//!
//! [`PgStore`] implements every store trait the crime engine consumes,
//! so the engine runs unchanged against this crate or the in-memory
//! store in `syndicate-core`.
//!
//! # Tables
//!
//! ```text
//! players          one row per player, guarded by `version`
//! crime_cooldowns  (player_id, crime_id) -> last_attempt_at
//! crimes           the crime catalog
//! ranks            the rank ladder, ordered by position
//! ```
//!
//! # Modules
//!
//! - [`postgres`] -- Pool construction from the `database` config section, and migrations
//! - [`store`] -- [`PgStore`] and its trait implementations
//! - [`rows`] -- Row types and conversion into domain values
//! - [`error`] -- [`DbError`] and its mapping onto the engine's errors

pub mod error;
pub mod postgres;
pub mod rows;
pub mod store;

pub use error::DbError;
pub use postgres::PostgresPool;
pub use store::PgStore;
