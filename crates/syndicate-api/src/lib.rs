//! HTTP API for the Syndicate game backend.
//!
//! This crate exposes the crime engine over JSON:
//!
//! - **Players**: registration, snapshots, and per-crime timers
//! - **Attempts**: `POST /api/players/{id}/crimes/{crime_id}` resolves one
//!   attempt and returns the outcome, narrative, and updated player
//! - **Catalog**: crime list and rank ladder
//! - **Leaderboard**: top players by XP or cash
//!
//! # Architecture
//!
//! Handlers are thin: they parse path identifiers, read the clock once,
//! call [`CrimeEngine`](syndicate_core::CrimeEngine), and map
//! [`EngineError`](syndicate_core::EngineError) to a status code via
//! [`ApiError`]. All game rules live in `syndicate-core`.

pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;

pub use error::ApiError;
pub use router::build_router;
pub use server::{ServerConfig, ServerError, start_server};
pub use state::AppState;
