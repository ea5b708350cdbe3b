//! Crime resolution engine for the Syndicate game backend.
//!
//! A player attempts a crime; the engine checks the jail and per-crime
//! cooldown gates, rolls the injected dice, and commits exactly one
//! delta (cash, XP, counters, cooldown, jail, rank) or none.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `syndicate-config.yaml`.
//! - [`dice`] -- The [`Dice`] randomness seam and [`ScriptedDice`].
//! - [`engine`] -- [`CrimeEngine`], the orchestrating entry point.
//! - [`error`] -- [`StoreError`] and [`EngineError`].
//! - [`locks`] -- Per-player async mutexes.
//! - [`memory`] -- [`InMemoryStore`], a complete store held in memory.
//! - [`narrative`] -- Player-facing outcome messages.
//! - [`policy`] -- Consolation XP for failures.
//! - [`rank`] -- Rank ladder, evaluation, and cache.
//! - [`resolve`] -- The pure, ordered resolution of one attempt.
//! - [`store`] -- Persistence traits the engine is generic over.
//! - [`timers`] -- Jail and cooldown arithmetic.
//!
//! [`Dice`]: dice::Dice
//! [`ScriptedDice`]: dice::ScriptedDice
//! [`CrimeEngine`]: engine::CrimeEngine
//! [`StoreError`]: error::StoreError
//! [`EngineError`]: error::EngineError
//! [`InMemoryStore`]: memory::InMemoryStore

pub mod config;
pub mod dice;
pub mod engine;
pub mod error;
pub mod locks;
pub mod memory;
pub mod narrative;
pub mod policy;
pub mod rank;
pub mod resolve;
pub mod store;
pub mod timers;

pub use engine::{CrimeEngine, Resolution};
pub use error::{EngineError, StoreError};
pub use rank::{RankTable, evaluate_rank};
