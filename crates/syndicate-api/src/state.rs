//! Shared application state for the HTTP API.
//!
//! [`AppState`] owns the crime engine; the engine in turn owns the store,
//! dice, per-player locks, and rank cache. Handlers hold it behind an
//! [`Arc`](std::sync::Arc) and never touch the store directly.

use chrono::{DateTime, Utc};
use syndicate_core::CrimeEngine;

/// State shared by every request handler.
#[derive(Debug)]
pub struct AppState<S, D> {
    /// The crime engine.
    pub engine: CrimeEngine<S, D>,
    /// When the server started, for the health endpoint.
    pub started_at: DateTime<Utc>,
}

impl<S, D> AppState<S, D> {
    /// Wrap an engine, stamping the start time.
    pub fn new(engine: CrimeEngine<S, D>) -> Self {
        Self {
            engine,
            started_at: Utc::now(),
        }
    }
}
