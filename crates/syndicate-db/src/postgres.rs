//! Pool construction and schema migrations.
//!
//! The pool is sized and bounded by the `database` section of
//! [`SyndicateConfig`](syndicate_core::config::SyndicateConfig); the
//! engine's own per-call timeout sits on top of the acquire timeout set
//! here.

use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use syndicate_core::config::DatabaseSection;

use crate::error::DbError;

/// A migrated-or-not pool of connections to the game database.
#[derive(Debug, Clone)]
pub struct PostgresPool {
    pool: PgPool,
}

impl PostgresPool {
    /// Open a pool as described by `section`.
    ///
    /// # Errors
    ///
    /// [`DbError::Config`] if no URL is configured or it does not parse,
    /// [`DbError::Postgres`] if the first connection fails.
    pub async fn connect(section: &DatabaseSection) -> Result<Self, DbError> {
        let url = section
            .url
            .as_deref()
            .ok_or_else(|| DbError::Config("database.url is not set".to_owned()))?;
        let options: PgConnectOptions = url
            .parse()
            .map_err(|e: sqlx::Error| DbError::Config(format!("database.url: {e}")))?;

        let pool = PgPoolOptions::new()
            .max_connections(section.max_connections)
            .acquire_timeout(Duration::from_secs(section.connect_timeout_secs))
            .connect_with(options)
            .await?;

        tracing::info!(
            max_connections = section.max_connections,
            acquire_timeout_secs = section.connect_timeout_secs,
            "Game database pool ready"
        );
        Ok(Self { pool })
    }

    /// Open a pool for `url` with the default pool sizing.
    ///
    /// # Errors
    ///
    /// Same as [`PostgresPool::connect`].
    pub async fn connect_url(url: &str) -> Result<Self, DbError> {
        let section = DatabaseSection {
            url: Some(url.to_owned()),
            ..DatabaseSection::default()
        };
        Self::connect(&section).await
    }

    /// Bring the `players`, `crime_cooldowns`, `crimes`, and `ranks`
    /// tables up to date.
    ///
    /// # Errors
    ///
    /// [`DbError::Migration`] if a migration fails.
    pub async fn run_migrations(&self) -> Result<(), DbError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        tracing::info!("Game schema is current");
        Ok(())
    }

    /// The underlying [`PgPool`], shared with [`PgStore`](crate::PgStore).
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Wait for checked-out connections to return, then close them.
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!("Game database pool closed");
    }
}
