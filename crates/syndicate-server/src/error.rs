//! Error types for the server binary.
//!
//! [`StartupError`] wraps every failure mode between reading the config
//! file and the HTTP server returning, so `run` can propagate with `?`.

/// Top-level error for the server binary.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// Configuration loading or validation failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: syndicate_core::config::ConfigError,
    },

    /// Connecting to or migrating `PostgreSQL` failed.
    #[error("database error: {source}")]
    Database {
        /// The underlying database error.
        #[from]
        source: syndicate_db::DbError,
    },

    /// Seeding the catalog failed.
    #[error("seed error: {source}")]
    Seed {
        /// The underlying engine error.
        #[from]
        source: syndicate_core::EngineError,
    },

    /// The HTTP server failed to bind or serve.
    #[error("server error: {source}")]
    Server {
        /// The underlying server error.
        #[from]
        source: syndicate_api::ServerError,
    },

    /// The log subscriber could not be installed.
    #[error("logging error: {message}")]
    Logging {
        /// Description of the failure.
        message: String,
    },
}
