//! Server binary for the Syndicate game backend.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `syndicate-config.yaml` (or the path in
//!    `SYNDICATE_CONFIG`), apply env overrides, and validate it
//! 2. Initialize structured logging (tracing)
//! 3. Select the store: `PostgreSQL` when a database URL is configured,
//!    otherwise the in-memory store
//! 4. Seed the crime catalog and rank ladder
//! 5. Build the dice (seeded or OS entropy) and the crime engine
//! 6. Serve the HTTP API until `Ctrl-C`

mod error;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use rand::SeedableRng;
use rand::rngs::StdRng;
use syndicate_api::{AppState, ServerConfig};
use syndicate_core::CrimeEngine;
use syndicate_core::config::SyndicateConfig;
use syndicate_core::memory::InMemoryStore;
use syndicate_core::store::GameStore;
use syndicate_db::{PgStore, PostgresPool};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::StartupError;

/// Default configuration file, relative to the working directory.
const DEFAULT_CONFIG_PATH: &str = "syndicate-config.yaml";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let path = std::env::var("SYNDICATE_CONFIG")
        .map_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    let config = load_config(&path)
        .with_context(|| format!("loading configuration from {}", path.display()))?;

    init_logging(&config).context("initializing logging")?;
    info!(
        config = %path.display(),
        crimes = config.crimes.len(),
        ranks = config.ranks.len(),
        "Configuration loaded"
    );

    if config.database.url.is_some() {
        let pool = PostgresPool::connect(&config.database)
            .await
            .map_err(StartupError::from)
            .context("connecting to PostgreSQL")?;
        pool.run_migrations()
            .await
            .map_err(StartupError::from)
            .context("running migrations")?;
        info!("Using PostgreSQL store");

        let store = Arc::new(PgStore::new(&pool));
        let result = run(&config, store).await;
        pool.close().await;
        result.context("running server")?;
    } else {
        warn!("No database URL configured; players live in memory only");
        run(&config, Arc::new(InMemoryStore::new()))
            .await
            .context("running server")?;
    }

    Ok(())
}

fn load_config(path: &std::path::Path) -> Result<SyndicateConfig, StartupError> {
    let config = SyndicateConfig::load_or_default(path)?;
    config.validate()?;
    Ok(config)
}

fn init_logging(config: &SyndicateConfig) -> Result<(), StartupError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let installed = if config.logging.format == "json" {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| StartupError::Logging {
        message: e.to_string(),
    })
}

/// Seed the catalog into `store`, build the engine, and serve.
async fn run<S: GameStore>(config: &SyndicateConfig, store: Arc<S>) -> Result<(), StartupError> {
    let dice = match config.engine.rng_seed {
        Some(seed) => {
            info!(seed, "Using seeded RNG");
            StdRng::seed_from_u64(seed)
        }
        None => StdRng::from_os_rng(),
    };

    let engine = CrimeEngine::new(store, dice)
        .with_failure_xp(config.engine.failure_xp)
        .with_store_timeout(Duration::from_millis(config.engine.store_timeout_ms));
    engine
        .seed_catalog(&config.crimes, &config.rank_table()?)
        .await?;

    let server_config = ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
    };
    let state = Arc::new(AppState::new(engine));
    syndicate_api::start_server(&server_config, state, shutdown_signal()).await?;
    Ok(())
}

async fn shutdown_signal() {
    shutdown_on(tokio::signal::ctrl_c()).await;
}

/// Resolves once `signal` fires. If the listener itself fails the server
/// keeps running and must be stopped externally.
async fn shutdown_on<F, E>(signal: F)
where
    F: Future<Output = Result<(), E>>,
    E: std::fmt::Display,
{
    if let Err(e) = signal.await {
        error!(error = %e, "Failed to listen for Ctrl-C; graceful shutdown disabled");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
