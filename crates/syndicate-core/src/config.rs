//! Configuration loading and typed config structures for the Syndicate backend.
//!
//! The canonical configuration lives in `syndicate-config.yaml` at the
//! project root. Every section is optional and falls back to the defaults
//! below, so an empty file (or no file at all) yields a runnable server
//! backed by the in-memory store.

use std::collections::BTreeSet;
use std::path::Path;

use serde::Deserialize;
use syndicate_types::{CrimeDefinition, CrimeId, RankTier};

use crate::policy::FailureXpPolicy;
use crate::rank::RankTable;
use crate::resolve::validate_crime;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The configuration parsed but describes an unusable setup.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level backend configuration.
///
/// Mirrors the structure of `syndicate-config.yaml`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SyndicateConfig {
    /// HTTP listener settings.
    #[serde(default)]
    pub server: ServerSection,

    /// `PostgreSQL` settings. Without a URL the in-memory store is used.
    #[serde(default)]
    pub database: DatabaseSection,

    /// Crime engine tuning.
    #[serde(default)]
    pub engine: EngineSection,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingSection,

    /// Crime catalog seeded into the store at startup.
    #[serde(default = "default_crimes")]
    pub crimes: Vec<CrimeDefinition>,

    /// Rank ladder seeded into the store at startup.
    #[serde(default = "default_ranks")]
    pub ranks: Vec<RankTier>,
}

impl Default for SyndicateConfig {
    fn default() -> Self {
        Self {
            server: ServerSection::default(),
            database: DatabaseSection::default(),
            engine: EngineSection::default(),
            logging: LoggingSection::default(),
            crimes: default_crimes(),
            ranks: default_ranks(),
        }
    }
}

impl SyndicateConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Only the file is read; see [`SyndicateConfig::load_or_default`]
    /// for the environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Load from `path` if it exists, otherwise start from defaults, then
    /// apply environment overrides:
    /// - `DATABASE_URL` overrides `database.url`
    /// - `SYNDICATE_PORT` overrides `server.port`
    ///
    /// # Errors
    ///
    /// Same as [`SyndicateConfig::from_file`], or [`ConfigError::Invalid`]
    /// if an override cannot be parsed.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            Self::from_file(path)?
        } else {
            Self::default()
        };
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Parse configuration from a YAML string. An empty string yields the
    /// defaults. The environment is not consulted.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yml::from_str(yaml)?)
    }

    /// Override connection settings from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `SYNDICATE_PORT` is not a port.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Override connection settings from `lookup`, which maps a variable
    /// name to its value. Blank `DATABASE_URL` values are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `SYNDICATE_PORT` is not a port.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(url) = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()) {
            self.database.url = Some(url);
        }
        if let Some(port) = lookup("SYNDICATE_PORT") {
            self.server.port = port.trim().parse().map_err(|e| {
                ConfigError::Invalid(format!("SYNDICATE_PORT {port:?} is not a valid port: {e}"))
            })?;
        }
        Ok(())
    }

    /// Check the configuration describes a usable backend.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.engine.store_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "engine.store_timeout_ms must be positive".to_owned(),
            ));
        }
        if !self.engine.failure_xp.is_valid() {
            return Err(ConfigError::Invalid(
                "engine.failure_xp percent must be at most 100".to_owned(),
            ));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be positive".to_owned(),
            ));
        }
        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            return Err(ConfigError::Invalid(format!(
                "logging.format must be \"pretty\" or \"json\", found {:?}",
                self.logging.format
            )));
        }

        let mut seen: BTreeSet<&CrimeId> = BTreeSet::new();
        for crime in &self.crimes {
            validate_crime(crime).map_err(|e| ConfigError::Invalid(e.to_string()))?;
            if !seen.insert(&crime.id) {
                return Err(ConfigError::Invalid(format!(
                    "crime {} is defined more than once",
                    crime.id
                )));
            }
        }

        self.rank_table().map(|_| ())
    }

    /// Build the validated rank ladder from the `ranks` section.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the ladder is malformed.
    pub fn rank_table(&self) -> Result<RankTable, ConfigError> {
        RankTable::new(self.ranks.clone())
            .map_err(|e| ConfigError::Invalid(format!("ranks: {e}")))
    }
}

/// HTTP listener configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerSection {
    /// Bind address.
    #[serde(default = "default_host")]
    pub host: String,

    /// Bind port.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// `PostgreSQL` connection configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DatabaseSection {
    /// Connection string. `None` selects the in-memory store.
    #[serde(default)]
    pub url: Option<String>,

    /// Maximum pool size.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Seconds to wait for a pooled connection.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: default_max_connections(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

/// Crime engine tuning.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EngineSection {
    /// Consolation XP for failed attempts.
    #[serde(default)]
    pub failure_xp: FailureXpPolicy,

    /// Fixed RNG seed for reproducible runs. Unset draws from the OS.
    #[serde(default)]
    pub rng_seed: Option<u64>,

    /// Upper bound on any single store call, in milliseconds.
    #[serde(default = "default_store_timeout_ms")]
    pub store_timeout_ms: u64,
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            failure_xp: FailureXpPolicy::default(),
            rng_seed: None,
            store_timeout_ms: default_store_timeout_ms(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingSection {
    /// Default filter directive when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// `pretty` or `json`.
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions
// ---------------------------------------------------------------------------

fn default_host() -> String {
    "0.0.0.0".to_owned()
}

const fn default_port() -> u16 {
    8080
}

const fn default_max_connections() -> u32 {
    10
}

const fn default_connect_timeout_secs() -> u64 {
    5
}

const fn default_store_timeout_ms() -> u64 {
    2_000
}

fn default_log_level() -> String {
    "info".to_owned()
}

fn default_log_format() -> String {
    "pretty".to_owned()
}

fn default_ranks() -> Vec<RankTier> {
    RankTable::default().tiers().to_vec()
}

fn crime(
    id: &str,
    name: &str,
    description: &str,
    rewards: (i64, i64),
    success_rate: f64,
    cooldown_secs: u64,
    xp_award: u64,
) -> CrimeDefinition {
    CrimeDefinition {
        id: CrimeId::from(id),
        name: name.to_owned(),
        description: description.to_owned(),
        min_reward: rewards.0,
        max_reward: rewards.1,
        success_rate,
        cooldown_secs,
        xp_award,
    }
}

fn default_crimes() -> Vec<CrimeDefinition> {
    vec![
        crime(
            "pickpocket",
            "Pickpocket",
            "Lift a wallet in a crowded market.",
            (5, 40),
            0.85,
            30,
            2,
        ),
        crime(
            "shoplift",
            "Shoplift",
            "Walk out of a corner store with something under your coat.",
            (20, 120),
            0.7,
            60,
            5,
        ),
        crime(
            "mugging",
            "Mugging",
            "Corner someone in an alley.",
            (80, 400),
            0.55,
            180,
            12,
        ),
        crime(
            "car_theft",
            "Car Theft",
            "Hotwire something expensive and sell it for parts.",
            (400, 1_500),
            0.4,
            600,
            30,
        ),
        crime(
            "bank_job",
            "Bank Job",
            "Hit the downtown branch with a crew.",
            (5_000, 25_000),
            0.15,
            3_600,
            150,
        ),
    ]
}
