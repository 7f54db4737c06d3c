//! Runtime configuration.
//!
//! Connection settings come from the environment (`.env` supported via
//! dotenvy in `main`); loader options come from the CLI and are validated
//! before the run starts.

use std::env;
use std::path::PathBuf;

use thiserror::Error;
use validator::Validate;

/// The per-transaction mutation cap of the target engine: one mutation is
/// one row-by-column write.
pub const DEFAULT_MAX_MUTATIONS: usize = 80_000;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required environment variable {name}")]
    MissingEnv { name: String },

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// ClickHouse connection settings, read from the environment.
#[derive(Clone, Debug)]
pub struct ConnectionConfig {
    pub url: String,
    pub user: String,
    pub password: String,
    pub database: String,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8123".to_string(),
            user: "default".to_string(),
            password: String::new(),
            database: "default".to_string(),
        }
    }
}

impl ConnectionConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            url: require_env("CLICKHOUSE_URL")?,
            user: require_env("CLICKHOUSE_USER")?,
            password: require_env("CLICKHOUSE_PASSWORD")?,
            database: require_env("CLICKHOUSE_DATABASE")?,
        })
    }
}

/// Loader options with validation.
#[derive(Clone, Debug, Validate)]
pub struct LoaderConfig {
    /// Directory holding the source CSV files.
    pub data_dir: PathBuf,

    /// Name the published graph views are derived from.
    #[validate(length(min = 1, message = "Graph name cannot be empty"))]
    pub graph_name: String,

    /// Per-transaction mutation cap of the target engine.
    #[validate(range(min = 1, message = "Mutation limit must be at least 1"))]
    pub max_mutations: usize,

    /// Transform and report without touching the store.
    pub dry_run: bool,

    /// Skip the teardown step (load into whatever is already there).
    pub keep_schema: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            graph_name: "graph".to_string(),
            max_mutations: DEFAULT_MAX_MUTATIONS,
            dry_run: false,
            keep_schema: false,
        }
    }
}

impl LoaderConfig {
    /// Validate and return the configuration, consuming the struct literal
    /// callers assemble from CLI arguments.
    pub fn validated(self) -> Result<Self, ConfigError> {
        self.validate()?;
        Ok(self)
    }
}

fn require_env(name: &str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::MissingEnv {
        name: name.to_string(),
    })
}
