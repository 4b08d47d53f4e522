use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use veris_query_core::{QueryError, QueryResult};

const DEFAULT_CONFIG_NAME: &str = "veris-query.json";

pub const DEFAULT_STATEMENT_TIMEOUT_MS: u64 = 30_000;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum DatabaseConfig {
    Sqlite { path: Option<String> },
    Postgres { url: String },
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PoolConfig {
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
    pub connect_timeout_ms: Option<u64>,
    pub acquire_timeout_ms: Option<u64>,
    pub idle_timeout_ms: Option<u64>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct QuerySettings {
    /// Upper bound for one database round-trip; a slow relation walk or
    /// latest join aborts the call with a retryable error.
    pub statement_timeout_ms: Option<u64>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoreConfig {
    pub database: DatabaseConfig,
    pub pool: Option<PoolConfig>,
    #[serde(default)]
    pub query: Option<QuerySettings>,
}

impl StoreConfig {
    pub fn default_sqlite(path: impl Into<String>) -> Self {
        Self {
            database: DatabaseConfig::Sqlite {
                path: Some(path.into()),
            },
            pool: None,
            query: None,
        }
    }

    pub fn postgres(url: impl Into<String>) -> Self {
        Self {
            database: DatabaseConfig::Postgres { url: url.into() },
            pool: None,
            query: None,
        }
    }

    pub fn load_or_init(base_dir: &Path, default_sqlite_path: &Path) -> QueryResult<Self> {
        fs::create_dir_all(base_dir)
            .map_err(|err| QueryError::storage(format!("create config dir: {err}")))?;
        let config_path = base_dir.join(DEFAULT_CONFIG_NAME);
        if config_path.exists() {
            let raw = fs::read_to_string(&config_path)
                .map_err(|err| QueryError::storage(format!("read config: {err}")))?;
            let config: StoreConfig =
                serde_json::from_str(&raw).map_err(|err| QueryError::invalid(err.to_string()))?;
            return Ok(config);
        }
        let default = StoreConfig::default_sqlite(default_sqlite_path.to_string_lossy());
        let payload = serde_json::to_string_pretty(&default)
            .map_err(|err| QueryError::storage(format!("serialize config: {err}")))?;
        fs::write(&config_path, payload)
            .map_err(|err| QueryError::storage(format!("write config: {err}")))?;
        Ok(default)
    }

    pub fn sqlite_path(&self, base_dir: &Path) -> QueryResult<PathBuf> {
        match &self.database {
            DatabaseConfig::Sqlite { path } => {
                let path = path.clone().unwrap_or_else(|| "veris-query.sqlite".to_string());
                let candidate = PathBuf::from(path);
                if candidate.is_absolute() {
                    Ok(candidate)
                } else {
                    Ok(base_dir.join(candidate))
                }
            }
            _ => Err(QueryError::invalid("config is not sqlite backend")),
        }
    }

    pub fn backend_name(&self) -> &'static str {
        match self.database {
            DatabaseConfig::Sqlite { .. } => "sqlite",
            DatabaseConfig::Postgres { .. } => "postgres",
        }
    }

    pub fn statement_timeout_ms(&self) -> u64 {
        self.query
            .as_ref()
            .and_then(|query| query.statement_timeout_ms)
            .unwrap_or(DEFAULT_STATEMENT_TIMEOUT_MS)
    }
}
