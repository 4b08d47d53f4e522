use std::path::{Path, PathBuf};

use veris_query_core::QueryResult;

use crate::config::StoreConfig;
use crate::store::EntityQueryStore;

const DEFAULT_DB_NAME: &str = "veris-query.sqlite";

pub fn load_or_init_config(base: &Path) -> QueryResult<StoreConfig> {
    let default_sqlite = base.join(DEFAULT_DB_NAME);
    StoreConfig::load_or_init(base, &default_sqlite)
}

pub async fn open_store(base: &Path) -> QueryResult<EntityQueryStore> {
    let config = load_or_init_config(base)?;
    EntityQueryStore::connect(&config, base).await
}

pub fn default_sqlite_path(base: &Path) -> PathBuf {
    base.join(DEFAULT_DB_NAME)
}
