pub mod adapter;
pub mod alarms;
pub mod config;
pub mod context;
pub mod datastore;
pub mod db;
pub mod filters;
pub mod keys;
pub mod migration;
pub mod plan;
pub mod predicates;
pub mod projections;
pub mod relations;
pub mod store;

pub use config::{DatabaseConfig, PoolConfig, QuerySettings, StoreConfig};
pub use datastore::{default_sqlite_path, load_or_init_config, open_store};
pub use store::EntityQueryStore;

pub use veris_query_core::*;
