use std::collections::HashMap;
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseBackend, DatabaseConnection,
    DatabaseTransaction, QueryResult as Row, TransactionTrait,
};
use sea_orm_migration::MigratorTrait;
use uuid::Uuid;
use veris_query_core::{
    AlarmData, AlarmDataQuery, AlarmQueryApi, Caller, EntityCountQuery, EntityData,
    EntityDataQuery, EntityFilter, EntityId, EntityKeyType, EntityQueryApi, EntityType, PageData,
    QueryError, QueryResult,
};

use crate::config::{DatabaseConfig, StoreConfig};
use crate::context::QueryContext;
use crate::migration::Migrator;
use crate::plan::{build_count_plan, build_data_plan};
use crate::{adapter, alarms};

/// Stateless query engine over one connection pool. Every call compiles a
/// plan, runs the count and data statements in one transaction and returns a
/// typed page; no state survives the call.
#[derive(Clone)]
pub struct EntityQueryStore {
    conn: DatabaseConnection,
    backend: DatabaseBackend,
    statement_timeout: Duration,
}

impl EntityQueryStore {
    pub async fn connect(config: &StoreConfig, base_dir: &Path) -> QueryResult<Self> {
        let url = build_connection_url(config, base_dir)?;
        let mut options = ConnectOptions::new(url);
        if let Some(pool) = &config.pool {
            if let Some(max) = pool.max_connections {
                options.max_connections(max);
            }
            if let Some(min) = pool.min_connections {
                options.min_connections(min);
            }
            if let Some(timeout_ms) = pool.connect_timeout_ms {
                options.connect_timeout(Duration::from_millis(timeout_ms));
            }
            if let Some(timeout_ms) = pool.acquire_timeout_ms {
                options.acquire_timeout(Duration::from_millis(timeout_ms));
            }
            if let Some(timeout_ms) = pool.idle_timeout_ms {
                options.idle_timeout(Duration::from_millis(timeout_ms));
            }
        }
        let conn = Database::connect(options).await.map_err(QueryError::from)?;
        let backend = conn.get_database_backend();
        let store = Self {
            conn,
            backend,
            statement_timeout: Duration::from_millis(config.statement_timeout_ms()),
        };
        Migrator::up(&store.conn, None)
            .await
            .map_err(QueryError::from)?;
        Ok(store)
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.conn
    }

    pub fn backend(&self) -> DatabaseBackend {
        self.backend
    }

    fn context(&self, caller: &Caller, entity_type: EntityType) -> QueryContext {
        QueryContext::new(self.backend, caller.tenant_id, caller.customer_id, entity_type)
    }

    async fn query_all(
        &self,
        txn: &DatabaseTransaction,
        ctx: &QueryContext,
        sql: &str,
    ) -> QueryResult<Vec<Row>> {
        let stmt = ctx.render(sql)?;
        log::debug!("query: {}", stmt.sql);
        match tokio::time::timeout(self.statement_timeout, txn.query_all(stmt)).await {
            Ok(rows) => rows.map_err(QueryError::from),
            Err(_) => Err(QueryError::unavailable("statement timeout exceeded")),
        }
    }

    async fn query_count(
        &self,
        txn: &DatabaseTransaction,
        ctx: &QueryContext,
        sql: &str,
    ) -> QueryResult<u64> {
        let rows = self.query_all(txn, ctx, sql).await?;
        let row = rows
            .first()
            .ok_or_else(|| QueryError::storage("count query returned no rows"))?;
        let count: i64 = row.try_get("", "cnt")?;
        Ok(count.max(0) as u64)
    }
}

#[async_trait]
impl EntityQueryApi for EntityQueryStore {
    async fn count_entities(&self, caller: &Caller, query: &EntityCountQuery) -> QueryResult<u64> {
        validate_caller(caller)?;
        let mut ctx = self.context(caller, filter_target_type(&query.entity_filter));
        let plan = build_count_plan(&mut ctx, &query.entity_filter, &query.key_filters)?;

        let txn = self.conn.begin().await.map_err(QueryError::from)?;
        let count = self.query_count(&txn, &ctx, &plan.count_sql).await?;
        txn.commit().await.map_err(QueryError::from)?;
        Ok(count)
    }

    async fn find_entity_data(
        &self,
        caller: &Caller,
        query: &EntityDataQuery,
    ) -> QueryResult<PageData<EntityData>> {
        validate_caller(caller)?;
        validate_data_query(query)?;
        let mut ctx = self.context(caller, filter_target_type(&query.entity_filter));
        let plan = build_data_plan(
            &mut ctx,
            &query.entity_filter,
            &query.key_filters,
            &query.entity_fields,
            &query.latest_values,
            &query.page_link,
        )?;
        let data_sql = plan
            .data_sql
            .as_deref()
            .ok_or_else(|| QueryError::internal("data plan without data statement"))?;

        let txn = self.conn.begin().await.map_err(QueryError::from)?;
        let total = self.query_count(&txn, &ctx, &plan.count_sql).await?;
        let mut data = Vec::new();
        if total > 0 {
            for row in self.query_all(&txn, &ctx, data_sql).await? {
                data.push(adapter::entity_data_from_row(&plan.projection, &row)?);
            }
        }
        txn.commit().await.map_err(QueryError::from)?;
        Ok(PageData::new(
            data,
            total,
            query.page_link.page_size,
            query.page_link.page,
        ))
    }
}

#[async_trait]
impl AlarmQueryApi for EntityQueryStore {
    async fn find_alarm_data(
        &self,
        caller: &Caller,
        query: &AlarmDataQuery,
        ordered_entity_ids: &[EntityId],
    ) -> QueryResult<PageData<AlarmData>> {
        validate_caller(caller)?;
        if ordered_entity_ids.is_empty() {
            return Ok(PageData::empty());
        }
        let mut ctx = self.context(caller, EntityType::Alarm);
        let plan = alarms::build_alarm_plan(&mut ctx, query, ordered_entity_ids, now_millis())?;

        let lookup: HashMap<Uuid, EntityId> = ordered_entity_ids
            .iter()
            .map(|entity| (entity.id, *entity))
            .collect();

        let txn = self.conn.begin().await.map_err(QueryError::from)?;
        let total = self.query_count(&txn, &ctx, &plan.count_sql).await?;
        let mut data = Vec::new();
        if total > 0 {
            for row in self.query_all(&txn, &ctx, &plan.data_sql).await? {
                data.push(adapter::alarm_data_from_row(&row, &lookup)?);
            }
        }
        txn.commit().await.map_err(QueryError::from)?;
        Ok(PageData::new(
            data,
            total,
            query.page_link.page_size,
            query.page_link.page,
        ))
    }
}

fn validate_caller(caller: &Caller) -> QueryResult<()> {
    match caller.customer_id {
        Some(customer) if customer.is_nil() => Err(QueryError::forbidden(
            "customer-scoped caller without a customer id",
        )),
        _ => Ok(()),
    }
}

fn validate_data_query(query: &EntityDataQuery) -> QueryResult<()> {
    for key in &query.entity_fields {
        if key.key_type != EntityKeyType::EntityField {
            return Err(QueryError::invalid(format!(
                "entity field selection '{}' must be of type ENTITY_FIELD",
                key.key
            )));
        }
    }
    for key in &query.latest_values {
        if !key.key_type.is_latest() {
            return Err(QueryError::invalid(format!(
                "latest value selection '{}' must be an attribute or time series key",
                key.key
            )));
        }
    }
    Ok(())
}

/// Target entity type of a filter, recorded in the security context.
fn filter_target_type(filter: &EntityFilter) -> EntityType {
    match filter {
        EntityFilter::EntityList { entity_type, .. } => *entity_type,
        EntityFilter::SingleEntity { single_entity } => single_entity.entity_type,
        EntityFilter::EntityType { entity_type } => *entity_type,
        EntityFilter::EntityName { entity_type, .. } => *entity_type,
        EntityFilter::EntityViewType { .. } => EntityType::EntityView,
        EntityFilter::DeviceType { .. } => EntityType::Device,
        EntityFilter::AssetType { .. } => EntityType::Asset,
        EntityFilter::RelationsQuery { root_entity, .. } => root_entity.entity_type,
        EntityFilter::DeviceSearchQuery { .. } => EntityType::Device,
        EntityFilter::AssetSearchQuery { .. } => EntityType::Asset,
        EntityFilter::EntityViewSearchQuery { .. } => EntityType::EntityView,
    }
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

fn build_connection_url(config: &StoreConfig, base_dir: &Path) -> QueryResult<String> {
    match &config.database {
        DatabaseConfig::Sqlite { .. } => {
            let path = config.sqlite_path(base_dir)?;
            Ok(format!("sqlite://{}?mode=rwc", path.display()))
        }
        DatabaseConfig::Postgres { url } => Ok(url.clone()),
    }
}
