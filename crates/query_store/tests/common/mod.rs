#![allow(dead_code)]

use sea_orm::sea_query::{Expr, OnConflict, Query, QueryStatementWriter, SqliteQueryBuilder};
use sea_orm::{ConnectionTrait, DatabaseBackend, DatabaseConnection, Statement};
use tempfile::TempDir;
use uuid::Uuid;
use veris_query_store::db::*;
use veris_query_store::{
    Caller, EntityId, EntityQueryStore, EntityType, StoreConfig, TenantId,
};

pub struct TestEnv {
    pub store: EntityQueryStore,
    pub tenant: TenantId,
    pub caller: Caller,
    _dir: TempDir,
}

pub async fn setup() -> TestEnv {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = StoreConfig::default_sqlite(dir.path().join("query.sqlite").to_string_lossy());
    let store = EntityQueryStore::connect(&config, dir.path())
        .await
        .expect("connect");
    let tenant = TenantId(Uuid::new_v4());
    insert_tenant(store.connection(), tenant.0, "My tenant", 1).await;
    TestEnv {
        store,
        tenant,
        caller: Caller::tenant(tenant),
        _dir: dir,
    }
}

pub async fn exec<S: QueryStatementWriter>(conn: &DatabaseConnection, stmt: &S) {
    let (sql, values) = stmt.build(SqliteQueryBuilder);
    conn.execute(Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        sql,
        values,
    ))
    .await
    .expect("exec");
}

fn id(value: Uuid) -> sea_orm::sea_query::SimpleExpr {
    value.to_string().into()
}

pub async fn insert_tenant(conn: &DatabaseConnection, tenant: Uuid, title: &str, created: i64) {
    let insert = Query::insert()
        .into_table(Tenant::Table)
        .columns([Tenant::Id, Tenant::CreatedTime, Tenant::Title])
        .values_panic([id(tenant), created.into(), title.into()])
        .to_owned();
    exec(conn, &insert).await;
}

pub async fn insert_customer(
    conn: &DatabaseConnection,
    customer: Uuid,
    tenant: Uuid,
    title: &str,
    created: i64,
) {
    let insert = Query::insert()
        .into_table(Customer::Table)
        .columns([
            Customer::Id,
            Customer::CreatedTime,
            Customer::TenantId,
            Customer::Title,
        ])
        .values_panic([id(customer), created.into(), id(tenant), title.into()])
        .to_owned();
    exec(conn, &insert).await;
}

pub async fn insert_device(
    conn: &DatabaseConnection,
    device: Uuid,
    tenant: Uuid,
    customer: Option<Uuid>,
    name: &str,
    device_type: &str,
    label: Option<&str>,
    created: i64,
) {
    let customer_value = match customer {
        Some(customer) => id(customer),
        None => sea_orm::Value::String(None).into(),
    };
    let label_value = match label {
        Some(label) => label.into(),
        None => sea_orm::Value::String(None).into(),
    };
    let insert = Query::insert()
        .into_table(Device::Table)
        .columns([
            Device::Id,
            Device::CreatedTime,
            Device::TenantId,
            Device::CustomerId,
            Device::Name,
            Device::Type,
            Device::Label,
        ])
        .values_panic([
            id(device),
            created.into(),
            id(tenant),
            customer_value,
            name.into(),
            device_type.into(),
            label_value,
        ])
        .to_owned();
    exec(conn, &insert).await;
}

pub async fn insert_asset(
    conn: &DatabaseConnection,
    asset: Uuid,
    tenant: Uuid,
    name: &str,
    asset_type: &str,
    created: i64,
) {
    let insert = Query::insert()
        .into_table(Asset::Table)
        .columns([
            Asset::Id,
            Asset::CreatedTime,
            Asset::TenantId,
            Asset::Name,
            Asset::Type,
        ])
        .values_panic([
            id(asset),
            created.into(),
            id(tenant),
            name.into(),
            asset_type.into(),
        ])
        .to_owned();
    exec(conn, &insert).await;
}

pub async fn insert_dashboard(
    conn: &DatabaseConnection,
    dashboard: Uuid,
    tenant: Uuid,
    title: &str,
    assigned_customers: Option<&str>,
    created: i64,
) {
    let assigned = match assigned_customers {
        Some(value) => value.into(),
        None => sea_orm::Value::String(None).into(),
    };
    let insert = Query::insert()
        .into_table(Dashboard::Table)
        .columns([
            Dashboard::Id,
            Dashboard::CreatedTime,
            Dashboard::TenantId,
            Dashboard::Title,
            Dashboard::AssignedCustomers,
        ])
        .values_panic([id(dashboard), created.into(), id(tenant), title.into(), assigned])
        .to_owned();
    exec(conn, &insert).await;
}

pub async fn insert_relation(
    conn: &DatabaseConnection,
    from: EntityId,
    to: EntityId,
    group: &str,
    relation_type: &str,
) {
    let insert = Query::insert()
        .into_table(Relation::Table)
        .columns([
            Relation::FromId,
            Relation::FromType,
            Relation::ToId,
            Relation::ToType,
            Relation::RelationTypeGroup,
            Relation::RelationType,
        ])
        .values_panic([
            id(from.id),
            from.entity_type.as_str().into(),
            id(to.id),
            to.entity_type.as_str().into(),
            group.into(),
            relation_type.into(),
        ])
        .to_owned();
    exec(conn, &insert).await;
}

pub async fn save_long_attribute(
    conn: &DatabaseConnection,
    entity: EntityId,
    scope: &str,
    key: &str,
    value: i64,
    ts: i64,
) {
    let insert = Query::insert()
        .into_table(AttributeKv::Table)
        .columns([
            AttributeKv::EntityType,
            AttributeKv::EntityId,
            AttributeKv::AttributeType,
            AttributeKv::AttributeKey,
            AttributeKv::LongV,
            AttributeKv::LastUpdateTs,
        ])
        .values_panic([
            entity.entity_type.as_str().into(),
            id(entity.id),
            scope.into(),
            key.into(),
            value.into(),
            ts.into(),
        ])
        .to_owned();
    exec(conn, &insert).await;
}

pub async fn save_str_attribute(
    conn: &DatabaseConnection,
    entity: EntityId,
    scope: &str,
    key: &str,
    value: &str,
    ts: i64,
) {
    let insert = Query::insert()
        .into_table(AttributeKv::Table)
        .columns([
            AttributeKv::EntityType,
            AttributeKv::EntityId,
            AttributeKv::AttributeType,
            AttributeKv::AttributeKey,
            AttributeKv::StrV,
            AttributeKv::LastUpdateTs,
        ])
        .values_panic([
            entity.entity_type.as_str().into(),
            id(entity.id),
            scope.into(),
            key.into(),
            value.into(),
            ts.into(),
        ])
        .to_owned();
    exec(conn, &insert).await;
}

pub async fn ts_key_id(conn: &DatabaseConnection, key: &str) -> i32 {
    let insert = Query::insert()
        .into_table(TsKvDictionary::Table)
        .columns([TsKvDictionary::Key])
        .values_panic([key.into()])
        .on_conflict(
            OnConflict::column(TsKvDictionary::Key)
                .do_nothing()
                .to_owned(),
        )
        .to_owned();
    exec(conn, &insert).await;

    let select = Query::select()
        .column(TsKvDictionary::KeyId)
        .from(TsKvDictionary::Table)
        .and_where(Expr::col(TsKvDictionary::Key).eq(key))
        .to_owned();
    let (sql, values) = select.build(SqliteQueryBuilder);
    let row = conn
        .query_one(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            sql,
            values,
        ))
        .await
        .expect("query key id")
        .expect("dictionary row");
    row.try_get("", "key_id").expect("key_id")
}

pub async fn save_latest_ts_long(
    conn: &DatabaseConnection,
    entity: EntityId,
    key: &str,
    value: i64,
    ts: i64,
) {
    let key_id = ts_key_id(conn, key).await;
    let insert = Query::insert()
        .into_table(TsKvLatest::Table)
        .columns([
            TsKvLatest::EntityId,
            TsKvLatest::KeyId,
            TsKvLatest::Ts,
            TsKvLatest::LongV,
        ])
        .values_panic([id(entity.id), key_id.into(), ts.into(), value.into()])
        .to_owned();
    exec(conn, &insert).await;
}

#[allow(clippy::too_many_arguments)]
pub async fn insert_alarm(
    conn: &DatabaseConnection,
    alarm: Uuid,
    tenant: Uuid,
    originator: EntityId,
    alarm_type: &str,
    severity: &str,
    status: &str,
    created: i64,
) {
    let insert = Query::insert()
        .into_table(Alarm::Table)
        .columns([
            Alarm::Id,
            Alarm::CreatedTime,
            Alarm::TenantId,
            Alarm::OriginatorId,
            Alarm::OriginatorType,
            Alarm::Type,
            Alarm::Severity,
            Alarm::Status,
            Alarm::StartTs,
            Alarm::EndTs,
            Alarm::AckTs,
            Alarm::ClearTs,
            Alarm::Propagate,
        ])
        .values_panic([
            id(alarm),
            created.into(),
            id(tenant),
            id(originator.id),
            originator.entity_type.as_str().into(),
            alarm_type.into(),
            severity.into(),
            status.into(),
            created.into(),
            0i64.into(),
            0i64.into(),
            0i64.into(),
            false.into(),
        ])
        .to_owned();
    exec(conn, &insert).await;
}

pub async fn delete_all_devices(conn: &DatabaseConnection, tenant: Uuid) {
    let delete = Query::delete()
        .from_table(Device::Table)
        .and_where(Expr::col(Device::TenantId).eq(tenant.to_string()))
        .to_owned();
    exec(conn, &delete).await;
}

pub async fn table_count(conn: &DatabaseConnection, table: &str) -> i64 {
    let row = conn
        .query_one(Statement::from_string(
            DatabaseBackend::Sqlite,
            format!("SELECT COUNT(*) AS cnt FROM {table}"),
        ))
        .await
        .expect("count query")
        .expect("count row");
    row.try_get("", "cnt").expect("cnt")
}

pub fn device_id(value: Uuid) -> EntityId {
    EntityId::new(EntityType::Device, value)
}

pub fn asset_id(value: Uuid) -> EntityId {
    EntityId::new(EntityType::Asset, value)
}
