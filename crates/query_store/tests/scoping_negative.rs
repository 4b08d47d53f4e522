mod common;

use common::*;
use uuid::Uuid;
use veris_query_store::{
    Caller, CustomerId, EntityCountQuery, EntityDataPageLink, EntityDataQuery, EntityFilter,
    EntityKey, EntityQueryApi, EntityType, QueryError,
};

#[tokio::test]
async fn explicit_id_list_cannot_escape_the_tenant() {
    let env = setup().await;
    let conn = env.store.connection();

    let other_tenant = Uuid::new_v4();
    insert_tenant(conn, other_tenant, "Other tenant", 1).await;
    let foreign_device = Uuid::new_v4();
    insert_device(conn, foreign_device, other_tenant, None, "Foreign", "default", None, 100).await;
    let own_device = Uuid::new_v4();
    insert_device(conn, own_device, env.tenant.0, None, "Own", "default", None, 101).await;

    let query = EntityCountQuery::new(EntityFilter::EntityList {
        entity_type: EntityType::Device,
        entity_list: vec![own_device, foreign_device],
    });
    let count = env.store.count_entities(&env.caller, &query).await.expect("count");
    assert_eq!(count, 1);
}

#[tokio::test]
async fn customer_scope_restricts_devices() {
    let env = setup().await;
    let conn = env.store.connection();

    let customer = Uuid::new_v4();
    insert_customer(conn, customer, env.tenant.0, "Customer A", 10).await;
    let other_customer = Uuid::new_v4();
    insert_customer(conn, other_customer, env.tenant.0, "Customer B", 11).await;

    let mine = Uuid::new_v4();
    insert_device(conn, mine, env.tenant.0, Some(customer), "Mine", "default", None, 100).await;
    let theirs = Uuid::new_v4();
    insert_device(conn, theirs, env.tenant.0, Some(other_customer), "Theirs", "default", None, 101)
        .await;
    let unassigned = Uuid::new_v4();
    insert_device(conn, unassigned, env.tenant.0, None, "Unassigned", "default", None, 102).await;

    let caller = Caller::customer(env.tenant, CustomerId(customer));
    let query = EntityCountQuery::new(EntityFilter::EntityType {
        entity_type: EntityType::Device,
    });
    let count = env.store.count_entities(&caller, &query).await.expect("count");
    assert_eq!(count, 1);

    let query = EntityCountQuery::new(EntityFilter::EntityList {
        entity_type: EntityType::Device,
        entity_list: vec![mine, theirs, unassigned],
    });
    let count = env.store.count_entities(&caller, &query).await.expect("count");
    assert_eq!(count, 1);
}

#[tokio::test]
async fn dashboard_visibility_follows_assignment() {
    let env = setup().await;
    let conn = env.store.connection();

    let customer = Uuid::new_v4();
    insert_customer(conn, customer, env.tenant.0, "Customer A", 10).await;
    let assigned = Uuid::new_v4();
    insert_dashboard(
        conn,
        assigned,
        env.tenant.0,
        "Assigned board",
        Some(&format!("[\"{customer}\"]")),
        100,
    )
    .await;
    let unassigned = Uuid::new_v4();
    insert_dashboard(conn, unassigned, env.tenant.0, "Private board", None, 101).await;

    let query = EntityCountQuery::new(EntityFilter::EntityType {
        entity_type: EntityType::Dashboard,
    });
    let count = env.store.count_entities(&env.caller, &query).await.expect("count");
    assert_eq!(count, 2);

    let caller = Caller::customer(env.tenant, CustomerId(customer));
    let count = env.store.count_entities(&caller, &query).await.expect("count");
    assert_eq!(count, 1);
}

#[tokio::test]
async fn nil_customer_id_is_forbidden() {
    let env = setup().await;
    let caller = Caller::customer(env.tenant, CustomerId(Uuid::nil()));
    let query = EntityCountQuery::new(EntityFilter::EntityType {
        entity_type: EntityType::Device,
    });
    let err = env.store.count_entities(&caller, &query).await.expect_err("must fail");
    assert!(matches!(err, QueryError::Forbidden { .. }));
}

#[tokio::test]
async fn malformed_queries_are_rejected_before_execution() {
    let env = setup().await;

    let query = EntityCountQuery::new(EntityFilter::EntityList {
        entity_type: EntityType::Device,
        entity_list: Vec::new(),
    });
    let err = env.store.count_entities(&env.caller, &query).await.expect_err("must fail");
    assert!(matches!(err, QueryError::InvalidQuery { .. }));

    let query = EntityCountQuery::new(EntityFilter::EntityType {
        entity_type: EntityType::RuleChain,
    });
    let err = env.store.count_entities(&env.caller, &query).await.expect_err("must fail");
    assert!(matches!(err, QueryError::InvalidQuery { .. }));

    let query = EntityDataQuery {
        entity_filter: EntityFilter::EntityType {
            entity_type: EntityType::Device,
        },
        page_link: EntityDataPageLink::page(10, 0),
        entity_fields: vec![EntityKey::attribute("temperature")],
        latest_values: Vec::new(),
        key_filters: Vec::new(),
    };
    let err = env
        .store
        .find_entity_data(&env.caller, &query)
        .await
        .expect_err("must fail");
    assert!(matches!(err, QueryError::InvalidQuery { .. }));
}

#[tokio::test]
async fn text_search_injection_has_no_side_effects() {
    let env = setup().await;
    let conn = env.store.connection();
    for i in 0..5 {
        insert_device(
            conn,
            Uuid::new_v4(),
            env.tenant.0,
            None,
            &format!("Device{i}"),
            "default",
            None,
            1_000 + i,
        )
        .await;
    }
    assert_eq!(table_count(conn, "device").await, 5);

    let mut page_link = EntityDataPageLink::page(10, 0);
    page_link.text_search = Some("'; DROP TABLE device; --".to_string());
    let query = EntityDataQuery {
        entity_filter: EntityFilter::EntityType {
            entity_type: EntityType::Device,
        },
        page_link,
        entity_fields: vec![EntityKey::field("name")],
        latest_values: Vec::new(),
        key_filters: Vec::new(),
    };
    let page = env.store.find_entity_data(&env.caller, &query).await.expect("find");
    assert_eq!(page.total_elements, 0);
    assert_eq!(table_count(conn, "device").await, 5);
}

#[tokio::test]
async fn unknown_keys_resolve_to_null_instead_of_failing() {
    let env = setup().await;
    let conn = env.store.connection();
    let id = Uuid::new_v4();
    insert_device(conn, id, env.tenant.0, None, "Sensor", "default", None, 1_000).await;

    let query = EntityDataQuery {
        entity_filter: EntityFilter::SingleEntity {
            single_entity: device_id(id),
        },
        page_link: EntityDataPageLink::page(10, 0),
        entity_fields: vec![EntityKey::field("name"), EntityKey::field("serialNumber")],
        latest_values: Vec::new(),
        key_filters: Vec::new(),
    };
    let page = env.store.find_entity_data(&env.caller, &query).await.expect("find");
    let fields = page.data[0]
        .latest
        .get(&veris_query_store::EntityKeyType::EntityField)
        .expect("fields");
    assert_eq!(fields["serialNumber"].value, "");
}
