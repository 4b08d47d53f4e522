mod common;

use common::*;
use uuid::Uuid;
use veris_query_store::{
    AlarmDataPageLink, AlarmDataQuery, AlarmQueryApi, AlarmSearchStatus, AlarmSeverity,
    AlarmStatus, EntityDataSortOrder, EntityId, EntityKey, EntityKeyType, EntityType,
    SortDirection,
};

fn alarm_query(page_link: AlarmDataPageLink) -> AlarmDataQuery {
    AlarmDataQuery {
        entity_filter: None,
        page_link,
        alarm_fields: vec![
            EntityKey::new(EntityKeyType::AlarmField, "type"),
            EntityKey::new(EntityKeyType::AlarmField, "severity"),
            EntityKey::new(EntityKeyType::AlarmField, "status"),
        ],
        entity_fields: Vec::new(),
        latest_values: Vec::new(),
        key_filters: Vec::new(),
    }
}

struct AlarmEnv {
    env: TestEnv,
    devices: Vec<EntityId>,
}

async fn setup_alarms() -> AlarmEnv {
    let env = setup().await;
    let conn = env.store.connection();
    let mut devices = Vec::new();
    for i in 0..3 {
        let id = Uuid::new_v4();
        insert_device(
            conn,
            id,
            env.tenant.0,
            None,
            &format!("Device{i}"),
            "default",
            None,
            1_000 + i,
        )
        .await;
        devices.push(device_id(id));
    }
    // Two alarms per device with distinct creation times and statuses.
    let mut created = 10_000i64;
    for (i, device) in devices.iter().enumerate() {
        for j in 0..2 {
            created += 1;
            let status = if j == 0 { "ACTIVE_UNACK" } else { "CLEARED_ACK" };
            insert_alarm(
                conn,
                Uuid::new_v4(),
                env.tenant.0,
                *device,
                &format!("HighTemp{i}"),
                "CRITICAL",
                status,
                created,
            )
            .await;
        }
    }
    AlarmEnv { env, devices }
}

#[tokio::test]
async fn priority_sort_follows_the_ordered_entity_list() {
    let alarms = setup_alarms().await;
    let ordered = vec![alarms.devices[2], alarms.devices[0], alarms.devices[1]];
    let page = alarms
        .env
        .store
        .find_alarm_data(&alarms.env.caller, &alarm_query(AlarmDataPageLink::page(10, 0)), &ordered)
        .await
        .expect("find");
    assert_eq!(page.total_elements, 6);
    assert_eq!(page.data.len(), 6);

    let matched: Vec<EntityId> = page.data.iter().map(|alarm| alarm.entity_id).collect();
    assert_eq!(matched[0], alarms.devices[2]);
    assert_eq!(matched[1], alarms.devices[2]);
    assert_eq!(matched[2], alarms.devices[0]);
    assert_eq!(matched[3], alarms.devices[0]);
    assert_eq!(matched[4], alarms.devices[1]);
    assert_eq!(matched[5], alarms.devices[1]);
    assert!(page.data.iter().all(|alarm| alarm.severity == AlarmSeverity::Critical));
}

#[tokio::test]
async fn alarm_field_sort_orders_by_created_time() {
    let alarms = setup_alarms().await;
    let mut page_link = AlarmDataPageLink::page(10, 0);
    page_link.sort_order = Some(EntityDataSortOrder {
        key: EntityKey::new(EntityKeyType::AlarmField, "createdTime"),
        direction: SortDirection::Desc,
    });
    let page = alarms
        .env
        .store
        .find_alarm_data(&alarms.env.caller, &alarm_query(page_link), &alarms.devices)
        .await
        .expect("find");
    let times: Vec<i64> = page.data.iter().map(|alarm| alarm.created_time).collect();
    let mut sorted = times.clone();
    sorted.sort_by(|a, b| b.cmp(a));
    assert_eq!(times, sorted);
}

#[tokio::test]
async fn status_translation_filters_concrete_statuses() {
    let alarms = setup_alarms().await;

    let mut page_link = AlarmDataPageLink::page(10, 0);
    page_link.status_list = Some(vec![AlarmSearchStatus::Ack]);
    let page = alarms
        .env
        .store
        .find_alarm_data(&alarms.env.caller, &alarm_query(page_link), &alarms.devices)
        .await
        .expect("find");
    assert_eq!(page.total_elements, 3);
    assert!(page.data.iter().all(|alarm| alarm.status == AlarmStatus::ClearedAck));

    // ACTIVE + CLEARED covers every concrete status, so the filter drops out.
    let mut page_link = AlarmDataPageLink::page(10, 0);
    page_link.status_list = Some(vec![AlarmSearchStatus::Active, AlarmSearchStatus::Cleared]);
    let page = alarms
        .env
        .store
        .find_alarm_data(&alarms.env.caller, &alarm_query(page_link), &alarms.devices)
        .await
        .expect("find");
    assert_eq!(page.total_elements, 6);
}

#[tokio::test]
async fn type_and_time_window_filters() {
    let alarms = setup_alarms().await;

    let mut page_link = AlarmDataPageLink::page(10, 0);
    page_link.type_list = Some(vec!["HighTemp0".to_string()]);
    let page = alarms
        .env
        .store
        .find_alarm_data(&alarms.env.caller, &alarm_query(page_link), &alarms.devices)
        .await
        .expect("find");
    assert_eq!(page.total_elements, 2);
    assert!(page.data.iter().all(|alarm| alarm.alarm_type == "HighTemp0"));

    // Seeded creation times run from 10_001 to 10_006.
    let mut page_link = AlarmDataPageLink::page(10, 0);
    page_link.start_ts = 10_004;
    page_link.end_ts = 10_006;
    let page = alarms
        .env
        .store
        .find_alarm_data(&alarms.env.caller, &alarm_query(page_link), &alarms.devices)
        .await
        .expect("find");
    assert_eq!(page.total_elements, 3);
}

#[tokio::test]
async fn propagated_alarms_resolve_to_the_related_entity() {
    let env = setup().await;
    let conn = env.store.connection();

    let asset = Uuid::new_v4();
    insert_asset(conn, asset, env.tenant.0, "Plant", "factory", 2_000).await;
    let device = Uuid::new_v4();
    insert_device(conn, device, env.tenant.0, None, "Sensor", "default", None, 2_001).await;

    let alarm = Uuid::new_v4();
    insert_alarm(
        conn,
        alarm,
        env.tenant.0,
        asset_id(asset),
        "Flood",
        "MAJOR",
        "ACTIVE_UNACK",
        3_000,
    )
    .await;
    insert_relation(
        conn,
        device_id(device),
        EntityId::new(EntityType::Alarm, alarm),
        "ALARM",
        "ANY",
    )
    .await;

    // Without propagation the device has no alarms of its own.
    let page = env
        .store
        .find_alarm_data(&env.caller, &alarm_query(AlarmDataPageLink::page(10, 0)), &[device_id(device)])
        .await
        .expect("find");
    assert_eq!(page.total_elements, 0);

    let mut page_link = AlarmDataPageLink::page(10, 0);
    page_link.search_propagated_alarms = true;
    let page = env
        .store
        .find_alarm_data(&env.caller, &alarm_query(page_link), &[device_id(device)])
        .await
        .expect("find");
    assert_eq!(page.total_elements, 1);
    let found = &page.data[0];
    assert_eq!(found.id, alarm);
    assert_eq!(found.originator, asset_id(asset));
    assert_eq!(found.entity_id, device_id(device));
    assert_eq!(found.originator_name.as_deref(), Some("Plant"));
}

#[tokio::test]
async fn empty_ordered_ids_short_circuit() {
    let env = setup().await;
    let page = env
        .store
        .find_alarm_data(&env.caller, &alarm_query(AlarmDataPageLink::page(10, 0)), &[])
        .await
        .expect("find");
    assert_eq!(page.total_elements, 0);
    assert!(page.data.is_empty());
    assert!(!page.has_next);
}

#[tokio::test]
async fn alarm_pagination_agrees_with_count() {
    let alarms = setup_alarms().await;
    let mut collected = 0usize;
    let mut query = alarm_query(AlarmDataPageLink::page(4, 0));
    loop {
        let page = alarms
            .env
            .store
            .find_alarm_data(&alarms.env.caller, &query, &alarms.devices)
            .await
            .expect("find");
        assert_eq!(page.total_elements, 6);
        collected += page.data.len();
        if !page.has_next {
            break;
        }
        query = query.next();
    }
    assert_eq!(collected, 6);
}
