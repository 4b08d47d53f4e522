//! Alarm search over an ordered collection of entity ids: propagation
//! relations, alarm criteria, text search over alarm fields, and a priority
//! sort preserving the caller's id ordering.

use veris_query_core::{
    to_alarm_statuses, AlarmDataQuery, EntityId, EntityKeyType, QueryError, QueryResult,
    SortDirection,
};

use crate::context::QueryContext;
use crate::keys::alarm_field_column;

const ORIGINATOR_NAME: &str = "CASE \
 WHEN a.originator_type = 'TENANT' THEN (SELECT title FROM tenant WHERE id = a.originator_id) \
 WHEN a.originator_type = 'CUSTOMER' THEN (SELECT title FROM customer WHERE id = a.originator_id) \
 WHEN a.originator_type = 'USER' THEN (SELECT email FROM tb_user WHERE id = a.originator_id) \
 WHEN a.originator_type = 'DASHBOARD' THEN (SELECT title FROM dashboard WHERE id = a.originator_id) \
 WHEN a.originator_type = 'ASSET' THEN (SELECT name FROM asset WHERE id = a.originator_id) \
 WHEN a.originator_type = 'DEVICE' THEN (SELECT name FROM device WHERE id = a.originator_id) \
 WHEN a.originator_type = 'ENTITY_VIEW' THEN (SELECT name FROM entity_view WHERE id = a.originator_id) \
 END AS originator_name";

const FIELDS_SELECTION: &str = "SELECT a.id AS id, \
 a.created_time AS created_time, \
 a.ack_ts AS ack_ts, \
 a.clear_ts AS clear_ts, \
 a.additional_info AS additional_info, \
 a.end_ts AS end_ts, \
 a.originator_id AS originator_id, \
 a.originator_type AS originator_type, \
 a.propagate AS propagate, \
 a.severity AS severity, \
 a.start_ts AS start_ts, \
 a.status AS status, \
 a.tenant_id AS tenant_id, \
 a.type AS type, ";

const JOIN_RELATIONS: &str = "LEFT JOIN relation r ON r.relation_type_group = 'ALARM' \
 AND r.relation_type = 'ANY' AND a.id = r.to_id AND r.from_id IN (:entity_ids)";

pub struct AlarmPlan {
    pub count_sql: String,
    pub data_sql: String,
}

pub fn build_alarm_plan(
    ctx: &mut QueryContext,
    query: &AlarmDataQuery,
    ordered_entity_ids: &[EntityId],
    now_ms: i64,
) -> QueryResult<AlarmPlan> {
    let page_link = &query.page_link;
    ctx.add_uuid_list(
        "entity_ids",
        ordered_entity_ids.iter().map(|id| id.id).collect(),
    );

    let mut select_part = FIELDS_SELECTION.to_string();
    select_part.push_str(ORIGINATOR_NAME);
    let mut from_part = " FROM alarm a ".to_string();
    let mut conditions: Vec<String> = vec![permissions_condition(ctx)];
    let mut sort_part = String::new();

    if page_link.search_propagated_alarms {
        select_part.push_str(
            ", CASE WHEN r.from_id IS NULL THEN a.originator_id ELSE r.from_id END AS entity_id",
        );
        from_part.push_str(JOIN_RELATIONS);
        conditions.push("(a.originator_id IN (:entity_ids) OR r.from_id IS NOT NULL)".to_string());
    } else {
        select_part.push_str(", a.originator_id AS entity_id");
        conditions.push("a.originator_id IN (:entity_ids)".to_string());
    }

    let alarm_field_sort = page_link
        .sort_order
        .as_ref()
        .filter(|order| order.key.key_type == EntityKeyType::AlarmField);
    if let Some(order) = alarm_field_sort {
        let column = alarm_field_column(&order.key.key).ok_or_else(|| {
            QueryError::invalid(format!("unknown alarm field '{}'", order.key.key))
        })?;
        let direction = match order.direction {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        };
        sort_part = format!("{column} {direction}");
    } else {
        // Preserve the caller's ordering: index of the matched entity in the
        // input list becomes the sort priority.
        select_part.push_str(", e.priority AS entity_priority");
        let mut derived = String::from("LEFT JOIN (");
        for (index, entity_id) in ordered_entity_ids.iter().enumerate() {
            let param = ctx.next_param_name("alarm_entity");
            ctx.add_uuid(param.clone(), entity_id.id);
            if index == 0 {
                derived.push_str(&format!("SELECT :{param} AS id, 0 AS priority"));
            } else {
                derived.push_str(&format!(" UNION ALL SELECT :{param}, {index}"));
            }
        }
        derived.push_str(") e ON ");
        if page_link.search_propagated_alarms {
            derived.push_str(
                "(r.from_id IS NULL AND a.originator_id = e.id) \
                 OR (r.from_id IS NOT NULL AND r.from_id = e.id)",
            );
        } else {
            derived.push_str("a.originator_id = e.id");
        }
        from_part.push(' ');
        from_part.push_str(&derived);
        sort_part = "entity_priority ASC".to_string();
    }

    let (start_ts, end_ts) = if page_link.time_window > 0 {
        (now_ms - page_link.time_window, now_ms)
    } else {
        (page_link.start_ts, page_link.end_ts)
    };
    if start_ts > 0 {
        ctx.add_long("start_time", start_ts);
        conditions.push("a.created_time >= :start_time".to_string());
    }
    if end_ts > 0 {
        ctx.add_long("end_time", end_ts);
        conditions.push("a.created_time <= :end_time".to_string());
    }

    if let Some(types) = page_link.type_list.as_ref().filter(|list| !list.is_empty()) {
        ctx.add_string_list("alarm_types", types.clone());
        conditions.push("a.type IN (:alarm_types)".to_string());
    }
    if let Some(severities) = page_link
        .severity_list
        .as_ref()
        .filter(|list| !list.is_empty())
    {
        ctx.add_string_list(
            "alarm_severities",
            severities.iter().map(|s| s.as_str().to_string()).collect(),
        );
        conditions.push("a.severity IN (:alarm_severities)".to_string());
    }
    if let Some(statuses) = page_link.status_list.as_ref() {
        let concrete = to_alarm_statuses(statuses);
        if !concrete.is_empty() {
            ctx.add_string_list(
                "alarm_statuses",
                concrete.iter().map(|s| s.as_str().to_string()).collect(),
            );
            conditions.push("a.status IN (:alarm_statuses)".to_string());
        }
    }

    let mut main = format!("{select_part}{from_part} WHERE {}", conditions.join(" AND "));
    if let Some(text_condition) = text_search_condition(ctx, query) {
        main = format!("SELECT * FROM ({main}) a WHERE {text_condition}");
    }

    let count_sql = format!("SELECT COUNT(*) AS cnt FROM ({main}) result");
    let mut data_sql = format!("{main} ORDER BY {sort_part}, id ASC");
    if page_link.page_size > 0 {
        ctx.add_long("alarm_limit", i64::from(page_link.page_size));
        ctx.add_long(
            "alarm_offset",
            i64::from(page_link.page_size) * i64::from(page_link.page),
        );
        data_sql.push_str(" LIMIT :alarm_limit OFFSET :alarm_offset");
    }
    Ok(AlarmPlan {
        count_sql,
        data_sql,
    })
}

/// Tenant scope plus, for customer-bound callers, an originator-row customer
/// check per originator type.
fn permissions_condition(ctx: &mut QueryContext) -> String {
    ctx.add_uuid("permissions_tenant_id", ctx.tenant_id().0);
    let mut sql = "a.tenant_id = :permissions_tenant_id".to_string();
    let customer_id = match ctx.customer_id() {
        Some(id) if !id.is_nil() => id,
        _ => return sql,
    };
    ctx.add_uuid("permissions_customer_id", customer_id.0);
    sql.push_str(
        " AND ((a.originator_type = 'DEVICE' AND EXISTS (SELECT 1 FROM device cd \
         WHERE cd.id = a.originator_id AND cd.customer_id = :permissions_customer_id)) \
         OR (a.originator_type = 'ASSET' AND EXISTS (SELECT 1 FROM asset ca \
         WHERE ca.id = a.originator_id AND ca.customer_id = :permissions_customer_id)) \
         OR (a.originator_type = 'CUSTOMER' AND EXISTS (SELECT 1 FROM customer cc \
         WHERE cc.id = a.originator_id AND cc.id = :permissions_customer_id)) \
         OR (a.originator_type = 'USER' AND EXISTS (SELECT 1 FROM tb_user cu \
         WHERE cu.id = a.originator_id AND cu.customer_id = :permissions_customer_id)) \
         OR (a.originator_type = 'ENTITY_VIEW' AND EXISTS (SELECT 1 FROM entity_view cv \
         WHERE cv.id = a.originator_id AND cv.customer_id = :permissions_customer_id)))",
    );
    sql
}

/// Case-insensitive containment over the alarm fields named by the query
/// projection, applied to the wrapped selection.
fn text_search_condition(ctx: &mut QueryContext, query: &AlarmDataQuery) -> Option<String> {
    let text = query.page_link.text_search.as_deref()?.trim();
    if text.is_empty() || query.alarm_fields.is_empty() {
        return None;
    }
    let lowered = text.to_lowercase();
    let mut predicates: Vec<String> = Vec::new();
    for key in &query.alarm_fields {
        let Some(column) = alarm_field_column(&key.key) else {
            continue;
        };
        let param = ctx.next_param_name(&format!("{column}_search"));
        ctx.add_string(param.clone(), lowered.clone());
        predicates.push(format!(
            "LOWER(CAST({column} AS VARCHAR)) LIKE ('%' || :{param} || '%')"
        ));
    }
    if predicates.is_empty() {
        None
    } else {
        Some(format!("({})", predicates.join(" OR ")))
    }
}
