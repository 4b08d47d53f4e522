//! Maps raw result rows to typed page records. Row readers tolerate the
//! backend differences in id and value representation (uuid columns read as
//! native uuids on PostgreSQL and as text on SQLite).

use std::collections::HashMap;

use sea_orm::QueryResult as Row;
use serde_json::Value as JsonValue;
use uuid::Uuid;
use veris_query_core::{
    AlarmData, AlarmSeverity, AlarmStatus, EntityData, EntityId, EntityKeyType, EntityType,
    QueryError, QueryResult, TsValue,
};

use crate::projections::EntityProjection;

pub fn read_uuid(row: &Row, column: &str) -> QueryResult<Uuid> {
    if let Ok(value) = row.try_get::<String>("", column) {
        return Uuid::parse_str(&value)
            .map_err(|err| QueryError::storage(format!("invalid uuid in '{column}': {err}")));
    }
    if let Ok(value) = row.try_get::<Uuid>("", column) {
        return Ok(value);
    }
    Err(QueryError::storage(format!(
        "unsupported id format in '{column}'"
    )))
}

fn read_entity_type(row: &Row, column: &str) -> QueryResult<EntityType> {
    let name: String = row.try_get("", column)?;
    EntityType::from_name(&name)
        .ok_or_else(|| QueryError::internal(format!("unknown entity type '{name}'")))
}

/// Reads a projected column of unknown runtime type as its canonical string
/// form. `None` means the cell was NULL.
fn read_value_as_string(row: &Row, column: &str) -> Option<String> {
    if let Ok(value) = row.try_get::<Option<String>>("", column) {
        return value;
    }
    if let Ok(value) = row.try_get::<Option<i64>>("", column) {
        return value.map(|v| v.to_string());
    }
    if let Ok(value) = row.try_get::<Option<f64>>("", column) {
        return value.map(|v| v.to_string());
    }
    if let Ok(value) = row.try_get::<Option<bool>>("", column) {
        return value.map(|v| if v { "true".to_string() } else { "false".to_string() });
    }
    None
}

fn latest_cell_value(row: &Row, prefix: &str) -> QueryResult<TsValue> {
    let ts: Option<i64> = row.try_get("", &format!("{prefix}_ts"))?;
    let str_v: Option<String> = row.try_get("", &format!("{prefix}_str"))?;
    let long_v: Option<i64> = row.try_get("", &format!("{prefix}_long"))?;
    let dbl_v: Option<f64> = row.try_get("", &format!("{prefix}_dbl"))?;
    let bool_v: Option<bool> = row.try_get("", &format!("{prefix}_bool"))?;
    let json_v: Option<String> = row.try_get("", &format!("{prefix}_json"))?;
    let value = if let Some(v) = str_v {
        v
    } else if let Some(v) = long_v {
        v.to_string()
    } else if let Some(v) = dbl_v {
        v.to_string()
    } else if let Some(v) = bool_v {
        if v {
            "true".to_string()
        } else {
            "false".to_string()
        }
    } else if let Some(v) = json_v {
        v
    } else {
        String::new()
    };
    Ok(TsValue {
        ts: ts.unwrap_or(0),
        value,
    })
}

/// One result row to `EntityData`, with the projection maps containing
/// exactly the requested keys; missing backing rows yield empty values.
pub fn entity_data_from_row(projection: &EntityProjection, row: &Row) -> QueryResult<EntityData> {
    let entity_type = read_entity_type(row, "entity_type")?;
    let id = read_uuid(row, "id")?;
    let mut data = EntityData::new(EntityId::new(entity_type, id));

    for (key, alias) in &projection.fields {
        let value = read_value_as_string(row, alias).unwrap_or_default();
        data.latest
            .entry(EntityKeyType::EntityField)
            .or_default()
            .insert(key.key.clone(), TsValue { ts: 0, value });
    }
    for (key, prefix) in &projection.latest {
        let value = latest_cell_value(row, prefix)?;
        data.latest
            .entry(key.key_type)
            .or_default()
            .insert(key.key.clone(), value);
    }
    Ok(data)
}

fn parse_severity(raw: &str) -> QueryResult<AlarmSeverity> {
    match raw {
        "CRITICAL" => Ok(AlarmSeverity::Critical),
        "MAJOR" => Ok(AlarmSeverity::Major),
        "MINOR" => Ok(AlarmSeverity::Minor),
        "WARNING" => Ok(AlarmSeverity::Warning),
        "INDETERMINATE" => Ok(AlarmSeverity::Indeterminate),
        other => Err(QueryError::internal(format!("unknown severity '{other}'"))),
    }
}

/// One alarm result row to `AlarmData`. `ordered` resolves the matched
/// entity id back to its typed form; propagated matches may target an entity
/// of a different type than the originator.
pub fn alarm_data_from_row(
    row: &Row,
    ordered: &HashMap<Uuid, EntityId>,
) -> QueryResult<AlarmData> {
    let originator_type = read_entity_type(row, "originator_type")?;
    let originator = EntityId::new(originator_type, read_uuid(row, "originator_id")?);
    let matched = read_uuid(row, "entity_id")?;
    let entity_id = ordered
        .get(&matched)
        .copied()
        .unwrap_or(EntityId::new(originator_type, matched));

    let status_raw: String = row.try_get("", "status")?;
    let status = AlarmStatus::from_name(&status_raw)
        .ok_or_else(|| QueryError::internal(format!("unknown alarm status '{status_raw}'")))?;
    let severity_raw: String = row.try_get("", "severity")?;

    let details = row
        .try_get::<Option<String>>("", "additional_info")?
        .map(|raw| serde_json::from_str(&raw).unwrap_or(JsonValue::String(raw)));

    Ok(AlarmData {
        id: read_uuid(row, "id")?,
        created_time: row.try_get("", "created_time")?,
        originator,
        alarm_type: row.try_get("", "type")?,
        severity: parse_severity(&severity_raw)?,
        status,
        start_ts: row.try_get("", "start_ts")?,
        end_ts: row.try_get("", "end_ts")?,
        ack_ts: row.try_get("", "ack_ts")?,
        clear_ts: row.try_get("", "clear_ts")?,
        propagate: row.try_get("", "propagate")?,
        details,
        originator_name: row.try_get("", "originator_name")?,
        entity_id,
        latest: HashMap::new(),
    })
}
