//! Static registries mapping logical key names to physical columns.
//!
//! Keys absent from a type's registry resolve to NULL rather than an error,
//! so mixed-type candidate sets still project a well-formed row.

use veris_query_core::EntityType;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FieldColumn {
    pub column: &'static str,
    pub numeric: bool,
}

const CREATED_TIME: FieldColumn = FieldColumn {
    column: "created_time",
    numeric: true,
};

const ADDITIONAL_INFO: FieldColumn = FieldColumn {
    column: "additional_info",
    numeric: false,
};

fn text(column: &'static str) -> FieldColumn {
    FieldColumn {
        column,
        numeric: false,
    }
}

/// Physical column for an ENTITY_FIELD key on the given type. `entityType`
/// is handled by the caller (it is a property of the candidate row, not a
/// table column).
pub fn entity_field_column(entity_type: EntityType, key: &str) -> Option<FieldColumn> {
    match key {
        "createdTime" => return Some(CREATED_TIME),
        "additionalInfo" => return Some(ADDITIONAL_INFO),
        _ => {}
    }
    match entity_type {
        EntityType::Device | EntityType::Asset => match key {
            "name" => Some(text("name")),
            "type" => Some(text("type")),
            "label" => Some(text("label")),
            _ => None,
        },
        EntityType::EntityView => match key {
            "name" => Some(text("name")),
            "type" => Some(text("type")),
            _ => None,
        },
        EntityType::Tenant => match key {
            "name" | "title" => Some(text("title")),
            "region" => Some(text("region")),
            _ => None,
        },
        EntityType::Customer => match key {
            "name" | "title" => Some(text("title")),
            "email" => Some(text("email")),
            _ => None,
        },
        EntityType::Dashboard => match key {
            "name" | "title" => Some(text("title")),
            _ => None,
        },
        EntityType::User => match key {
            "name" | "email" => Some(text("email")),
            "firstName" => Some(text("first_name")),
            "lastName" => Some(text("last_name")),
            _ => None,
        },
        _ => None,
    }
}

/// Fixed alarm-field registry; values are both the physical columns and the
/// projection aliases of the alarm selection.
pub fn alarm_field_column(key: &str) -> Option<&'static str> {
    match key {
        "createdTime" => Some("created_time"),
        "ackTs" | "ackTime" => Some("ack_ts"),
        "clearTs" | "clearTime" => Some("clear_ts"),
        "startTs" | "startTime" => Some("start_ts"),
        "endTs" | "endTime" => Some("end_ts"),
        "details" => Some("additional_info"),
        "type" => Some("type"),
        "severity" => Some("severity"),
        "status" => Some("status"),
        "originator_id" => Some("originator_id"),
        "originator_type" => Some("originator_type"),
        "originator" => Some("originator_name"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn common_keys_resolve_for_every_row_type() {
        for ty in [
            EntityType::Tenant,
            EntityType::Customer,
            EntityType::User,
            EntityType::Dashboard,
            EntityType::Asset,
            EntityType::Device,
            EntityType::EntityView,
        ] {
            let created = entity_field_column(ty, "createdTime").expect("createdTime");
            assert!(created.numeric);
            assert!(entity_field_column(ty, "additionalInfo").is_some());
            assert!(entity_field_column(ty, "name").is_some());
        }
    }

    #[test]
    fn name_aliases_to_the_type_specific_column() {
        assert_eq!(
            entity_field_column(EntityType::Customer, "name").map(|c| c.column),
            Some("title")
        );
        assert_eq!(
            entity_field_column(EntityType::User, "name").map(|c| c.column),
            Some("email")
        );
        assert_eq!(
            entity_field_column(EntityType::Device, "name").map(|c| c.column),
            Some("name")
        );
        assert!(entity_field_column(EntityType::Device, "serial").is_none());
    }

    #[test]
    fn alarm_registry_matches_the_wire_keys() {
        assert_eq!(alarm_field_column("ackTime"), Some("ack_ts"));
        assert_eq!(alarm_field_column("originator"), Some("originator_name"));
        assert_eq!(alarm_field_column("details"), Some("additional_info"));
        assert_eq!(alarm_field_column("nope"), None);
    }
}
