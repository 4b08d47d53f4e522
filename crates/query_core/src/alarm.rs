//! Alarm query model: severities, lifecycle statuses, the search-status
//! translation and the alarm page objects.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::ids::EntityId;
use crate::page::TsValue;
use crate::query::{EntityDataSortOrder, EntityFilter, EntityKey, EntityKeyType, KeyFilter};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlarmSeverity {
    Critical,
    Major,
    Minor,
    Warning,
    Indeterminate,
}

impl AlarmSeverity {
    pub fn as_str(self) -> &'static str {
        match self {
            AlarmSeverity::Critical => "CRITICAL",
            AlarmSeverity::Major => "MAJOR",
            AlarmSeverity::Minor => "MINOR",
            AlarmSeverity::Warning => "WARNING",
            AlarmSeverity::Indeterminate => "INDETERMINATE",
        }
    }
}

/// Concrete lifecycle status stored on the alarm row.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlarmStatus {
    ActiveUnack,
    ActiveAck,
    ClearedUnack,
    ClearedAck,
}

impl AlarmStatus {
    pub const ALL: [AlarmStatus; 4] = [
        AlarmStatus::ActiveUnack,
        AlarmStatus::ActiveAck,
        AlarmStatus::ClearedUnack,
        AlarmStatus::ClearedAck,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AlarmStatus::ActiveUnack => "ACTIVE_UNACK",
            AlarmStatus::ActiveAck => "ACTIVE_ACK",
            AlarmStatus::ClearedUnack => "CLEARED_UNACK",
            AlarmStatus::ClearedAck => "CLEARED_ACK",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "ACTIVE_UNACK" => Some(AlarmStatus::ActiveUnack),
            "ACTIVE_ACK" => Some(AlarmStatus::ActiveAck),
            "CLEARED_UNACK" => Some(AlarmStatus::ClearedUnack),
            "CLEARED_ACK" => Some(AlarmStatus::ClearedAck),
            _ => None,
        }
    }
}

/// User-facing search dimension; each value denotes a set of concrete
/// statuses.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlarmSearchStatus {
    Any,
    Active,
    Cleared,
    Ack,
    Unack,
}

/// Translates search statuses to the concrete status set to filter on. An
/// empty result means the status filter must be omitted: either `ANY` was
/// requested or the combination covers every concrete status.
pub fn to_alarm_statuses(search: &[AlarmSearchStatus]) -> Vec<AlarmStatus> {
    let mut result: Vec<AlarmStatus> = Vec::new();
    let push = |status: AlarmStatus, result: &mut Vec<AlarmStatus>| {
        if !result.contains(&status) {
            result.push(status);
        }
    };
    for status in search {
        match status {
            AlarmSearchStatus::Ack => {
                push(AlarmStatus::ActiveAck, &mut result);
                push(AlarmStatus::ClearedAck, &mut result);
            }
            AlarmSearchStatus::Unack => {
                push(AlarmStatus::ActiveUnack, &mut result);
                push(AlarmStatus::ClearedUnack, &mut result);
            }
            AlarmSearchStatus::Cleared => {
                push(AlarmStatus::ClearedAck, &mut result);
                push(AlarmStatus::ClearedUnack, &mut result);
            }
            AlarmSearchStatus::Active => {
                push(AlarmStatus::ActiveAck, &mut result);
                push(AlarmStatus::ActiveUnack, &mut result);
            }
            AlarmSearchStatus::Any => return Vec::new(),
        }
        if result.len() == AlarmStatus::ALL.len() {
            return Vec::new();
        }
    }
    result
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlarmDataPageLink {
    pub page_size: u32,
    pub page: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_search: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<EntityDataSortOrder>,
    #[serde(default)]
    pub dynamic: bool,
    #[serde(default)]
    pub start_ts: i64,
    #[serde(default)]
    pub end_ts: i64,
    #[serde(default)]
    pub time_window: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_list: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity_list: Option<Vec<AlarmSeverity>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_list: Option<Vec<AlarmSearchStatus>>,
    #[serde(default)]
    pub search_propagated_alarms: bool,
}

impl AlarmDataPageLink {
    pub fn page(page_size: u32, page: u32) -> Self {
        Self {
            page_size,
            page,
            text_search: None,
            sort_order: None,
            dynamic: false,
            start_ts: 0,
            end_ts: 0,
            time_window: 0,
            type_list: None,
            severity_list: None,
            status_list: None,
            search_propagated_alarms: false,
        }
    }

    pub fn next_page_link(&self) -> Self {
        let mut next = self.clone();
        next.page += 1;
        next
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlarmDataQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_filter: Option<EntityFilter>,
    pub page_link: AlarmDataPageLink,
    #[serde(default)]
    pub alarm_fields: Vec<EntityKey>,
    #[serde(default)]
    pub entity_fields: Vec<EntityKey>,
    #[serde(default)]
    pub latest_values: Vec<EntityKey>,
    #[serde(default)]
    pub key_filters: Vec<KeyFilter>,
}

impl AlarmDataQuery {
    pub fn next(&self) -> Self {
        let mut next = self.clone();
        next.page_link = self.page_link.next_page_link();
        next
    }
}

/// One alarm row of a query result. `entity_id` is the queried entity the
/// alarm was matched for, which differs from `originator` when the match came
/// through a propagation relation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlarmData {
    pub id: Uuid,
    pub created_time: i64,
    pub originator: EntityId,
    #[serde(rename = "type")]
    pub alarm_type: String,
    pub severity: AlarmSeverity,
    pub status: AlarmStatus,
    pub start_ts: i64,
    pub end_ts: i64,
    pub ack_ts: i64,
    pub clear_ts: i64,
    pub propagate: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub originator_name: Option<String>,
    pub entity_id: EntityId,
    #[serde(default)]
    pub latest: HashMap<EntityKeyType, HashMap<String, TsValue>>,
}
