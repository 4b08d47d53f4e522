use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::ids::EntityId;
use crate::query::EntityKeyType;

/// One projected value: the canonical string form plus the source timestamp
/// (attribute `last_update_ts`, telemetry `ts`, `0` for entity fields and for
/// missing backing rows).
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct TsValue {
    pub ts: i64,
    pub value: String,
}

impl TsValue {
    pub fn new(ts: i64, value: impl Into<String>) -> Self {
        Self {
            ts,
            value: value.into(),
        }
    }
}

/// One entity row of a query result. Entity fields live under
/// `latest[ENTITY_FIELD]`; attribute and telemetry values under their key
/// type. The maps contain exactly the requested keys.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityData {
    pub entity_id: EntityId,
    pub latest: HashMap<EntityKeyType, HashMap<String, TsValue>>,
}

impl EntityData {
    pub fn new(entity_id: EntityId) -> Self {
        Self {
            entity_id,
            latest: HashMap::new(),
        }
    }

    pub fn latest_value(&self, key_type: EntityKeyType, key: &str) -> Option<&TsValue> {
        self.latest.get(&key_type).and_then(|m| m.get(key))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageData<T> {
    pub data: Vec<T>,
    pub total_pages: u64,
    pub total_elements: u64,
    pub has_next: bool,
}

impl<T> PageData<T> {
    /// Page math per the engine contract: `total_pages` is the ceiling for a
    /// positive page size and `1` otherwise; `has_next` compares the window
    /// end against the total.
    pub fn new(data: Vec<T>, total_elements: u64, page_size: u32, page: u32) -> Self {
        let total_pages = if page_size > 0 {
            total_elements.div_ceil(page_size as u64)
        } else {
            1
        };
        let has_next = page_size > 0 && (page as u64 + 1) * (page_size as u64) < total_elements;
        Self {
            data,
            total_pages,
            total_elements,
            has_next,
        }
    }

    pub fn empty() -> Self {
        Self {
            data: Vec::new(),
            total_pages: 0,
            total_elements: 0,
            has_next: false,
        }
    }
}
