//! Declarative query objects: entity filters, key filters, predicates and
//! page links. These deserialize directly from the wire format consumed by
//! the HTTP layer.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::ids::{EntityId, EntityType};

/// Addresses either an entity column, a latest attribute value, a latest
/// telemetry value or an alarm column.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityKeyType {
    EntityField,
    Attribute,
    ClientAttribute,
    SharedAttribute,
    ServerAttribute,
    TimeSeries,
    AlarmField,
}

impl EntityKeyType {
    pub fn is_attribute(self) -> bool {
        matches!(
            self,
            EntityKeyType::Attribute
                | EntityKeyType::ClientAttribute
                | EntityKeyType::SharedAttribute
                | EntityKeyType::ServerAttribute
        )
    }

    pub fn is_latest(self) -> bool {
        self.is_attribute() || self == EntityKeyType::TimeSeries
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct EntityKey {
    #[serde(rename = "type")]
    pub key_type: EntityKeyType,
    pub key: String,
}

impl EntityKey {
    pub fn new(key_type: EntityKeyType, key: impl Into<String>) -> Self {
        Self {
            key_type,
            key: key.into(),
        }
    }

    pub fn field(key: impl Into<String>) -> Self {
        Self::new(EntityKeyType::EntityField, key)
    }

    pub fn attribute(key: impl Into<String>) -> Self {
        Self::new(EntityKeyType::Attribute, key)
    }

    pub fn time_series(key: impl Into<String>) -> Self {
        Self::new(EntityKeyType::TimeSeries, key)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityKeyValueType {
    String,
    Numeric,
    Boolean,
    DateTime,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StringOperation {
    Equal,
    NotEqual,
    StartsWith,
    EndsWith,
    Contains,
    NotContains,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NumericOperation {
    Equal,
    NotEqual,
    Greater,
    Less,
    GreaterOrEqual,
    LessOrEqual,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BooleanOperation {
    Equal,
    NotEqual,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComplexOperation {
    And,
    Or,
}

/// Right-hand side of a predicate: a literal with an optional dynamic
/// reference to another key of the same entity. When `dynamic_key` is set the
/// comparison is column-to-column; otherwise the user value (falling back to
/// the default) binds as a parameter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterPredicateValue<T> {
    pub default_value: T,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_value: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dynamic_key: Option<EntityKey>,
}

impl<T> FilterPredicateValue<T> {
    pub fn literal(value: T) -> Self {
        Self {
            default_value: value,
            user_value: None,
            dynamic_key: None,
        }
    }

    pub fn resolved(&self) -> &T {
        self.user_value.as_ref().unwrap_or(&self.default_value)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StringFilterPredicate {
    pub operation: StringOperation,
    pub value: FilterPredicateValue<String>,
    #[serde(default)]
    pub ignore_case: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NumericFilterPredicate {
    pub operation: NumericOperation,
    pub value: FilterPredicateValue<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BooleanFilterPredicate {
    pub operation: BooleanOperation,
    pub value: FilterPredicateValue<bool>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE", rename_all_fields = "camelCase")]
pub enum KeyFilterPredicate {
    String(StringFilterPredicate),
    Numeric(NumericFilterPredicate),
    Boolean(BooleanFilterPredicate),
    Complex {
        operation: ComplexOperation,
        predicates: Vec<KeyFilterPredicate>,
    },
}

/// A typed predicate over one entity key, applied as a WHERE conjunct.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyFilter {
    pub key: EntityKey,
    pub value_type: EntityKeyValueType,
    pub predicate: KeyFilterPredicate,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntitySearchDirection {
    From,
    To,
}

/// Post-filter applied to traversal output: keep rows reached over
/// `relation_type` whose entity type is in `entity_types`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationEntityTypeFilter {
    #[serde(default)]
    pub relation_type: Option<String>,
    #[serde(default)]
    pub entity_types: Vec<EntityType>,
}

fn serialize_max_level<S: Serializer>(value: &Option<u32>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u32(value.unwrap_or(0))
}

fn deserialize_max_level<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u32>, D::Error> {
    let raw = Option::<u32>::deserialize(d)?;
    Ok(raw.filter(|level| *level > 0))
}

/// Selects the candidate entity set of a query. Dispatch lives in the filter
/// compiler; this is a pure value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum EntityFilter {
    EntityList {
        entity_type: EntityType,
        entity_list: Vec<Uuid>,
    },
    SingleEntity {
        single_entity: EntityId,
    },
    EntityType {
        entity_type: EntityType,
    },
    EntityName {
        entity_type: EntityType,
        entity_name_filter: String,
    },
    EntityViewType {
        entity_view_type: String,
        #[serde(default)]
        entity_view_name_filter: String,
    },
    DeviceType {
        device_type: String,
        #[serde(default)]
        device_name_filter: String,
    },
    AssetType {
        asset_type: String,
        #[serde(default)]
        asset_name_filter: String,
    },
    RelationsQuery {
        root_entity: EntityId,
        direction: EntitySearchDirection,
        #[serde(
            default,
            serialize_with = "serialize_max_level",
            deserialize_with = "deserialize_max_level"
        )]
        max_level: Option<u32>,
        #[serde(default)]
        fetch_last_level_only: bool,
        #[serde(default)]
        filters: Vec<RelationEntityTypeFilter>,
    },
    DeviceSearchQuery {
        root_entity: EntityId,
        direction: EntitySearchDirection,
        #[serde(
            default,
            serialize_with = "serialize_max_level",
            deserialize_with = "deserialize_max_level"
        )]
        max_level: Option<u32>,
        #[serde(default)]
        fetch_last_level_only: bool,
        #[serde(default)]
        relation_type: Option<String>,
        #[serde(default)]
        device_types: Vec<String>,
    },
    AssetSearchQuery {
        root_entity: EntityId,
        direction: EntitySearchDirection,
        #[serde(
            default,
            serialize_with = "serialize_max_level",
            deserialize_with = "deserialize_max_level"
        )]
        max_level: Option<u32>,
        #[serde(default)]
        fetch_last_level_only: bool,
        #[serde(default)]
        relation_type: Option<String>,
        #[serde(default)]
        asset_types: Vec<String>,
    },
    EntityViewSearchQuery {
        root_entity: EntityId,
        direction: EntitySearchDirection,
        #[serde(
            default,
            serialize_with = "serialize_max_level",
            deserialize_with = "deserialize_max_level"
        )]
        max_level: Option<u32>,
        #[serde(default)]
        fetch_last_level_only: bool,
        #[serde(default)]
        relation_type: Option<String>,
        #[serde(default)]
        entity_view_types: Vec<String>,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityDataSortOrder {
    pub key: EntityKey,
    pub direction: SortDirection,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityDataPageLink {
    pub page_size: u32,
    pub page: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_search: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<EntityDataSortOrder>,
    #[serde(default)]
    pub dynamic: bool,
}

impl EntityDataPageLink {
    pub fn page(page_size: u32, page: u32) -> Self {
        Self {
            page_size,
            page,
            text_search: None,
            sort_order: None,
            dynamic: false,
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
pub struct EntityDataQuery {
    pub entity_filter: EntityFilter,
    pub page_link: EntityDataPageLink,
    #[serde(default)]
    pub entity_fields: Vec<EntityKey>,
    #[serde(default)]
    pub latest_values: Vec<EntityKey>,
    #[serde(default)]
    pub key_filters: Vec<KeyFilter>,
}

impl EntityDataQuery {
    /// Same query addressing the next page.
    pub fn next(&self) -> Self {
        let mut next = self.clone();
        next.page_link = self.page_link.next_page_link();
        next
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityCountQuery {
    pub entity_filter: EntityFilter,
    #[serde(default)]
    pub key_filters: Vec<KeyFilter>,
}

impl EntityCountQuery {
    pub fn new(entity_filter: EntityFilter) -> Self {
        Self {
            entity_filter,
            key_filters: Vec::new(),
        }
    }
}
