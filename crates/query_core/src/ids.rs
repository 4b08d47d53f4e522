use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Closed set of addressable entity types.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityType {
    Tenant,
    Customer,
    User,
    Dashboard,
    Asset,
    Device,
    EntityView,
    Alarm,
    RuleChain,
    RuleNode,
}

impl EntityType {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityType::Tenant => "TENANT",
            EntityType::Customer => "CUSTOMER",
            EntityType::User => "USER",
            EntityType::Dashboard => "DASHBOARD",
            EntityType::Asset => "ASSET",
            EntityType::Device => "DEVICE",
            EntityType::EntityView => "ENTITY_VIEW",
            EntityType::Alarm => "ALARM",
            EntityType::RuleChain => "RULE_CHAIN",
            EntityType::RuleNode => "RULE_NODE",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "TENANT" => Some(EntityType::Tenant),
            "CUSTOMER" => Some(EntityType::Customer),
            "USER" => Some(EntityType::User),
            "DASHBOARD" => Some(EntityType::Dashboard),
            "ASSET" => Some(EntityType::Asset),
            "DEVICE" => Some(EntityType::Device),
            "ENTITY_VIEW" => Some(EntityType::EntityView),
            "ALARM" => Some(EntityType::Alarm),
            "RULE_CHAIN" => Some(EntityType::RuleChain),
            "RULE_NODE" => Some(EntityType::RuleNode),
            _ => None,
        }
    }

    /// Types that are backed by a queryable row table.
    pub fn has_row_table(self) -> bool {
        matches!(
            self,
            EntityType::Tenant
                | EntityType::Customer
                | EntityType::User
                | EntityType::Dashboard
                | EntityType::Asset
                | EntityType::Device
                | EntityType::EntityView
        )
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An addressable entity: `(type, uuid)`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityId {
    pub entity_type: EntityType,
    pub id: Uuid,
}

impl EntityId {
    pub fn new(entity_type: EntityType, id: Uuid) -> Self {
        Self { entity_type, id }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.entity_type, self.id)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct TenantId(pub Uuid);

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct CustomerId(pub Uuid);

impl CustomerId {
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

/// Security scope of the invoking user. `customer_id: None` is a tenant-level
/// caller; `Some(id)` restricts every plan to that customer's entities.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Caller {
    pub tenant_id: TenantId,
    pub customer_id: Option<CustomerId>,
}

impl Caller {
    pub fn tenant(tenant_id: TenantId) -> Self {
        Self {
            tenant_id,
            customer_id: None,
        }
    }

    pub fn customer(tenant_id: TenantId, customer_id: CustomerId) -> Self {
        Self {
            tenant_id,
            customer_id: Some(customer_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_type_names_round_trip() {
        for ty in [
            EntityType::Tenant,
            EntityType::Customer,
            EntityType::User,
            EntityType::Dashboard,
            EntityType::Asset,
            EntityType::Device,
            EntityType::EntityView,
            EntityType::Alarm,
            EntityType::RuleChain,
            EntityType::RuleNode,
        ] {
            assert_eq!(EntityType::from_name(ty.as_str()), Some(ty));
        }
        assert_eq!(EntityType::from_name("WIDGET"), None);
    }

    #[test]
    fn entity_id_serializes_with_wire_names() {
        let id = EntityId::new(EntityType::Device, Uuid::nil());
        let json = serde_json::to_value(&id).expect("serialize");
        assert_eq!(json["entityType"], "DEVICE");
        assert_eq!(json["id"], "00000000-0000-0000-0000-000000000000");
    }
}
