//! Per-variant compilation of entity filters into candidate sub-selects
//! producing `(id, entity_type[, lvl])`, with tenant/customer scoping woven
//! into every single-table select. Traversal candidates are scoped later,
//! through the per-type row joins of the projection binder.

use veris_query_core::{
    EntityFilter, EntityId, EntitySearchDirection, EntityType, QueryError, QueryResult,
    RelationEntityTypeFilter,
};

use crate::context::QueryContext;
use crate::keys::entity_field_column;
use crate::relations::{build_relation_walk, WalkSpec};

/// Entity types that have a queryable row table, in join order.
pub const ROW_TYPES: [EntityType; 7] = [
    EntityType::Tenant,
    EntityType::Customer,
    EntityType::User,
    EntityType::Dashboard,
    EntityType::Asset,
    EntityType::Device,
    EntityType::EntityView,
];

pub fn table_name(entity_type: EntityType) -> Option<&'static str> {
    match entity_type {
        EntityType::Tenant => Some("tenant"),
        EntityType::Customer => Some("customer"),
        EntityType::User => Some("tb_user"),
        EntityType::Dashboard => Some("dashboard"),
        EntityType::Asset => Some("asset"),
        EntityType::Device => Some("device"),
        EntityType::EntityView => Some("entity_view"),
        _ => None,
    }
}

/// Fixed alias of each row table in the assembled plan.
pub fn type_alias(entity_type: EntityType) -> Option<&'static str> {
    match entity_type {
        EntityType::Tenant => Some("tnt"),
        EntityType::Customer => Some("cst"),
        EntityType::User => Some("usr"),
        EntityType::Dashboard => Some("dsh"),
        EntityType::Asset => Some("ast"),
        EntityType::Device => Some("dev"),
        EntityType::EntityView => Some("evw"),
        _ => None,
    }
}

/// Candidate entity set of one filter, ready to be wrapped as `FROM (..) s`.
#[derive(Debug)]
pub struct CandidateQuery {
    pub sql: String,
    /// Entity types the candidate rows can have, restricted to row types.
    pub entity_types: Vec<EntityType>,
    /// Traversal candidates carry a `lvl` column and are not yet scoped.
    pub traversal: bool,
    /// Additional conditions over the outer type aliases (subtype filters).
    pub extra_where: Vec<String>,
}

/// Scope fragment for one row-table alias: tenant ownership plus the
/// type-aware customer predicate when the caller is customer-bound.
pub fn permission_conditions(
    ctx: &mut QueryContext,
    alias: &str,
    entity_type: EntityType,
) -> String {
    ctx.add_uuid("permissions_tenant_id", ctx.tenant_id().0);
    let mut sql = if entity_type == EntityType::Tenant {
        format!("{alias}.id = :permissions_tenant_id")
    } else {
        format!("{alias}.tenant_id = :permissions_tenant_id")
    };
    let customer_id = match ctx.customer_id() {
        Some(id) if !id.is_nil() => id,
        _ => return sql,
    };
    ctx.add_uuid("permissions_customer_id", customer_id.0);
    match entity_type {
        EntityType::Device | EntityType::Asset | EntityType::EntityView | EntityType::User => {
            sql.push_str(&format!(
                " AND {alias}.customer_id = :permissions_customer_id"
            ));
        }
        EntityType::Customer => {
            sql.push_str(&format!(" AND {alias}.id = :permissions_customer_id"));
        }
        EntityType::Tenant => {
            // Customer users cannot address tenant rows.
            sql.push_str(" AND 1 = 0");
        }
        EntityType::Dashboard => {
            ctx.add_string("permissions_customer_id_text", customer_id.0.to_string());
            sql.push_str(&format!(
                " AND {alias}.assigned_customers IS NOT NULL \
                 AND {alias}.assigned_customers LIKE ('%' || :permissions_customer_id_text || '%')"
            ));
        }
        _ => sql.push_str(" AND 1 = 0"),
    }
    sql
}

fn require_row_table(entity_type: EntityType) -> QueryResult<&'static str> {
    table_name(entity_type).ok_or_else(|| {
        QueryError::invalid(format!(
            "entity type {entity_type} is not addressable by entity queries"
        ))
    })
}

fn single_table_candidate(
    ctx: &mut QueryContext,
    entity_type: EntityType,
    conditions: Vec<String>,
) -> QueryResult<CandidateQuery> {
    let table = require_row_table(entity_type)?;
    let mut sql = format!(
        "SELECT e.id AS id, '{}' AS entity_type, e.created_time AS created_time FROM {table} e WHERE {}",
        entity_type.as_str(),
        permission_conditions(ctx, "e", entity_type)
    );
    for condition in conditions {
        sql.push_str(" AND ");
        sql.push_str(&condition);
    }
    Ok(CandidateQuery {
        sql,
        entity_types: vec![entity_type],
        traversal: false,
        extra_where: Vec::new(),
    })
}

fn name_prefix_condition(
    ctx: &mut QueryContext,
    entity_type: EntityType,
    prefix: &str,
) -> Option<String> {
    if prefix.is_empty() {
        return None;
    }
    let column = entity_field_column(entity_type, "name")?.column;
    let param = ctx.next_param_name("name_prefix");
    ctx.add_string(param.clone(), format!("{}%", prefix.to_lowercase()));
    Some(format!("LOWER(e.{column}) LIKE :{param}"))
}

fn traversal_candidate(
    ctx: &mut QueryContext,
    root: EntityId,
    direction: EntitySearchDirection,
    max_level: Option<u32>,
    fetch_last_level_only: bool,
    filters: &[RelationEntityTypeFilter],
    entity_types: Vec<EntityType>,
    extra_where: Vec<String>,
) -> QueryResult<CandidateQuery> {
    let walk = build_relation_walk(
        ctx,
        &WalkSpec {
            root,
            direction,
            max_level,
            fetch_last_level_only,
            filters,
        },
    )?;
    Ok(CandidateQuery {
        sql: walk,
        entity_types,
        traversal: true,
        extra_where,
    })
}

/// Possible row types of a traversal result set, narrowed by the filter
/// pairs when every pair names explicit entity types.
fn traversal_types(filters: &[RelationEntityTypeFilter]) -> Vec<EntityType> {
    if filters.is_empty() || filters.iter().any(|f| f.entity_types.is_empty()) {
        return ROW_TYPES.to_vec();
    }
    let mut types: Vec<EntityType> = Vec::new();
    for filter in filters {
        for ty in &filter.entity_types {
            if ty.has_row_table() && !types.contains(ty) {
                types.push(*ty);
            }
        }
    }
    types
}

fn subtype_condition(
    ctx: &mut QueryContext,
    entity_type: EntityType,
    subtypes: &[String],
) -> Vec<String> {
    if subtypes.is_empty() {
        return Vec::new();
    }
    let alias = type_alias(entity_type).expect("search filters target row types");
    let param = ctx.next_param_name("subtype");
    ctx.add_string_list(param.clone(), subtypes.to_vec());
    vec![format!("{alias}.type IN (:{param})")]
}

fn search_filters(relation_type: &Option<String>, entity_type: EntityType) -> Vec<RelationEntityTypeFilter> {
    vec![RelationEntityTypeFilter {
        relation_type: relation_type.clone(),
        entity_types: vec![entity_type],
    }]
}

pub fn compile_entity_filter(
    ctx: &mut QueryContext,
    filter: &EntityFilter,
) -> QueryResult<CandidateQuery> {
    match filter {
        EntityFilter::EntityList {
            entity_type,
            entity_list,
        } => {
            if entity_list.is_empty() {
                return Err(QueryError::invalid("entity list filter with no ids"));
            }
            ctx.add_uuid_list("filter_entity_ids", entity_list.clone());
            single_table_candidate(
                ctx,
                *entity_type,
                vec!["e.id IN (:filter_entity_ids)".to_string()],
            )
        }
        EntityFilter::SingleEntity { single_entity } => {
            ctx.add_uuid("filter_entity_id", single_entity.id);
            single_table_candidate(
                ctx,
                single_entity.entity_type,
                vec!["e.id = :filter_entity_id".to_string()],
            )
        }
        EntityFilter::EntityType { entity_type } => {
            single_table_candidate(ctx, *entity_type, Vec::new())
        }
        EntityFilter::EntityName {
            entity_type,
            entity_name_filter,
        } => {
            let conditions = name_prefix_condition(ctx, *entity_type, entity_name_filter)
                .into_iter()
                .collect();
            single_table_candidate(ctx, *entity_type, conditions)
        }
        EntityFilter::DeviceType {
            device_type,
            device_name_filter,
        } => {
            ctx.add_string("filter_device_type", device_type.clone());
            let mut conditions = vec!["e.type = :filter_device_type".to_string()];
            conditions.extend(name_prefix_condition(ctx, EntityType::Device, device_name_filter));
            single_table_candidate(ctx, EntityType::Device, conditions)
        }
        EntityFilter::AssetType {
            asset_type,
            asset_name_filter,
        } => {
            ctx.add_string("filter_asset_type", asset_type.clone());
            let mut conditions = vec!["e.type = :filter_asset_type".to_string()];
            conditions.extend(name_prefix_condition(ctx, EntityType::Asset, asset_name_filter));
            single_table_candidate(ctx, EntityType::Asset, conditions)
        }
        EntityFilter::EntityViewType {
            entity_view_type,
            entity_view_name_filter,
        } => {
            ctx.add_string("filter_entity_view_type", entity_view_type.clone());
            let mut conditions = vec!["e.type = :filter_entity_view_type".to_string()];
            conditions.extend(name_prefix_condition(
                ctx,
                EntityType::EntityView,
                entity_view_name_filter,
            ));
            single_table_candidate(ctx, EntityType::EntityView, conditions)
        }
        EntityFilter::RelationsQuery {
            root_entity,
            direction,
            max_level,
            fetch_last_level_only,
            filters,
        } => traversal_candidate(
            ctx,
            *root_entity,
            *direction,
            *max_level,
            *fetch_last_level_only,
            filters,
            traversal_types(filters),
            Vec::new(),
        ),
        EntityFilter::DeviceSearchQuery {
            root_entity,
            direction,
            max_level,
            fetch_last_level_only,
            relation_type,
            device_types,
        } => {
            let subtype_cond = subtype_condition(ctx, EntityType::Device, device_types);
            traversal_candidate(
                ctx,
                *root_entity,
                *direction,
                *max_level,
                *fetch_last_level_only,
                &search_filters(relation_type, EntityType::Device),
                vec![EntityType::Device],
                subtype_cond,
            )
        }
        EntityFilter::AssetSearchQuery {
            root_entity,
            direction,
            max_level,
            fetch_last_level_only,
            relation_type,
            asset_types,
        } => {
            let subtype_cond = subtype_condition(ctx, EntityType::Asset, asset_types);
            traversal_candidate(
                ctx,
                *root_entity,
                *direction,
                *max_level,
                *fetch_last_level_only,
                &search_filters(relation_type, EntityType::Asset),
                vec![EntityType::Asset],
                subtype_cond,
            )
        }
        EntityFilter::EntityViewSearchQuery {
            root_entity,
            direction,
            max_level,
            fetch_last_level_only,
            relation_type,
            entity_view_types,
        } => {
            let subtype_cond =
                subtype_condition(ctx, EntityType::EntityView, entity_view_types);
            traversal_candidate(
                ctx,
                *root_entity,
                *direction,
                *max_level,
                *fetch_last_level_only,
                &search_filters(relation_type, EntityType::EntityView),
                vec![EntityType::EntityView],
                subtype_cond,
            )
        }
    }
}
