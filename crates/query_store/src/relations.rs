//! Recursive walk over the COMMON relation group.
//!
//! The walk follows every edge reachable from the root (cycle-cut on the
//! visited path) and carries the last edge's relation type, so the
//! `(relation type, entity types)` filters apply to the reached rows rather
//! than restricting which edges may be crossed. Output is deduplicated on
//! `(type, id)` with the shallowest level winning.

use veris_query_core::{
    EntityId, EntitySearchDirection, QueryResult, RelationEntityTypeFilter,
};

use crate::context::QueryContext;

/// Bound for unbounded walks; the path cycle-cut terminates recursion before
/// this is ever reached on a finite graph.
const UNLIMITED_LEVEL: i64 = i32::MAX as i64;

pub struct WalkSpec<'a> {
    pub root: EntityId,
    pub direction: EntitySearchDirection,
    pub max_level: Option<u32>,
    pub fetch_last_level_only: bool,
    pub filters: &'a [RelationEntityTypeFilter],
}

/// Candidate sub-select producing `(id, entity_type, lvl)`.
pub fn build_relation_walk(ctx: &mut QueryContext, spec: &WalkSpec<'_>) -> QueryResult<String> {
    let (start_id, start_type, join_id, join_type) = match spec.direction {
        EntitySearchDirection::From => ("r.to_id", "r.to_type", "r.from_id", "r.from_type"),
        EntitySearchDirection::To => ("r.from_id", "r.from_type", "r.to_id", "r.to_type"),
    };

    ctx.add_uuid("relation_root_id", spec.root.id);
    ctx.add_string("relation_root_type", spec.root.entity_type.as_str());
    ctx.add_long(
        "relation_max_level",
        spec.max_level.map(i64::from).unwrap_or(UNLIMITED_LEVEL),
    );

    let mut sql = format!(
        "WITH RECURSIVE walk(id, entity_type, relation_type, lvl, path) AS ( \
         SELECT {start_id}, {start_type}, r.relation_type, 1, \
         ('/' || CAST({join_id} AS VARCHAR) || '/' || CAST({start_id} AS VARCHAR) || '/') \
         FROM relation r \
         WHERE {join_id} = :relation_root_id AND {join_type} = :relation_root_type \
         AND r.relation_type_group = 'COMMON' \
         UNION ALL \
         SELECT {start_id}, {start_type}, r.relation_type, w.lvl + 1, \
         (w.path || CAST({start_id} AS VARCHAR) || '/') \
         FROM relation r \
         JOIN walk w ON {join_id} = w.id AND {join_type} = w.entity_type \
         WHERE r.relation_type_group = 'COMMON' \
         AND w.lvl < :relation_max_level \
         AND w.path NOT LIKE ('%/' || CAST({start_id} AS VARCHAR) || '/%') \
         ) \
         SELECT w.id AS id, w.entity_type AS entity_type, MIN(w.lvl) AS lvl FROM walk w"
    );

    let mut conditions: Vec<String> = Vec::new();
    if spec.fetch_last_level_only && spec.max_level.is_some() {
        conditions.push("w.lvl = :relation_max_level".to_string());
    }
    if let Some(pair_filter) = build_pair_filter(ctx, spec.filters) {
        conditions.push(pair_filter);
    }
    if !conditions.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&conditions.join(" AND "));
    }
    sql.push_str(" GROUP BY w.id, w.entity_type");
    Ok(sql)
}

fn build_pair_filter(
    ctx: &mut QueryContext,
    filters: &[RelationEntityTypeFilter],
) -> Option<String> {
    let mut pairs: Vec<String> = Vec::new();
    for filter in filters {
        let type_list = if filter.entity_types.is_empty() {
            None
        } else {
            let names: Vec<String> = filter
                .entity_types
                .iter()
                .map(|ty| format!("'{}'", ty.as_str()))
                .collect();
            Some(format!("w.entity_type IN ({})", names.join(", ")))
        };
        let relation_cond = filter.relation_type.as_ref().map(|relation_type| {
            let param = ctx.next_param_name("relation_type");
            ctx.add_string(param.clone(), relation_type.clone());
            format!("w.relation_type = :{param}")
        });
        match (relation_cond, type_list) {
            (Some(rel), Some(types)) => pairs.push(format!("({rel} AND {types})")),
            (Some(rel), None) => pairs.push(rel),
            (None, Some(types)) => pairs.push(format!("({types})")),
            (None, None) => {}
        }
    }
    if pairs.is_empty() {
        None
    } else {
        Some(format!("({})", pairs.join(" OR ")))
    }
}
