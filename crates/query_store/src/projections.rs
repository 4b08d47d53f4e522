//! Builds the join/projection layer over a candidate set: per-type CASE
//! expressions for entity fields, latest attribute joins with scope
//! precedence, and telemetry dictionary + latest joins.

use veris_query_core::{
    EntityKey, EntityKeyType, KeyFilter, KeyFilterPredicate, QueryError, QueryResult,
};

use crate::context::QueryContext;
use crate::filters::{permission_conditions, table_name, type_alias, CandidateQuery};
use crate::keys::entity_field_column;
use crate::predicates::{KeyExpr, KeyExprMap, ValueCells};

pub struct EntityProjection {
    pub joins: Vec<String>,
    pub select_columns: Vec<String>,
    pub where_conditions: Vec<String>,
    pub key_exprs: KeyExprMap,
    /// Projected entity-field keys with their column aliases, in request order.
    pub fields: Vec<(EntityKey, String)>,
    /// Projected latest keys with their column alias prefixes, in request order.
    pub latest: Vec<(EntityKey, String)>,
    pub created_time_expr: String,
    pub has_level: bool,
}

/// Every key a set of key filters touches, including dynamic value
/// references.
pub fn collect_filter_keys(filters: &[KeyFilter]) -> Vec<EntityKey> {
    fn visit(predicate: &KeyFilterPredicate, out: &mut Vec<EntityKey>) {
        match predicate {
            KeyFilterPredicate::String(p) => {
                if let Some(key) = &p.value.dynamic_key {
                    out.push(key.clone());
                }
            }
            KeyFilterPredicate::Numeric(p) => {
                if let Some(key) = &p.value.dynamic_key {
                    out.push(key.clone());
                }
            }
            KeyFilterPredicate::Boolean(p) => {
                if let Some(key) = &p.value.dynamic_key {
                    out.push(key.clone());
                }
            }
            KeyFilterPredicate::Complex { predicates, .. } => {
                for child in predicates {
                    visit(child, out);
                }
            }
        }
    }
    let mut keys = Vec::new();
    for filter in filters {
        keys.push(filter.key.clone());
        visit(&filter.predicate, &mut keys);
    }
    keys
}

fn attribute_scope(key_type: EntityKeyType) -> Option<&'static str> {
    match key_type {
        EntityKeyType::ClientAttribute => Some("CLIENT_SCOPE"),
        EntityKeyType::SharedAttribute => Some("SHARED_SCOPE"),
        EntityKeyType::ServerAttribute => Some("SERVER_SCOPE"),
        _ => None,
    }
}

fn scoped_attribute_join(alias: &str, key_param: &str, scope: &str) -> String {
    format!(
        "LEFT JOIN attribute_kv {alias} ON {alias}.entity_id = s.id \
         AND {alias}.entity_type = s.entity_type \
         AND {alias}.attribute_key = :{key_param} \
         AND {alias}.attribute_type = '{scope}'"
    )
}

fn cells_from_alias(alias: &str, ts_column: &str) -> ValueCells {
    ValueCells {
        bool_v: format!("{alias}.bool_v"),
        str_v: format!("{alias}.str_v"),
        long_v: format!("{alias}.long_v"),
        dbl_v: format!("{alias}.dbl_v"),
        json_v: format!("{alias}.json_v"),
        ts: format!("{alias}.{ts_column}"),
    }
}

/// Row-presence pick across the three attribute scopes, client winning over
/// shared winning over server.
fn precedence_cell(aliases: &[&str; 3], cell: &str) -> String {
    format!(
        "CASE WHEN {0}.entity_id IS NOT NULL THEN {0}.{cell} \
         WHEN {1}.entity_id IS NOT NULL THEN {1}.{cell} \
         ELSE {2}.{cell} END",
        aliases[0], aliases[1], aliases[2]
    )
}

pub fn build_entity_projection(
    ctx: &mut QueryContext,
    candidate: &CandidateQuery,
    entity_fields: &[EntityKey],
    latest_values: &[EntityKey],
    filter_keys: &[EntityKey],
    sort_key: Option<&EntityKey>,
) -> QueryResult<EntityProjection> {
    let mut projection = EntityProjection {
        joins: Vec::new(),
        select_columns: Vec::new(),
        where_conditions: candidate.extra_where.clone(),
        key_exprs: KeyExprMap::new(),
        fields: Vec::new(),
        latest: Vec::new(),
        created_time_expr: String::new(),
        has_level: candidate.traversal,
    };

    build_type_joins(ctx, candidate, &mut projection);

    let mut all_keys: Vec<&EntityKey> = Vec::new();
    all_keys.extend(entity_fields);
    all_keys.extend(latest_values);
    all_keys.extend(filter_keys);
    if let Some(key) = sort_key {
        all_keys.push(key);
    }

    let mut latest_index = 0usize;
    for key in all_keys {
        if projection.key_exprs.contains_key(key) {
            continue;
        }
        let expr = match key.key_type {
            EntityKeyType::EntityField => field_expr(candidate, &projection.created_time_expr, key),
            EntityKeyType::TimeSeries => {
                let cells = time_series_join(ctx, &mut projection.joins, &mut latest_index, key);
                KeyExpr::Cells(cells)
            }
            kind if kind.is_attribute() => {
                let cells = attribute_join(ctx, &mut projection.joins, &mut latest_index, key);
                KeyExpr::Cells(cells)
            }
            _ => {
                return Err(QueryError::invalid(format!(
                    "key '{}' of type ALARM_FIELD is not valid in an entity query",
                    key.key
                )))
            }
        };
        projection.key_exprs.insert(key.clone(), expr);
    }

    build_select_columns(&mut projection, entity_fields, latest_values)?;
    Ok(projection)
}

fn build_type_joins(
    ctx: &mut QueryContext,
    candidate: &CandidateQuery,
    projection: &mut EntityProjection,
) {
    if !candidate.traversal {
        let entity_type = candidate.entity_types[0];
        let alias = type_alias(entity_type).expect("single-table candidates target row types");
        let table = table_name(entity_type).expect("single-table candidates target row types");
        projection
            .joins
            .push(format!("LEFT JOIN {table} {alias} ON {alias}.id = s.id"));
        projection.created_time_expr = "s.created_time".to_string();
        return;
    }

    let mut existence: Vec<String> = Vec::new();
    let mut created_branches: Vec<String> = Vec::new();
    for entity_type in &candidate.entity_types {
        let alias = match type_alias(*entity_type) {
            Some(alias) => alias,
            None => continue,
        };
        let table = table_name(*entity_type).expect("row type");
        let perm = permission_conditions(ctx, alias, *entity_type);
        projection.joins.push(format!(
            "LEFT JOIN {table} {alias} ON s.entity_type = '{}' AND {alias}.id = s.id AND {perm}",
            entity_type.as_str()
        ));
        existence.push(format!(
            "(s.entity_type = '{}' AND {alias}.id IS NOT NULL)",
            entity_type.as_str()
        ));
        created_branches.push(format!(
            "WHEN s.entity_type = '{}' THEN {alias}.created_time",
            entity_type.as_str()
        ));
    }
    if existence.is_empty() {
        projection.where_conditions.push("1 = 0".to_string());
        projection.created_time_expr = "NULL".to_string();
    } else {
        projection
            .where_conditions
            .insert(0, format!("({})", existence.join(" OR ")));
        projection.created_time_expr = format!("CASE {} END", created_branches.join(" "));
    }
}

fn field_expr(candidate: &CandidateQuery, created_time_expr: &str, key: &EntityKey) -> KeyExpr {
    if key.key == "entityType" {
        return KeyExpr::Field {
            expr: "s.entity_type".to_string(),
            numeric: false,
        };
    }
    if key.key == "createdTime" {
        return KeyExpr::Field {
            expr: created_time_expr.to_string(),
            numeric: true,
        };
    }
    if !candidate.traversal {
        let entity_type = candidate.entity_types[0];
        let alias = type_alias(entity_type).expect("row type");
        return match entity_field_column(entity_type, &key.key) {
            Some(column) => KeyExpr::Field {
                expr: format!("{alias}.{}", column.column),
                numeric: column.numeric,
            },
            None => KeyExpr::null(),
        };
    }
    let mut branches: Vec<String> = Vec::new();
    let mut numeric = false;
    for entity_type in &candidate.entity_types {
        let alias = match type_alias(*entity_type) {
            Some(alias) => alias,
            None => continue,
        };
        if let Some(column) = entity_field_column(*entity_type, &key.key) {
            branches.push(format!(
                "WHEN s.entity_type = '{}' THEN {alias}.{}",
                entity_type.as_str(),
                column.column
            ));
            numeric = column.numeric;
        }
    }
    if branches.is_empty() {
        KeyExpr::null()
    } else {
        KeyExpr::Field {
            expr: format!("CASE {} END", branches.join(" ")),
            numeric,
        }
    }
}

fn attribute_join(
    ctx: &mut QueryContext,
    joins: &mut Vec<String>,
    latest_index: &mut usize,
    key: &EntityKey,
) -> ValueCells {
    let index = *latest_index;
    *latest_index += 1;
    let key_param = ctx.next_param_name("attr_key");
    ctx.add_string(key_param.clone(), key.key.clone());
    if let Some(scope) = attribute_scope(key.key_type) {
        let alias = format!("att{index}");
        joins.push(scoped_attribute_join(&alias, &key_param, scope));
        return cells_from_alias(&alias, "last_update_ts");
    }
    // Unqualified ATTRIBUTE searches all scopes; precedence picks one row.
    let client = format!("ca{index}");
    let shared = format!("sha{index}");
    let server = format!("sva{index}");
    joins.push(scoped_attribute_join(&client, &key_param, "CLIENT_SCOPE"));
    joins.push(scoped_attribute_join(&shared, &key_param, "SHARED_SCOPE"));
    joins.push(scoped_attribute_join(&server, &key_param, "SERVER_SCOPE"));
    let aliases = [client.as_str(), shared.as_str(), server.as_str()];
    ValueCells {
        bool_v: precedence_cell(&aliases, "bool_v"),
        str_v: precedence_cell(&aliases, "str_v"),
        long_v: precedence_cell(&aliases, "long_v"),
        dbl_v: precedence_cell(&aliases, "dbl_v"),
        json_v: precedence_cell(&aliases, "json_v"),
        ts: precedence_cell(&aliases, "last_update_ts"),
    }
}

fn time_series_join(
    ctx: &mut QueryContext,
    joins: &mut Vec<String>,
    latest_index: &mut usize,
    key: &EntityKey,
) -> ValueCells {
    let index = *latest_index;
    *latest_index += 1;
    let key_param = ctx.next_param_name("ts_key");
    ctx.add_string(key_param.clone(), key.key.clone());
    let dict = format!("tsd{index}");
    let latest = format!("tsl{index}");
    joins.push(format!(
        "LEFT JOIN ts_kv_dictionary {dict} ON {dict}.key = :{key_param}"
    ));
    joins.push(format!(
        "LEFT JOIN ts_kv_latest {latest} ON {latest}.entity_id = s.id AND {latest}.key_id = {dict}.key_id"
    ));
    cells_from_alias(&latest, "ts")
}

fn build_select_columns(
    projection: &mut EntityProjection,
    entity_fields: &[EntityKey],
    latest_values: &[EntityKey],
) -> QueryResult<()> {
    projection.select_columns.push("s.id AS id".to_string());
    projection
        .select_columns
        .push("s.entity_type AS entity_type".to_string());
    projection
        .select_columns
        .push(format!("{} AS created_time", projection.created_time_expr));
    if projection.has_level {
        projection.select_columns.push("s.lvl AS lvl".to_string());
    }

    for key in entity_fields {
        if projection.fields.iter().any(|(existing, _)| existing == key) {
            continue;
        }
        let alias = format!("f_{}", projection.fields.len());
        let expr = match projection.key_exprs.get(key) {
            Some(KeyExpr::Field { expr, .. }) => expr.clone(),
            _ => return Err(QueryError::internal(format!("unresolved field '{}'", key.key))),
        };
        projection.select_columns.push(format!("{expr} AS {alias}"));
        projection.fields.push((key.clone(), alias));
    }

    for key in latest_values {
        if projection.latest.iter().any(|(existing, _)| existing == key) {
            continue;
        }
        let prefix = format!("l_{}", projection.latest.len());
        let cells = match projection.key_exprs.get(key) {
            Some(KeyExpr::Cells(cells)) => cells.clone(),
            _ => {
                return Err(QueryError::internal(format!(
                    "unresolved latest key '{}'",
                    key.key
                )))
            }
        };
        projection
            .select_columns
            .push(format!("{} AS {prefix}_bool", cells.bool_v));
        projection
            .select_columns
            .push(format!("{} AS {prefix}_str", cells.str_v));
        projection
            .select_columns
            .push(format!("{} AS {prefix}_long", cells.long_v));
        projection
            .select_columns
            .push(format!("{} AS {prefix}_dbl", cells.dbl_v));
        projection
            .select_columns
            .push(format!("{} AS {prefix}_json", cells.json_v));
        projection
            .select_columns
            .push(format!("{} AS {prefix}_ts", cells.ts));
        projection.latest.push((key.clone(), prefix));
    }
    Ok(())
}
