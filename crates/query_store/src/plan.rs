//! Assembles the final SELECT and its COUNT companion from the candidate
//! sub-select, the projection layer, key filters, text search, sort and
//! pagination.

use veris_query_core::{
    EntityDataPageLink, EntityFilter, EntityKey, KeyFilter, QueryError, QueryResult, SortDirection,
};

use crate::context::QueryContext;
use crate::filters::compile_entity_filter;
use crate::predicates::{compile_key_filter, KeyExpr};
use crate::projections::{build_entity_projection, collect_filter_keys, EntityProjection};

pub struct EntityPlan {
    pub count_sql: String,
    pub data_sql: Option<String>,
    pub projection: EntityProjection,
}

/// Count-only plan: no projection columns, joins only as far as the key
/// filters need them.
pub fn build_count_plan(
    ctx: &mut QueryContext,
    filter: &EntityFilter,
    key_filters: &[KeyFilter],
) -> QueryResult<EntityPlan> {
    let (main, projection) = build_main(ctx, filter, key_filters, &[], &[], None, None)?;
    Ok(EntityPlan {
        count_sql: wrap_count(&main),
        data_sql: None,
        projection,
    })
}

pub fn build_data_plan(
    ctx: &mut QueryContext,
    filter: &EntityFilter,
    key_filters: &[KeyFilter],
    entity_fields: &[EntityKey],
    latest_values: &[EntityKey],
    page_link: &EntityDataPageLink,
) -> QueryResult<EntityPlan> {
    let sort_key = page_link.sort_order.as_ref().map(|order| &order.key);
    let text_search = page_link
        .text_search
        .as_deref()
        .filter(|text| !text.is_empty());
    let (main, projection) = build_main(
        ctx,
        filter,
        key_filters,
        entity_fields,
        latest_values,
        sort_key,
        text_search,
    )?;

    let mut data_sql = main.clone();
    data_sql.push_str(" ORDER BY ");
    data_sql.push_str(&order_clause(&projection, page_link)?);
    if page_link.page_size > 0 {
        ctx.add_long("query_limit", i64::from(page_link.page_size));
        ctx.add_long(
            "query_offset",
            i64::from(page_link.page_size) * i64::from(page_link.page),
        );
        data_sql.push_str(" LIMIT :query_limit OFFSET :query_offset");
    }

    Ok(EntityPlan {
        count_sql: wrap_count(&main),
        data_sql: Some(data_sql),
        projection,
    })
}

fn build_main(
    ctx: &mut QueryContext,
    filter: &EntityFilter,
    key_filters: &[KeyFilter],
    entity_fields: &[EntityKey],
    latest_values: &[EntityKey],
    sort_key: Option<&EntityKey>,
    text_search: Option<&str>,
) -> QueryResult<(String, EntityProjection)> {
    let candidate = compile_entity_filter(ctx, filter)?;
    let filter_keys = collect_filter_keys(key_filters);
    let projection = build_entity_projection(
        ctx,
        &candidate,
        entity_fields,
        latest_values,
        &filter_keys,
        sort_key,
    )?;

    let mut conditions = projection.where_conditions.clone();
    for key_filter in key_filters {
        conditions.push(compile_key_filter(ctx, &projection.key_exprs, key_filter)?);
    }
    if let Some(text) = text_search {
        if let Some(condition) = text_search_condition(ctx, &projection, text) {
            conditions.push(condition);
        }
    }

    let mut sql = format!(
        "SELECT {} FROM ({}) s",
        projection.select_columns.join(", "),
        candidate.sql
    );
    for join in &projection.joins {
        sql.push(' ');
        sql.push_str(join);
    }
    if !conditions.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&conditions.join(" AND "));
    }
    Ok((sql, projection))
}

fn wrap_count(main: &str) -> String {
    format!("SELECT COUNT(*) AS cnt FROM ({main}) result")
}

/// Case-insensitive prefix match across every projected entity-field column.
fn text_search_condition(
    ctx: &mut QueryContext,
    projection: &EntityProjection,
    text: &str,
) -> Option<String> {
    let mut predicates: Vec<String> = Vec::new();
    for (key, _) in &projection.fields {
        let expr = match projection.key_exprs.get(key) {
            Some(KeyExpr::Field { expr, .. }) if expr != "NULL" => expr.clone(),
            _ => continue,
        };
        let param = ctx.next_param_name("text_search");
        ctx.add_string(param.clone(), format!("{}%", text.to_lowercase()));
        predicates.push(format!("LOWER(CAST({expr} AS VARCHAR)) LIKE :{param}"));
    }
    if predicates.is_empty() {
        None
    } else {
        Some(format!("({})", predicates.join(" OR ")))
    }
}

fn order_clause(
    projection: &EntityProjection,
    page_link: &EntityDataPageLink,
) -> QueryResult<String> {
    let created = &projection.created_time_expr;
    let mut clause = match &page_link.sort_order {
        Some(order) => {
            let direction = match order.direction {
                SortDirection::Asc => "ASC",
                SortDirection::Desc => "DESC",
            };
            match projection.key_exprs.get(&order.key) {
                Some(KeyExpr::Field { expr, .. }) => format!("{expr} {direction}"),
                Some(cells @ KeyExpr::Cells(_)) => {
                    let nulls = match order.direction {
                        SortDirection::Asc => "NULLS LAST",
                        SortDirection::Desc => "NULLS FIRST",
                    };
                    format!("{} {direction} {nulls}", cells.string_expr())
                }
                None => {
                    return Err(QueryError::internal(format!(
                        "unresolved sort key '{}'",
                        order.key.key
                    )))
                }
            }
        }
        None if projection.has_level => format!("s.lvl ASC, {created} ASC"),
        None => format!("{created} DESC"),
    };
    clause.push_str(&format!(", {created} ASC, s.entity_type ASC, s.id ASC"));
    Ok(clause)
}
