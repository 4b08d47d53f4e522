//! Compiles typed key-filter predicates into boolean SQL fragments.
//!
//! A predicate target is either a resolved entity-field expression or the
//! value cells of a joined latest row. NULL targets fail every predicate
//! except NOT_EQUAL / NOT_CONTAINS, which treat NULL as distinct.

use std::collections::HashMap;

use veris_query_core::{
    BooleanFilterPredicate, BooleanOperation, ComplexOperation, EntityKey, KeyFilter,
    KeyFilterPredicate, NumericFilterPredicate, NumericOperation, QueryError, QueryResult,
    StringFilterPredicate, StringOperation,
};

use crate::context::QueryContext;

/// Value cell expressions of one joined latest row (attribute or telemetry).
#[derive(Clone, Debug)]
pub struct ValueCells {
    pub bool_v: String,
    pub str_v: String,
    pub long_v: String,
    pub dbl_v: String,
    pub json_v: String,
    pub ts: String,
}

/// Resolved comparable expression for one entity key.
#[derive(Clone, Debug)]
pub enum KeyExpr {
    Field { expr: String, numeric: bool },
    Cells(ValueCells),
}

impl KeyExpr {
    pub fn null() -> Self {
        KeyExpr::Field {
            expr: "NULL".to_string(),
            numeric: false,
        }
    }

    /// Text form used by string predicates, text search and latest-value
    /// sorts.
    pub fn string_expr(&self) -> String {
        match self {
            KeyExpr::Field { expr, numeric } => {
                if *numeric {
                    format!("CAST({expr} AS VARCHAR)")
                } else {
                    expr.clone()
                }
            }
            KeyExpr::Cells(cells) => format!(
                "COALESCE({}, CAST({} AS VARCHAR), CAST({} AS VARCHAR), CAST({} AS VARCHAR))",
                cells.str_v, cells.long_v, cells.dbl_v, cells.bool_v
            ),
        }
    }

    /// Numeric form; non-numeric columns are coerced, value cells coalesce
    /// the integer and double cells.
    pub fn numeric_expr(&self) -> String {
        match self {
            KeyExpr::Field { expr, numeric } => {
                if *numeric {
                    expr.clone()
                } else {
                    format!("CAST({expr} AS DOUBLE PRECISION)")
                }
            }
            KeyExpr::Cells(cells) => format!(
                "COALESCE(CAST({} AS DOUBLE PRECISION), {})",
                cells.long_v, cells.dbl_v
            ),
        }
    }

    pub fn boolean_expr(&self) -> String {
        match self {
            KeyExpr::Field { expr, .. } => expr.clone(),
            KeyExpr::Cells(cells) => cells.bool_v.clone(),
        }
    }
}

pub type KeyExprMap = HashMap<EntityKey, KeyExpr>;

pub fn compile_key_filter(
    ctx: &mut QueryContext,
    key_exprs: &KeyExprMap,
    filter: &KeyFilter,
) -> QueryResult<String> {
    let target = key_exprs
        .get(&filter.key)
        .ok_or_else(|| QueryError::internal(format!("unresolved filter key '{}'", filter.key.key)))?;
    compile_predicate(ctx, &filter.key.key, target, key_exprs, &filter.predicate)
}

fn compile_predicate(
    ctx: &mut QueryContext,
    key: &str,
    target: &KeyExpr,
    key_exprs: &KeyExprMap,
    predicate: &KeyFilterPredicate,
) -> QueryResult<String> {
    match predicate {
        KeyFilterPredicate::String(p) => compile_string(ctx, key, target, key_exprs, p),
        KeyFilterPredicate::Numeric(p) => compile_numeric(ctx, key, target, key_exprs, p),
        KeyFilterPredicate::Boolean(p) => compile_boolean(ctx, key, target, key_exprs, p),
        KeyFilterPredicate::Complex {
            operation,
            predicates,
        } => {
            if predicates.is_empty() {
                return Err(QueryError::invalid("complex predicate with no operands"));
            }
            let glue = match operation {
                ComplexOperation::And => " AND ",
                ComplexOperation::Or => " OR ",
            };
            let parts = predicates
                .iter()
                .map(|child| compile_predicate(ctx, key, target, key_exprs, child))
                .collect::<QueryResult<Vec<_>>>()?;
            Ok(format!("({})", parts.join(glue)))
        }
    }
}

fn dynamic_string_expr(key_exprs: &KeyExprMap, key: &EntityKey) -> QueryResult<String> {
    key_exprs
        .get(key)
        .map(KeyExpr::string_expr)
        .ok_or_else(|| QueryError::invalid(format!("dynamic value key '{}' is not resolvable", key.key)))
}

fn compile_string(
    ctx: &mut QueryContext,
    key: &str,
    target: &KeyExpr,
    key_exprs: &KeyExprMap,
    predicate: &StringFilterPredicate,
) -> QueryResult<String> {
    let mut column = target.string_expr();
    let mut rhs = match &predicate.value.dynamic_key {
        Some(dynamic) => dynamic_string_expr(key_exprs, dynamic)?,
        None => {
            let param = ctx.next_param_name(key);
            ctx.add_string(param.clone(), predicate.value.resolved().clone());
            format!(":{param}")
        }
    };
    if predicate.ignore_case {
        column = format!("LOWER({column})");
        rhs = format!("LOWER({rhs})");
    }
    Ok(match predicate.operation {
        StringOperation::Equal => format!("{column} = {rhs}"),
        StringOperation::NotEqual => format!("({column} IS NULL OR {column} <> {rhs})"),
        StringOperation::StartsWith => format!("{column} LIKE ({rhs} || '%')"),
        StringOperation::EndsWith => format!("{column} LIKE ('%' || {rhs})"),
        StringOperation::Contains => format!("{column} LIKE ('%' || {rhs} || '%')"),
        StringOperation::NotContains => {
            format!("({column} IS NULL OR {column} NOT LIKE ('%' || {rhs} || '%'))")
        }
    })
}

fn compile_numeric(
    ctx: &mut QueryContext,
    key: &str,
    target: &KeyExpr,
    key_exprs: &KeyExprMap,
    predicate: &NumericFilterPredicate,
) -> QueryResult<String> {
    let column = target.numeric_expr();
    let rhs = match &predicate.value.dynamic_key {
        Some(dynamic) => key_exprs
            .get(dynamic)
            .map(KeyExpr::numeric_expr)
            .ok_or_else(|| {
                QueryError::invalid(format!("dynamic value key '{}' is not resolvable", dynamic.key))
            })?,
        None => {
            let param = ctx.next_param_name(key);
            ctx.add_double(param.clone(), *predicate.value.resolved());
            format!(":{param}")
        }
    };
    Ok(match predicate.operation {
        NumericOperation::Equal => format!("{column} = {rhs}"),
        NumericOperation::NotEqual => format!("({column} IS NULL OR {column} <> {rhs})"),
        NumericOperation::Greater => format!("{column} > {rhs}"),
        NumericOperation::Less => format!("{column} < {rhs}"),
        NumericOperation::GreaterOrEqual => format!("{column} >= {rhs}"),
        NumericOperation::LessOrEqual => format!("{column} <= {rhs}"),
    })
}

fn compile_boolean(
    ctx: &mut QueryContext,
    key: &str,
    target: &KeyExpr,
    key_exprs: &KeyExprMap,
    predicate: &BooleanFilterPredicate,
) -> QueryResult<String> {
    let column = target.boolean_expr();
    let rhs = match &predicate.value.dynamic_key {
        Some(dynamic) => key_exprs
            .get(dynamic)
            .map(KeyExpr::boolean_expr)
            .ok_or_else(|| {
                QueryError::invalid(format!("dynamic value key '{}' is not resolvable", dynamic.key))
            })?,
        None => {
            let param = ctx.next_param_name(key);
            ctx.add_bool(param.clone(), *predicate.value.resolved());
            format!(":{param}")
        }
    };
    Ok(match predicate.operation {
        BooleanOperation::Equal => format!("{column} = {rhs}"),
        BooleanOperation::NotEqual => format!("({column} IS NULL OR {column} <> {rhs})"),
    })
}
