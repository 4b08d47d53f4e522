//! Shared compilation context: typed named-parameter bindings plus the
//! security triple, threaded by reference through every compiler so recursive
//! compilation contributes to a single parameter map.

use std::collections::HashMap;
use std::fmt::Write as _;

use sea_orm::{DatabaseBackend, Statement, Value as SeaValue};
use uuid::Uuid;
use veris_query_core::{CustomerId, EntityType, QueryError, QueryResult, TenantId};

#[derive(Clone, Debug, PartialEq)]
pub enum ParamValue {
    Uuid(Uuid),
    UuidList(Vec<Uuid>),
    Long(i64),
    Double(f64),
    Str(String),
    StrList(Vec<String>),
    Bool(bool),
}

pub struct QueryContext {
    backend: DatabaseBackend,
    tenant_id: TenantId,
    customer_id: Option<CustomerId>,
    entity_type: EntityType,
    params: Vec<(String, ParamValue)>,
    index: HashMap<String, usize>,
    counter: u32,
}

impl QueryContext {
    pub fn new(
        backend: DatabaseBackend,
        tenant_id: TenantId,
        customer_id: Option<CustomerId>,
        entity_type: EntityType,
    ) -> Self {
        Self {
            backend,
            tenant_id,
            customer_id,
            entity_type,
            params: Vec::new(),
            index: HashMap::new(),
            counter: 0,
        }
    }

    pub fn backend(&self) -> DatabaseBackend {
        self.backend
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    /// Customer scope, when the caller is customer-bound. A nil customer id
    /// is rejected before compilation starts and never shows up here.
    pub fn customer_id(&self) -> Option<CustomerId> {
        self.customer_id
    }

    pub fn entity_type(&self) -> EntityType {
        self.entity_type
    }

    /// Fresh parameter name for compilers that need uniqueness.
    pub fn next_param_name(&mut self, base: &str) -> String {
        let sanitized: String = base
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
            .collect();
        let name = format!("{}_{}", sanitized, self.counter);
        self.counter += 1;
        name
    }

    pub fn add_uuid(&mut self, name: impl Into<String>, value: Uuid) {
        self.put(name.into(), ParamValue::Uuid(value));
    }

    pub fn add_uuid_list(&mut self, name: impl Into<String>, value: Vec<Uuid>) {
        self.put(name.into(), ParamValue::UuidList(value));
    }

    pub fn add_long(&mut self, name: impl Into<String>, value: i64) {
        self.put(name.into(), ParamValue::Long(value));
    }

    pub fn add_double(&mut self, name: impl Into<String>, value: f64) {
        self.put(name.into(), ParamValue::Double(value));
    }

    pub fn add_string(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.put(name.into(), ParamValue::Str(value.into()));
    }

    pub fn add_string_list(&mut self, name: impl Into<String>, value: Vec<String>) {
        self.put(name.into(), ParamValue::StrList(value));
    }

    pub fn add_bool(&mut self, name: impl Into<String>, value: bool) {
        self.put(name.into(), ParamValue::Bool(value));
    }

    fn put(&mut self, name: String, value: ParamValue) {
        if let Some(position) = self.index.get(&name) {
            self.params[*position].1 = value;
        } else {
            self.index.insert(name.clone(), self.params.len());
            self.params.push((name, value));
        }
    }

    fn scalar_value(&self, value: &ParamValue) -> SeaValue {
        match value {
            ParamValue::Uuid(v) => uuid_value(self.backend, *v),
            ParamValue::Long(v) => (*v).into(),
            ParamValue::Double(v) => (*v).into(),
            ParamValue::Str(v) => v.clone().into(),
            ParamValue::Bool(v) => (*v).into(),
            ParamValue::UuidList(_) | ParamValue::StrList(_) => {
                unreachable!("list parameters expand at render time")
            }
        }
    }

    /// Renders `:name` markers into backend placeholders and collects the
    /// bound values in occurrence order. List parameters expand into one
    /// placeholder per element. This is the only road user data takes into a
    /// statement.
    pub fn render(&self, sql: &str) -> QueryResult<Statement> {
        let mut out = String::with_capacity(sql.len());
        let mut values: Vec<SeaValue> = Vec::new();
        let mut chars = sql.char_indices().peekable();
        while let Some((_, c)) = chars.next() {
            if c != ':' {
                out.push(c);
                continue;
            }
            let mut name = String::new();
            while let Some((_, next)) = chars.peek() {
                if next.is_ascii_alphanumeric() || *next == '_' {
                    name.push(*next);
                    chars.next();
                } else {
                    break;
                }
            }
            if name.is_empty() {
                out.push(':');
                continue;
            }
            let position = self
                .index
                .get(&name)
                .ok_or_else(|| QueryError::internal(format!("unbound parameter :{name}")))?;
            let value = &self.params[*position].1;
            match value {
                ParamValue::UuidList(list) => {
                    if list.is_empty() {
                        return Err(QueryError::internal(format!("empty list parameter :{name}")));
                    }
                    for (i, element) in list.iter().enumerate() {
                        if i > 0 {
                            out.push_str(", ");
                        }
                        values.push(uuid_value(self.backend, *element));
                        self.push_placeholder(&mut out, values.len());
                    }
                }
                ParamValue::StrList(list) => {
                    if list.is_empty() {
                        return Err(QueryError::internal(format!("empty list parameter :{name}")));
                    }
                    for (i, element) in list.iter().enumerate() {
                        if i > 0 {
                            out.push_str(", ");
                        }
                        values.push(element.clone().into());
                        self.push_placeholder(&mut out, values.len());
                    }
                }
                scalar => {
                    values.push(self.scalar_value(scalar));
                    self.push_placeholder(&mut out, values.len());
                }
            }
        }
        Ok(Statement::from_sql_and_values(self.backend, out, values))
    }

    fn push_placeholder(&self, out: &mut String, ordinal: usize) {
        match self.backend {
            DatabaseBackend::Postgres => {
                let _ = write!(out, "${ordinal}");
            }
            _ => out.push('?'),
        }
    }
}

pub fn uuid_value(backend: DatabaseBackend, id: Uuid) -> SeaValue {
    match backend {
        DatabaseBackend::Postgres => id.into(),
        _ => id.to_string().into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_ctx(backend: DatabaseBackend) -> QueryContext {
        QueryContext::new(
            backend,
            TenantId(Uuid::nil()),
            None,
            EntityType::Device,
        )
    }

    #[test]
    fn renders_postgres_placeholders_in_occurrence_order() {
        let mut ctx = test_ctx(DatabaseBackend::Postgres);
        ctx.add_string("name", "Device1");
        ctx.add_long("created", 42);
        let stmt = ctx
            .render("SELECT 1 WHERE a = :created AND b = :name AND c = :created")
            .expect("render");
        assert_eq!(stmt.sql, "SELECT 1 WHERE a = $1 AND b = $2 AND c = $3");
        let values = stmt.values.expect("values").0;
        assert_eq!(values.len(), 3);
    }

    #[test]
    fn expands_list_parameters() {
        let mut ctx = test_ctx(DatabaseBackend::Sqlite);
        ctx.add_string_list("types", vec!["a".into(), "b".into(), "c".into()]);
        let stmt = ctx.render("x IN (:types)").expect("render");
        assert_eq!(stmt.sql, "x IN (?, ?, ?)");
    }

    #[test]
    fn unbound_parameter_is_an_internal_error() {
        let ctx = test_ctx(DatabaseBackend::Sqlite);
        let err = ctx.render("x = :missing").expect_err("must fail");
        assert_eq!(err.code(), "INTERNAL");
    }

    #[test]
    fn fresh_names_are_unique_and_sanitized() {
        let mut ctx = test_ctx(DatabaseBackend::Sqlite);
        let first = ctx.next_param_name("Temperature Key");
        let second = ctx.next_param_name("Temperature Key");
        assert_eq!(first, "temperature_key_0");
        assert_eq!(second, "temperature_key_1");
    }
}
