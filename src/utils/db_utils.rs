use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value;
use sqlx::mysql::{MySql, MySqlArguments};
use sqlx::query::{Query, QueryAs, QueryScalar};
use sqlx::MySqlPool;

use crate::error::{AppError, AppResult};

/// ===============================
/// SQL bindable value enum
/// ===============================
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    String(String),
    I64(i64),
    U64(u64),
    F64(f64),
    Bool(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

macro_rules! bind_value {
    ($query:expr, $value:expr) => {
        match $value {
            SqlValue::String(v) => $query.bind(v),
            SqlValue::I64(v) => $query.bind(v),
            SqlValue::U64(v) => $query.bind(v),
            SqlValue::F64(v) => $query.bind(v),
            SqlValue::Bool(v) => $query.bind(v),
            SqlValue::Date(v) => $query.bind(v),
            SqlValue::DateTime(v) => $query.bind(v),
        }
    };
}

pub fn bind_query<'q>(
    mut query: Query<'q, MySql, MySqlArguments>,
    values: &[SqlValue],
) -> Query<'q, MySql, MySqlArguments> {
    for value in values.iter().cloned() {
        query = bind_value!(query, value);
    }
    query
}

pub fn bind_query_as<'q, O>(
    mut query: QueryAs<'q, MySql, O, MySqlArguments>,
    values: &[SqlValue],
) -> QueryAs<'q, MySql, O, MySqlArguments> {
    for value in values.iter().cloned() {
        query = bind_value!(query, value);
    }
    query
}

pub fn bind_query_scalar<'q, O>(
    mut query: QueryScalar<'q, MySql, O, MySqlArguments>,
    values: &[SqlValue],
) -> QueryScalar<'q, MySql, O, MySqlArguments> {
    for value in values.iter().cloned() {
        query = bind_value!(query, value);
    }
    query
}

/// ===============================
/// Dynamic WHERE for list filters
/// ===============================
#[derive(Debug)]
pub struct WhereClause {
    sql: String,
    values: Vec<SqlValue>,
}

impl Default for WhereClause {
    fn default() -> Self {
        WhereClause {
            sql: String::from(" WHERE 1=1"),
            values: Vec::new(),
        }
    }
}

impl WhereClause {
    /// `clause` must hold exactly one `?` for `value`.
    pub fn and(&mut self, clause: &str, value: SqlValue) -> &mut Self {
        self.sql.push_str(" AND ");
        self.sql.push_str(clause);
        self.values.push(value);
        self
    }

    /// Like [`WhereClause::and`] for a clause with several placeholders.
    pub fn and_all(&mut self, clause: &str, values: impl IntoIterator<Item = SqlValue>) -> &mut Self {
        self.sql.push_str(" AND ");
        self.sql.push_str(clause);
        self.values.extend(values);
        self
    }

    pub fn and_opt<T: Into<SqlValue>>(&mut self, clause: &str, value: Option<T>) -> &mut Self {
        if let Some(v) = value {
            self.and(clause, v.into());
        }
        self
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn values(&self) -> &[SqlValue] {
        &self.values
    }
}

impl From<u64> for SqlValue {
    fn from(v: u64) -> Self {
        SqlValue::U64(v)
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::String(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::String(v.to_string())
    }
}

/// ===============================
/// SQL update container
/// ===============================
#[derive(Debug)]
pub struct SqlUpdate {
    pub sql: String,
    pub values: Vec<SqlValue>,
}

/// ===============================
/// Build dynamic UPDATE SQL
/// ===============================
/// Only keys listed in `allowed` may be updated; `null` members are skipped
/// so a serialized patch struct only touches the fields it carries.
pub fn build_update_sql(
    table: &str,
    payload: &Value,
    allowed: &[&str],
    id_column: &str,
    id_value: u64,
) -> AppResult<SqlUpdate> {
    let obj = payload
        .as_object()
        .ok_or_else(|| AppError::validation("Payload must be a JSON object"))?;

    let mut columns = Vec::new();
    let mut values = Vec::with_capacity(obj.len() + 1);

    for (key, value) in obj {
        if value.is_null() {
            continue;
        }
        if !allowed.contains(&key.as_str()) {
            return Err(AppError::Validation(format!("Field '{}' cannot be updated", key)));
        }
        columns.push(format!("{} = ?", key));

        // Convert JSON values → SqlValue
        match value {
            Value::String(s) => {
                if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
                    values.push(SqlValue::Date(d));
                } else if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
                    values.push(SqlValue::DateTime(dt));
                } else {
                    values.push(SqlValue::String(s.clone()));
                }
            }
            Value::Number(n) => {
                if let Some(u) = n.as_u64() {
                    values.push(SqlValue::U64(u));
                } else if let Some(i) = n.as_i64() {
                    values.push(SqlValue::I64(i));
                } else if let Some(f) = n.as_f64() {
                    values.push(SqlValue::F64(f));
                }
            }
            Value::Bool(b) => values.push(SqlValue::Bool(*b)),
            _ => return Err(AppError::validation("Unsupported JSON value type")),
        }
    }

    if columns.is_empty() {
        return Err(AppError::validation("No fields provided for update"));
    }

    let sql = format!(
        "UPDATE {} SET {} WHERE {} = ?",
        table,
        columns.join(", "),
        id_column
    );

    // WHERE id = ?
    values.push(SqlValue::U64(id_value));

    Ok(SqlUpdate { sql, values })
}

/// ===============================
/// Execute the update
/// ===============================
pub async fn execute_update(pool: &MySqlPool, update: SqlUpdate) -> AppResult<u64> {
    let result = bind_query(sqlx::query(&update.sql), &update.values)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const ALLOWED: &[&str] = &["first_name", "salary", "bank_id", "status"];

    #[test]
    fn builds_set_clause_for_present_fields_only() {
        let payload = json!({ "first_name": "Ana", "salary": "3100000.00", "bank_id": null });
        let update = build_update_sql("employees", &payload, ALLOWED, "id", 7).unwrap();

        assert_eq!(
            update.sql,
            "UPDATE employees SET first_name = ?, salary = ? WHERE id = ?"
        );
        assert_eq!(
            update.values,
            vec![
                SqlValue::String("Ana".into()),
                SqlValue::String("3100000.00".into()),
                SqlValue::U64(7),
            ]
        );
    }

    #[test]
    fn rejects_columns_outside_whitelist() {
        let payload = json!({ "company_id": 2 });
        assert!(build_update_sql("employees", &payload, ALLOWED, "id", 1).is_err());
    }

    #[test]
    fn empty_patch_is_rejected() {
        let payload = json!({ "first_name": null });
        assert!(build_update_sql("employees", &payload, ALLOWED, "id", 1).is_err());
        assert!(build_update_sql("employees", &json!([1]), ALLOWED, "id", 1).is_err());
    }

    #[test]
    fn where_clause_accumulates_values() {
        let mut w = WhereClause::default();
        w.and_opt("company_id = ?", Some(3u64))
            .and_opt::<String>("status = ?", None)
            .and("email LIKE ?", SqlValue::from("%ana%"));
        assert_eq!(w.sql(), " WHERE 1=1 AND company_id = ? AND email LIKE ?");
        assert_eq!(w.values().len(), 2);
    }
}
