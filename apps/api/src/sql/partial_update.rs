//! Partial-update statement builder.
//!
//! Turns a sparse, ordered set of column assignments into a single
//! parameterized `UPDATE ... RETURNING *` statement. Values are always
//! bound as `$n` parameters; the table and key column are interpolated
//! into the text and must come from a fixed allow-list (see [`super::table`]).

use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::QueryAs;
use sqlx::{FromRow, Postgres};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PartialUpdateError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// A scalar that can be bound as a statement parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// Binds as a text-typed `NULL`; only assign it to text columns.
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl SqlValue {
    fn bind_to<'q, O>(
        &'q self,
        query: QueryAs<'q, Postgres, O, PgArguments>,
    ) -> QueryAs<'q, Postgres, O, PgArguments> {
        match self {
            SqlValue::Null => query.bind(None::<String>),
            SqlValue::Bool(b) => query.bind(*b),
            SqlValue::Int(i) => query.bind(*i),
            SqlValue::Float(f) => query.bind(*f),
            SqlValue::Text(s) => query.bind(s.as_str()),
        }
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Bool(v)
    }
}

impl From<i32> for SqlValue {
    fn from(v: i32) -> Self {
        SqlValue::Int(i64::from(v))
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::Int(v)
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        SqlValue::Float(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(SqlValue::Null, Into::into)
    }
}

/// Ordered column → value mapping. Iteration order is insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldSet {
    entries: Vec<(String, SqlValue)>,
}

impl FieldSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a column. Re-setting a column replaces its value in place.
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<SqlValue>) -> &mut Self {
        let column = column.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(c, _)| *c == column) {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((column, value)),
        }
        self
    }

    /// Sets a column only when a value is present (None => skip).
    pub fn insert_opt<T: Into<SqlValue>>(
        &mut self,
        column: impl Into<String>,
        value: Option<T>,
    ) -> &mut Self {
        if let Some(v) = value {
            self.insert(column, v);
        }
        self
    }

    pub fn with(mut self, column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        self.insert(column, value);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
        self.entries.iter().map(|(c, v)| (c.as_str(), v))
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(c, _)| c.as_str())
    }
}

impl<K, V> FromIterator<(K, V)> for FieldSet
where
    K: Into<String>,
    V: Into<SqlValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut fields = FieldSet::new();
        for (column, value) in iter {
            fields.insert(column, value);
        }
        fields
    }
}

/// A generated statement: query text plus its arguments in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub struct PartialUpdate {
    pub query: String,
    pub values: Vec<SqlValue>,
}

impl PartialUpdate {
    /// Prepares the statement as a typed sqlx query with every argument bound.
    pub fn query_as<'q, O>(&'q self) -> QueryAs<'q, Postgres, O, PgArguments>
    where
        O: for<'r> FromRow<'r, PgRow>,
    {
        self.values
            .iter()
            .fold(sqlx::query_as::<_, O>(&self.query), |query, value| {
                value.bind_to(query)
            })
    }
}

/// Builds `UPDATE {table} SET c1=$1, ..., cN=$N WHERE {pk_column}=$N+1 RETURNING *`.
///
/// `table` and `pk_column` are written into the statement verbatim and
/// MUST come from code, never from request input. Column names in `fields`
/// are written verbatim too; values are bound.
///
/// Fails with [`PartialUpdateError::InvalidArgument`] when `fields` is
/// empty, `table` or `pk_column` is empty, or `pk_value` is `Null`.
pub fn sql_for_partial_update(
    table: &str,
    fields: &FieldSet,
    pk_column: &str,
    pk_value: impl Into<SqlValue>,
) -> Result<PartialUpdate, PartialUpdateError> {
    if table.trim().is_empty() {
        return Err(PartialUpdateError::InvalidArgument(
            "table name cannot be empty".to_string(),
        ));
    }
    if pk_column.trim().is_empty() {
        return Err(PartialUpdateError::InvalidArgument(
            "primary key column cannot be empty".to_string(),
        ));
    }
    if fields.is_empty() {
        return Err(PartialUpdateError::InvalidArgument(
            "at least one field is required for an update".to_string(),
        ));
    }
    let pk_value = pk_value.into();
    if pk_value == SqlValue::Null {
        return Err(PartialUpdateError::InvalidArgument(
            "primary key value is missing".to_string(),
        ));
    }

    let mut set_parts = Vec::with_capacity(fields.len());
    let mut values = Vec::with_capacity(fields.len() + 1);
    for (idx, (column, value)) in fields.iter().enumerate() {
        set_parts.push(format!("{}=${}", column, idx + 1));
        values.push(value.clone());
    }
    values.push(pk_value);

    let query = format!(
        "UPDATE {} SET {} WHERE {}=${} RETURNING *",
        table,
        set_parts.join(", "),
        pk_column,
        fields.len() + 1
    );

    Ok(PartialUpdate { query, values })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placeholders(query: &str) -> Vec<usize> {
        query
            .split('$')
            .skip(1)
            .map(|rest| {
                let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
                digits.parse().unwrap()
            })
            .collect()
    }

    #[test]
    fn test_users_example() {
        let fields = FieldSet::new()
            .with("firstName", "Elie")
            .with("lastName", "Schoppik");
        let update = sql_for_partial_update("users", &fields, "id", 100).unwrap();
        assert_eq!(
            update.query,
            "UPDATE users SET firstName=$1, lastName=$2 WHERE id=$3 RETURNING *"
        );
        assert_eq!(
            update.values,
            vec![
                SqlValue::Text("Elie".to_string()),
                SqlValue::Text("Schoppik".to_string()),
                SqlValue::Int(100),
            ]
        );
    }

    #[test]
    fn test_single_field() {
        let fields = FieldSet::new().with("name", "Acme");
        let update = sql_for_partial_update("companies", &fields, "handle", "acme").unwrap();
        assert_eq!(
            update.query,
            "UPDATE companies SET name=$1 WHERE handle=$2 RETURNING *"
        );
        assert_eq!(update.values.len(), 2);
    }

    #[test]
    fn test_empty_fields_rejected() {
        let err = sql_for_partial_update("users", &FieldSet::new(), "id", 1).unwrap_err();
        assert!(matches!(err, PartialUpdateError::InvalidArgument(_)));
    }

    #[test]
    fn test_empty_table_rejected() {
        let fields = FieldSet::new().with("a", 1);
        assert!(sql_for_partial_update("", &fields, "id", 1).is_err());
        assert!(sql_for_partial_update("  ", &fields, "id", 1).is_err());
    }

    #[test]
    fn test_empty_pk_column_rejected() {
        let fields = FieldSet::new().with("a", 1);
        assert!(sql_for_partial_update("users", &fields, "", 1).is_err());
    }

    #[test]
    fn test_null_pk_value_rejected() {
        let fields = FieldSet::new().with("a", 1);
        let err = sql_for_partial_update("users", &fields, "id", SqlValue::Null).unwrap_err();
        assert_eq!(
            err,
            PartialUpdateError::InvalidArgument("primary key value is missing".to_string())
        );
        assert!(sql_for_partial_update("users", &fields, "id", None::<i64>).is_err());
    }

    #[test]
    fn test_placeholders_contiguous_for_any_width() {
        for n in 1..=12 {
            let fields: FieldSet = (0..n).map(|i| (format!("col{i}"), i as i64)).collect();
            let update = sql_for_partial_update("t", &fields, "pk", "key").unwrap();
            let found = placeholders(&update.query);
            let expected: Vec<usize> = (1..=n + 1).collect();
            assert_eq!(found, expected, "n = {n}");
            assert_eq!(update.values.len(), n + 1);
            assert_eq!(update.values.last(), Some(&SqlValue::Text("key".to_string())));
            assert!(update.query.ends_with(&format!("WHERE pk=${} RETURNING *", n + 1)));
        }
    }

    #[test]
    fn test_insertion_order_preserved() {
        let fields = FieldSet::new()
            .with("zeta", 1)
            .with("alpha", 2)
            .with("mid", 3);
        let update = sql_for_partial_update("t", &fields, "id", 9).unwrap();
        assert_eq!(
            update.query,
            "UPDATE t SET zeta=$1, alpha=$2, mid=$3 WHERE id=$4 RETURNING *"
        );
        assert_eq!(
            update.values,
            vec![
                SqlValue::Int(1),
                SqlValue::Int(2),
                SqlValue::Int(3),
                SqlValue::Int(9)
            ]
        );
    }

    #[test]
    fn test_reinsert_keeps_position() {
        let mut fields = FieldSet::new();
        fields.insert("a", 1).insert("b", 2).insert("a", 3);
        assert_eq!(fields.len(), 2);
        let cols: Vec<&str> = fields.columns().collect();
        assert_eq!(cols, vec!["a", "b"]);
        let update = sql_for_partial_update("t", &fields, "id", 1).unwrap();
        assert_eq!(update.values[0], SqlValue::Int(3));
    }

    #[test]
    fn test_insert_opt_skips_none() {
        let mut fields = FieldSet::new();
        fields
            .insert_opt("name", Some("x"))
            .insert_opt("logo_url", None::<String>);
        assert_eq!(fields.len(), 1);
    }

    #[test]
    fn test_idempotent() {
        let fields = FieldSet::new()
            .with("salary", 10.5)
            .with("title", "Engineer")
            .with("remote", true);
        let first = sql_for_partial_update("jobs", &fields, "id", 4).unwrap();
        let second = sql_for_partial_update("jobs", &fields, "id", 4).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_does_not_mutate_input() {
        let fields = FieldSet::new().with("a", 1);
        let before = fields.clone();
        let _ = sql_for_partial_update("t", &fields, "id", 1).unwrap();
        assert_eq!(fields, before);
    }

    #[test]
    fn test_round_trip_reconstructs_mapping() {
        let fields = FieldSet::new()
            .with("first_name", "Jon")
            .with("photo_url", SqlValue::Null)
            .with("email", "j@j.com");
        let update = sql_for_partial_update("users", &fields, "username", "jk").unwrap();

        let set_clause = update
            .query
            .strip_prefix("UPDATE users SET ")
            .and_then(|rest| rest.split(" WHERE ").next())
            .unwrap();
        let rebuilt: FieldSet = set_clause
            .split(", ")
            .map(|frag| {
                let (col, placeholder) = frag.split_once("=$").unwrap();
                let idx: usize = placeholder.parse().unwrap();
                (col.to_string(), update.values[idx - 1].clone())
            })
            .collect();
        assert_eq!(rebuilt, fields);

        let where_clause = update.query.split(" WHERE ").nth(1).unwrap();
        let (pk_col, pk_placeholder) = where_clause
            .trim_end_matches(" RETURNING *")
            .split_once("=$")
            .unwrap();
        let pk_idx: usize = pk_placeholder.parse().unwrap();
        assert_eq!(pk_col, "username");
        assert_eq!(update.values[pk_idx - 1], SqlValue::Text("jk".to_string()));
    }

    #[test]
    fn test_scalar_conversions() {
        assert_eq!(SqlValue::from(7_i32), SqlValue::Int(7));
        assert_eq!(SqlValue::from(false), SqlValue::Bool(false));
        assert_eq!(SqlValue::from(Some(1.5)), SqlValue::Float(1.5));
        assert_eq!(SqlValue::from(None::<String>), SqlValue::Null);
    }
}
