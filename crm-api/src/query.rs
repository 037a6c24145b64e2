//! Dynamic query composition for the filtered list endpoints
//!
//! Each list endpoint accepts a subset of optional filters. Active filters
//! are collected as predicates into an ordered list and folded into a single
//! parameterized statement. The list owns bind application for both the data
//! query and its COUNT twin, so the two always agree on predicate semantics.

use sqlx::sqlite::{SqliteQueryResult, SqliteRow};
use sqlx::{Sqlite, SqlitePool};

use crate::error::ApiError;

/// A bind value for a dynamically assembled statement
#[derive(Debug, Clone, PartialEq)]
pub enum BindValue {
    Int(i64),
    Text(String),
}

/// Ordered list of active filter predicates and their bind values
///
/// Predicates combine with AND; an absent filter imposes no constraint.
#[derive(Debug, Clone, Default)]
pub struct PredicateList {
    conditions: Vec<String>,
    binds: Vec<BindValue>,
}

impl PredicateList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a predicate. `condition` must contain one `?` placeholder per
    /// entry of `values` (an OR-group may carry several).
    pub fn push(
        &mut self,
        condition: impl Into<String>,
        values: impl IntoIterator<Item = BindValue>,
    ) {
        self.conditions.push(condition.into());
        self.binds.extend(values);
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Render the WHERE clause (empty string when no filters are active)
    pub fn where_clause(&self) -> String {
        if self.conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.conditions.join(" AND "))
        }
    }

    pub fn binds(&self) -> &[BindValue] {
        &self.binds
    }

    /// Run the data query: predicate binds first, then any trailing binds
    /// (LIMIT/OFFSET), in order.
    pub async fn fetch_all_as<T>(
        &self,
        pool: &SqlitePool,
        sql: &str,
        trailing: &[BindValue],
    ) -> Result<Vec<T>, sqlx::Error>
    where
        T: for<'r> sqlx::FromRow<'r, SqliteRow> + Send + Unpin,
    {
        let mut query = sqlx::query_as::<Sqlite, T>(sql);
        for value in self.binds.iter().chain(trailing) {
            query = match value {
                BindValue::Int(v) => query.bind(*v),
                BindValue::Text(v) => query.bind(v.clone()),
            };
        }
        query.fetch_all(pool).await
    }

    /// Run the COUNT twin with exactly the same predicate binds
    pub async fn fetch_count(&self, pool: &SqlitePool, sql: &str) -> Result<i64, sqlx::Error> {
        let mut query = sqlx::query_scalar::<Sqlite, i64>(sql);
        for value in &self.binds {
            query = match value {
                BindValue::Int(v) => query.bind(*v),
                BindValue::Text(v) => query.bind(v.clone()),
            };
        }
        query.fetch_one(pool).await
    }
}

/// Execute a dynamically assembled statement (e.g. a partial UPDATE)
pub async fn execute_with(
    pool: &SqlitePool,
    sql: &str,
    binds: &[BindValue],
) -> Result<SqliteQueryResult, sqlx::Error> {
    let mut query = sqlx::query(sql);
    for value in binds {
        query = match value {
            BindValue::Int(v) => query.bind(*v),
            BindValue::Text(v) => query.bind(v.clone()),
        };
    }
    query.execute(pool).await
}

/// Parse the string-encoded `limit`/`offset` pagination parameters
///
/// Both arrive as strings (defaulting "100"/"0"); anything that is not a
/// non-negative integer is a client error.
pub fn parse_pagination(limit: &str, offset: &str) -> Result<(i64, i64), ApiError> {
    let limit: i64 = limit
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("Invalid limit parameter: {}", limit)))?;
    let offset: i64 = offset
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("Invalid offset parameter: {}", offset)))?;

    if limit < 0 || offset < 0 {
        return Err(ApiError::BadRequest(
            "limit and offset must be non-negative".to_string(),
        ));
    }

    Ok((limit, offset))
}

/// Parse a string-encoded numeric identifier (path or query parameter)
pub fn parse_id(raw: &str, label: &str) -> Result<i64, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::BadRequest(format!("Valid {} is required", label)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_predicate_list_has_no_where_clause() {
        let predicates = PredicateList::new();
        assert!(predicates.is_empty());
        assert_eq!(predicates.where_clause(), "");
        assert!(predicates.binds().is_empty());
    }

    #[test]
    fn predicates_fold_with_and_in_push_order() {
        let mut predicates = PredicateList::new();
        predicates.push("d.contact_id = ?", [BindValue::Int(7)]);
        predicates.push("d.stage = ?", [BindValue::Text("negotiation".into())]);
        predicates.push("d.status = ?", [BindValue::Text("open".into())]);

        assert_eq!(
            predicates.where_clause(),
            " WHERE d.contact_id = ? AND d.stage = ? AND d.status = ?"
        );
        assert_eq!(
            predicates.binds(),
            &[
                BindValue::Int(7),
                BindValue::Text("negotiation".into()),
                BindValue::Text("open".into()),
            ]
        );
    }

    #[test]
    fn or_group_keeps_all_bind_values() {
        let mut predicates = PredicateList::new();
        let pattern = "%acme%".to_string();
        predicates.push(
            "(contact_name LIKE ? OR company LIKE ? OR email LIKE ?)",
            [
                BindValue::Text(pattern.clone()),
                BindValue::Text(pattern.clone()),
                BindValue::Text(pattern),
            ],
        );

        assert_eq!(
            predicates.where_clause(),
            " WHERE (contact_name LIKE ? OR company LIKE ? OR email LIKE ?)"
        );
        assert_eq!(predicates.binds().len(), 3);
    }

    #[test]
    fn pagination_defaults_parse() {
        assert_eq!(parse_pagination("100", "0").unwrap(), (100, 0));
    }

    #[test]
    fn pagination_rejects_garbage() {
        assert!(parse_pagination("ten", "0").is_err());
        assert!(parse_pagination("100", "x").is_err());
        assert!(parse_pagination("-1", "0").is_err());
    }

    #[test]
    fn id_parsing() {
        assert_eq!(parse_id("42", "contact ID").unwrap(), 42);
        assert!(parse_id("abc", "contact ID").is_err());
    }
}
