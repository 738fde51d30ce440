//! Execute a resolved query against SQLite and classify the result.

use crate::error::AppError;
use crate::resolve::ResolvedQuery;
use crate::sql::BindValue;
use serde::Serialize;
use serde_json::Value;
use sqlx::sqlite::SqliteRow;
use sqlx::{Executor, SqlitePool, Statement};

/// Rows when the statement reports columns (possibly none returned), otherwise the affected-row count.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QueryOutcome {
    Rows(Vec<Value>),
    Count(u64),
}

pub struct QueryService;

impl QueryService {
    pub async fn execute(pool: &SqlitePool, resolved: &ResolvedQuery) -> Result<QueryOutcome, AppError> {
        let Some(sql) = resolved.query.as_deref() else {
            return Ok(QueryOutcome::Rows(Vec::new()));
        };
        tracing::debug!(path = %resolved.path, sql = %sql, params = resolved.values.len(), "query");

        let mut conn = pool.acquire().await?;
        let stmt = (&mut *conn).prepare(sql).await?;
        let returns_rows = !stmt.columns().is_empty();
        let mut query = stmt.query();
        for v in &resolved.values {
            query = query.bind(BindValue::from_json(v));
        }

        if returns_rows {
            let rows = query.fetch_all(&mut *conn).await?;
            Ok(QueryOutcome::Rows(rows.iter().map(row_to_json).collect()))
        } else {
            let result = query.execute(&mut *conn).await?;
            Ok(QueryOutcome::Count(result.rows_affected()))
        }
    }
}

/// One JSON object per row, keys in SELECT column order.
fn row_to_json(row: &SqliteRow) -> Value {
    use sqlx::Column;
    use sqlx::Row;
    let mut map = serde_json::Map::new();
    for (idx, col) in row.columns().iter().enumerate() {
        map.insert(col.name().to_string(), cell_to_value(row, idx));
    }
    Value::Object(map)
}

fn cell_to_value(row: &SqliteRow, idx: usize) -> Value {
    use sqlx::{Row, ValueRef};
    match row.try_get_raw(idx) {
        Ok(raw) if !raw.is_null() => {}
        _ => return Value::Null,
    }
    if let Ok(n) = row.try_get::<i64, _>(idx) {
        return Value::Number(n.into());
    }
    if let Ok(n) = row.try_get::<f64, _>(idx) {
        return serde_json::Number::from_f64(n)
            .map(Value::Number)
            .unwrap_or(Value::Null);
    }
    if let Ok(s) = row.try_get::<String, _>(idx) {
        return Value::String(s);
    }
    if let Ok(b) = row.try_get::<Vec<u8>, _>(idx) {
        return Value::String(hex::encode(b));
    }
    row.try_get_unchecked::<String, _>(idx)
        .map(Value::String)
        .unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::raw_sql(
            "CREATE TABLE posts (id INTEGER PRIMARY KEY, thread_id TEXT, users_id TEXT, body TEXT, score REAL);
             INSERT INTO posts (thread_id, users_id, body, score) VALUES ('341', 'u1', 'first', 1.5);
             INSERT INTO posts (thread_id, users_id, body, score) VALUES ('341', NULL, 'second', NULL);
             INSERT INTO posts (thread_id, users_id, body, score) VALUES ('7', 'u2', 'other', 0.0);",
        )
        .execute(&pool)
        .await
        .unwrap();
        pool
    }

    fn resolved(query: Option<&str>, values: Vec<Value>) -> ResolvedQuery {
        ResolvedQuery {
            path: "posts".into(),
            query: query.map(String::from),
            values,
            role: "reader".into(),
        }
    }

    #[tokio::test]
    async fn select_returns_rows_as_objects() {
        let pool = pool().await;
        let out = QueryService::execute(
            &pool,
            &resolved(
                Some("SELECT id, users_id, body, score FROM posts WHERE thread_id = ? ORDER BY id"),
                vec![json!("341")],
            ),
        )
        .await
        .unwrap();
        assert_eq!(
            out,
            QueryOutcome::Rows(vec![
                json!({"id": 1, "users_id": "u1", "body": "first", "score": 1.5}),
                json!({"id": 2, "users_id": null, "body": "second", "score": null}),
            ])
        );
    }

    #[tokio::test]
    async fn records_keep_select_column_order() {
        let pool = pool().await;
        let out = QueryService::execute(
            &pool,
            &resolved(Some("SELECT score, body, id FROM posts WHERE id = 1"), vec![]),
        )
        .await
        .unwrap();
        assert_eq!(
            serde_json::to_string(&out).unwrap(),
            r#"[{"score":1.5,"body":"first","id":1}]"#
        );
    }

    #[tokio::test]
    async fn select_with_no_matches_is_empty_rows_not_count() {
        let pool = pool().await;
        let out = QueryService::execute(
            &pool,
            &resolved(Some("SELECT * FROM posts WHERE thread_id = ?"), vec![json!("none")]),
        )
        .await
        .unwrap();
        assert_eq!(out, QueryOutcome::Rows(vec![]));
    }

    #[tokio::test]
    async fn writes_return_affected_count() {
        let pool = pool().await;
        let out = QueryService::execute(
            &pool,
            &resolved(Some("DELETE FROM posts WHERE thread_id = ?"), vec![json!("341")]),
        )
        .await
        .unwrap();
        assert_eq!(out, QueryOutcome::Count(2));
    }

    #[tokio::test]
    async fn values_are_bound_not_interpolated() {
        let pool = pool().await;
        let out = QueryService::execute(
            &pool,
            &resolved(
                Some("SELECT body FROM posts WHERE thread_id = ?"),
                vec![json!("341' OR '1'='1")],
            ),
        )
        .await
        .unwrap();
        assert_eq!(out, QueryOutcome::Rows(vec![]));
    }

    #[tokio::test]
    async fn missing_query_is_an_empty_record_set() {
        let pool = pool().await;
        let out = QueryService::execute(&pool, &resolved(None, vec![])).await.unwrap();
        assert_eq!(out, QueryOutcome::Rows(vec![]));
        assert_eq!(serde_json::to_value(&out).unwrap(), json!([]));
    }

    #[tokio::test]
    async fn operational_errors_surface_as_db_errors() {
        let pool = pool().await;
        let err = QueryService::execute(&pool, &resolved(Some("SELECT * FROM nope"), vec![]))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Db(_)));
    }
}
