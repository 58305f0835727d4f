//! PostgreSQL executor backed by `sqlx::PgPool`
//!
//! Rows are read back through `row_to_json` so any table can be hydrated
//! into an attribute map without per-model decoding code.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde_json::Value;
use sqlx::postgres::{PgArguments, PgPool};
use sqlx::query::{Query, QueryScalar};
use sqlx::types::Json;
use sqlx::Postgres;
use tracing::debug;

use super::core::DatabaseExecutor;
use crate::error::{ModelError, ModelResult};
use crate::model::Attributes;
use crate::query::Statement;
use crate::timestamps::DATETIME_FORMAT;

type JsonRow = Json<Value>;

/// Bind a JSON value with the closest PostgreSQL type. Strings in the
/// datetime column format are sent as `timestamp` so they can be assigned
/// to timestamp columns.
macro_rules! bind_json_value {
    ($query:expr, $value:expr) => {
        match $value {
            Value::Null => $query.bind(None::<String>),
            Value::Bool(b) => $query.bind(*b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    $query.bind(i)
                } else if let Some(f) = n.as_f64() {
                    $query.bind(f)
                } else {
                    $query.bind(n.to_string())
                }
            }
            Value::String(s) => match NaiveDateTime::parse_from_str(s, DATETIME_FORMAT) {
                Ok(datetime) => $query.bind(datetime),
                Err(_) => $query.bind(s.clone()),
            },
            other @ (Value::Array(_) | Value::Object(_)) => $query.bind(Json(other.clone())),
        }
    };
}

fn bind_scalar<'q>(
    query: QueryScalar<'q, Postgres, JsonRow, PgArguments>,
    value: &Value,
) -> QueryScalar<'q, Postgres, JsonRow, PgArguments> {
    bind_json_value!(query, value)
}

fn bind_query<'q>(query: Query<'q, Postgres, PgArguments>, value: &Value) -> Query<'q, Postgres, PgArguments> {
    bind_json_value!(query, value)
}

fn into_attributes(row: Value) -> ModelResult<Attributes> {
    match row {
        Value::Object(map) => Ok(map),
        other => Err(ModelError::Serialization(format!(
            "Expected a JSON object row, got {}",
            other
        ))),
    }
}

#[async_trait]
impl DatabaseExecutor for PgPool {
    async fn fetch_all(&self, statement: &Statement) -> ModelResult<Vec<Attributes>> {
        let (sql, params) = statement.to_sql_with_params();
        let sql = format!("SELECT row_to_json(selected) FROM ({}) AS selected", sql);
        debug!(%sql, params = params.len(), "Fetching rows");

        let mut query: QueryScalar<'_, Postgres, JsonRow, PgArguments> = sqlx::query_scalar(&sql);
        for value in &params {
            query = bind_scalar(query, value);
        }

        let rows = query.fetch_all(self).await?;
        rows.into_iter().map(|Json(row)| into_attributes(row)).collect()
    }

    async fn execute(&self, statement: &Statement) -> ModelResult<u64> {
        let (sql, params) = statement.to_sql_with_params();
        debug!(%sql, params = params.len(), "Executing statement");

        let mut query = sqlx::query(&sql);
        for value in &params {
            query = bind_query(query, value);
        }

        let result = query.execute(self).await?;
        Ok(result.rows_affected())
    }

    async fn insert(&self, statement: &Statement) -> ModelResult<Attributes> {
        let (sql, params) = statement.to_sql_with_params();
        let sql = format!(
            "WITH inserted AS ({} RETURNING *) SELECT row_to_json(inserted) FROM inserted",
            sql
        );
        debug!(%sql, params = params.len(), "Inserting row");

        let mut query: QueryScalar<'_, Postgres, JsonRow, PgArguments> = sqlx::query_scalar(&sql);
        for value in &params {
            query = bind_scalar(query, value);
        }

        let Json(row) = query.fetch_one(self).await?;
        into_attributes(row)
    }
}
