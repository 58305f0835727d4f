//! In-memory executor
//!
//! Evaluates compiled statements against tables of attribute maps. Rows get
//! an auto-increment `id` when the insert does not provide one, and unique
//! keys can be declared per table to exercise insert-first flows.
//! Joined statements are rejected.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::Value;

use super::core::DatabaseExecutor;
use crate::error::{ModelError, ModelResult};
use crate::model::Attributes;
use crate::query::{QueryOperator, QueryType, Statement, WhereCondition};

#[derive(Debug, Default)]
struct MemoryTable {
    rows: Vec<Attributes>,
    next_id: i64,
    unique_keys: Vec<Vec<String>>,
}

/// Thread-safe in-process store
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<HashMap<String, MemoryTable>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a unique key over `columns` of `table`
    pub fn with_unique_key(self, table: &str, columns: &[&str]) -> Self {
        if let Ok(mut tables) = self.tables.lock() {
            tables
                .entry(table.to_string())
                .or_default()
                .unique_keys
                .push(columns.iter().map(|c| c.to_string()).collect());
        }
        self
    }

    /// Raw rows of a table, ignoring every scope
    pub fn rows(&self, table: &str) -> ModelResult<Vec<Attributes>> {
        let tables = self.lock()?;
        Ok(tables
            .get(table)
            .map(|t| t.rows.clone())
            .unwrap_or_default())
    }

    fn lock(&self) -> ModelResult<MutexGuard<'_, HashMap<String, MemoryTable>>> {
        self.tables
            .lock()
            .map_err(|e| ModelError::Database(format!("Memory store poisoned: {}", e)))
    }
}

#[async_trait]
impl DatabaseExecutor for MemoryStore {
    async fn fetch_all(&self, statement: &Statement) -> ModelResult<Vec<Attributes>> {
        reject_joins(statement)?;
        let tables = self.lock()?;
        let Some(table) = tables.get(&statement.table) else {
            return Ok(Vec::new());
        };

        let mut rows = Vec::new();
        for row in &table.rows {
            if statement.limit.map_or(false, |limit| rows.len() as i64 >= limit) {
                break;
            }
            if row_matches(row, statement)? {
                rows.push(row.clone());
            }
        }
        Ok(rows)
    }

    async fn execute(&self, statement: &Statement) -> ModelResult<u64> {
        reject_joins(statement)?;
        let mut tables = self.lock()?;
        let Some(table) = tables.get_mut(&statement.table) else {
            return Ok(0);
        };

        match statement.query_type {
            QueryType::Update => {
                let mut affected = 0;
                for row in table.rows.iter_mut() {
                    if !row_matches(row, statement)? {
                        continue;
                    }
                    for clause in &statement.set_clauses {
                        let column = local_column(&clause.column, &statement.table)?;
                        row.insert(column.to_string(), clause.value.clone());
                    }
                    affected += 1;
                }
                Ok(affected)
            }
            QueryType::Delete => {
                let mut kept = Vec::with_capacity(table.rows.len());
                let mut affected = 0;
                for row in table.rows.drain(..) {
                    if row_matches(&row, statement)? {
                        affected += 1;
                    } else {
                        kept.push(row);
                    }
                }
                table.rows = kept;
                Ok(affected)
            }
            other => Err(ModelError::Query(format!(
                "Memory store cannot execute {:?} statements",
                other
            ))),
        }
    }

    async fn insert(&self, statement: &Statement) -> ModelResult<Attributes> {
        let mut tables = self.lock()?;
        let table = tables.entry(statement.table.clone()).or_default();

        let mut row = Attributes::new();
        for clause in &statement.set_clauses {
            let column = local_column(&clause.column, &statement.table)?;
            row.insert(column.to_string(), clause.value.clone());
        }

        for key in &table.unique_keys {
            let collides = table.rows.iter().any(|existing| {
                key.iter().all(|column| {
                    let candidate = row.get(column).unwrap_or(&Value::Null);
                    !candidate.is_null() && values_equal(existing.get(column).unwrap_or(&Value::Null), candidate)
                })
            });
            if collides {
                return Err(ModelError::UniqueViolation(format!(
                    "duplicate key ({}) in table '{}'",
                    key.join(", "),
                    statement.table
                )));
            }
        }

        match row.get("id").and_then(Value::as_i64) {
            Some(id) => table.next_id = table.next_id.max(id),
            None => {
                table.next_id += 1;
                row.insert("id".to_string(), Value::from(table.next_id));
            }
        }

        table.rows.push(row.clone());
        Ok(row)
    }
}

fn reject_joins(statement: &Statement) -> ModelResult<()> {
    if statement.joins.is_empty() {
        Ok(())
    } else {
        Err(ModelError::Query(
            "Memory store does not support joins".to_string(),
        ))
    }
}

/// Resolve a plain or `table.`-qualified column against the statement table
fn local_column<'a>(column: &'a str, table: &str) -> ModelResult<&'a str> {
    match column.split_once('.') {
        None => Ok(column),
        Some((qualifier, local)) if qualifier == table => Ok(local),
        Some((qualifier, _)) => Err(ModelError::Query(format!(
            "Unknown table '{}' in column reference '{}'",
            qualifier, column
        ))),
    }
}

fn row_matches(row: &Attributes, statement: &Statement) -> ModelResult<bool> {
    for condition in &statement.conditions {
        if !condition_matches(row, condition, &statement.table)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn condition_matches(row: &Attributes, condition: &WhereCondition, table: &str) -> ModelResult<bool> {
    let column = local_column(&condition.column, table)?;
    let actual = row.get(column).unwrap_or(&Value::Null);

    let matched = match condition.operator {
        QueryOperator::IsNull => actual.is_null(),
        QueryOperator::IsNotNull => !actual.is_null(),
        QueryOperator::In => condition.values.iter().any(|v| values_equal(actual, v)),
        operator => {
            // Comparisons against NULL never match, as in SQL
            let Some(expected) = condition.value.as_ref().filter(|v| !v.is_null()) else {
                return Ok(false);
            };
            if actual.is_null() {
                return Ok(false);
            }
            match operator {
                QueryOperator::Equal => values_equal(actual, expected),
                QueryOperator::NotEqual => !values_equal(actual, expected),
                _ => match compare_values(actual, expected) {
                    Some(ordering) => match operator {
                        QueryOperator::GreaterThan => ordering == Ordering::Greater,
                        QueryOperator::GreaterThanOrEqual => ordering != Ordering::Less,
                        QueryOperator::LessThan => ordering == Ordering::Less,
                        QueryOperator::LessThanOrEqual => ordering != Ordering::Greater,
                        _ => false,
                    },
                    None => false,
                },
            }
        }
    };
    Ok(matched)
}

fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        _ => left == right,
    }
}

fn compare_values(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}
