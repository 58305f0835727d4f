//! Core Database Backend Trait
//!
//! The query layer never talks to a driver directly; it compiles a
//! [`Statement`] and hands it to an executor.

use async_trait::async_trait;

use crate::error::ModelResult;
use crate::model::Attributes;
use crate::query::Statement;

/// Abstract statement executor
#[async_trait]
pub trait DatabaseExecutor: Send + Sync {
    /// Run a SELECT and return every matching row
    async fn fetch_all(&self, statement: &Statement) -> ModelResult<Vec<Attributes>>;

    /// Run an UPDATE or DELETE and return the affected row count
    async fn execute(&self, statement: &Statement) -> ModelResult<u64>;

    /// Run an INSERT and return the stored row.
    ///
    /// A collision on a unique key must surface as
    /// [`ModelError::UniqueViolation`](crate::error::ModelError::UniqueViolation).
    async fn insert(&self, statement: &Statement) -> ModelResult<Attributes>;
}
