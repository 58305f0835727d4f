//! Soft-delete scope
//!
//! Rows of a soft-deleting model are never removed by [`QueryBuilder::delete`].
//! The deleted-at column is stamped instead, and a global scope hides stamped
//! rows from every query built for the model. [`SoftDeleteExt`] lets a caller
//! look past that scope, narrow to trashed rows or bring rows back.
//!
//! Whether the column holds an epoch integer (`0` = live) or a nullable
//! datetime (`NULL` = live) follows [`ColumnSemantics`], i.e. the column name.

use async_trait::async_trait;
use tracing::{debug, trace};

use crate::backends::DatabaseExecutor;
use crate::error::{ModelError, ModelResult};
use crate::model::{Attributes, Model};
use crate::query::{GlobalScope, QueryBuilder, QueryOperator, ScopeId, WhereCondition};
use crate::timestamps::ColumnSemantics;

/// Global scope excluding soft-deleted rows
#[derive(Debug, Clone, Copy, Default)]
pub struct SoftDeleteScope;

impl GlobalScope for SoftDeleteScope {
    const ID: ScopeId = ScopeId::SoftDelete;

    fn apply<M: Model>(&self, conditions: &mut Vec<WhereCondition>) {
        let column = M::qualified_deleted_at_column();
        trace!(%column, "Applying soft delete scope");
        conditions.push(not_deleted(&column, M::deleted_at_semantics()));
    }
}

fn not_deleted(column: &str, semantics: ColumnSemantics) -> WhereCondition {
    match semantics {
        ColumnSemantics::EpochInteger => WhereCondition::compare(column, QueryOperator::Equal, 0),
        ColumnSemantics::NullableDatetime => WhereCondition::null(column),
    }
}

fn deleted(column: &str, semantics: ColumnSemantics) -> WhereCondition {
    match semantics {
        ColumnSemantics::EpochInteger => {
            WhereCondition::compare(column, QueryOperator::GreaterThan, 0)
        }
        ColumnSemantics::NullableDatetime => WhereCondition::not_null(column),
    }
}

fn single(column: String, value: serde_json::Value) -> Attributes {
    let mut values = Attributes::new();
    values.insert(column, value);
    values
}

impl SoftDeleteScope {
    /// Deleted-at column for writes: qualified once joins make it ambiguous
    pub fn deleted_at_column<M: Model>(builder: &QueryBuilder<M>) -> String {
        if builder.has_joins() {
            M::qualified_deleted_at_column()
        } else {
            M::deleted_at_column()
        }
    }

    /// Replacement for the physical delete: stamp the matched rows
    pub async fn on_delete<M: Model>(
        builder: &QueryBuilder<M>,
        executor: &dyn DatabaseExecutor,
    ) -> ModelResult<u64> {
        let column = Self::deleted_at_column(builder);
        let value = M::deleted_at_semantics().deleted_sentinel(M::fresh_timestamp());
        debug!(table = M::table_name(), %column, %value, "Soft deleting rows");

        builder.update(executor, single(column, value)).await
    }
}

/// Query builder extensions provided by the soft-delete scope
#[async_trait]
pub trait SoftDeleteExt<M: Model>: Sized {
    /// Include trashed rows
    fn with_trashed(self) -> Self;

    /// Include trashed rows when `include` is true, otherwise behave as
    /// [`without_trashed`](SoftDeleteExt::without_trashed)
    fn with_trashed_if(self, include: bool) -> Self;

    /// Exclude trashed rows with an explicit predicate
    fn without_trashed(self) -> Self;

    /// Only trashed rows
    fn only_trashed(self) -> Self;

    /// Clear the deleted-at column of every matched row, trashed or not
    async fn restore(self, executor: &dyn DatabaseExecutor) -> ModelResult<u64>;

    /// Find (including trashed) or create, then restore the record
    async fn restore_or_create(
        self,
        executor: &dyn DatabaseExecutor,
        attributes: Attributes,
        values: Attributes,
    ) -> ModelResult<M>;

    /// Create first, fall back to the existing row on a unique collision,
    /// then restore the record
    async fn create_or_restore(
        self,
        executor: &dyn DatabaseExecutor,
        attributes: Attributes,
        values: Attributes,
    ) -> ModelResult<M>;
}

#[async_trait]
impl<M: Model> SoftDeleteExt<M> for QueryBuilder<M> {
    fn with_trashed(self) -> Self {
        self.with_trashed_if(true)
    }

    fn with_trashed_if(self, include: bool) -> Self {
        if !include {
            return self.without_trashed();
        }
        self.without_global_scope(SoftDeleteScope::ID)
    }

    fn without_trashed(self) -> Self {
        let column = SoftDeleteScope::deleted_at_column(&self);
        let mut builder = self.without_global_scope(SoftDeleteScope::ID);
        builder
            .where_conditions
            .push(not_deleted(&column, M::deleted_at_semantics()));
        builder
    }

    fn only_trashed(self) -> Self {
        let column = SoftDeleteScope::deleted_at_column(&self);
        let mut builder = self.without_global_scope(SoftDeleteScope::ID);
        builder
            .where_conditions
            .push(deleted(&column, M::deleted_at_semantics()));
        builder
    }

    async fn restore(self, executor: &dyn DatabaseExecutor) -> ModelResult<u64> {
        let builder = self.with_trashed();
        let sentinel = M::deleted_at_semantics().not_deleted_sentinel();
        debug!(table = M::table_name(), "Restoring soft deleted rows");

        builder
            .update(executor, single(M::deleted_at_column(), sentinel))
            .await
    }

    async fn restore_or_create(
        self,
        executor: &dyn DatabaseExecutor,
        attributes: Attributes,
        values: Attributes,
    ) -> ModelResult<M> {
        let mut record = self
            .with_trashed()
            .first_or_create(executor, attributes, values)
            .await?;
        record.restore(executor).await?;
        Ok(record)
    }

    async fn create_or_restore(
        self,
        executor: &dyn DatabaseExecutor,
        attributes: Attributes,
        values: Attributes,
    ) -> ModelResult<M> {
        let mut record = self
            .with_trashed()
            .create_or_first(executor, attributes, values)
            .await?;
        record.restore(executor).await?;
        Ok(record)
    }
}

/// Soft-delete operations on a loaded record
#[async_trait]
pub trait SoftDeleteRecord: Model + Sized {
    /// Whether this record is currently soft deleted
    fn trashed(&self) -> ModelResult<bool>;

    /// Mark the row as live and update this record to match; a
    /// [`ModelError::Query`] for models without soft deletes
    async fn restore(&mut self, executor: &dyn DatabaseExecutor) -> ModelResult<()>;

    /// Mark the row as deleted and update this record to match.
    ///
    /// Models without soft deletes have the row removed instead.
    async fn delete(&mut self, executor: &dyn DatabaseExecutor) -> ModelResult<()>;
}

#[async_trait]
impl<M: Model> SoftDeleteRecord for M {
    fn trashed(&self) -> ModelResult<bool> {
        if !M::uses_soft_deletes() {
            return Ok(false);
        }
        let value = self.attribute(&M::deleted_at_column())?;
        Ok(M::deleted_at_semantics().is_deleted(value.as_ref()))
    }

    async fn restore(&mut self, executor: &dyn DatabaseExecutor) -> ModelResult<()> {
        if !M::uses_soft_deletes() {
            return Err(ModelError::Query(format!(
                "{} does not use soft deletes",
                M::table_name()
            )));
        }
        let key = self.primary_key().ok_or(ModelError::MissingPrimaryKey)?;
        M::query()
            .where_eq(&M::qualify_column(M::primary_key_name()), key)
            .restore(executor)
            .await?;

        self.set_attribute(
            &M::deleted_at_column(),
            M::deleted_at_semantics().not_deleted_sentinel(),
        )
    }

    async fn delete(&mut self, executor: &dyn DatabaseExecutor) -> ModelResult<()> {
        let key = self.primary_key().ok_or(ModelError::MissingPrimaryKey)?;
        if !M::uses_soft_deletes() {
            debug!(table = M::table_name(), %key, "Removing record");
            M::query()
                .where_eq(&M::qualify_column(M::primary_key_name()), key)
                .force_delete(executor)
                .await?;
            return Ok(());
        }

        let column = M::deleted_at_column();
        let value = M::deleted_at_semantics().deleted_sentinel(M::fresh_timestamp());
        debug!(table = M::table_name(), %key, "Soft deleting record");

        M::query()
            .without_global_scopes()
            .where_eq(&M::qualify_column(M::primary_key_name()), key)
            .update(executor, single(column.clone(), value.clone()))
            .await?;

        self.set_attribute(&column, value)
    }
}
