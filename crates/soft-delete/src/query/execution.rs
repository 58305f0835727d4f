//! Query execution - terminal operations run through a [`DatabaseExecutor`]

use tracing::debug;

use super::builder::QueryBuilder;
use super::statement::Statement;
use crate::backends::DatabaseExecutor;
use crate::error::{ModelError, ModelResult};
use crate::model::{Attributes, Model};
use crate::soft_delete::SoftDeleteScope;
use crate::timestamps::{normalize_timestamp_attributes, stamp_insert, stamp_update};

impl<M: Model> QueryBuilder<M> {
    /// Fetch every matching record
    pub async fn get(&self, executor: &dyn DatabaseExecutor) -> ModelResult<Vec<M>> {
        let rows = executor.fetch_all(&self.to_select()).await?;
        rows.into_iter().map(M::from_attributes).collect()
    }

    /// Fetch the first matching record
    pub async fn first(&self, executor: &dyn DatabaseExecutor) -> ModelResult<Option<M>> {
        let records = self.clone().limit(1).get(executor).await?;
        Ok(records.into_iter().next())
    }

    /// Find a record by primary key within the current scopes
    pub async fn find(&self, executor: &dyn DatabaseExecutor, id: M::PrimaryKey) -> ModelResult<Option<M>> {
        self.clone()
            .where_eq(&M::qualify_column(M::primary_key_name()), id)
            .first(executor)
            .await
    }

    /// Insert a new record.
    ///
    /// Epoch timestamp strings are converted, created/updated columns are
    /// stamped when the model uses timestamps, and the deleted-at column
    /// defaults to the not-deleted sentinel.
    pub async fn create(&self, executor: &dyn DatabaseExecutor, mut attributes: Attributes) -> ModelResult<M> {
        normalize_timestamp_attributes(&mut attributes, &M::timestamp_columns())?;
        stamp_insert::<M>(&mut attributes, M::fresh_timestamp());

        let row = executor.insert(&Statement::insert(&self.table, attributes)).await?;
        M::from_attributes(row)
    }

    /// Update every matching row, returning the affected count
    pub async fn update(&self, executor: &dyn DatabaseExecutor, mut values: Attributes) -> ModelResult<u64> {
        normalize_timestamp_attributes(&mut values, &M::timestamp_columns())?;
        stamp_update::<M>(&mut values, M::fresh_timestamp());

        executor.execute(&self.to_update(values)).await
    }

    /// Delete the matching rows.
    ///
    /// For soft-deleting models this marks the rows as deleted instead of
    /// removing them; see [`SoftDeleteScope::on_delete`].
    pub async fn delete(&self, executor: &dyn DatabaseExecutor) -> ModelResult<u64> {
        if M::uses_soft_deletes() {
            return SoftDeleteScope::on_delete(self, executor).await;
        }
        self.force_delete(executor).await
    }

    /// Physically remove the matching rows, bypassing soft deletes
    pub async fn force_delete(&self, executor: &dyn DatabaseExecutor) -> ModelResult<u64> {
        debug!(table = %self.table, "Removing rows");
        executor.execute(&self.to_delete()).await
    }

    /// Return the first record matching `attributes`, or insert
    /// `attributes` merged with `values`
    pub async fn first_or_create(
        &self,
        executor: &dyn DatabaseExecutor,
        attributes: Attributes,
        values: Attributes,
    ) -> ModelResult<M> {
        if let Some(found) = self.clone().where_attributes(&attributes).first(executor).await? {
            debug!(table = %self.table, "first_or_create matched an existing row");
            return Ok(found);
        }

        let mut merged = attributes;
        merged.extend(values);
        self.create(executor, merged).await
    }

    /// Insert `attributes` merged with `values`; on a unique-key collision
    /// return the existing record matching `attributes` instead
    pub async fn create_or_first(
        &self,
        executor: &dyn DatabaseExecutor,
        attributes: Attributes,
        values: Attributes,
    ) -> ModelResult<M> {
        let mut merged = attributes.clone();
        merged.extend(values);

        match self.create(executor, merged).await {
            Err(ModelError::UniqueViolation(reason)) => {
                debug!(table = %self.table, %reason, "create_or_first fell back to lookup");
                self.clone()
                    .where_attributes(&attributes)
                    .first(executor)
                    .await?
                    .ok_or_else(|| ModelError::NotFound(self.table.clone()))
            }
            other => other,
        }
    }
}
