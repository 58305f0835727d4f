//! Query Builder - Core builder implementation

use std::collections::BTreeSet;
use std::marker::PhantomData;

use super::scopes::ScopeId;
use super::types::*;
use crate::model::Model;

/// Query builder over a single model's table.
///
/// Explicit predicates live in `where_conditions`; global scopes are kept as
/// identifiers and only turned into predicates when the query is compiled,
/// so removing a scope never has to hunt down the predicate it added.
#[derive(Debug)]
pub struct QueryBuilder<M> {
    pub(crate) table: String,
    pub(crate) where_conditions: Vec<WhereCondition>,
    pub(crate) joins: Vec<JoinClause>,
    pub(crate) scopes: BTreeSet<ScopeId>,
    pub(crate) limit_count: Option<i64>,
    _phantom: PhantomData<M>,
}

impl<M> Clone for QueryBuilder<M> {
    fn clone(&self) -> Self {
        Self {
            table: self.table.clone(),
            where_conditions: self.where_conditions.clone(),
            joins: self.joins.clone(),
            scopes: self.scopes.clone(),
            limit_count: self.limit_count,
            _phantom: PhantomData,
        }
    }
}

impl<M: Model> Default for QueryBuilder<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Model> QueryBuilder<M> {
    /// Create a query builder for `M`, attaching the model's global scopes
    pub fn new() -> Self {
        let mut builder = Self {
            table: M::table_name().to_string(),
            where_conditions: Vec::new(),
            joins: Vec::new(),
            scopes: BTreeSet::new(),
            limit_count: None,
            _phantom: PhantomData,
        };
        builder.boot_scopes();
        builder
    }
}

impl<M> QueryBuilder<M> {
    /// Table this query targets
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Limit the number of rows returned
    pub fn limit(mut self, count: i64) -> Self {
        self.limit_count = Some(count);
        self
    }

    /// Explicit predicates, without global scopes
    pub fn where_conditions(&self) -> &[WhereCondition] {
        &self.where_conditions
    }
}
