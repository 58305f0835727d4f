//! Global scopes - default filters attached to every query of a model
//!
//! A builder carries the identifiers of its active scopes. Scopes are applied
//! when the statement is compiled, ahead of the caller's own predicates, and
//! can be removed per builder with [`QueryBuilder::without_global_scope`].

use super::builder::QueryBuilder;
use super::types::WhereCondition;
use crate::model::Model;
use crate::soft_delete::SoftDeleteScope;

/// Stable identifier of a global scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ScopeId {
    SoftDelete,
}

/// A filter applied by default to every query of a model
pub trait GlobalScope {
    /// Identifier used to remove this scope from a single builder
    const ID: ScopeId;

    /// Push this scope's predicates for model `M`
    fn apply<M: Model>(&self, conditions: &mut Vec<WhereCondition>);
}

impl ScopeId {
    fn apply<M: Model>(self, conditions: &mut Vec<WhereCondition>) {
        match self {
            ScopeId::SoftDelete => SoftDeleteScope.apply::<M>(conditions),
        }
    }
}

impl<M: Model> QueryBuilder<M> {
    pub(crate) fn boot_scopes(&mut self) {
        if M::uses_soft_deletes() {
            self.scopes.insert(SoftDeleteScope::ID);
        }
    }

    /// Scope predicates followed by the explicit predicates
    pub fn effective_conditions(&self) -> Vec<WhereCondition> {
        let mut conditions = Vec::with_capacity(self.where_conditions.len() + self.scopes.len());
        for scope in &self.scopes {
            scope.apply::<M>(&mut conditions);
        }
        conditions.extend(self.where_conditions.iter().cloned());
        conditions
    }
}

impl<M> QueryBuilder<M> {
    /// Remove a global scope from this query only
    pub fn without_global_scope(mut self, scope: ScopeId) -> Self {
        self.scopes.remove(&scope);
        self
    }

    /// Remove every global scope from this query
    pub fn without_global_scopes(mut self) -> Self {
        self.scopes.clear();
        self
    }

    pub fn has_global_scope(&self, scope: ScopeId) -> bool {
        self.scopes.contains(&scope)
    }

    pub fn global_scopes(&self) -> impl Iterator<Item = ScopeId> + '_ {
        self.scopes.iter().copied()
    }
}
