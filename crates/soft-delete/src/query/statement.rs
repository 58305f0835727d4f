//! Compiled statements handed to a [`DatabaseExecutor`](crate::backends::DatabaseExecutor)

use super::builder::QueryBuilder;
use super::types::*;
use crate::model::{Attributes, Model};

/// A fully resolved statement: global scopes are already folded into
/// `conditions`, ahead of the explicit predicates.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub query_type: QueryType,
    pub table: String,
    pub joins: Vec<JoinClause>,
    pub conditions: Vec<WhereCondition>,
    pub set_clauses: Vec<SetClause>,
    pub limit: Option<i64>,
}

impl Statement {
    fn new(query_type: QueryType, table: &str) -> Self {
        Self {
            query_type,
            table: table.to_string(),
            joins: Vec::new(),
            conditions: Vec::new(),
            set_clauses: Vec::new(),
            limit: None,
        }
    }

    /// INSERT of a single row
    pub fn insert(table: &str, attributes: Attributes) -> Self {
        let mut statement = Self::new(QueryType::Insert, table);
        statement.set_clauses = into_set_clauses(attributes);
        statement
    }
}

fn into_set_clauses(attributes: Attributes) -> Vec<SetClause> {
    attributes
        .into_iter()
        .map(|(column, value)| SetClause { column, value })
        .collect()
}

impl<M: Model> QueryBuilder<M> {
    fn compile(&self, query_type: QueryType) -> Statement {
        let mut statement = Statement::new(query_type, &self.table);
        statement.joins = self.joins.clone();
        statement.conditions = self.effective_conditions();
        statement
    }

    /// SELECT of the matched rows
    pub fn to_select(&self) -> Statement {
        let mut statement = self.compile(QueryType::Select);
        statement.limit = self.limit_count;
        statement
    }

    /// UPDATE of the matched rows with `values`
    pub fn to_update(&self, values: Attributes) -> Statement {
        let mut statement = self.compile(QueryType::Update);
        statement.set_clauses = into_set_clauses(values);
        statement
    }

    /// Physical DELETE of the matched rows
    pub fn to_delete(&self) -> Statement {
        self.compile(QueryType::Delete)
    }

    /// Inline SQL of the SELECT, for logging and assertions
    pub fn to_sql(&self) -> String {
        self.to_select().to_sql()
    }
}
