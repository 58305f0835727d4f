//! Query Builder WHERE clause operations

use super::builder::QueryBuilder;
use super::types::*;
use crate::model::Attributes;
use serde_json::Value;

impl<M> QueryBuilder<M> {
    /// Add WHERE condition with equality
    pub fn where_eq<T: Into<Value>>(mut self, column: &str, value: T) -> Self {
        self.where_conditions
            .push(WhereCondition::compare(column, QueryOperator::Equal, value));
        self
    }

    /// Add WHERE condition with not equal
    pub fn where_ne<T: Into<Value>>(mut self, column: &str, value: T) -> Self {
        self.where_conditions
            .push(WhereCondition::compare(column, QueryOperator::NotEqual, value));
        self
    }

    /// Add WHERE condition with greater than
    pub fn where_gt<T: Into<Value>>(mut self, column: &str, value: T) -> Self {
        self.where_conditions
            .push(WhereCondition::compare(column, QueryOperator::GreaterThan, value));
        self
    }

    /// Add WHERE condition with greater than or equal
    pub fn where_gte<T: Into<Value>>(mut self, column: &str, value: T) -> Self {
        self.where_conditions.push(WhereCondition::compare(
            column,
            QueryOperator::GreaterThanOrEqual,
            value,
        ));
        self
    }

    /// Add WHERE condition with less than
    pub fn where_lt<T: Into<Value>>(mut self, column: &str, value: T) -> Self {
        self.where_conditions
            .push(WhereCondition::compare(column, QueryOperator::LessThan, value));
        self
    }

    /// Add WHERE condition with less than or equal
    pub fn where_lte<T: Into<Value>>(mut self, column: &str, value: T) -> Self {
        self.where_conditions.push(WhereCondition::compare(
            column,
            QueryOperator::LessThanOrEqual,
            value,
        ));
        self
    }

    /// Add WHERE condition with IN
    pub fn where_in<T: Into<Value>>(mut self, column: &str, values: Vec<T>) -> Self {
        self.where_conditions.push(WhereCondition {
            column: column.to_string(),
            operator: QueryOperator::In,
            value: None,
            values: values.into_iter().map(|v| v.into()).collect(),
        });
        self
    }

    /// Add WHERE condition with IS NULL
    pub fn where_null(mut self, column: &str) -> Self {
        self.where_conditions.push(WhereCondition::null(column));
        self
    }

    /// Add WHERE condition with IS NOT NULL
    pub fn where_not_null(mut self, column: &str) -> Self {
        self.where_conditions.push(WhereCondition::not_null(column));
        self
    }

    /// Match every attribute by equality; `null` values become IS NULL
    pub fn where_attributes(mut self, attributes: &Attributes) -> Self {
        for (column, value) in attributes {
            self = match value {
                Value::Null => self.where_null(column),
                other => self.where_eq(column, other.clone()),
            };
        }
        self
    }
}
