//! Query Builder Module - the builder surface the soft-delete scope is layered on

pub mod builder;
pub mod execution;
pub mod joins;
pub mod scopes;
pub mod sql_generation;
pub mod statement;
pub mod types;
pub mod where_clause;

pub use builder::QueryBuilder;
pub use scopes::{GlobalScope, ScopeId};
pub use statement::Statement;
pub use types::{JoinClause, JoinType, QueryOperator, QueryType, SetClause, WhereCondition};
