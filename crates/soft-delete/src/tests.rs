//! Statement-level tests for the soft-delete scope
//!
//! A recording executor captures what each operation sends to the database,
//! so the scope's predicates and update payloads can be checked exactly.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::backends::DatabaseExecutor;
use crate::error::{ModelError, ModelResult};
use crate::model::{Attributes, Model, TimestampColumns};
use crate::query::{QueryBuilder, QueryOperator, QueryType, ScopeId, Statement};
use crate::soft_delete::{SoftDeleteExt, SoftDeleteRecord};

const FROZEN_EPOCH: i64 = 1704164645;

fn frozen_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()
}

/// Epoch-column model with a frozen clock
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Article {
    #[serde(default)]
    id: Option<i64>,
    title: String,
    #[serde(default)]
    create_time: i64,
    #[serde(default)]
    update_time: i64,
    #[serde(default)]
    delete_time: i64,
}

impl Model for Article {
    type PrimaryKey = i64;

    fn table_name() -> &'static str {
        "articles"
    }

    fn primary_key(&self) -> Option<Self::PrimaryKey> {
        self.id
    }

    fn timestamp_columns() -> TimestampColumns {
        TimestampColumns::BASIC
    }

    fn uses_timestamps() -> bool {
        true
    }

    fn uses_soft_deletes() -> bool {
        true
    }

    fn fresh_timestamp() -> DateTime<Utc> {
        frozen_now()
    }
}

/// Datetime-column model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Post {
    #[serde(default)]
    id: Option<i64>,
    body: String,
    #[serde(default)]
    deleted_at: Option<String>,
}

impl Model for Post {
    type PrimaryKey = i64;

    fn table_name() -> &'static str {
        "posts"
    }

    fn primary_key(&self) -> Option<Self::PrimaryKey> {
        self.id
    }

    fn uses_soft_deletes() -> bool {
        true
    }

    fn fresh_timestamp() -> DateTime<Utc> {
        frozen_now()
    }
}

/// Model without soft deletes
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Tag {
    id: Option<i64>,
    name: String,
}

impl Model for Tag {
    type PrimaryKey = i64;

    fn table_name() -> &'static str {
        "tags"
    }

    fn primary_key(&self) -> Option<Self::PrimaryKey> {
        self.id
    }
}

/// Datetime-column model whose table name contains `time`
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Timeline {
    #[serde(default)]
    id: Option<i64>,
    title: String,
    #[serde(default)]
    deleted_at: Option<String>,
}

impl Model for Timeline {
    type PrimaryKey = i64;

    fn table_name() -> &'static str {
        "timelines"
    }

    fn primary_key(&self) -> Option<Self::PrimaryKey> {
        self.id
    }

    fn uses_soft_deletes() -> bool {
        true
    }

    fn fresh_timestamp() -> DateTime<Utc> {
        frozen_now()
    }
}

/// Executor that records statements and reports one affected row
#[derive(Debug, Default)]
struct RecordingExecutor {
    statements: Mutex<Vec<Statement>>,
}

impl RecordingExecutor {
    fn record(&self, statement: &Statement) {
        self.statements.lock().unwrap().push(statement.clone());
    }

    fn statements(&self) -> Vec<Statement> {
        self.statements.lock().unwrap().clone()
    }

    fn last(&self) -> Statement {
        self.statements().pop().expect("no statement recorded")
    }
}

#[async_trait]
impl DatabaseExecutor for RecordingExecutor {
    async fn fetch_all(&self, statement: &Statement) -> ModelResult<Vec<Attributes>> {
        self.record(statement);
        Ok(Vec::new())
    }

    async fn execute(&self, statement: &Statement) -> ModelResult<u64> {
        self.record(statement);
        Ok(1)
    }

    async fn insert(&self, statement: &Statement) -> ModelResult<Attributes> {
        self.record(statement);
        let mut row: Attributes = statement
            .set_clauses
            .iter()
            .map(|clause| (clause.column.clone(), clause.value.clone()))
            .collect();
        row.insert("id".to_string(), json!(1));
        Ok(row)
    }
}

fn set_value<'a>(statement: &'a Statement, column: &str) -> Option<&'a Value> {
    statement
        .set_clauses
        .iter()
        .find(|clause| clause.column == column)
        .map(|clause| &clause.value)
}

#[cfg(test)]
mod default_scope_tests {
    use super::*;

    #[test]
    fn test_epoch_model_filters_live_rows() {
        assert_eq!(
            Article::query().to_sql(),
            "SELECT articles.* FROM articles WHERE articles.delete_time = 0"
        );
    }

    #[test]
    fn test_datetime_model_filters_null_rows() {
        assert_eq!(
            Post::query().to_sql(),
            "SELECT posts.* FROM posts WHERE posts.deleted_at IS NULL"
        );
    }

    #[test]
    fn test_scope_precedes_explicit_predicates() {
        let sql = Article::query().where_eq("title", "Hello").to_sql();
        assert_eq!(
            sql,
            "SELECT articles.* FROM articles WHERE articles.delete_time = 0 AND title = 'Hello'"
        );
    }

    #[test]
    fn test_models_without_soft_deletes_have_no_scope() {
        let query = Tag::query();
        assert!(!query.has_global_scope(ScopeId::SoftDelete));
        assert_eq!(query.to_sql(), "SELECT tags.* FROM tags");
    }

    #[test]
    fn test_scope_is_registered_per_builder() {
        let trashed = Article::query().with_trashed();
        let fresh = Article::query();

        assert!(!trashed.has_global_scope(ScopeId::SoftDelete));
        assert!(fresh.has_global_scope(ScopeId::SoftDelete));
        assert_eq!(fresh.global_scopes().collect::<Vec<_>>(), vec![ScopeId::SoftDelete]);
    }

    #[test]
    fn test_table_name_does_not_decide_column_semantics() {
        assert_eq!(
            Timeline::query().to_sql(),
            "SELECT timelines.* FROM timelines WHERE timelines.deleted_at IS NULL"
        );

        let sql = Timeline::query()
            .join("users", "timelines.user_id", "users.id")
            .only_trashed()
            .to_sql();
        assert_eq!(
            sql,
            "SELECT timelines.* FROM timelines INNER JOIN users ON timelines.user_id = users.id WHERE timelines.deleted_at IS NOT NULL"
        );
    }

    #[test]
    fn test_without_global_scope_by_identifier() {
        let sql = QueryBuilder::<Article>::new()
            .without_global_scope(ScopeId::SoftDelete)
            .to_sql();
        assert_eq!(sql, "SELECT articles.* FROM articles");
    }
}

#[cfg(test)]
mod extension_tests {
    use super::*;

    #[test]
    fn test_with_trashed_removes_the_filter() {
        let sql = Article::query().where_eq("title", "Hello").with_trashed().to_sql();
        assert_eq!(sql, "SELECT articles.* FROM articles WHERE title = 'Hello'");
    }

    #[test]
    fn test_without_trashed_adds_an_explicit_predicate() {
        assert_eq!(
            Article::query().without_trashed().to_sql(),
            "SELECT articles.* FROM articles WHERE delete_time = 0"
        );
        assert_eq!(
            Post::query().without_trashed().to_sql(),
            "SELECT posts.* FROM posts WHERE deleted_at IS NULL"
        );
    }

    #[test]
    fn test_without_trashed_survives_a_removed_scope() {
        let query = Article::query().with_trashed().without_trashed();
        assert_eq!(
            query.to_sql(),
            "SELECT articles.* FROM articles WHERE delete_time = 0"
        );
    }

    #[test]
    fn test_with_trashed_false_is_without_trashed() {
        let toggled = Article::query().where_eq("title", "a").with_trashed_if(false);
        let explicit = Article::query().where_eq("title", "a").without_trashed();
        assert_eq!(toggled.to_select(), explicit.to_select());

        let included = Article::query().with_trashed_if(true);
        assert_eq!(included.to_select(), Article::query().with_trashed().to_select());
    }

    #[test]
    fn test_only_trashed_predicates() {
        assert_eq!(
            Article::query().only_trashed().to_sql(),
            "SELECT articles.* FROM articles WHERE delete_time > 0"
        );
        assert_eq!(
            Post::query().only_trashed().to_sql(),
            "SELECT posts.* FROM posts WHERE deleted_at IS NOT NULL"
        );
    }

    #[test]
    fn test_joined_queries_qualify_the_column() {
        let sql = Article::query()
            .join("authors", "articles.author_id", "authors.id")
            .only_trashed()
            .to_sql();
        assert_eq!(
            sql,
            "SELECT articles.* FROM articles INNER JOIN authors ON articles.author_id = authors.id WHERE articles.delete_time > 0"
        );

        let statement = Post::query()
            .left_join("users", "posts.user_id", "users.id")
            .without_trashed()
            .to_select();
        assert_eq!(statement.conditions.len(), 1);
        assert_eq!(statement.conditions[0].column, "posts.deleted_at");
        assert_eq!(statement.conditions[0].operator, QueryOperator::IsNull);
    }
}

#[cfg(test)]
mod delete_tests {
    use super::*;

    #[tokio::test]
    async fn test_delete_becomes_an_update_of_the_plain_column() {
        let executor = RecordingExecutor::default();
        let affected = Article::query().where_eq("id", 1).delete(&executor).await.unwrap();
        assert_eq!(affected, 1);

        let statement = executor.last();
        assert_eq!(statement.query_type, QueryType::Update);
        assert_eq!(set_value(&statement, "delete_time"), Some(&json!(FROZEN_EPOCH)));
        assert_eq!(set_value(&statement, "articles.update_time"), Some(&json!(FROZEN_EPOCH)));
        assert_eq!(statement.conditions.len(), 2);
        assert_eq!(statement.conditions[0].column, "articles.delete_time");
    }

    #[tokio::test]
    async fn test_joined_delete_uses_the_qualified_column() {
        let executor = RecordingExecutor::default();
        Article::query()
            .join("authors", "articles.author_id", "authors.id")
            .where_eq("authors.banned", true)
            .delete(&executor)
            .await
            .unwrap();

        let statement = executor.last();
        assert_eq!(statement.query_type, QueryType::Update);
        assert_eq!(set_value(&statement, "articles.delete_time"), Some(&json!(FROZEN_EPOCH)));
        assert!(set_value(&statement, "delete_time").is_none());
        let sql = statement.to_sql();
        assert!(sql.starts_with("UPDATE articles SET "));
        assert!(sql.ends_with(
            " FROM authors WHERE articles.author_id = authors.id AND articles.delete_time = 0 AND authors.banned = true"
        ));
    }

    #[tokio::test]
    async fn test_datetime_delete_writes_a_datetime_string() {
        let executor = RecordingExecutor::default();
        Post::query().where_eq("id", 3).delete(&executor).await.unwrap();

        let statement = executor.last();
        assert_eq!(set_value(&statement, "deleted_at"), Some(&json!("2024-01-02 03:04:05")));
        assert!(set_value(&statement, "posts.updated_at").is_none());
    }

    #[tokio::test]
    async fn test_joined_datetime_delete_keeps_the_datetime_sentinel() {
        let executor = RecordingExecutor::default();
        Timeline::query()
            .join("users", "timelines.user_id", "users.id")
            .delete(&executor)
            .await
            .unwrap();

        let statement = executor.last();
        assert_eq!(
            set_value(&statement, "timelines.deleted_at"),
            Some(&json!("2024-01-02 03:04:05"))
        );
        assert_eq!(
            statement.to_sql(),
            "UPDATE timelines SET deleted_at = '2024-01-02 03:04:05' FROM users WHERE timelines.user_id = users.id AND timelines.deleted_at IS NULL"
        );
    }

    #[tokio::test]
    async fn test_force_delete_and_plain_models_remove_rows() {
        let executor = RecordingExecutor::default();

        Article::query().where_eq("id", 1).force_delete(&executor).await.unwrap();
        assert_eq!(
            executor.last().to_sql(),
            "DELETE FROM articles WHERE articles.delete_time = 0 AND id = 1"
        );

        Tag::query().where_eq("id", 9).delete(&executor).await.unwrap();
        assert_eq!(executor.last().to_sql(), "DELETE FROM tags WHERE id = 9");
    }
}

#[cfg(test)]
mod restore_tests {
    use super::*;

    #[tokio::test]
    async fn test_restore_targets_trashed_rows_and_writes_the_sentinel() {
        let executor = RecordingExecutor::default();
        Article::query().where_eq("id", 1).restore(&executor).await.unwrap();

        let statement = executor.last();
        assert_eq!(statement.query_type, QueryType::Update);
        assert_eq!(statement.conditions.len(), 1);
        assert_eq!(statement.conditions[0].column, "id");
        assert_eq!(set_value(&statement, "delete_time"), Some(&json!(0)));

        Post::query().where_eq("id", 2).restore(&executor).await.unwrap();
        assert_eq!(
            executor.last().to_sql(),
            "UPDATE posts SET deleted_at = NULL WHERE id = 2"
        );
    }

    #[tokio::test]
    async fn test_restore_or_create_looks_up_including_trashed_then_restores() {
        let executor = RecordingExecutor::default();
        let mut attributes = Attributes::new();
        attributes.insert("title".to_string(), json!("Hello"));

        let article = Article::query()
            .restore_or_create(&executor, attributes, Attributes::new())
            .await
            .unwrap();
        assert_eq!(article.id, Some(1));
        assert_eq!(article.delete_time, 0);

        let statements = executor.statements();
        assert_eq!(statements.len(), 3);
        assert_eq!(
            statements[0].to_sql(),
            "SELECT articles.* FROM articles WHERE title = 'Hello' LIMIT 1"
        );
        assert_eq!(statements[1].query_type, QueryType::Insert);
        assert_eq!(set_value(&statements[1], "delete_time"), Some(&json!(0)));

        let restore = &statements[2];
        assert_eq!(restore.query_type, QueryType::Update);
        assert_eq!(restore.conditions.len(), 1);
        assert_eq!(restore.conditions[0].column, "articles.id");
        assert_eq!(set_value(restore, "delete_time"), Some(&json!(0)));
    }

    #[tokio::test]
    async fn test_record_level_delete_and_restore() {
        let executor = RecordingExecutor::default();
        let mut article = Article {
            id: Some(5),
            title: "Hello".to_string(),
            create_time: 1,
            update_time: 1,
            delete_time: 0,
        };
        assert!(!article.trashed().unwrap());

        article.delete(&executor).await.unwrap();
        assert_eq!(article.delete_time, FROZEN_EPOCH);
        assert!(article.trashed().unwrap());
        let statement = executor.last();
        assert!(statement.conditions.iter().all(|c| c.column != "articles.delete_time"));

        article.restore(&executor).await.unwrap();
        assert_eq!(article.delete_time, 0);
        assert!(!article.trashed().unwrap());
    }

    #[tokio::test]
    async fn test_record_level_delete_removes_rows_of_plain_models() {
        let executor = RecordingExecutor::default();
        let mut tag = Tag {
            id: Some(9),
            name: "rust".to_string(),
        };
        assert!(!tag.trashed().unwrap());

        tag.delete(&executor).await.unwrap();
        let statement = executor.last();
        assert_eq!(statement.query_type, QueryType::Delete);
        assert_eq!(statement.to_sql(), "DELETE FROM tags WHERE tags.id = 9");

        let err = tag.restore(&executor).await.unwrap_err();
        assert!(matches!(err, ModelError::Query(_)));
        assert_eq!(executor.statements().len(), 1);
    }

    #[tokio::test]
    async fn test_record_without_primary_key_is_rejected() {
        let executor = RecordingExecutor::default();
        let mut post = Post {
            id: None,
            body: "draft".to_string(),
            deleted_at: None,
        };

        let err = post.restore(&executor).await.unwrap_err();
        assert_eq!(err, ModelError::MissingPrimaryKey);
        assert!(executor.statements().is_empty());
    }
}

#[cfg(test)]
mod predicate_tests {
    use super::*;

    #[test]
    fn test_range_predicates_render_in_order() {
        let query = Tag::query()
            .where_ne("name", "rust")
            .where_gte("id", 2)
            .where_lt("id", 10)
            .where_lte("id", 9);

        assert_eq!(query.table(), "tags");
        let operators: Vec<QueryOperator> =
            query.where_conditions().iter().map(|c| c.operator).collect();
        assert_eq!(
            operators,
            vec![
                QueryOperator::NotEqual,
                QueryOperator::GreaterThanOrEqual,
                QueryOperator::LessThan,
                QueryOperator::LessThanOrEqual,
            ]
        );
        assert_eq!(
            query.to_sql(),
            "SELECT tags.* FROM tags WHERE name != 'rust' AND id >= 2 AND id < 10 AND id <= 9"
        );
    }

    #[test]
    fn test_where_conditions_exclude_global_scopes() {
        let query = Article::query().where_eq("title", "Hello");
        assert_eq!(query.where_conditions().len(), 1);
        assert_eq!(query.effective_conditions().len(), 2);
    }
}
