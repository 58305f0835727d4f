//! Model trait - table metadata, timestamp column naming and attribute access
//!
//! Records move between the executor and Rust types as attribute maps; the
//! conversion goes through serde so a model only has to describe its table.

use std::borrow::Cow;
use std::fmt::{Debug, Display};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ModelError, ModelResult};
use crate::query::QueryBuilder;
use crate::timestamps::ColumnSemantics;

/// Column name to value mapping for a single row
pub type Attributes = serde_json::Map<String, Value>;

/// Names of the created/updated/deleted timestamp columns of a model.
///
/// Deserializable so the names can live in application configuration; a
/// missing field falls back to the conventional `*_at` name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimestampColumns {
    pub created_at: Cow<'static, str>,
    pub updated_at: Cow<'static, str>,
    pub deleted_at: Cow<'static, str>,
}

impl TimestampColumns {
    /// Epoch-integer columns used by the `Basic` model family
    pub const BASIC: TimestampColumns = TimestampColumns {
        created_at: Cow::Borrowed("create_time"),
        updated_at: Cow::Borrowed("update_time"),
        deleted_at: Cow::Borrowed("delete_time"),
    };

    /// Whether `column` (plain or table-qualified) is one of these columns
    pub fn contains(&self, column: &str) -> bool {
        let local = column.rsplit('.').next().unwrap_or(column);
        [&self.created_at, &self.updated_at, &self.deleted_at]
            .iter()
            .any(|name| name.as_ref() == local)
    }
}

impl Default for TimestampColumns {
    fn default() -> Self {
        Self {
            created_at: Cow::Borrowed("created_at"),
            updated_at: Cow::Borrowed("updated_at"),
            deleted_at: Cow::Borrowed("deleted_at"),
        }
    }
}

/// Core trait for database models
pub trait Model: Send + Sync + Debug + Serialize + DeserializeOwned + 'static {
    /// The type used for this model's primary key
    type PrimaryKey: Clone + Send + Sync + Debug + Display + Into<Value>;

    /// Table name for this model
    fn table_name() -> &'static str;

    /// Primary key field name
    fn primary_key_name() -> &'static str {
        "id"
    }

    /// Get the primary key value for this model instance
    fn primary_key(&self) -> Option<Self::PrimaryKey>;

    /// Timestamp column names for this model
    fn timestamp_columns() -> TimestampColumns {
        TimestampColumns::default()
    }

    /// Check if this model stamps its created/updated columns
    fn uses_timestamps() -> bool {
        false
    }

    /// Check if this model supports soft deletes
    fn uses_soft_deletes() -> bool {
        false
    }

    fn deleted_at_column() -> String {
        Self::timestamp_columns().deleted_at.into_owned()
    }

    fn qualified_deleted_at_column() -> String {
        Self::qualify_column(&Self::deleted_at_column())
    }

    /// Storage semantics of the deleted-at column, decided by its name
    fn deleted_at_semantics() -> ColumnSemantics {
        ColumnSemantics::of(&Self::deleted_at_column())
    }

    /// Prefix a column with this model's table name
    fn qualify_column(column: &str) -> String {
        if column.contains('.') {
            column.to_string()
        } else {
            format!("{}.{}", Self::table_name(), column)
        }
    }

    /// Current instant used for timestamps and delete markers
    fn fresh_timestamp() -> DateTime<Utc> {
        Utc::now()
    }

    /// Start a query against this model's table with global scopes booted
    fn query() -> QueryBuilder<Self>
    where
        Self: Sized,
    {
        QueryBuilder::new()
    }

    /// Convert model to column-value pairs
    fn to_attributes(&self) -> ModelResult<Attributes> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            other => Err(ModelError::Serialization(format!(
                "{} did not serialize to an object: {}",
                Self::table_name(),
                other
            ))),
        }
    }

    /// Build a model instance from column-value pairs
    fn from_attributes(attributes: Attributes) -> ModelResult<Self>
    where
        Self: Sized,
    {
        serde_json::from_value(Value::Object(attributes)).map_err(|e| {
            ModelError::Serialization(format!(
                "Failed to hydrate {}: {}",
                Self::table_name(),
                e
            ))
        })
    }

    /// Read a single attribute
    fn attribute(&self, column: &str) -> ModelResult<Option<Value>> {
        Ok(self.to_attributes()?.remove(column))
    }

    /// Overwrite a single attribute in place
    fn set_attribute(&mut self, column: &str, value: Value) -> ModelResult<()>
    where
        Self: Sized,
    {
        let mut attributes = self.to_attributes()?;
        attributes.insert(column.to_string(), value);
        *self = Self::from_attributes(attributes)?;
        Ok(())
    }
}
