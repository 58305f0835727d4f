//! # elif-soft-delete: epoch timestamps and soft deletes for elif.rs models
//!
//! Models opt into two behaviors:
//!
//! - **Custom timestamp columns.** [`TimestampColumns::BASIC`] names the
//!   `create_time` / `update_time` / `delete_time` columns. Any column whose
//!   name contains `time` stores Unix-epoch seconds.
//! - **Soft deletes.** Deleting through [`QueryBuilder::delete`] stamps the
//!   deleted-at column instead of removing rows. A global scope hides stamped
//!   rows, and [`SoftDeleteExt`] brings them back into view or restores them.
//!
//! ```ignore
//! let store = MemoryStore::new();
//! let article: Article = Article::query().create(&store, attrs).await?;
//! Article::query().where_eq("id", 1).delete(&store).await?;
//! let trashed = Article::query().only_trashed().get(&store).await?;
//! Article::query().where_eq("id", 1).restore(&store).await?;
//! ```

pub mod backends;
pub mod console;
pub mod error;
pub mod model;
pub mod query;
pub mod soft_delete;
pub mod timestamps;

#[cfg(test)]
mod tests;

pub use backends::{DatabaseExecutor, MemoryStore};
pub use error::{ModelError, ModelResult};
pub use model::{Attributes, Model, TimestampColumns};
pub use query::{QueryBuilder, ScopeId, Statement};
pub use soft_delete::{SoftDeleteExt, SoftDeleteRecord, SoftDeleteScope};
pub use timestamps::{is_epoch_column, ColumnSemantics};
