//! Database backends
//!
//! Statements are executed through [`DatabaseExecutor`]. PostgreSQL is
//! served by `sqlx::PgPool`; [`MemoryStore`] evaluates statements against
//! in-process tables and is what the test suites run on.

pub mod core;
pub mod memory;
pub mod postgres;

pub use self::core::DatabaseExecutor;
pub use memory::MemoryStore;
