pub mod accounts;
pub mod emails;
pub mod pool;
pub mod schema;

// Re-export the pool type so callers can do `use crate::adapters::sqlite::DbPool`
pub use pool::DbPool;
