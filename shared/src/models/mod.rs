//! Data models
//!
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All IDs are `i64` (SQLite INTEGER PRIMARY KEY), all timestamps are
//! Unix millis.

pub mod account;
pub mod dining_table;
pub mod visitor;

// Re-exports
pub use account::*;
pub use dining_table::*;
pub use visitor::*;
