//! Dining Table Model

use serde::{Deserialize, Serialize};

/// Dining table entity (桌台及呼叫状态)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct DiningTable {
    #[serde(skip_serializing)]
    #[serde(default)]
    pub id: i64,
    pub table_number: i64,
    pub is_calling: bool,
}

/// Create dining table payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiningTableCreate {
    pub table_number: i64,
}
