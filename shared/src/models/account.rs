//! Account Model

use serde::{Deserialize, Serialize};

/// 账号 (员工 / 顾客桌台 / 进出传感器)
///
/// `table_number` 绑定顾客所在桌台，员工与传感器为 `None`。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Account {
    pub id: i64,
    pub username: String,
    /// Argon2 PHC string, never serialized
    #[serde(skip_serializing, default)]
    pub hash_pass: String,
    pub is_staff: bool,
    pub table_number: Option<i64>,
    pub is_active: bool,
    pub created_at: i64,
}

/// Create account payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountCreate {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub is_staff: bool,
    pub table_number: Option<i64>,
}
