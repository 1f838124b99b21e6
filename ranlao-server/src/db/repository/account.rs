//! Account Repository

use super::{RepoError, RepoResult};
use crate::auth::password::hash_password;
use shared::models::{Account, AccountCreate};
use shared::util::now_millis;
use sqlx::SqlitePool;

const COLUMNS: &str = "id, username, hash_pass, is_staff, table_number, is_active, created_at";

pub async fn find_by_username(pool: &SqlitePool, username: &str) -> RepoResult<Option<Account>> {
    let account = sqlx::query_as::<_, Account>(&format!(
        "SELECT {COLUMNS} FROM account WHERE username = ?"
    ))
    .bind(username)
    .fetch_optional(pool)
    .await?;
    Ok(account)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Account>> {
    let account = sqlx::query_as::<_, Account>(&format!("SELECT {COLUMNS} FROM account WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(account)
}

pub async fn count(pool: &SqlitePool) -> RepoResult<i64> {
    let n = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM account")
        .fetch_one(pool)
        .await?;
    Ok(n)
}

/// Create account, hashing the password with Argon2
pub async fn create(pool: &SqlitePool, data: AccountCreate) -> RepoResult<Account> {
    let username = data.username.trim().to_string();
    if username.is_empty() {
        return Err(RepoError::Validation("Username cannot be empty".into()));
    }
    if data.password.is_empty() {
        return Err(RepoError::Validation("Password cannot be empty".into()));
    }
    let hash_pass = hash_password(&data.password)
        .map_err(|e| RepoError::Database(format!("Failed to hash password: {}", e)))?;
    let created_at = now_millis();

    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO account (username, hash_pass, is_staff, table_number, is_active, created_at) \
         VALUES (?, ?, ?, ?, 1, ?) RETURNING id",
    )
    .bind(&username)
    .bind(&hash_pass)
    .bind(data.is_staff)
    .bind(data.table_number)
    .bind(created_at)
    .fetch_one(pool)
    .await
    .map_err(|e| match RepoError::from(e) {
        RepoError::Duplicate(_) => {
            RepoError::Duplicate(format!("Account '{}' already exists", username))
        }
        other => other,
    })?;

    Ok(Account {
        id,
        username,
        hash_pass,
        is_staff: data.is_staff,
        table_number: data.table_number,
        is_active: true,
        created_at,
    })
}

pub async fn set_active(pool: &SqlitePool, id: i64, is_active: bool) -> RepoResult<()> {
    let rows = sqlx::query("UPDATE account SET is_active = ? WHERE id = ?")
        .bind(is_active)
        .bind(id)
        .execute(pool)
        .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Account {} not found", id)));
    }
    Ok(())
}
