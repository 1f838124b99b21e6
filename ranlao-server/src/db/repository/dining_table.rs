//! Dining Table Repository

use super::{RepoError, RepoResult};
use shared::models::{DiningTable, DiningTableCreate};
use sqlx::SqlitePool;

const COLUMNS: &str = "id, table_number, is_calling";

/// All tables ordered by number
pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<DiningTable>> {
    let tables = sqlx::query_as::<_, DiningTable>(&format!(
        "SELECT {COLUMNS} FROM dining_table ORDER BY table_number"
    ))
    .fetch_all(pool)
    .await?;
    Ok(tables)
}

pub async fn find_by_number(pool: &SqlitePool, table_number: i64) -> RepoResult<Option<DiningTable>> {
    let table = sqlx::query_as::<_, DiningTable>(&format!(
        "SELECT {COLUMNS} FROM dining_table WHERE table_number = ?"
    ))
    .bind(table_number)
    .fetch_optional(pool)
    .await?;
    Ok(table)
}

pub async fn create(pool: &SqlitePool, data: DiningTableCreate) -> RepoResult<DiningTable> {
    if data.table_number < 1 {
        return Err(RepoError::Validation(format!(
            "Table number must be positive, got {}",
            data.table_number
        )));
    }
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO dining_table (table_number, is_calling) VALUES (?, 0) RETURNING id",
    )
    .bind(data.table_number)
    .fetch_one(pool)
    .await
    .map_err(|e| match RepoError::from(e) {
        RepoError::Duplicate(_) => {
            RepoError::Duplicate(format!("Table {} already exists", data.table_number))
        }
        other => other,
    })?;

    Ok(DiningTable {
        id,
        table_number: data.table_number,
        is_calling: false,
    })
}

/// 设置呼叫状态 (call / complete)
pub async fn set_calling(
    pool: &SqlitePool,
    table_number: i64,
    is_calling: bool,
) -> RepoResult<DiningTable> {
    let rows = sqlx::query("UPDATE dining_table SET is_calling = ? WHERE table_number = ?")
        .bind(is_calling)
        .bind(table_number)
        .execute(pool)
        .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Table {} not found", table_number)));
    }
    find_by_number(pool, table_number)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Table {} not found", table_number)))
}
