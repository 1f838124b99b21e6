//! Visitor Bucket Repository
//!
//! Hour-aligned counters keyed by `bucket_time` (UTC hour start, Unix millis).
//! Every function takes a connection so the reconciler can run a whole
//! gap-fill inside one transaction.

use super::{RepoError, RepoResult};
use shared::models::VisitorBucket;
use sqlx::SqliteConnection;

const COLUMNS: &str = "id, bucket_time, amount";

/// Get the bucket for `bucket_time`, creating it with amount 0 if absent.
///
/// Returns `(bucket, created)`; `created` is true only when this call inserted it.
pub async fn get_or_create(
    conn: &mut SqliteConnection,
    bucket_time: i64,
) -> RepoResult<(VisitorBucket, bool)> {
    let inserted = sqlx::query(
        "INSERT INTO visitor_bucket (bucket_time, amount) VALUES (?, 0) ON CONFLICT (bucket_time) DO NOTHING",
    )
    .bind(bucket_time)
    .execute(&mut *conn)
    .await?;

    let bucket = get(conn, bucket_time)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create visitor bucket".into()))?;
    Ok((bucket, inserted.rows_affected() == 1))
}

pub async fn get(conn: &mut SqliteConnection, bucket_time: i64) -> RepoResult<Option<VisitorBucket>> {
    let bucket = sqlx::query_as::<_, VisitorBucket>(&format!(
        "SELECT {COLUMNS} FROM visitor_bucket WHERE bucket_time = ?"
    ))
    .bind(bucket_time)
    .fetch_optional(conn)
    .await?;
    Ok(bucket)
}

/// Latest bucket with `not_older_than <= bucket_time < before`
pub async fn find_latest_before(
    conn: &mut SqliteConnection,
    before: i64,
    not_older_than: i64,
) -> RepoResult<Option<VisitorBucket>> {
    let bucket = sqlx::query_as::<_, VisitorBucket>(&format!(
        "SELECT {COLUMNS} FROM visitor_bucket WHERE bucket_time < ? AND bucket_time >= ? ORDER BY bucket_time DESC LIMIT 1"
    ))
    .bind(before)
    .bind(not_older_than)
    .fetch_optional(conn)
    .await?;
    Ok(bucket)
}

/// Create a filler bucket carrying `amount`; an existing bucket is left untouched.
///
/// Returns whether a bucket was created.
pub async fn insert_filler(
    conn: &mut SqliteConnection,
    bucket_time: i64,
    amount: i64,
) -> RepoResult<bool> {
    let rows = sqlx::query(
        "INSERT INTO visitor_bucket (bucket_time, amount) VALUES (?, ?) ON CONFLICT (bucket_time) DO NOTHING",
    )
    .bind(bucket_time)
    .bind(amount)
    .execute(conn)
    .await?;
    Ok(rows.rows_affected() == 1)
}

/// Persist the amount of an existing bucket
pub async fn save(conn: &mut SqliteConnection, bucket: &VisitorBucket) -> RepoResult<()> {
    if bucket.amount < 0 {
        return Err(RepoError::Validation(format!(
            "Visitor amount cannot be negative: {}",
            bucket.amount
        )));
    }
    let rows = sqlx::query("UPDATE visitor_bucket SET amount = ? WHERE bucket_time = ?")
        .bind(bucket.amount)
        .bind(bucket.bucket_time)
        .execute(conn)
        .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!(
            "Visitor bucket {} not found",
            bucket.bucket_time
        )));
    }
    Ok(())
}

/// Buckets with `start <= bucket_time <= end`, ascending
pub async fn query_range(
    conn: &mut SqliteConnection,
    start: i64,
    end: i64,
) -> RepoResult<Vec<VisitorBucket>> {
    let buckets = sqlx::query_as::<_, VisitorBucket>(&format!(
        "SELECT {COLUMNS} FROM visitor_bucket WHERE bucket_time >= ? AND bucket_time <= ? ORDER BY bucket_time ASC"
    ))
    .bind(start)
    .bind(end)
    .fetch_all(conn)
    .await?;
    Ok(buckets)
}

/// All buckets, newest first
pub async fn find_all_desc(conn: &mut SqliteConnection) -> RepoResult<Vec<VisitorBucket>> {
    let buckets = sqlx::query_as::<_, VisitorBucket>(&format!(
        "SELECT {COLUMNS} FROM visitor_bucket ORDER BY bucket_time DESC"
    ))
    .fetch_all(conn)
    .await?;
    Ok(buckets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use shared::util::HOUR_MILLIS;

    const T: i64 = 1_645_092_000_000; // 2022-02-17 10:00 UTC

    #[tokio::test]
    async fn test_get_or_create_reports_creation_once() {
        let pool = test_pool().await;
        let mut conn = pool.acquire().await.unwrap();

        let (b, created) = get_or_create(&mut conn, T).await.unwrap();
        assert!(created);
        assert_eq!(b.amount, 0);
        assert_eq!(b.bucket_time, T);

        let (again, created) = get_or_create(&mut conn, T).await.unwrap();
        assert!(!created);
        assert_eq!(again.id, b.id);
    }

    #[tokio::test]
    async fn test_find_latest_before_bounds() {
        let pool = test_pool().await;
        let mut conn = pool.acquire().await.unwrap();

        insert_filler(&mut conn, T - 7 * HOUR_MILLIS, 3).await.unwrap();
        insert_filler(&mut conn, T - 6 * HOUR_MILLIS, 4).await.unwrap();
        insert_filler(&mut conn, T, 9).await.unwrap();

        // Strictly before the query time, floor inclusive
        let found = find_latest_before(&mut conn, T, T - 6 * HOUR_MILLIS)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.bucket_time, T - 6 * HOUR_MILLIS);
        assert_eq!(found.amount, 4);

        // Floor above every candidate
        let none = find_latest_before(&mut conn, T, T - 5 * HOUR_MILLIS)
            .await
            .unwrap();
        assert!(none.is_none());
    }

    #[tokio::test]
    async fn test_insert_filler_never_overwrites() {
        let pool = test_pool().await;
        let mut conn = pool.acquire().await.unwrap();

        assert!(insert_filler(&mut conn, T, 5).await.unwrap());
        assert!(!insert_filler(&mut conn, T, 1).await.unwrap());
        assert_eq!(get(&mut conn, T).await.unwrap().unwrap().amount, 5);
    }

    #[tokio::test]
    async fn test_save_updates_amount() {
        let pool = test_pool().await;
        let mut conn = pool.acquire().await.unwrap();

        let (mut b, _) = get_or_create(&mut conn, T).await.unwrap();
        b.amount = 12;
        save(&mut conn, &b).await.unwrap();
        assert_eq!(get(&mut conn, T).await.unwrap().unwrap().amount, 12);

        b.amount = -1;
        assert!(matches!(
            save(&mut conn, &b).await,
            Err(RepoError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_query_range_inclusive_ascending() {
        let pool = test_pool().await;
        let mut conn = pool.acquire().await.unwrap();

        for h in [3, 0, 5, 1, 6] {
            insert_filler(&mut conn, T + h * HOUR_MILLIS, h).await.unwrap();
        }

        let rows = query_range(&mut conn, T, T + 5 * HOUR_MILLIS).await.unwrap();
        let hours: Vec<i64> = rows.iter().map(|b| b.amount).collect();
        assert_eq!(hours, vec![0, 1, 3, 5]);

        let all = find_all_desc(&mut conn).await.unwrap();
        assert_eq!(all.first().unwrap().bucket_time, T + 6 * HOUR_MILLIS);
        assert_eq!(all.len(), 5);
    }
}
