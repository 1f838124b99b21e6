//! Visitor Ledger
//!
//! 每小时一个计数桶。传感器可能断电或漏报，因此某小时第一次被触达时，
//! 会在回看窗口 (6 小时) 内找到最近的已知桶，把中间缺失的小时按该桶的
//! 人数补齐 (carry-forward)，再对当前小时应用增量。
//!
//! 每次 reconcile 是一个 SQLite 事务：补桶与增量一起提交或一起回滚。
//! 同一小时的 reconcile 由进程内的按小时互斥锁串行化。

use std::sync::Arc;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use dashmap::DashMap;
use shared::models::VisitorBucket;
use shared::util::{HOUR_MILLIS, hour_index, truncate_to_hour};
use sqlx::SqlitePool;
use tokio::sync::Mutex;

use super::report::{ReportWindow, window_bounds};
use crate::db::repository::{RepoError, RepoResult, visitor_bucket};
use crate::utils::AppResult;

/// 回看窗口 (小时)
pub const LOOKBACK_HOURS: i64 = 6;

/// SQLite BUSY/LOCKED 时整体重试的最大次数
pub const MAX_RECONCILE_ATTEMPTS: u32 = 3;

const LOOKBACK_MILLIS: i64 = LOOKBACK_HOURS * HOUR_MILLIS;

/// 一次 reconcile 中发生的补桶
#[derive(Debug)]
struct GapFill {
    previous: VisitorBucket,
    synthetic: bool,
    fillers: usize,
}

#[derive(Clone)]
pub struct VisitorLedger {
    pool: SqlitePool,
    hour_locks: Arc<DashMap<i64, Arc<Mutex<()>>>>,
}

impl VisitorLedger {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            hour_locks: Arc::new(DashMap::new()),
        }
    }

    /// 客人进入 (+1)
    pub async fn enter(&self, at: DateTime<Utc>) -> AppResult<VisitorBucket> {
        self.reconcile(at, 1).await
    }

    /// 客人离开 (-1，已为 0 时忽略)
    pub async fn leave(&self, at: DateTime<Utc>) -> AppResult<VisitorBucket> {
        self.reconcile(at, -1).await
    }

    /// 当前小时的桶 (必要时补齐)
    pub async fn current(&self, at: DateTime<Utc>) -> AppResult<VisitorBucket> {
        self.reconcile(at, 0).await
    }

    /// Resolve the bucket for `at`'s hour, gap-fill if it is new, then apply `delta`.
    pub async fn reconcile(&self, at: DateTime<Utc>, delta: i64) -> AppResult<VisitorBucket> {
        let zero = truncate_to_hour(at.timestamp_millis());

        let lock = self
            .hour_locks
            .entry(zero)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let result = {
            let _guard = lock.lock().await;
            self.reconcile_with_retry(zero, delta).await
        };
        drop(lock);
        self.prune_locks(zero);

        let (bucket, fill) = result?;
        if let Some(fill) = fill {
            tracing::info!(
                bucket_time = zero,
                previous_time = fill.previous.bucket_time,
                previous_amount = fill.previous.amount,
                fillers = fill.fillers,
                synthetic = fill.synthetic,
                "Visitor buckets gap-filled"
            );
        }
        tracing::debug!(
            bucket_time = zero,
            delta,
            amount = bucket.amount,
            "Visitor bucket reconciled"
        );
        Ok(bucket)
    }

    async fn reconcile_with_retry(
        &self,
        zero: i64,
        delta: i64,
    ) -> AppResult<(VisitorBucket, Option<GapFill>)> {
        let mut attempt = 1;
        loop {
            match self.reconcile_once(zero, delta).await {
                Ok(done) => return Ok(done),
                Err(e) if e.is_retryable() && attempt < MAX_RECONCILE_ATTEMPTS => {
                    tracing::warn!(
                        bucket_time = zero,
                        attempt,
                        error = %e,
                        "Visitor reconcile conflicted, retrying"
                    );
                    attempt += 1;
                    tokio::task::yield_now().await;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    async fn reconcile_once(
        &self,
        zero: i64,
        delta: i64,
    ) -> RepoResult<(VisitorBucket, Option<GapFill>)> {
        let mut tx = self.pool.begin().await?;

        let (mut current, created) = visitor_bucket::get_or_create(&mut tx, zero).await?;

        let mut fill = None;
        if created {
            let floor = zero - LOOKBACK_MILLIS;
            let (previous, synthetic) =
                match visitor_bucket::find_latest_before(&mut tx, zero, floor).await? {
                    Some(previous) => (previous, false),
                    None => (visitor_bucket::get_or_create(&mut tx, floor).await?.0, true),
                };

            let gap = hour_index(zero) - hour_index(previous.bucket_time);
            let mut fillers = 0;
            for h in 1..gap {
                if visitor_bucket::insert_filler(&mut tx, zero - h * HOUR_MILLIS, previous.amount)
                    .await?
                {
                    fillers += 1;
                }
            }

            current.amount = previous.amount;
            fill = Some(GapFill {
                previous,
                synthetic,
                fillers,
            });
        }

        let applied = current.apply_delta(delta);
        if !applied {
            tracing::debug!(
                bucket_time = zero,
                delta,
                amount = current.amount,
                "Visitor delta dropped at zero"
            );
        }
        if created || (applied && delta != 0) {
            visitor_bucket::save(&mut tx, &current).await?;
        }

        tx.commit().await?;
        Ok((current, fill))
    }

    /// 前一日统计窗口内的桶，升序，不补齐
    pub async fn statistics(
        &self,
        now: DateTime<Utc>,
        tz: Tz,
        window: ReportWindow,
    ) -> AppResult<Vec<VisitorBucket>> {
        let (start, end) = window_bounds(now, tz, window)?;
        let mut conn = self.pool.acquire().await.map_err(RepoError::from)?;
        Ok(visitor_bucket::query_range(&mut conn, start, end).await?)
    }

    /// 全部桶，最新在前
    pub async fn history(&self) -> AppResult<Vec<VisitorBucket>> {
        let mut conn = self.pool.acquire().await.map_err(RepoError::from)?;
        Ok(visitor_bucket::find_all_desc(&mut conn).await?)
    }

    fn prune_locks(&self, zero: i64) {
        let oldest = zero - LOOKBACK_MILLIS;
        self.hour_locks
            .retain(|&hour, lock| hour >= oldest || Arc::strong_count(lock) > 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{DbService, test_pool};
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2022, 2, 17, 10, 0, 0).unwrap()
    }

    fn hours(n: i64) -> i64 {
        n * HOUR_MILLIS
    }

    async fn seed(pool: &SqlitePool, bucket_time: i64, amount: i64) {
        let mut conn = pool.acquire().await.unwrap();
        assert!(
            visitor_bucket::insert_filler(&mut conn, bucket_time, amount)
                .await
                .unwrap()
        );
    }

    async fn all(pool: &SqlitePool) -> Vec<(i64, i64)> {
        let mut conn = pool.acquire().await.unwrap();
        let mut rows: Vec<(i64, i64)> = visitor_bucket::find_all_desc(&mut conn)
            .await
            .unwrap()
            .into_iter()
            .map(|b| (b.bucket_time, b.amount))
            .collect();
        rows.reverse();
        rows
    }

    #[tokio::test]
    async fn test_enter_within_hour_truncates_and_accumulates() {
        let pool = test_pool().await;
        let ledger = VisitorLedger::new(pool.clone());
        let t = t0().timestamp_millis();

        ledger.enter(t0() + Duration::minutes(5)).await.unwrap();
        let b = ledger.enter(t0() + Duration::minutes(59)).await.unwrap();
        assert_eq!(b.bucket_time, t);
        assert_eq!(b.amount, 2);

        let b = ledger.leave(t0() + Duration::minutes(30)).await.unwrap();
        assert_eq!(b.amount, 1);
    }

    #[tokio::test]
    async fn test_amount_never_negative() {
        let pool = test_pool().await;
        let ledger = VisitorLedger::new(pool.clone());

        let deltas = [1, -1, -1, -1, 1, 1, -1, -1, -1, 1];
        for (i, d) in deltas.iter().enumerate() {
            let at = t0() + Duration::minutes(i as i64 * 20);
            let b = ledger.reconcile(at, *d).await.unwrap();
            assert!(b.amount >= 0);
        }
        assert!(all(&pool).await.iter().all(|(_, amount)| *amount >= 0));
    }

    #[tokio::test]
    async fn test_count_read_is_idempotent() {
        let pool = test_pool().await;
        let ledger = VisitorLedger::new(pool.clone());
        ledger.enter(t0()).await.unwrap();

        let later = t0() + Duration::hours(3);
        let first = ledger.current(later).await.unwrap();
        let second = ledger.current(later).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.amount, 1);
    }

    #[tokio::test]
    async fn test_gap_fill_from_previous_hour() {
        let pool = test_pool().await;
        let ledger = VisitorLedger::new(pool.clone());
        let t = t0().timestamp_millis();
        seed(&pool, t - hours(1), 5).await;

        let b = ledger.reconcile(t0(), 1).await.unwrap();
        assert_eq!(b.amount, 6);
        assert_eq!(all(&pool).await, vec![(t - hours(1), 5), (t, 6)]);
    }

    #[tokio::test]
    async fn test_gap_fill_leave_from_previous_hour() {
        let pool = test_pool().await;
        let ledger = VisitorLedger::new(pool.clone());
        let t = t0().timestamp_millis();
        seed(&pool, t - hours(1), 5).await;

        let b = ledger.reconcile(t0(), -1).await.unwrap();
        assert_eq!(b.amount, 4);
        assert_eq!(all(&pool).await.len(), 2);
    }

    #[tokio::test]
    async fn test_lookback_boundary_honored_at_six_hours() {
        let pool = test_pool().await;
        let ledger = VisitorLedger::new(pool.clone());
        let t = t0().timestamp_millis();
        seed(&pool, t - hours(6), 4).await;

        let b = ledger.reconcile(t0(), 1).await.unwrap();
        assert_eq!(b.amount, 5);

        let rows = all(&pool).await;
        assert_eq!(rows.len(), 7);
        assert_eq!(rows[0], (t - hours(6), 4));
        for h in 1..=5 {
            assert!(rows.contains(&(t - hours(h), 4)));
        }
    }

    #[tokio::test]
    async fn test_lookback_ignores_older_bucket() {
        let pool = test_pool().await;
        let ledger = VisitorLedger::new(pool.clone());
        let t = t0().timestamp_millis();
        seed(&pool, t - hours(7), 4).await;

        let b = ledger.reconcile(t0(), 1).await.unwrap();
        assert_eq!(b.amount, 1);

        let rows = all(&pool).await;
        assert_eq!(rows[0], (t - hours(7), 4));
        assert_eq!(rows[1], (t - hours(6), 0));
        assert_eq!(rows.len(), 8);
    }

    #[tokio::test]
    async fn test_carry_forward_not_zero_fill() {
        let pool = test_pool().await;
        let ledger = VisitorLedger::new(pool.clone());
        let t = t0().timestamp_millis();
        seed(&pool, t - hours(5), 7).await;

        let b = ledger.reconcile(t0(), 8).await.unwrap();
        assert_eq!(b.amount, 15);
        assert_eq!(
            all(&pool).await,
            vec![
                (t - hours(5), 7),
                (t - hours(4), 7),
                (t - hours(3), 7),
                (t - hours(2), 7),
                (t - hours(1), 7),
                (t, 15),
            ]
        );
    }

    #[tokio::test]
    async fn test_no_previous_creates_synthetic_floor() {
        let pool = test_pool().await;
        let ledger = VisitorLedger::new(pool.clone());
        let t = t0().timestamp_millis();

        let b = ledger.reconcile(t0(), 1).await.unwrap();
        assert_eq!(b.amount, 1);

        let mut expected: Vec<(i64, i64)> = (1..=6).rev().map(|h| (t - hours(h), 0)).collect();
        expected.push((t, 1));
        assert_eq!(all(&pool).await, expected);
    }

    #[tokio::test]
    async fn test_leave_at_zero_is_noop() {
        let pool = test_pool().await;
        let ledger = VisitorLedger::new(pool.clone());

        let b = ledger.current(t0()).await.unwrap();
        assert_eq!(b.amount, 0);
        let b = ledger.leave(t0()).await.unwrap();
        assert_eq!(b.amount, 0);
    }

    #[tokio::test]
    async fn test_existing_hour_skips_gap_fill() {
        let pool = test_pool().await;
        let ledger = VisitorLedger::new(pool.clone());
        let t = t0().timestamp_millis();
        seed(&pool, t, 3).await;

        let b = ledger.enter(t0()).await.unwrap();
        assert_eq!(b.amount, 4);
        assert_eq!(all(&pool).await, vec![(t, 4)]);
    }

    #[tokio::test]
    async fn test_delta_applies_only_to_target_hour() {
        let pool = test_pool().await;
        let ledger = VisitorLedger::new(pool.clone());
        let t = t0().timestamp_millis();
        seed(&pool, t - hours(3), 2).await;

        ledger.reconcile(t0(), 5).await.unwrap();
        let rows = all(&pool).await;
        assert_eq!(rows[1], (t - hours(2), 2));
        assert_eq!(rows[2], (t - hours(1), 2));
        assert_eq!(rows[3], (t, 7));
    }

    #[tokio::test]
    async fn test_statistics_window_boundaries() {
        let pool = test_pool().await;
        let ledger = VisitorLedger::new(pool.clone());
        let day = |h: u32| Utc.with_ymd_and_hms(2022, 2, 16, h, 0, 0).unwrap().timestamp_millis();

        seed(&pool, day(17), 1).await;
        seed(&pool, day(23), 6).await;
        seed(&pool, day(18), 2).await;
        seed(&pool, day(20), 4).await;
        seed(&pool, t0().timestamp_millis(), 9).await;

        let stat = ledger
            .statistics(t0(), Tz::UTC, ReportWindow::default())
            .await
            .unwrap();
        let got: Vec<(i64, i64)> = stat.iter().map(|b| (b.bucket_time, b.amount)).collect();
        assert_eq!(got, vec![(day(18), 2), (day(20), 4), (day(23), 6)]);
    }

    #[tokio::test]
    async fn test_history_newest_first() {
        let pool = test_pool().await;
        let ledger = VisitorLedger::new(pool.clone());
        ledger.enter(t0()).await.unwrap();

        let history = ledger.history().await.unwrap();
        assert_eq!(history.len(), 7);
        assert!(
            history
                .windows(2)
                .all(|w| w[0].bucket_time > w[1].bucket_time)
        );
        assert_eq!(history[0].amount, 1);
    }

    #[tokio::test]
    async fn test_lock_table_is_pruned() {
        let pool = test_pool().await;
        let ledger = VisitorLedger::new(pool.clone());

        ledger.enter(t0()).await.unwrap();
        ledger.enter(t0() + Duration::hours(10)).await.unwrap();
        assert_eq!(ledger.hour_locks.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_enters_are_not_lost() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("visitors.db");
        let db = DbService::new(path.to_str().unwrap()).await.unwrap();
        let ledger = VisitorLedger::new(db.pool.clone());

        let handles: Vec<_> = (0..40)
            .map(|i| {
                let ledger = ledger.clone();
                tokio::spawn(async move {
                    ledger
                        .enter(t0() + Duration::seconds(i))
                        .await
                        .unwrap()
                })
            })
            .collect();
        for h in handles {
            h.await.unwrap();
        }

        let b = ledger.current(t0()).await.unwrap();
        assert_eq!(b.amount, 40);
        // synthetic floor + 5 fillers + current, no duplicates
        assert_eq!(ledger.history().await.unwrap().len(), 7);
    }

    #[tokio::test]
    async fn test_locked_database_gives_up_and_rolls_back() {
        use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
        use sqlx::{Connection, SqliteConnection};
        use std::str::FromStr;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("locked.db");
        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))
            .unwrap()
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(std::time::Duration::ZERO);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options.clone())
            .await
            .unwrap();
        crate::db::migrate(&pool).await.unwrap();
        let ledger = VisitorLedger::new(pool.clone());

        // 另一个连接持有写锁
        let mut writer = SqliteConnection::connect_with(&options).await.unwrap();
        sqlx::query("BEGIN IMMEDIATE")
            .execute(&mut writer)
            .await
            .unwrap();

        let err = ledger.enter(t0()).await.unwrap_err();
        assert_eq!(err.code, shared::error::ErrorCode::LedgerConflict);
        assert_eq!(err.http_status(), http::StatusCode::INTERNAL_SERVER_ERROR);

        sqlx::query("ROLLBACK").execute(&mut writer).await.unwrap();
        // 没有半截的补桶
        assert!(ledger.history().await.unwrap().is_empty());

        ledger.enter(t0()).await.unwrap();
        assert_eq!(ledger.current(t0()).await.unwrap().amount, 1);
    }
}
