//! 时间工具 - 小时桶计算
//!
//! 所有时间戳均为 UTC Unix millis。

/// 一小时的毫秒数
pub const HOUR_MILLIS: i64 = 3_600_000;

/// 获取当前 UTC 时间戳（毫秒）
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// 截断到整点 (分、秒、毫秒归零)
///
/// 负时间戳同样向下取整，保证 `truncate_to_hour(t) <= t`。
pub fn truncate_to_hour(millis: i64) -> i64 {
    millis.div_euclid(HOUR_MILLIS) * HOUR_MILLIS
}

/// 自 epoch 起的小时序号
pub fn hour_index(millis: i64) -> i64 {
    millis.div_euclid(HOUR_MILLIS)
}

/// Unix millis → `DateTime<Utc>`，超出范围时回落到 epoch
pub fn millis_to_datetime(millis: i64) -> chrono::DateTime<chrono::Utc> {
    chrono::DateTime::from_timestamp_millis(millis).unwrap_or_default()
}
