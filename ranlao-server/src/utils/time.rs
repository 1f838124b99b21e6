//! 时间工具函数 - 业务时区转换
//!
//! 日期→时间戳转换在这里完成，repository 层只接收 `i64` Unix millis。

use chrono::NaiveDate;
use chrono_tz::Tz;

use super::{AppError, AppResult};

/// 解析 IANA 时区名 (如 `Europe/Madrid`)
pub fn parse_timezone(name: &str) -> AppResult<Tz> {
    name.parse::<Tz>()
        .map_err(|_| AppError::validation(format!("Invalid timezone: {}", name)))
}

/// 日期 + 时分秒 → Unix millis (业务时区)
///
/// DST gap fallback: 如果本地时间不存在 (夏令时跳跃)，fallback 到 UTC。
pub fn date_hms_to_millis(date: NaiveDate, hour: u32, min: u32, sec: u32, tz: Tz) -> AppResult<i64> {
    let naive = date.and_hms_opt(hour, min, sec).ok_or_else(|| {
        AppError::validation(format!("Invalid time {:02}:{:02}:{:02}", hour, min, sec))
    })?;
    Ok(naive
        .and_local_timezone(tz)
        .latest()
        .map(|dt| dt.timestamp_millis())
        .unwrap_or_else(|| naive.and_utc().timestamp_millis()))
}
