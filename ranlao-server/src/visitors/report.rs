//! 统计窗口 (前一营业日 18:00 - 23:00)

use chrono::{DateTime, Days, Utc};
use chrono_tz::Tz;

use crate::utils::time::date_hms_to_millis;
use crate::utils::{AppError, AppResult, ErrorCode};

/// 每日统计时段，`start_hour..=end_hour` (本地时区整点)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportWindow {
    pub start_hour: u32,
    pub end_hour: u32,
}

impl Default for ReportWindow {
    fn default() -> Self {
        Self {
            start_hour: 18,
            end_hour: 23,
        }
    }
}

impl ReportWindow {
    pub fn new(start_hour: u32, end_hour: u32) -> AppResult<Self> {
        if start_hour > end_hour || end_hour > 23 {
            return Err(AppError::with_message(
                ErrorCode::ReportWindowInvalid,
                format!("Invalid report window {start_hour}:00-{end_hour}:00"),
            ));
        }
        Ok(Self {
            start_hour,
            end_hour,
        })
    }
}

/// `now` 所在日期的前一天，在 `tz` 中换算出窗口的起止 (Unix millis，两端均包含)
pub fn window_bounds(now: DateTime<Utc>, tz: Tz, window: ReportWindow) -> AppResult<(i64, i64)> {
    let today = now.with_timezone(&tz).date_naive();
    let yesterday = today
        .checked_sub_days(Days::new(1))
        .ok_or_else(|| AppError::validation(format!("No previous day for {today}")))?;

    let start = date_hms_to_millis(yesterday, window.start_hour, 0, 0, tz)?;
    let end = date_hms_to_millis(yesterday, window.end_hour, 0, 0, tz)?;
    Ok((start, end))
}
