//! 访客人数账本
//!
//! - [`clock`] - 可注入的时间源
//! - [`ledger`] - 按小时分桶的计数 + 缺口回填 (gap-fill)
//! - [`report`] - 前一日固定时段的统计窗口

pub mod clock;
pub mod ledger;
pub mod report;

pub use clock::{Clock, FixedClock, SystemClock};
pub use ledger::{LOOKBACK_HOURS, MAX_RECONCILE_ATTEMPTS, VisitorLedger};
pub use report::{ReportWindow, window_bounds};
