//! 工具模块 - 通用工具函数和类型
//!
//! - [`AppError`] - 应用错误类型 (from shared::error)
//! - 日志、时区等工具

pub mod logger;
pub mod time;

pub use shared::error::{AppError, AppResult, ErrorCode};

