//! Ranlao Server - 酒馆桌台呼叫与客流统计服务
//!
//! # 模块结构
//!
//! ```text
//! ranlao-server/src/
//! ├── core/          # 配置、状态、服务器
//! ├── auth/          # JWT / Basic 认证
//! ├── api/           # HTTP 路由和处理器
//! ├── visitors/      # 小时客流账本 (补齐、统计窗口)
//! ├── db/            # SQLite 连接池与 repository
//! └── utils/         # 日志、时区工具
//! ```

pub mod api;
pub mod auth;
pub mod core;
pub mod db;
pub mod utils;
pub mod visitors;

// Re-export 公共类型
pub use crate::auth::{CurrentUser, JwtService};
pub use crate::core::{Config, Server, ServerState};
pub use crate::utils::{AppError, AppResult, ErrorCode};
pub use crate::visitors::{Clock, FixedClock, SystemClock, VisitorLedger};

// Security logging macro - 支持 tracing 格式说明符
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}

/// 初始化日志
pub fn setup_environment(config: &Config) {
    utils::logger::init_logger(&config.log_level, config.log_dir.as_deref());
}
