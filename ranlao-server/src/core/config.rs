use std::path::PathBuf;

use chrono_tz::Tz;

use crate::auth::JwtConfig;
use crate::core::{Result, ServerError};
use crate::utils::time::parse_timezone;
use crate::visitors::ReportWindow;

/// 服务器配置
///
/// # 环境变量
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | ./data | 工作目录 (数据库、日志) |
/// | HTTP_PORT | 8000 | HTTP 服务端口 |
/// | ENVIRONMENT | development | 运行环境 |
/// | TIMEZONE | UTC | 业务时区 (IANA) |
/// | STAT_START_HOUR | 18 | 统计窗口起始小时 |
/// | STAT_END_HOUR | 23 | 统计窗口结束小时 (含) |
/// | ADMIN_USERNAME | admin | 初始员工账号 |
/// | ADMIN_PASSWORD | - | 初始员工密码，未设置则不创建 |
/// | LOG_LEVEL | info | 日志级别 (RUST_LOG 优先) |
/// | LOG_DIR | - | 日志文件目录 |
/// | REQUEST_TIMEOUT_MS | 30000 | 请求超时(毫秒) |
///
/// JWT 相关见 [`JwtConfig::from_env`]。
#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录
    pub work_dir: String,
    pub http_port: u16,
    /// 运行环境: development | staging | production
    pub environment: String,
    /// 业务时区，决定 "前一天" 的边界
    pub timezone: Tz,
    pub report_window: ReportWindow,
    pub admin_username: String,
    pub admin_password: Option<String>,
    pub log_level: String,
    pub log_dir: Option<String>,
    /// 请求超时时间 (毫秒)
    pub request_timeout_ms: u64,
    pub jwt: JwtConfig,
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 未设置的项使用默认值；格式错误的时区或统计窗口直接报错。
    pub fn from_env() -> Result<Self> {
        let timezone = parse_timezone(&env_or("TIMEZONE", "UTC"))?;
        let report_window = ReportWindow::new(
            env_parse("STAT_START_HOUR", 18),
            env_parse("STAT_END_HOUR", 23),
        )?;
        let jwt = JwtConfig::from_env().map_err(|e| ServerError::Config(e.to_string()))?;

        Ok(Self {
            work_dir: env_or("WORK_DIR", "./data"),
            http_port: env_parse("HTTP_PORT", 8000),
            environment: env_or("ENVIRONMENT", "development"),
            timezone,
            report_window,
            admin_username: env_or("ADMIN_USERNAME", "admin"),
            admin_password: std::env::var("ADMIN_PASSWORD").ok().filter(|p| !p.is_empty()),
            log_level: env_or("LOG_LEVEL", "info"),
            log_dir: std::env::var("LOG_DIR").ok(),
            request_timeout_ms: env_parse("REQUEST_TIMEOUT_MS", 30000),
            jwt,
        })
    }

    /// SQLite 数据库文件路径
    pub fn database_path(&self) -> PathBuf {
        PathBuf::from(&self.work_dir)
            .join("database")
            .join("ranlao.db")
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
