use std::sync::Arc;

use chrono::{DateTime, Utc};
use shared::models::AccountCreate;
use sqlx::SqlitePool;

use crate::auth::JwtService;
use crate::core::{Config, Result};
use crate::db::DbService;
use crate::db::repository::account;
use crate::utils::AppError;
use crate::visitors::{Clock, SystemClock, VisitorLedger};

/// 服务器状态 - 持有所有服务的共享引用
///
/// | 字段 | 说明 |
/// |------|------|
/// | config | 配置项 (不可变) |
/// | pool | SQLite 连接池 |
/// | jwt_service | JWT 认证服务 |
/// | ledger | 访客账本 |
/// | clock | 时间源，handler 只从这里取 "now" |
#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub pool: SqlitePool,
    pub jwt_service: Arc<JwtService>,
    pub ledger: VisitorLedger,
    pub clock: Arc<dyn Clock>,
}

impl ServerState {
    /// 手动构造 (测试中可注入 `FixedClock`)
    pub fn new(config: Config, pool: SqlitePool, clock: Arc<dyn Clock>) -> Self {
        let jwt_service = Arc::new(JwtService::with_config(config.jwt.clone()));
        let ledger = VisitorLedger::new(pool.clone());
        Self {
            config,
            pool,
            jwt_service,
            ledger,
            clock,
        }
    }

    /// 初始化服务器状态
    ///
    /// 1. 创建工作目录
    /// 2. 打开数据库并执行迁移
    /// 3. 账号表为空时创建初始员工账号
    pub async fn initialize(config: &Config) -> Result<Self> {
        let db_path = config.database_path();
        if let Some(dir) = db_path.parent() {
            std::fs::create_dir_all(dir)?;
        }

        let db = DbService::new(&db_path.to_string_lossy()).await?;
        let state = Self::new(config.clone(), db.pool, Arc::new(SystemClock));
        state.bootstrap_admin().await?;

        tracing::info!(
            work_dir = %config.work_dir,
            timezone = %config.timezone,
            "Server state initialized"
        );
        Ok(state)
    }

    /// 账号表为空且设置了 `ADMIN_PASSWORD` 时创建员工账号
    pub async fn bootstrap_admin(&self) -> Result<()> {
        if account::count(&self.pool).await.map_err(AppError::from)? > 0 {
            return Ok(());
        }
        let Some(password) = self.config.admin_password.clone() else {
            tracing::warn!("No accounts exist and ADMIN_PASSWORD is not set");
            return Ok(());
        };

        let admin = account::create(
            &self.pool,
            AccountCreate {
                username: self.config.admin_username.clone(),
                password,
                is_staff: true,
                table_number: None,
            },
        )
        .await
        .map_err(AppError::from)?;
        tracing::info!(username = %admin.username, "Bootstrap staff account created");
        Ok(())
    }

    pub fn get_jwt_service(&self) -> Arc<JwtService> {
        self.jwt_service.clone()
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }
}
