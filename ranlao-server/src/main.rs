use ranlao_server::{Config, Server, ServerState, setup_environment};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. .env 与配置
    dotenv::dotenv().ok();
    let config = Config::from_env()?;

    // 2. 日志
    setup_environment(&config);
    tracing::info!(environment = %config.environment, "Ranlao server starting...");

    // 3. 初始化服务器状态 (数据库、迁移、初始账号)
    let state = ServerState::initialize(&config).await?;

    // 4. 启动 HTTP 服务器
    let server = Server::with_state(config, state);
    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
