use mall_server::{Config, ServerState, setup_environment};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. 设置环境 (dotenv, 日志)
    setup_environment()?;

    tracing::info!("Mall order server starting...");

    // 2. 加载配置
    let config = Config::from_env();

    // 3. 初始化状态（数据库 + 订单工作池）
    let state = ServerState::initialize(&config).await?;
    tracing::info!(
        workers = state.config.worker_count,
        queue = state.config.queue_capacity,
        "Order service ready"
    );

    // 4. 常驻运行，等待终止信号
    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received, exiting");

    Ok(())
}
