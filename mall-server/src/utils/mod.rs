//! Utilities - 日志与环境装配

pub mod logger;

pub use logger::{init_logger, init_logger_with_file};

/// 进程启动装配：加载 .env、初始化日志
pub fn setup_environment() -> anyhow::Result<()> {
    // .env 不存在不是错误（生产环境直接用环境变量）
    let _ = dotenv::dotenv();

    let level = std::env::var("LOG_LEVEL").ok();
    let log_dir = std::env::var("LOG_DIR").ok();
    init_logger_with_file(level.as_deref(), log_dir.as_deref());

    Ok(())
}
