/// 服务器配置 - 订单引擎的所有配置项
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | /var/lib/mall | 工作目录 |
/// | DATABASE_PATH | {WORK_DIR}/mall.db | SQLite 数据库文件 |
/// | ORDER_WORKER_COUNT | 5 | 订单工作协程数量（最小 1） |
/// | ORDER_QUEUE_CAPACITY | 100 | 订单队列容量（最小 1） |
/// | ORDER_CREATE_TIMEOUT_MS | 30000 | 创建订单等待超时(毫秒) |
/// | ORDER_ACTION_TIMEOUT_MS | 10000 | 状态更新/取消等待超时(毫秒) |
/// | ENVIRONMENT | development | 运行环境 |
///
/// # 示例
///
/// ```ignore
/// WORK_DIR=/data/mall ORDER_WORKER_COUNT=8 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录，存储数据库、日志等文件
    pub work_dir: String,
    /// SQLite 数据库文件路径
    pub database_path: String,
    /// 固定工作池大小
    pub worker_count: usize,
    /// 有界队列容量，队列满时提交方阻塞（背压）
    pub queue_capacity: usize,
    /// 创建订单的结果等待期限 (毫秒)
    pub create_timeout_ms: u64,
    /// 状态更新/取消的结果等待期限 (毫秒)
    pub action_timeout_ms: u64,
    /// 运行环境: development | staging | production
    pub environment: String,
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置，使用默认值
    pub fn from_env() -> Self {
        let work_dir = std::env::var("WORK_DIR").unwrap_or_else(|_| "/var/lib/mall".into());
        let database_path = std::env::var("DATABASE_PATH")
            .unwrap_or_else(|_| format!("{}/mall.db", work_dir));

        Self {
            work_dir,
            database_path,
            // 0 个 worker 会让任务无人消费，0 容量的 mpsc 在启动时
            // 直接 panic，这里都收紧到最小 1
            worker_count: std::env::var("ORDER_WORKER_COUNT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5)
                .max(1),
            queue_capacity: std::env::var("ORDER_QUEUE_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(100)
                .max(1),
            create_timeout_ms: std::env::var("ORDER_CREATE_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30_000),
            action_timeout_ms: std::env::var("ORDER_ACTION_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10_000),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
        }
    }

    /// 使用自定义值覆盖部分配置
    ///
    /// 常用于测试场景
    pub fn with_overrides(work_dir: impl Into<String>, worker_count: usize) -> Self {
        let work_dir = work_dir.into();
        let mut config = Self::from_env();
        config.database_path = format!("{}/mall.db", work_dir);
        config.work_dir = work_dir;
        config.worker_count = worker_count.max(1);
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_keep_defaults() {
        let config = Config::with_overrides("/tmp/mall-test", 2);
        assert_eq!(config.work_dir, "/tmp/mall-test");
        assert_eq!(config.database_path, "/tmp/mall-test/mall.db");
        assert_eq!(config.worker_count, 2);
        assert_eq!(config.queue_capacity, 100);
        assert_eq!(config.create_timeout_ms, 30_000);
        assert_eq!(config.action_timeout_ms, 10_000);
    }

    #[test]
    fn test_zero_workers_clamped() {
        let config = Config::with_overrides("/tmp/mall-test", 0);
        assert_eq!(config.worker_count, 1);
    }
}
