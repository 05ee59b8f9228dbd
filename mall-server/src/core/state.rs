//! Server State - 服务器全局状态与启动装配

use sqlx::SqlitePool;

use crate::db;
use crate::orders::OrderService;

use super::Config;

/// 服务器状态：连接池与订单服务
#[derive(Clone, Debug)]
pub struct ServerState {
    pub config: Config,
    pool: SqlitePool,
    orders: OrderService,
}

impl ServerState {
    /// 初始化数据库（含迁移）并启动订单工作池
    pub async fn initialize(config: &Config) -> anyhow::Result<Self> {
        let pool = db::init_pool(&config.database_path).await?;
        tracing::info!(path = %config.database_path, "Database ready");

        let orders = OrderService::start(pool.clone(), config);

        Ok(Self {
            config: config.clone(),
            pool,
            orders,
        })
    }

    pub fn orders(&self) -> &OrderService {
        &self.orders
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
