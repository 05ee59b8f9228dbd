//! Mall Server - 电商订单处理引擎
//!
//! # 架构概述
//!
//! 本模块是订单履约服务的主入口，提供以下核心功能：
//!
//! - **订单队列** (`orders::queue`): 有界任务队列 + 固定工作池
//! - **库存仲裁** (`orders::stock`): 按商品串行化的库存扣减/恢复
//! - **订单事务** (`orders::create`): 订单落库的原子事务
//! - **提交门面** (`orders::service`): 同步外观、异步内部、超时受限
//! - **数据库** (`db`): 嵌入式 SQLite 存储（sqlx）
//!
//! # 模块结构
//!
//! ```text
//! mall-server/src/
//! ├── core/          # 配置、状态、错误
//! ├── db/            # 数据库层（连接池、迁移、仓储）
//! ├── orders/        # 订单处理核心
//! └── utils/         # 日志等工具函数
//! ```
//!
//! # Concurrency model
//!
//! Callers submit jobs through [`OrderService`]; a bounded queue feeds
//! a fixed pool of workers. Per-product stock operations are strictly
//! serialized by [`StockManager`] regardless of which worker they run
//! on; everything else relies on the database's transaction discipline.

pub mod core;
pub mod db;
pub mod orders;
pub mod utils;

// Re-export 公共类型
pub use crate::core::{Config, OrderError, OrderResult, ServerState};
pub use orders::{CreateOrderRequest, OrderService, StockManager};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};
pub use utils::setup_environment;
