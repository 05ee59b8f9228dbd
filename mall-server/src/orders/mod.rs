//! Orders Module - 并发订单处理核心
//!
//! # 处理流程
//!
//! ```text
//! OrderService::submit_*()
//!     ├─ 1. 参数校验（无副作用）
//!     ├─ 2. 构造 OrderJob（携带 oneshot 结果通道）
//!     ├─ 3. 投递到有界队列（队列满则阻塞提交方）
//!     ├─ 4. 某个 worker 取出任务并按类型分发
//!     │      ├─ Create: 库存仲裁 + 金额计算 → 订单事务
//!     │      └─ UpdateStatus/Cancel: 状态机校验 → 落库 → 取消时异步恢复库存
//!     └─ 5. 带超时等待 oneshot 结果
//! ```
//!
//! 同一商品的库存操作经由同一个 [`stock::StockSlot`] 严格串行，
//! 与任务来自哪个 worker 无关。

pub mod create;
pub mod job;
pub mod money;
pub mod queue;
pub mod service;
pub mod status;
pub mod stock;

pub use job::{CreateOrderRequest, JobOutcome, JobPayload, OrderJob};
pub use queue::OrderQueue;
pub use service::OrderService;
pub use stock::StockManager;

use std::sync::Arc;

use sqlx::SqlitePool;

/// 任务处理上下文：worker 分发处理器时共享的依赖
#[derive(Clone)]
pub struct JobContext {
    pub pool: SqlitePool,
    pub stock: Arc<StockManager>,
}
