//! Order Service - 提交门面
//!
//! 对调用方同步、内部异步的三个入口：创建订单、更新状态、取消订单。
//! 每个入口构造一个 [`OrderJob`] 投递到队列，然后在类型对应的期限内
//! 阻塞等待 oneshot 结果。
//!
//! # Timeout semantics
//!
//! 超时只是门面不再等待：任务不会被中断，其副作用（库存变更、落库）
//! 照常发生，结果被静默丢弃。调用方收到 [`OrderError::Timeout`] 后
//! 需要事后查询订单状态来获知真实结局。门面会触发任务携带的取消令牌，
//! 尚未开始执行的任务会被 worker 直接丢弃。

use std::sync::Arc;
use std::time::Duration;

use shared::{Order, OrderStatus};
use sqlx::SqlitePool;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use crate::core::{Config, OrderError, OrderResult};
use crate::db::repository::order as order_repo;

use super::job::{CreateOrderRequest, JobOutcome, JobPayload, OrderJob};
use super::{JobContext, OrderQueue, StockManager};

/// 订单提交门面
///
/// Clone 代价低（内部共享），可安全跨任务使用。
#[derive(Clone)]
pub struct OrderService {
    ctx: Arc<JobContext>,
    queue: OrderQueue,
    create_timeout: Duration,
    action_timeout: Duration,
}

impl OrderService {
    /// 构建库存管理器、启动工作池
    pub fn start(pool: SqlitePool, config: &Config) -> Self {
        let ctx = Arc::new(JobContext {
            pool: pool.clone(),
            stock: Arc::new(StockManager::new(pool)),
        });
        let queue = OrderQueue::start(ctx.clone(), config.worker_count, config.queue_capacity);

        Self {
            ctx,
            queue,
            create_timeout: Duration::from_millis(config.create_timeout_ms),
            action_timeout: Duration::from_millis(config.action_timeout_ms),
        }
    }

    /// 创建订单（30 秒期限）
    pub async fn submit_create_order(
        &self,
        user_id: i64,
        shipping_address: impl Into<String>,
        cart_item_ids: Vec<i64>,
    ) -> OrderResult<Order> {
        let shipping_address = shipping_address.into();
        if shipping_address.trim().is_empty() {
            return Err(OrderError::Validation("shipping address is required".into()));
        }
        if cart_item_ids.is_empty() {
            return Err(OrderError::Validation("cart item ids are required".into()));
        }
        let mut seen = cart_item_ids.clone();
        seen.sort_unstable();
        seen.dedup();
        if seen.len() != cart_item_ids.len() {
            return Err(OrderError::Validation("duplicate cart item ids".into()));
        }

        let payload = JobPayload::Create(CreateOrderRequest {
            shipping_address,
            cart_item_ids,
        });
        match self.submit(None, user_id, payload, self.create_timeout).await? {
            JobOutcome::Created(order) => Ok(order),
            JobOutcome::Done => Err(OrderError::Internal("create job returned no order".into())),
        }
    }

    /// 更新订单状态（10 秒期限）
    pub async fn submit_status_update(
        &self,
        order_id: i64,
        user_id: i64,
        new_status: OrderStatus,
    ) -> OrderResult<()> {
        self.submit(
            Some(order_id),
            user_id,
            JobPayload::UpdateStatus(new_status),
            self.action_timeout,
        )
        .await
        .map(|_| ())
    }

    /// 取消订单（10 秒期限）
    pub async fn submit_cancel(&self, order_id: i64, user_id: i64) -> OrderResult<()> {
        self.submit(Some(order_id), user_id, JobPayload::Cancel, self.action_timeout)
            .await
            .map(|_| ())
    }

    /// 查询订单（含订单项）；供超时后的调用方确认真实结局
    pub async fn find_order(&self, order_id: i64, user_id: i64) -> OrderResult<Option<Order>> {
        Ok(order_repo::find_by_id_for_user(&self.ctx.pool, order_id, user_id).await?)
    }

    /// 用户订单列表，按创建时间倒序
    pub async fn find_orders(
        &self,
        user_id: i64,
        limit: i64,
        offset: i64,
    ) -> OrderResult<Vec<Order>> {
        Ok(order_repo::find_by_user(&self.ctx.pool, user_id, limit, offset).await?)
    }

    /// 库存管理器（诊断与测试用）
    pub fn stock(&self) -> &StockManager {
        &self.ctx.stock
    }

    async fn submit(
        &self,
        order_id: Option<i64>,
        user_id: i64,
        payload: JobPayload,
        deadline: Duration,
    ) -> OrderResult<JobOutcome> {
        let kind = payload.kind();
        let (respond_to, result_rx) = oneshot::channel();
        let cancel = CancellationToken::new();

        let job = OrderJob {
            order_id,
            user_id,
            payload,
            respond_to,
            cancel: cancel.clone(),
        };
        self.queue.submit(job).await?;

        match tokio::time::timeout(deadline, result_rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(OrderError::Internal("worker dropped result channel".into())),
            Err(_) => {
                // 任务继续在后台运行；未开始的会被 worker 丢弃
                cancel.cancel();
                tracing::warn!(kind, order_id, user_id, "Gave up waiting for job result");
                Err(OrderError::Timeout(match kind {
                    "create" => "order creation",
                    "update" => "order status update",
                    _ => "order cancellation",
                }))
            }
        }
    }
}

impl std::fmt::Debug for OrderService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderService").finish_non_exhaustive()
    }
}
