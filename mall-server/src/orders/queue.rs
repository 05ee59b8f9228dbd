//! Order Queue & Worker Pool - 有界队列 + 固定工作池
//!
//! 队列解耦请求到达与处理，并为在途的订单变更设置上限：
//!
//! - `submit` 投递到有界 mpsc 队列，队列满时挂起提交方（背压，不丢任务）。
//! - 固定数量的 worker 循环取任务，按类型分发处理器，记录耗时，
//!   并将结果经 oneshot 通道恰好投递一次。
//! - 顺序保证仅限单个 worker 内 FIFO；跨订单的任务可能乱序完成。
//!   同一商品的库存操作由 [`super::stock`] 串行化，与池无关。
//!
//! # Supervision
//!
//! worker 在 `JoinSet` 下运行。处理器内部的 panic 只终结该 worker
//! 任务，监督循环会记录并补位重启，池容量不会永久缩水。

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinSet;

use crate::core::{OrderError, OrderResult};

use super::job::{JobOutcome, JobPayload, OrderJob};
use super::{JobContext, create, status};

type SharedReceiver = Arc<Mutex<mpsc::Receiver<OrderJob>>>;

/// 订单任务队列的提交端
#[derive(Clone)]
pub struct OrderQueue {
    tx: mpsc::Sender<OrderJob>,
}

impl OrderQueue {
    /// 启动队列与工作池
    pub fn start(ctx: Arc<JobContext>, worker_count: usize, capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity);
        let rx: SharedReceiver = Arc::new(Mutex::new(rx));

        tokio::spawn(supervise(ctx, rx, worker_count));
        tracing::info!(worker_count, capacity, "Order worker pool started");

        Self { tx }
    }

    /// 投递任务；队列满时等待（背压），队列关闭返回错误
    pub async fn submit(&self, job: OrderJob) -> OrderResult<()> {
        self.tx
            .send(job)
            .await
            .map_err(|_| OrderError::Internal("order queue closed".into()))
    }
}

/// 监督循环：启动 worker 并在 panic 后补位
async fn supervise(ctx: Arc<JobContext>, rx: SharedReceiver, worker_count: usize) {
    let mut workers = JoinSet::new();
    let mut next_id = 0usize;

    for _ in 0..worker_count {
        workers.spawn(worker_loop(next_id, ctx.clone(), rx.clone()));
        next_id += 1;
    }

    while let Some(exit) = workers.join_next().await {
        match exit {
            // 队列关闭，worker 正常退出
            Ok(worker_id) => {
                tracing::debug!(worker_id, "Order worker stopped");
            }
            Err(e) if e.is_panic() => {
                tracing::error!(error = %e, "Order worker panicked, respawning");
                workers.spawn(worker_loop(next_id, ctx.clone(), rx.clone()));
                next_id += 1;
            }
            Err(e) => {
                tracing::error!(error = %e, "Order worker aborted");
            }
        }
    }
    tracing::info!("Order worker pool stopped");
}

/// worker 主循环
async fn worker_loop(worker_id: usize, ctx: Arc<JobContext>, rx: SharedReceiver) -> usize {
    tracing::debug!(worker_id, "Order worker started");

    loop {
        // 锁只覆盖 recv：取到任务立即释放，让下一个 worker 等待队列
        let job = {
            let mut rx = rx.lock().await;
            rx.recv().await
        };
        let Some(job) = job else { break };

        let OrderJob {
            order_id,
            user_id,
            payload,
            respond_to,
            cancel,
        } = job;
        let kind = payload.kind();

        // 门面已放弃的任务在开始前丢弃（不打断已运行的处理器）
        if cancel.is_cancelled() {
            tracing::warn!(worker_id, kind, order_id, "Job cancelled before start, discarded");
            continue;
        }

        let start = Instant::now();
        let result = dispatch(&ctx, order_id, user_id, payload).await;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        match &result {
            Ok(_) => {
                tracing::info!(worker_id, kind, order_id, user_id, elapsed_ms, "Job completed");
            }
            Err(e) => {
                tracing::warn!(worker_id, kind, order_id, user_id, elapsed_ms, error = %e, "Job failed");
            }
        }

        // 恰好投递一次；接收端超时离场则结果静默丢弃
        if respond_to.send(result).is_err() {
            tracing::warn!(worker_id, kind, order_id, "Result discarded, caller gave up waiting");
        }
    }

    worker_id
}

/// 按任务类型分发处理器
async fn dispatch(
    ctx: &JobContext,
    order_id: Option<i64>,
    user_id: i64,
    payload: JobPayload,
) -> OrderResult<JobOutcome> {
    match payload {
        JobPayload::Create(req) => {
            let order = create::handle(ctx, user_id, req).await?;
            Ok(JobOutcome::Created(order))
        }
        JobPayload::UpdateStatus(new_status) => {
            let order_id = order_id
                .ok_or_else(|| OrderError::Validation("update job missing order id".into()))?;
            status::handle_update(ctx, order_id, new_status).await?;
            Ok(JobOutcome::Done)
        }
        JobPayload::Cancel => {
            let order_id = order_id
                .ok_or_else(|| OrderError::Validation("cancel job missing order id".into()))?;
            status::handle_cancel(ctx, order_id, user_id).await?;
            Ok(JobOutcome::Done)
        }
        #[cfg(test)]
        JobPayload::Fail => panic!("injected handler failure"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::orders::StockManager;
    use shared::OrderStatus;
    use tokio::sync::oneshot;
    use tokio_util::sync::CancellationToken;

    async fn test_ctx() -> (tempfile::TempDir, Arc<JobContext>) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("queue-test.db");
        let pool = db::init_pool(path.to_str().unwrap()).await.unwrap();
        let ctx = Arc::new(JobContext {
            pool: pool.clone(),
            stock: Arc::new(StockManager::new(pool)),
        });
        (dir, ctx)
    }

    fn make_job(
        payload: JobPayload,
        order_id: Option<i64>,
    ) -> (OrderJob, oneshot::Receiver<OrderResult<JobOutcome>>) {
        let (respond_to, rx) = oneshot::channel();
        let job = OrderJob {
            order_id,
            user_id: 1,
            payload,
            respond_to,
            cancel: CancellationToken::new(),
        };
        (job, rx)
    }

    #[tokio::test]
    async fn test_panicked_worker_respawned() {
        let (_dir, ctx) = test_ctx().await;
        let queue = OrderQueue::start(ctx, 1, 4);

        // 单 worker 池里打穿唯一的 worker
        let (job, rx) = make_job(JobPayload::Fail, None);
        queue.submit(job).await.unwrap();
        assert!(rx.await.is_err(), "panicked handler drops the result sender");

        // 监督循环补位后，后续任务仍被处理
        let (job, rx) = make_job(JobPayload::UpdateStatus(OrderStatus::Paid), Some(999));
        queue.submit(job).await.unwrap();
        assert!(matches!(rx.await.unwrap(), Err(OrderError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_cancelled_job_discarded_before_start() {
        let (_dir, ctx) = test_ctx().await;
        let queue = OrderQueue::start(ctx, 1, 4);

        let (job, rx) = make_job(JobPayload::Cancel, Some(1));
        job.cancel.cancel();
        queue.submit(job).await.unwrap();
        // worker 丢弃任务时发送端一并被丢弃
        assert!(rx.await.is_err());
    }
}
