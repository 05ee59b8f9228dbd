//! Order Job - 一次订单变更请求及其结果通道

use serde::{Deserialize, Serialize};
use shared::{Order, OrderStatus};
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use crate::core::OrderResult;

/// 创建订单请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub shipping_address: String,
    pub cart_item_ids: Vec<i64>,
}

/// 任务负载，按类型分发到对应处理器
#[derive(Debug)]
pub enum JobPayload {
    Create(CreateOrderRequest),
    UpdateStatus(OrderStatus),
    Cancel,
    /// 测试注入：处理器直接 panic，驱动工作池的监督重启路径
    #[cfg(test)]
    Fail,
}

impl JobPayload {
    /// 日志用任务类型名
    pub fn kind(&self) -> &'static str {
        match self {
            JobPayload::Create(_) => "create",
            JobPayload::UpdateStatus(_) => "update",
            JobPayload::Cancel => "cancel",
            #[cfg(test)]
            JobPayload::Fail => "fail",
        }
    }
}

/// 任务执行结果
#[derive(Debug)]
pub enum JobOutcome {
    /// 创建成功，返回落库后的完整订单
    Created(Order),
    /// 状态更新/取消成功
    Done,
}

/// 一次订单变更任务
///
/// 在门面构造，被且仅被一个 worker 消费一次，不持久化。
/// `respond_to` 恰好投递一次结果；`cancel` 在门面超时后触发，
/// worker 只在任务开始前检查它（不打断执行中的处理器）。
#[derive(Debug)]
pub struct OrderJob {
    /// 目标订单（创建任务为 None）
    pub order_id: Option<i64>,
    pub user_id: i64,
    pub payload: JobPayload,
    pub respond_to: oneshot::Sender<OrderResult<JobOutcome>>,
    pub cancel: CancellationToken,
}
