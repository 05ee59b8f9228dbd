//! Order Status Transition Handler - 状态机与取消恢复
//!
//! 状态边由 [`OrderStatus::can_transition_to`] 强制执行，非法跳转返回
//! 类型化错误（不接受任意五态互跳）。
//!
//! 任何落到 `cancelled` 的变更都会异步恢复该订单全部订单项的库存。
//! 恢复是 fire-and-forget：与请求脱离，失败只对运维可见（日志），
//! 不重试也不回传给已经收到成功响应的调用方。

use shared::OrderStatus;

use crate::core::{OrderError, OrderResult};
use crate::db::repository::order as order_repo;

use super::JobContext;

/// 更新订单状态
///
/// 状态更新不校验订单归属（管理侧入口）；用户侧取消走
/// [`handle_cancel`]。
pub async fn handle_update(
    ctx: &JobContext,
    order_id: i64,
    new_status: OrderStatus,
) -> OrderResult<()> {
    // 读-判-写之间可能有并发任务改动同一订单（池不按订单串行），
    // 落盘用条件更新仲裁；输掉竞争就按最新状态重新评估。
    loop {
        let order = order_repo::find_by_id(&ctx.pool, order_id)
            .await?
            .ok_or_else(|| OrderError::NotFound(format!("order {order_id} not found")))?;

        if !order.status.can_transition_to(new_status) {
            return Err(OrderError::InvalidTransition {
                from: order.status,
                to: new_status,
            });
        }

        // 状态只沿有限的边前进，重试次数有上界
        if !order_repo::update_status_from(&ctx.pool, order_id, order.status, new_status).await? {
            continue;
        }

        tracing::info!(order_id, from = %order.status, to = %new_status, "Order status updated");

        // 恢复只在赢得这次跳转时触发一次
        if new_status == OrderStatus::Cancelled {
            spawn_restore(ctx, order_id);
        }

        return Ok(());
    }
}

/// 取消订单：校验归属与 `pending` 状态后落到 `cancelled`
pub async fn handle_cancel(ctx: &JobContext, order_id: i64, user_id: i64) -> OrderResult<()> {
    let order = order_repo::find_by_id_for_user(&ctx.pool, order_id, user_id)
        .await?
        .ok_or_else(|| OrderError::NotFound(format!("order {order_id} not found")))?;

    if order.status != OrderStatus::Pending {
        return Err(OrderError::InvalidTransition {
            from: order.status,
            to: OrderStatus::Cancelled,
        });
    }

    handle_update(ctx, order_id, OrderStatus::Cancelled).await
}

/// 与请求脱离地恢复订单库存（按商品与数量逐项 restore）
fn spawn_restore(ctx: &JobContext, order_id: i64) {
    let pool = ctx.pool.clone();
    let stock = ctx.stock.clone();

    tokio::spawn(async move {
        let items = match order_repo::find_items(&pool, order_id).await {
            Ok(items) => items,
            Err(e) => {
                tracing::error!(order_id, error = %e, "Failed to load items for stock restore");
                return;
            }
        };

        for item in items {
            if let Err(e) = stock.restore(item.product_id, item.quantity).await {
                tracing::error!(
                    order_id,
                    product_id = item.product_id,
                    quantity = item.quantity,
                    error = %e,
                    "Failed to restore stock for cancelled order"
                );
            }
        }
        tracing::info!(order_id, "Stock restored for cancelled order");
    });
}
