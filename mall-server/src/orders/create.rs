//! Order Creation Handler - 两阶段下单
//!
//! # 处理流程
//!
//! ```text
//! handle(ctx, user_id, req)
//!     ├─ 1. 并发执行（互不串行）：
//!     │      ├─ (a) 逐项校验归属并扣减库存（失败时回滚本任务已扣项）
//!     │      └─ (b) 独立重读购物车计算总额（普通读，容忍轻微陈旧）
//!     ├─ 2. 单个数据库事务：订单行 + 订单项 + 删购物车行 + 累加销量
//!     │      （订单号唯一冲突换号重试，上限 3 次）
//!     └─ 3. 事务失败 → 恢复第 1 步的全部扣减（补偿动作）
//! ```
//!
//! 库存准入（阶段 1）刻意不在持久化事务（阶段 2）内复验：仲裁热路径
//! 不碰锁表，代价是两阶段之间存在一个靠补偿动作覆盖的窄窗口。

use rust_decimal::Decimal;
use shared::util::order_no;
use shared::{CartItem, Order};

use crate::core::{OrderError, OrderResult};
use crate::db;
use crate::db::repository::{cart, order as order_repo, product};

use super::JobContext;
use super::job::CreateOrderRequest;
use super::money;

/// 订单号唯一冲突的换号重试上限
const ORDER_NO_MAX_ATTEMPTS: u32 = 3;

pub async fn handle(
    ctx: &JobContext,
    user_id: i64,
    req: CreateOrderRequest,
) -> OrderResult<Order> {
    // 阶段 1：库存仲裁与金额计算并发进行
    let (deducted, total) = tokio::join!(
        deduct_cart_items(ctx, user_id, &req.cart_item_ids),
        calculate_amount(ctx, user_id, &req.cart_item_ids),
    );

    let deducted = deducted?;
    let total = match total {
        Ok(total) => total,
        Err(e) => {
            // 金额计算失败也要归还已经拿到的准入
            rollback_deductions(ctx, &deducted).await;
            return Err(e);
        }
    };

    // 阶段 2：原子落库；失败则补偿恢复库存
    match persist_order(ctx, user_id, &req, money::to_f64(total)).await {
        Ok(order) => Ok(order),
        Err(e) => {
            rollback_deductions(ctx, &deducted).await;
            Err(e)
        }
    }
}

/// 逐项校验归属、在售状态并扣减库存。
///
/// 任何一项失败时，本任务中其他项已获得的扣减先经 `restore` 回滚，
/// 再返回错误（跨商品不是一次原子准入，而是补偿动作）。
async fn deduct_cart_items(
    ctx: &JobContext,
    user_id: i64,
    cart_item_ids: &[i64],
) -> OrderResult<Vec<(i64, i64)>> {
    let mut granted: Vec<(i64, i64)> = Vec::with_capacity(cart_item_ids.len());

    for &item_id in cart_item_ids {
        let result = deduct_one(ctx, user_id, item_id).await;
        match result {
            Ok(grant) => granted.push(grant),
            Err(e) => {
                rollback_deductions(ctx, &granted).await;
                return Err(e);
            }
        }
    }

    Ok(granted)
}

async fn deduct_one(ctx: &JobContext, user_id: i64, item_id: i64) -> OrderResult<(i64, i64)> {
    let item = require_cart_item(ctx, user_id, item_id).await?;

    let p = product::find_by_id(&ctx.pool, item.product_id)
        .await?
        .ok_or_else(|| OrderError::NotFound(format!("product {} not found", item.product_id)))?;
    if !p.is_on_sale() {
        return Err(OrderError::Validation(format!(
            "product {} is off shelf",
            p.id
        )));
    }

    ctx.stock.deduct(item.product_id, item.quantity).await?;
    Ok((item.product_id, item.quantity))
}

/// 独立计算订单总额（普通读，不持有任何槽位锁）
async fn calculate_amount(
    ctx: &JobContext,
    user_id: i64,
    cart_item_ids: &[i64],
) -> OrderResult<Decimal> {
    let mut total = Decimal::ZERO;

    for &item_id in cart_item_ids {
        let item = require_cart_item(ctx, user_id, item_id).await?;
        let p = product::find_by_id(&ctx.pool, item.product_id)
            .await?
            .ok_or_else(|| {
                OrderError::NotFound(format!("product {} not found", item.product_id))
            })?;
        total += money::line_total(p.price, item.quantity);
    }

    Ok(total)
}

/// 原子持久化：订单行、订单项（快照单价）、删除购物车行、累加销量。
///
/// 全部语句在同一事务内提交；订单号唯一冲突时整个事务换号重试。
async fn persist_order(
    ctx: &JobContext,
    user_id: i64,
    req: &CreateOrderRequest,
    total_amount: f64,
) -> OrderResult<Order> {
    let mut attempt = 0;
    loop {
        attempt += 1;
        let no = order_no();

        match try_persist(ctx, user_id, req, total_amount, &no).await {
            Ok(order_id) => {
                let order = order_repo::find_by_id(&ctx.pool, order_id)
                    .await?
                    .ok_or_else(|| {
                        OrderError::Internal(format!("order {order_id} vanished after commit"))
                    })?;
                return Ok(order);
            }
            Err(OrderError::Transaction(msg)) if msg.contains("UNIQUE") && attempt < ORDER_NO_MAX_ATTEMPTS => {
                tracing::warn!(order_no = %no, attempt, "Order number collision, regenerating");
            }
            Err(e) => return Err(e),
        }
    }
}

async fn try_persist(
    ctx: &JobContext,
    user_id: i64,
    req: &CreateOrderRequest,
    total_amount: f64,
    no: &str,
) -> OrderResult<i64> {
    let mut tx = ctx.pool.begin().await?;

    let order_id = order_repo::insert(&mut tx, user_id, no, total_amount, &req.shipping_address)
        .await
        .map_err(classify_insert_error)?;

    for &item_id in &req.cart_item_ids {
        let item = cart::find_by_id_for_user_tx(&mut tx, item_id, user_id)
            .await?
            .ok_or_else(|| OrderError::NotFound(format!("cart item {item_id} not found")))?;

        // 快照当前单价；后续改价不影响已生成订单
        let p = product::find_by_id(&ctx.pool, item.product_id)
            .await?
            .ok_or_else(|| {
                OrderError::NotFound(format!("product {} not found", item.product_id))
            })?;

        order_repo::insert_item(&mut tx, order_id, item.product_id, item.quantity, p.price)
            .await
            .map_err(OrderError::from)?;

        if !cart::delete(&mut tx, item_id).await? {
            return Err(OrderError::NotFound(format!(
                "cart item {item_id} already consumed"
            )));
        }

        product::increment_sales(&mut tx, item.product_id, item.quantity).await?;
    }

    tx.commit().await?;
    Ok(order_id)
}

fn classify_insert_error(err: sqlx::Error) -> OrderError {
    if db::is_unique_violation(&err) {
        // 保留 UNIQUE 标记供重试逻辑识别
        OrderError::Transaction(format!("UNIQUE violation: {err}"))
    } else {
        err.into()
    }
}

/// 补偿动作：归还本任务已获得的全部扣减
async fn rollback_deductions(ctx: &JobContext, granted: &[(i64, i64)]) {
    for &(product_id, quantity) in granted {
        if let Err(e) = ctx.stock.restore(product_id, quantity).await {
            tracing::error!(
                product_id,
                quantity,
                error = %e,
                "Failed to roll back stock deduction"
            );
        }
    }
}

async fn require_cart_item(
    ctx: &JobContext,
    user_id: i64,
    item_id: i64,
) -> OrderResult<CartItem> {
    cart::find_by_id_for_user(&ctx.pool, item_id, user_id)
        .await?
        .ok_or_else(|| OrderError::NotFound(format!("cart item {item_id} not found")))
}
