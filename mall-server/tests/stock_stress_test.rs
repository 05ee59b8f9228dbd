//! 库存压力测试 - 并发下单不超卖
//!
//! 交叉并发提交创建订单任务，验证库存仲裁在任意交织下的不变量：
//! 不超卖、不出现负库存、订单号全局唯一、失败任务零残留。

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use common::{count_rows, seed_cart_item, seed_product, setup, wait_until};
use mall_server::core::OrderError;

#[tokio::test]
async fn test_two_buyers_one_unit_short() {
    // Scenario A: 库存 5，两个并发订单各要 3，恰好一成一败
    let env = setup(2).await;
    let pool = env.state.pool();
    let orders = env.state.orders();

    let px = seed_product(pool, "x", 50.0, 5).await;
    let c1 = seed_cart_item(pool, 1, px, 3).await;
    let c2 = seed_cart_item(pool, 2, px, 3).await;

    let (r1, r2) = tokio::join!(
        orders.submit_create_order(1, "addr-1", vec![c1]),
        orders.submit_create_order(2, "addr-2", vec![c2]),
    );

    let (ok, failed) = match (&r1, &r2) {
        (Ok(_), Err(e)) => (r1.as_ref().unwrap(), e),
        (Err(e), Ok(_)) => (r2.as_ref().unwrap(), e),
        other => panic!("expected exactly one success, got {other:?}"),
    };

    assert_eq!(ok.items.len(), 1);
    // 后到者看到的是先行扣减后的余量
    assert!(matches!(
        failed,
        OrderError::InsufficientStock {
            available: 2,
            requested: 3,
            ..
        }
    ));

    assert_eq!(orders.stock().available(px).await.unwrap(), 2);
    assert_eq!(count_rows(pool, "orders").await, 1);
    assert_eq!(count_rows(pool, "cart_item").await, 1);
}

#[tokio::test]
async fn test_fifty_concurrent_single_unit_deductions() {
    // Scenario D: 50 个并发单件订单清空 50 件库存，无负中间值
    let env = setup(5).await;
    let pool = env.state.pool();
    let orders = Arc::new(env.state.orders().clone());

    let px = seed_product(pool, "x", 9.9, 50).await;
    let mut cart_ids = Vec::new();
    for user in 1..=50i64 {
        cart_ids.push((user, seed_cart_item(pool, user, px, 1).await));
    }

    let mut handles = Vec::new();
    for (user, cart_id) in cart_ids {
        let orders = orders.clone();
        handles.push(tokio::spawn(async move {
            orders
                .submit_create_order(user, format!("addr-{user}"), vec![cart_id])
                .await
        }));
    }

    let mut order_nos = Vec::new();
    for h in handles {
        let order = h.await.unwrap().expect("all 50 orders must succeed");
        order_nos.push(order.order_no);
    }

    // 清零且从未为负（为负的扣减会被拒绝导致失败订单）
    assert_eq!(orders.stock().available(px).await.unwrap(), 0);
    assert_eq!(count_rows(pool, "orders").await, 50);

    // P5: 订单号两两互异
    order_nos.sort();
    order_nos.dedup();
    assert_eq!(order_nos.len(), 50);

    // 异步快照最终与权威值一致
    wait_until(
        || async {
            sqlx::query_scalar::<_, i64>("SELECT stock FROM product WHERE id = ?")
                .bind(px)
                .fetch_one(pool)
                .await
                .unwrap()
                == 0
        },
        "stock snapshot convergence",
    )
    .await;
}

#[tokio::test]
async fn test_oversubscribed_demand_never_oversells() {
    // P1: 需求两倍于库存，成交数恰好等于库存
    let env = setup(5).await;
    let pool = env.state.pool();
    let orders = Arc::new(env.state.orders().clone());

    let px = seed_product(pool, "x", 5.0, 20).await;
    let succeeded = Arc::new(AtomicUsize::new(0));
    let rejected = Arc::new(AtomicUsize::new(0));

    let mut handles = Vec::new();
    for user in 1..=40i64 {
        let cart_id = seed_cart_item(pool, user, px, 1).await;
        let orders = orders.clone();
        let succeeded = succeeded.clone();
        let rejected = rejected.clone();
        handles.push(tokio::spawn(async move {
            match orders.submit_create_order(user, "addr", vec![cart_id]).await {
                Ok(_) => succeeded.fetch_add(1, Ordering::SeqCst),
                Err(OrderError::InsufficientStock { .. }) => {
                    rejected.fetch_add(1, Ordering::SeqCst)
                }
                Err(e) => panic!("unexpected error: {e}"),
            }
        }));
    }
    for h in handles {
        h.await.unwrap();
    }

    assert_eq!(succeeded.load(Ordering::SeqCst), 20);
    assert_eq!(rejected.load(Ordering::SeqCst), 20);
    assert_eq!(orders.stock().available(px).await.unwrap(), 0);
    assert_eq!(count_rows(pool, "orders").await, 20);
    assert_eq!(count_rows(pool, "order_item").await, 20);
    // 被拒任务的购物车行原样保留
    assert_eq!(count_rows(pool, "cart_item").await, 20);
}

#[tokio::test]
async fn test_racing_claims_on_same_cart_item() {
    // P2: 两个任务抢同一购物车项，输家的事务整体回滚且补偿扣减
    let env = setup(2).await;
    let pool = env.state.pool();
    let orders = env.state.orders();

    let px = seed_product(pool, "x", 10.0, 10).await;
    let shared_cart = seed_cart_item(pool, 1, px, 2).await;

    let (r1, r2) = tokio::join!(
        orders.submit_create_order(1, "addr", vec![shared_cart]),
        orders.submit_create_order(1, "addr", vec![shared_cart]),
    );

    let wins = [r1.is_ok(), r2.is_ok()].iter().filter(|b| **b).count();
    assert_eq!(wins, 1, "exactly one claim may consume the cart item");

    // 恰好一单一项；输家没有留下任何行
    assert_eq!(count_rows(pool, "orders").await, 1);
    assert_eq!(count_rows(pool, "order_item").await, 1);
    assert_eq!(count_rows(pool, "cart_item").await, 0);

    // 输家的扣减被补偿，最终只消耗 2 件
    wait_until(
        || async { orders.stock().available(px).await.unwrap() == 8 },
        "loser deduction compensation",
    )
    .await;
}
