//! Order Repository

use shared::util::now_millis;
use shared::{Order, OrderItem, OrderStatus};
use sqlx::{SqliteConnection, SqlitePool};

use super::RepoResult;

const ORDER_COLUMNS: &str =
    "id, user_id, order_no, total_amount, status, shipping_address, created_at, updated_at";

/// 插入订单行（订单事务内调用），返回新订单 ID。
///
/// `order_no` 上有 UNIQUE 索引；碰撞由调用方捕获并换号重试。
pub async fn insert(
    conn: &mut SqliteConnection,
    user_id: i64,
    order_no: &str,
    total_amount: f64,
    shipping_address: &str,
) -> Result<i64, sqlx::Error> {
    let now = now_millis();
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO orders (user_id, order_no, total_amount, status, shipping_address, created_at, updated_at) \
         VALUES (?, ?, ?, 'pending', ?, ?, ?) RETURNING id",
    )
    .bind(user_id)
    .bind(order_no)
    .bind(total_amount)
    .bind(shipping_address)
    .bind(now)
    .bind(now)
    .fetch_one(conn)
    .await?;
    Ok(id)
}

/// 插入订单项，快照下单时的数量与单价（订单事务内调用）
pub async fn insert_item(
    conn: &mut SqliteConnection,
    order_id: i64,
    product_id: i64,
    quantity: i64,
    price: f64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO order_item (order_id, product_id, quantity, price, created_at) \
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(order_id)
    .bind(product_id)
    .bind(quantity)
    .bind(price)
    .bind(now_millis())
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Order>> {
    let order = sqlx::query_as::<_, Order>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    attach_items(pool, order).await
}

pub async fn find_by_id_for_user(
    pool: &SqlitePool,
    id: i64,
    user_id: i64,
) -> RepoResult<Option<Order>> {
    let order = sqlx::query_as::<_, Order>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE id = ? AND user_id = ?"
    ))
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    attach_items(pool, order).await
}

/// 用户订单列表，按创建时间倒序分页
pub async fn find_by_user(
    pool: &SqlitePool,
    user_id: i64,
    limit: i64,
    offset: i64,
) -> RepoResult<Vec<Order>> {
    let mut orders = sqlx::query_as::<_, Order>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = ? \
         ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?"
    ))
    .bind(user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    for order in &mut orders {
        order.items = find_items(pool, order.id).await?;
    }
    Ok(orders)
}

pub async fn find_items(pool: &SqlitePool, order_id: i64) -> RepoResult<Vec<OrderItem>> {
    let items = sqlx::query_as::<_, OrderItem>(
        "SELECT id, order_id, product_id, quantity, price, created_at \
         FROM order_item WHERE order_id = ? ORDER BY id",
    )
    .bind(order_id)
    .fetch_all(pool)
    .await?;
    Ok(items)
}

/// 条件状态更新：仅当当前状态仍为 `from` 时落盘。
///
/// 返回是否真的更新了行。并发任务抢同一订单时，条件子句让数据库
/// 做最终仲裁，输家拿到 `false` 而不是覆盖赢家的状态。
pub async fn update_status_from(
    pool: &SqlitePool,
    id: i64,
    from: OrderStatus,
    to: OrderStatus,
) -> RepoResult<bool> {
    let result = sqlx::query(
        "UPDATE orders SET status = ?, updated_at = ? WHERE id = ? AND status = ?",
    )
    .bind(to.as_str())
    .bind(now_millis())
    .bind(id)
    .bind(from.as_str())
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

async fn attach_items(pool: &SqlitePool, order: Option<Order>) -> RepoResult<Option<Order>> {
    match order {
        Some(mut order) => {
            order.items = find_items(pool, order.id).await?;
            Ok(Some(order))
        }
        None => Ok(None),
    }
}
