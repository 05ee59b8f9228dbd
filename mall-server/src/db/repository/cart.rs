//! Cart Repository

use shared::CartItem;
use shared::util::now_millis;
use sqlx::{SqliteConnection, SqlitePool};

use super::RepoResult;

/// 按归属校验读取购物车项（不存在或不属于该用户都视为缺失）
pub async fn find_by_id_for_user(
    pool: &SqlitePool,
    id: i64,
    user_id: i64,
) -> RepoResult<Option<CartItem>> {
    let item = sqlx::query_as::<_, CartItem>(
        "SELECT id, user_id, product_id, quantity, created_at, updated_at \
         FROM cart_item WHERE id = ? AND user_id = ?",
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(item)
}

/// 事务内版本：订单落库时重读并消费购物车项
pub async fn find_by_id_for_user_tx(
    conn: &mut SqliteConnection,
    id: i64,
    user_id: i64,
) -> RepoResult<Option<CartItem>> {
    let item = sqlx::query_as::<_, CartItem>(
        "SELECT id, user_id, product_id, quantity, created_at, updated_at \
         FROM cart_item WHERE id = ? AND user_id = ?",
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(conn)
    .await?;
    Ok(item)
}

/// 删除购物车项（订单事务内调用，返回是否确有删除）
pub async fn delete(conn: &mut SqliteConnection, id: i64) -> RepoResult<bool> {
    let result = sqlx::query("DELETE FROM cart_item WHERE id = ?")
        .bind(id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn find_by_user(pool: &SqlitePool, user_id: i64) -> RepoResult<Vec<CartItem>> {
    let items = sqlx::query_as::<_, CartItem>(
        "SELECT id, user_id, product_id, quantity, created_at, updated_at \
         FROM cart_item WHERE user_id = ? ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(items)
}

/// 新建购物车项（测试与上游购物车服务使用）
pub async fn create(
    pool: &SqlitePool,
    user_id: i64,
    product_id: i64,
    quantity: i64,
) -> RepoResult<i64> {
    let now = now_millis();
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO cart_item (user_id, product_id, quantity, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?) RETURNING id",
    )
    .bind(user_id)
    .bind(product_id)
    .bind(quantity)
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await?;
    Ok(id)
}
