//! Product Repository

use shared::Product;
use shared::util::now_millis;
use sqlx::{SqliteConnection, SqlitePool};

use super::RepoResult;

const PRODUCT_COLUMNS: &str =
    "id, name, price, stock, status, sales_count, created_at, updated_at";

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Product>> {
    let product = sqlx::query_as::<_, Product>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM product WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(product)
}

/// 读取商品当前持久化库存（库存槽位首次初始化时调用一次）
pub async fn read_stock(pool: &SqlitePool, id: i64) -> RepoResult<Option<i64>> {
    let stock = sqlx::query_scalar::<_, i64>("SELECT stock FROM product WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(stock)
}

/// 将库存槽位的新值写回数据库（异步快照，不参与准入判断）
pub async fn write_stock(pool: &SqlitePool, id: i64, stock: i64) -> RepoResult<()> {
    sqlx::query("UPDATE product SET stock = ?, updated_at = ? WHERE id = ?")
        .bind(stock)
        .bind(now_millis())
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// 累加商品销量（订单事务内调用）
pub async fn increment_sales(
    conn: &mut SqliteConnection,
    id: i64,
    quantity: i64,
) -> RepoResult<()> {
    sqlx::query("UPDATE product SET sales_count = sales_count + ?, updated_at = ? WHERE id = ?")
        .bind(quantity)
        .bind(now_millis())
        .bind(id)
        .execute(conn)
        .await?;
    Ok(())
}

/// 新建商品（测试与后台导入使用）
pub async fn create(
    pool: &SqlitePool,
    name: &str,
    price: f64,
    stock: i64,
) -> RepoResult<Product> {
    let now = now_millis();
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO product (name, price, stock, status, sales_count, created_at, updated_at) \
         VALUES (?, ?, ?, 1, 0, ?, ?) RETURNING id",
    )
    .bind(name)
    .bind(price)
    .bind(stock)
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await?;

    find_by_id(pool, id).await?.ok_or_else(|| {
        super::RepoError::NotFound(format!("product {id} vanished after insert"))
    })
}
