//! 集成测试公共装配：临时 SQLite + 完整初始化的 ServerState

use std::future::Future;
use std::time::Duration;

use mall_server::db::repository::{cart, product};
use mall_server::{Config, ServerState};
use sqlx::SqlitePool;

pub struct TestEnv {
    // 测试结束自动清理数据库文件
    _dir: tempfile::TempDir,
    pub state: ServerState,
}

pub async fn setup(worker_count: usize) -> TestEnv {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = Config::with_overrides(dir.path().to_str().expect("utf8 path"), worker_count);
    let state = ServerState::initialize(&config).await.expect("initialize");
    TestEnv { _dir: dir, state }
}

pub async fn seed_product(pool: &SqlitePool, name: &str, price: f64, stock: i64) -> i64 {
    product::create(pool, name, price, stock)
        .await
        .expect("seed product")
        .id
}

pub async fn seed_cart_item(pool: &SqlitePool, user_id: i64, product_id: i64, quantity: i64) -> i64 {
    cart::create(pool, user_id, product_id, quantity)
        .await
        .expect("seed cart item")
}

pub async fn count_rows(pool: &SqlitePool, table: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(pool)
        .await
        .expect("count rows")
}

/// 轮询等待异步副作用（库存恢复、快照写回）收敛
pub async fn wait_until<F, Fut>(mut check: F, what: &str)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    for _ in 0..200 {
        if check().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("timed out waiting for {what}");
}
