//! Database Layer - 嵌入式 SQLite 存储
//!
//! 连接池初始化与表结构迁移。迁移与原系统一致，启动时幂等执行
//! `CREATE TABLE IF NOT EXISTS`。
//!
//! # Durability
//!
//! WAL journal mode plus a busy timeout so concurrent workers queue on
//! the single writer instead of failing with `SQLITE_BUSY`.

pub mod repository;

use std::path::Path;
use std::time::Duration;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};

/// 数据库连接池大小
const MAX_CONNECTIONS: u32 = 10;
/// 写锁争用等待上限
const BUSY_TIMEOUT_SECS: u64 = 5;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS product (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        name        TEXT    NOT NULL,
        price       REAL    NOT NULL,
        stock       INTEGER NOT NULL DEFAULT 0,
        status      INTEGER NOT NULL DEFAULT 1,
        sales_count INTEGER NOT NULL DEFAULT 0,
        created_at  INTEGER NOT NULL,
        updated_at  INTEGER NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS cart_item (
        id         INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id    INTEGER NOT NULL,
        product_id INTEGER NOT NULL,
        quantity   INTEGER NOT NULL,
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_cart_item_user ON cart_item(user_id)",
    r#"
    CREATE TABLE IF NOT EXISTS orders (
        id               INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id          INTEGER NOT NULL,
        order_no         TEXT    NOT NULL UNIQUE,
        total_amount     REAL    NOT NULL,
        status           TEXT    NOT NULL DEFAULT 'pending',
        shipping_address TEXT    NOT NULL,
        created_at       INTEGER NOT NULL,
        updated_at       INTEGER NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_orders_user ON orders(user_id, created_at DESC)",
    r#"
    CREATE TABLE IF NOT EXISTS order_item (
        id         INTEGER PRIMARY KEY AUTOINCREMENT,
        order_id   INTEGER NOT NULL,
        product_id INTEGER NOT NULL,
        quantity   INTEGER NOT NULL,
        price      REAL    NOT NULL,
        created_at INTEGER NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_order_item_order ON order_item(order_id)",
];

/// 初始化连接池并执行迁移
pub async fn init_pool(database_path: &str) -> Result<SqlitePool, sqlx::Error> {
    if let Some(parent) = Path::new(database_path).parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(sqlx::Error::Io)?;
    }

    let options = SqliteConnectOptions::new()
        .filename(database_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(BUSY_TIMEOUT_SECS))
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .connect_with(options)
        .await?;

    migrate(&pool).await?;
    Ok(pool)
}

/// 幂等建表
pub async fn migrate(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    for ddl in SCHEMA {
        sqlx::query(ddl).execute(pool).await?;
    }
    tracing::debug!(statements = SCHEMA.len(), "Database schema migrated");
    Ok(())
}

/// 判断是否为唯一索引冲突（订单号碰撞重试用）
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.is_unique_violation(),
        _ => false,
    }
}
