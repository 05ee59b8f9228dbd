//! Repository Module
//!
//! 面向 SQLite 表的数据访问操作。仓储函数是直接作用于
//! `&SqlitePool` / `&mut SqliteConnection` 的自由函数；事务内的多条
//! 语句由调用方持有的 `Transaction` 统一提交或回滚。

pub mod cart;
pub mod order;
pub mod product;

use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

impl From<RepoError> for crate::core::OrderError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(msg) => crate::core::OrderError::NotFound(msg),
            RepoError::Database(e) => e.into(),
        }
    }
}
