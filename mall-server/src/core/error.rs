//! 统一错误处理
//!
//! 订单引擎对外暴露的错误分类：
//!
//! | 分类 | 说明 |
//! |------|------|
//! | Validation | 调用方参数错误，无副作用 |
//! | NotFound | 购物车项/订单/商品不存在 |
//! | InsufficientStock | 库存仲裁拒绝（携带可用量与需求量） |
//! | InvalidTransition | 状态机拒绝的非法跳转 |
//! | Timeout | 门面放弃等待，任务可能仍在后台完成 |
//! | Transaction | 持久化事务失败，已整体回滚 |
//! | Internal | 意外的系统错误 |

use thiserror::Error;

use shared::OrderStatus;

/// 应用错误枚举
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Arbitration rejected the deduction; any partial deductions in
    /// the same job have already been rolled back when this surfaces.
    #[error("Insufficient stock for product {product_id}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: i64,
        available: i64,
        requested: i64,
    },

    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// The façade gave up waiting. The job is not aborted; its result
    /// is discarded and the caller must query order state to learn the
    /// true outcome.
    #[error("Timed out waiting for {0}")]
    Timeout(&'static str),

    #[error("Transaction error: {0}")]
    Transaction(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for OrderError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => OrderError::NotFound("row not found".into()),
            other => OrderError::Transaction(other.to_string()),
        }
    }
}

/// Result type for order engine operations
pub type OrderResult<T> = Result<T, OrderError>;
