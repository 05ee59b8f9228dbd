//! Product Model

use serde::{Deserialize, Serialize};

/// Product entity
///
/// `stock` is the persisted quantity; while the server is running the
/// authoritative value for admission decisions lives in the stock
/// manager's in-memory slot, and this column is a best-effort snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Product {
    pub id: i64,
    pub name: String,
    /// Unit price in currency unit
    pub price: f64,
    pub stock: i64,
    /// 1=on sale, 0=off shelf
    pub status: i32,
    /// Cumulative units sold, bumped inside the order transaction
    pub sales_count: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Product {
    /// Whether the product can currently be ordered
    pub fn is_on_sale(&self) -> bool {
        self.status == 1
    }
}
