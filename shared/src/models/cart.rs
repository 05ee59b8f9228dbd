//! Cart Model

use serde::{Deserialize, Serialize};

/// Cart item entity
///
/// Ephemeral: a successful order creation deletes the referenced rows
/// atomically with the order it produces.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct CartItem {
    pub id: i64,
    pub user_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub created_at: i64,
    pub updated_at: i64,
}
