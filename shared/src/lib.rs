//! Shared types for the Mall order platform
//!
//! Domain models and utility helpers used by the order-processing
//! server. Database derives (`sqlx::FromRow`) are feature-gated behind
//! `db` so non-database consumers stay lightweight.

pub mod models;
pub mod util;

// Re-exports
pub use models::{CartItem, Order, OrderItem, OrderStatus, Product};
pub use serde::{Deserialize, Serialize};
