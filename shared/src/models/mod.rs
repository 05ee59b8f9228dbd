//! Domain Models
//!
//! 订单域实体：商品、购物车项、订单、订单项。
//! All timestamps are UTC milliseconds (see [`crate::util::now_millis`]).

pub mod cart;
pub mod order;
pub mod product;

pub use cart::CartItem;
pub use order::{Order, OrderItem, OrderStatus};
pub use product::Product;
