//! Core Module - 配置、错误、服务器状态

pub mod config;
pub mod error;
pub mod state;

pub use config::Config;
pub use error::{OrderError, OrderResult};
pub use state::ServerState;
