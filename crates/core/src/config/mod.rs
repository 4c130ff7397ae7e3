//! 配置管理模块

pub mod app_config;
pub mod environment;

// 重新导出
pub use app_config::AppConfig;
pub use environment::*;
