//! # Quant Universe Filters
//!
//! 交易对筛选：过滤器框架、具体过滤器实现、流水线编排

pub mod framework;
pub mod implementations;

// 重新导出核心类型
pub use framework::*;
pub use implementations::*;
