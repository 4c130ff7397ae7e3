//! # Quant Universe Common
//!
//! 公共工具函数：时间周期解析、毫秒时间戳换算

pub mod utils;

// 重新导出常用函数
pub use utils::*;
