//! 工具函数模块

pub mod time;

// 重新导出常用函数
pub use time::*;
