// 调度器模块
pub mod background_task;

// 重新导出
pub use background_task::*;
