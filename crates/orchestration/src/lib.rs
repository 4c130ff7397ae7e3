//! # Quant Universe Orchestration
//!
//! 编排：后台任务生命周期、资金流水汇总、状态报告、筛选周期

pub mod jobs;
pub mod scheduler;

pub use jobs::*;
pub use scheduler::*;
