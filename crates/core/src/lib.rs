//! # Quant Universe Core
//!
//! 核心基础设施：配置、错误类型、日志、旁路存储（Redis / 内存）、行情快照

pub mod cache;
pub mod config;
pub mod error;
pub mod logger;
pub mod market;
