// 过滤器框架核心模块
pub mod config;
pub mod error;
pub mod filter_trait;
pub mod pipeline;
pub mod ranking;
pub mod registry;
pub mod result;

// 重新导出核心类型
pub use config::*;
pub use error::*;
pub use filter_trait::*;
pub use pipeline::*;
pub use ranking::*;
pub use registry::*;
pub use result::*;
