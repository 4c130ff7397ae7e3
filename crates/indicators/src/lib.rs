//! # Quant Universe Indicators
//!
//! 技术指标库：趋势（EMA）、波动性（ATR）、统计量

pub mod statistics;
pub mod trend;
pub mod volatility;

// 重新导出所有子模块的类型
pub use statistics::*;
pub use trend::*;
pub use volatility::*;
