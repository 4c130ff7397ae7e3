//! 波动性指标

pub mod atr;

// 重新导出
pub use atr::{atr_percent, AtrError, ATR};
