//! 趋势指标

pub mod ema_indicator;

pub use ema_indicator::{ema_series, EmaError};
