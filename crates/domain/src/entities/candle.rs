//! K线实体

use serde::{Deserialize, Serialize};

/// K线实体
///
/// 一根完整的 OHLCV 数据，返回后不可变；序列按时间从旧到新排列
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// K线开始时间戳 (毫秒)
    pub start_date: i64,

    /// K线结束时间戳 (毫秒)
    pub close_date: i64,

    /// 开盘价
    pub open: f64,

    /// 最高价
    pub high: f64,

    /// 最低价
    pub low: f64,

    /// 收盘价
    pub close: f64,

    /// 成交量（基础币）
    pub volume: f64,

    /// 成交额（计价币）
    #[serde(default)]
    pub quote_volume: f64,
}

impl Candle {
    /// 判断是否为阳线
    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    /// 判断是否为阴线
    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }

    /// 获取总范围 (高-低)
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    /// 真实波幅，`prev_close` 为上一根K线的收盘价
    pub fn true_range(&self, prev_close: Option<f64>) -> f64 {
        match prev_close {
            None => self.range(),
            Some(prev_close) => self
                .range()
                .max((self.high - prev_close).abs())
                .max((self.low - prev_close).abs()),
        }
    }
}
