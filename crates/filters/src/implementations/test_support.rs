//! 单元测试公共构造

use std::sync::Arc;

use quant_universe_core::market::SnapshotMarketData;
use quant_universe_domain::{Candle, FixedClock, SymbolInformation};

use crate::framework::FilterContext;

pub const NOW: i64 = 1_700_000_000_000;

pub fn syms(symbols: &[&str]) -> Vec<String> {
    symbols.iter().map(|s| s.to_string()).collect()
}

pub fn info(symbol: &str, onboard_date: i64) -> SymbolInformation {
    SymbolInformation {
        symbol: symbol.to_string(),
        onboard_date,
        minimum_quantity: 0.001,
        minimum_notional: 5.0,
    }
}

/// 以 `start_date` 开始、持续 `duration` 毫秒的K线
pub fn candle(start_date: i64, duration: i64, open: f64, high: f64, low: f64, close: f64) -> Candle {
    Candle {
        start_date,
        close_date: start_date + duration - 1,
        open,
        high,
        low,
        close,
        volume: 1.0,
        quote_volume: close,
    }
}

/// 连续的K线，最后一根在 `NOW` 收盘
pub fn candles_ending_now(duration: i64, bars: &[(f64, f64, f64, f64)]) -> Vec<Candle> {
    let first_start = NOW - duration * bars.len() as i64 + 1;
    bars.iter()
        .enumerate()
        .map(|(i, (o, h, l, c))| candle(first_start + i as i64 * duration, duration, *o, *h, *l, *c))
        .collect()
}

/// 所有交易对都注册进交易所状态
pub fn snapshot_with_symbols(symbols: &[&str]) -> SnapshotMarketData {
    symbols
        .iter()
        .fold(SnapshotMarketData::new(), |data, s| data.with_symbol(info(s, 0)))
}

pub fn context(data: SnapshotMarketData) -> FilterContext {
    let data = Arc::new(data);
    FilterContext::new(data.clone(), data).with_clock(Arc::new(FixedClock::new(NOW)))
}
