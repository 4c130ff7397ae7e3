//! 三K线反转形态
//!
//! 取最近三根K线 (first, middle, last)：
//! - 做多看摆动低点，止损设在 middle.low
//! - 做空看摆动高点，止损设在 middle.high
//!
//! K线数量不足或最新K线收盘时间落后超过一个周期时视为过期，跳过

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use quant_universe_common::parse_timeframe_to_millis;
use quant_universe_domain::{Candle, PositionSide};

use crate::framework::{
    metadata, parse_filter_config, Filter, FilterConfigError, FilterContext, FilterError,
    FilterFactory, FilterResult,
};

const MIN_CANDLES: usize = 4;

fn default_number_candles() -> usize {
    MIN_CANDLES
}

fn default_position_sides() -> Vec<PositionSide> {
    vec![PositionSide::Long, PositionSide::Short]
}

/// 摆动低点：末根收盘站上前两根最高价，中间一根创新低，首根为阴线
pub fn is_swing_low(first: &Candle, middle: &Candle, last: &Candle) -> bool {
    last.close > first.high
        && last.close > middle.high
        && middle.low < first.low
        && middle.low < last.low
        && first.is_bearish()
}

/// 摆动高点：末根收盘跌破前两根最低价，中间一根创新高，首根为阳线
pub fn is_swing_high(first: &Candle, middle: &Candle, last: &Candle) -> bool {
    last.close < first.low
        && last.close < middle.low
        && middle.high > first.high
        && middle.high > last.high
        && first.is_bullish()
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TrendReversalFilterConfig {
    candle_timeframe: String,
    #[serde(default = "default_number_candles")]
    number_candles: usize,
    #[serde(default = "default_position_sides")]
    position_sides: Vec<PositionSide>,
}

pub struct TrendReversalFilter {
    candle_timeframe: String,
    timeframe_ms: i64,
    number_candles: usize,
    position_sides: Vec<PositionSide>,
    ctx: FilterContext,
}

impl TrendReversalFilter {
    /// 按配置的持仓方向依次检查，返回第一个匹配的方向和止损价
    fn detect(&self, candles: &[Candle]) -> Option<(PositionSide, f64)> {
        let [first, middle, last] = &candles[candles.len().saturating_sub(3)..] else {
            return None;
        };
        self.position_sides.iter().find_map(|side| match side {
            PositionSide::Long if is_swing_low(first, middle, last) => Some((*side, middle.low)),
            PositionSide::Short if is_swing_high(first, middle, last) => {
                Some((*side, middle.high))
            }
            _ => None,
        })
    }

    fn is_stale(&self, candles: &[Candle], now: i64) -> bool {
        match candles.last() {
            Some(last) => {
                candles.len() < self.number_candles || now - last.close_date > self.timeframe_ms
            }
            None => true,
        }
    }
}

impl FilterFactory for TrendReversalFilter {
    const NAME: &'static str = "TrendReversalFilter";

    fn from_config(config: &Value, ctx: &FilterContext) -> Result<Self, FilterConfigError> {
        let config: TrendReversalFilterConfig = parse_filter_config(Self::NAME, config)?;
        let timeframe_ms = parse_timeframe_to_millis(&config.candle_timeframe).map_err(|e| {
            FilterConfigError::invalid_field(Self::NAME, "candle_timeframe", e.to_string())
        })?;
        if config.number_candles < MIN_CANDLES {
            return Err(FilterConfigError::invalid_field(
                Self::NAME,
                "number_candles",
                format!("至少需要 {} 根", MIN_CANDLES),
            ));
        }
        let mut position_sides = Vec::with_capacity(config.position_sides.len());
        for side in config.position_sides {
            if !position_sides.contains(&side) {
                position_sides.push(side);
            }
        }
        if position_sides.is_empty() {
            return Err(FilterConfigError::invalid_field(
                Self::NAME,
                "position_sides",
                "不能为空",
            ));
        }

        Ok(Self {
            candle_timeframe: config.candle_timeframe,
            timeframe_ms,
            number_candles: config.number_candles,
            position_sides,
            ctx: ctx.clone(),
        })
    }
}

#[async_trait]
impl Filter for TrendReversalFilter {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn select(
        &self,
        starting_list: &[String],
        is_first: bool,
        _previous_results: &[FilterResult],
    ) -> Result<FilterResult, FilterError> {
        let input = self
            .ctx
            .resolve_input(Self::NAME, starting_list, is_first)
            .await?;
        let fetched = self
            .ctx
            .last_candles_for(&input, &self.candle_timeframe, self.number_candles)
            .await;
        let now = self.ctx.now_millis();

        let mut result = FilterResult::new();
        for (symbol, candles) in fetched {
            let candles = match candles {
                Ok(candles) => candles,
                Err(e) => {
                    warn!("{}: 获取K线失败 {}: {}", Self::NAME, symbol, e);
                    continue;
                }
            };
            if self.is_stale(&candles, now) {
                debug!("{}: {} K线数据过期或不足，跳过", Self::NAME, symbol);
                continue;
            }

            if let Some((side, stoploss_price)) = self.detect(&candles) {
                debug!(
                    "{}: {} 检测到反转形态 {} 止损 {}",
                    Self::NAME,
                    symbol,
                    side,
                    stoploss_price
                );
                result.insert(
                    symbol,
                    metadata([
                        ("position_side", json!(side.as_str())),
                        ("stoploss_price", json!(stoploss_price)),
                    ]),
                );
            }
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::implementations::test_support::*;

    const HOUR: i64 = 3_600_000;

    /// (open, high, low, close)
    type Bar = (f64, f64, f64, f64);

    const FILLER: Bar = (10.0, 10.5, 9.5, 10.0);
    const LOW_FIRST: Bar = (10.0, 10.0, 8.0, 9.0);
    const LOW_MIDDLE: Bar = (8.5, 9.0, 7.0, 8.0);
    const LOW_LAST: Bar = (9.0, 11.0, 8.5, 11.0);

    const HIGH_FIRST: Bar = (10.0, 11.0, 9.5, 10.5);
    const HIGH_MIDDLE: Bar = (10.5, 12.0, 10.0, 11.0);
    const HIGH_LAST: Bar = (10.0, 11.5, 9.0, 9.2);

    fn bar(b: Bar) -> Candle {
        candle(0, HOUR, b.0, b.1, b.2, b.3)
    }

    #[test]
    fn test_swing_low_detection() {
        assert!(is_swing_low(&bar(LOW_FIRST), &bar(LOW_MIDDLE), &bar(LOW_LAST)));

        // 首根改为阳线后不再成立
        let bullish_first = (8.5, 10.0, 8.0, 9.0);
        assert!(!is_swing_low(&bar(bullish_first), &bar(LOW_MIDDLE), &bar(LOW_LAST)));
    }

    #[test]
    fn test_swing_high_detection() {
        assert!(is_swing_high(&bar(HIGH_FIRST), &bar(HIGH_MIDDLE), &bar(HIGH_LAST)));
        assert!(!is_swing_low(&bar(HIGH_FIRST), &bar(HIGH_MIDDLE), &bar(HIGH_LAST)));
    }

    fn data() -> quant_universe_core::market::SnapshotMarketData {
        let swing_low = [FILLER, LOW_FIRST, LOW_MIDDLE, LOW_LAST];
        let swing_high = [FILLER, HIGH_FIRST, HIGH_MIDDLE, HIGH_LAST];
        snapshot_with_symbols(&["LOW", "HIGH", "NONE", "STALE", "FEW"])
            .with_candles("LOW", "1h", candles_ending_now(HOUR, &swing_low))
            .with_candles("HIGH", "1h", candles_ending_now(HOUR, &swing_high))
            .with_candles("NONE", "1h", candles_ending_now(HOUR, &[FILLER; 4]))
            .with_candles("FEW", "1h", candles_ending_now(HOUR, &swing_low[1..]))
            .with_candles(
                "STALE",
                "1h",
                candles_ending_now(HOUR, &swing_low)
                    .into_iter()
                    .map(|mut c| {
                        c.start_date -= 2 * HOUR;
                        c.close_date -= 2 * HOUR;
                        c
                    })
                    .collect(),
            )
    }

    #[tokio::test]
    async fn test_detects_both_sides() {
        let filter = TrendReversalFilter::from_config(
            &json!({"candle_timeframe": "1h"}),
            &context(data()),
        )
        .unwrap();

        let result = filter.select(&[], true, &[]).await.unwrap();
        assert_eq!(result.symbols(), syms(&["HIGH", "LOW"]));

        let low = result.get("LOW").unwrap();
        assert_eq!(low.get("position_side"), Some(&json!("LONG")));
        assert_eq!(low.get("stoploss_price"), Some(&json!(7.0)));

        let high = result.get("HIGH").unwrap();
        assert_eq!(high.get("position_side"), Some(&json!("SHORT")));
        assert_eq!(high.get("stoploss_price"), Some(&json!(12.0)));
    }

    #[tokio::test]
    async fn test_only_configured_side_evaluated() {
        let filter = TrendReversalFilter::from_config(
            &json!({"candle_timeframe": "1h", "position_sides": ["SHORT"]}),
            &context(data()),
        )
        .unwrap();

        let result = filter.select(&[], true, &[]).await.unwrap();
        assert_eq!(result.symbols(), syms(&["HIGH"]));
    }

    #[tokio::test]
    async fn test_idempotent() {
        let filter = TrendReversalFilter::from_config(
            &json!({"candle_timeframe": "1h"}),
            &context(data()),
        )
        .unwrap();
        let input = syms(&["LOW", "HIGH", "STALE"]);
        let first = filter.select(&input, false, &[]).await.unwrap();
        let second = filter.select(&input, false, &[]).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.symbols(), syms(&["LOW", "HIGH"]));
    }

    #[test]
    fn test_config_validation() {
        let ctx = context(data());
        assert!(TrendReversalFilter::from_config(
            &json!({"candle_timeframe": "1h", "number_candles": 3}),
            &ctx
        )
        .is_err());
        assert!(TrendReversalFilter::from_config(
            &json!({"candle_timeframe": "1h", "position_sides": []}),
            &ctx
        )
        .is_err());
        assert!(TrendReversalFilter::from_config(
            &json!({"candle_timeframe": "1h", "position_sides": ["FLAT"]}),
            &ctx
        )
        .is_err());
        assert!(TrendReversalFilter::from_config(&json!({}), &ctx).is_err());
    }
}
