//! EMA 拐头过滤
//!
//! 用最近 `ema_window + 1` 根K线的收盘价计算 EMA，比较最后两个值：
//! BOTTOM 要求拐头向上，TOP 要求拐头向下

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use quant_universe_common::parse_timeframe_to_millis;
use quant_universe_indicators::ema_series;

use crate::framework::{
    metadata, parse_filter_config, Filter, FilterConfigError, FilterContext, FilterError,
    FilterFactory, FilterResult,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EmaPivot {
    /// 底部拐头（向上）
    Bottom,
    /// 顶部拐头（向下）
    Top,
}

impl EmaPivot {
    pub fn matches(&self, previous: f64, current: f64) -> bool {
        match self {
            EmaPivot::Bottom => current > previous,
            EmaPivot::Top => current < previous,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct EmaReversalFilterConfig {
    candle_timeframe: String,
    ema_window: usize,
    pivot: EmaPivot,
}

pub struct EmaReversalFilter {
    candle_timeframe: String,
    ema_window: usize,
    pivot: EmaPivot,
    ctx: FilterContext,
}

impl FilterFactory for EmaReversalFilter {
    const NAME: &'static str = "EmaReversalFilter";

    fn from_config(config: &Value, ctx: &FilterContext) -> Result<Self, FilterConfigError> {
        let config: EmaReversalFilterConfig = parse_filter_config(Self::NAME, config)?;
        parse_timeframe_to_millis(&config.candle_timeframe).map_err(|e| {
            FilterConfigError::invalid_field(Self::NAME, "candle_timeframe", e.to_string())
        })?;
        if config.ema_window == 0 {
            return Err(FilterConfigError::invalid_field(
                Self::NAME,
                "ema_window",
                "必须大于 0",
            ));
        }
        Ok(Self {
            candle_timeframe: config.candle_timeframe,
            ema_window: config.ema_window,
            pivot: config.pivot,
            ctx: ctx.clone(),
        })
    }
}

#[async_trait]
impl Filter for EmaReversalFilter {
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
        let required = self.ema_window + 1;
        let fetched = self
            .ctx
            .last_candles_for(&input, &self.candle_timeframe, required)
            .await;

        let mut result = FilterResult::new();
        for (symbol, candles) in fetched {
            let candles = match candles {
                Ok(candles) => candles,
                Err(e) => {
                    warn!("{}: 获取K线失败 {}: {}", Self::NAME, symbol, e);
                    continue;
                }
            };
            if candles.len() < required {
                debug!(
                    "{}: {} K线不足 {}/{}",
                    Self::NAME,
                    symbol,
                    candles.len(),
                    required
                );
                continue;
            }

            let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
            let ema = match ema_series(&closes, self.ema_window) {
                Ok(ema) => ema,
                Err(e) => {
                    warn!("{}: 计算EMA失败 {}: {}", Self::NAME, symbol, e);
                    continue;
                }
            };
            let (previous, current) = (ema[ema.len() - 2], ema[ema.len() - 1]);

            if self.pivot.matches(previous, current) {
                result.insert(
                    symbol,
                    metadata([
                        ("ema_previous", json!(previous)),
                        ("ema_current", json!(current)),
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

    fn closes(values: &[f64]) -> Vec<quant_universe_domain::Candle> {
        let bars: Vec<(f64, f64, f64, f64)> = values.iter().map(|c| (*c, *c, *c, *c)).collect();
        candles_ending_now(HOUR, &bars)
    }

    fn data() -> quant_universe_core::market::SnapshotMarketData {
        snapshot_with_symbols(&["TURN_UP", "TURN_DOWN", "SHORT"])
            .with_candles("TURN_UP", "1h", closes(&[10.0, 9.0, 8.0, 9.5]))
            .with_candles("TURN_DOWN", "1h", closes(&[8.0, 9.0, 10.0, 8.5]))
            .with_candles("SHORT", "1h", closes(&[1.0, 2.0]))
    }

    fn filter(pivot: &str) -> EmaReversalFilter {
        EmaReversalFilter::from_config(
            &json!({"candle_timeframe": "1h", "ema_window": 3, "pivot": pivot}),
            &context(data()),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_bottom_pivot() {
        let result = filter("BOTTOM").select(&[], true, &[]).await.unwrap();
        assert_eq!(result.symbols(), syms(&["TURN_UP"]));
        let meta = result.get("TURN_UP").unwrap();
        let previous = meta.get("ema_previous").unwrap().as_f64().unwrap();
        let current = meta.get("ema_current").unwrap().as_f64().unwrap();
        assert!(current > previous);
    }

    #[tokio::test]
    async fn test_top_pivot() {
        let result = filter("TOP").select(&[], true, &[]).await.unwrap();
        assert_eq!(result.symbols(), syms(&["TURN_DOWN"]));
    }

    #[test]
    fn test_invalid_pivot() {
        let ctx = context(data());
        assert!(EmaReversalFilter::from_config(
            &json!({"candle_timeframe": "1h", "ema_window": 3, "pivot": "MIDDLE"}),
            &ctx
        )
        .is_err());
        assert!(EmaReversalFilter::from_config(
            &json!({"candle_timeframe": "1h", "ema_window": 0, "pivot": "TOP"}),
            &ctx
        )
        .is_err());
    }
}
