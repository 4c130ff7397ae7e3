//! 突破幅度过滤
//!
//! 参考最近 `reference_candle_nr` 根K线：
//! - 向上突破：当前价高于区间最低价的百分比
//! - 向下突破：当前价低于区间最高价的百分比
//!
//! 任一已配置的阈值达到即保留

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use quant_universe_common::parse_timeframe_to_millis;
use quant_universe_domain::Candle;

use crate::framework::{
    metadata, parse_filter_config, Filter, FilterConfigError, FilterContext, FilterError,
    FilterFactory, FilterResult,
};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct VolatilityFilterConfig {
    candle_timeframe: String,
    reference_candle_nr: usize,
    positive_breakout_pct: Option<f64>,
    negative_breakout_pct: Option<f64>,
}

pub struct VolatilityFilter {
    candle_timeframe: String,
    reference_candle_nr: usize,
    positive_breakout_pct: Option<f64>,
    negative_breakout_pct: Option<f64>,
    ctx: FilterContext,
}

/// (向上突破%, 向下突破%)，区间最高/最低价无效时返回 None
pub fn breakout_pcts(candles: &[Candle], price: f64) -> Option<(f64, f64)> {
    let lowest_low = candles.iter().map(|c| c.low).reduce(f64::min)?;
    let highest_high = candles.iter().map(|c| c.high).reduce(f64::max)?;
    if lowest_low <= 0.0 || highest_high <= 0.0 {
        return None;
    }
    let positive = (price - lowest_low) / lowest_low * 100.0;
    let negative = (highest_high - price) / highest_high * 100.0;
    Some((positive, negative))
}

impl VolatilityFilter {
    fn accepts(&self, positive: f64, negative: f64) -> bool {
        self.positive_breakout_pct
            .map_or(false, |threshold| positive >= threshold)
            || self
                .negative_breakout_pct
                .map_or(false, |threshold| negative >= threshold)
    }
}

impl FilterFactory for VolatilityFilter {
    const NAME: &'static str = "VolatilityFilter";

    fn from_config(config: &Value, ctx: &FilterContext) -> Result<Self, FilterConfigError> {
        let config: VolatilityFilterConfig = parse_filter_config(Self::NAME, config)?;
        parse_timeframe_to_millis(&config.candle_timeframe).map_err(|e| {
            FilterConfigError::invalid_field(Self::NAME, "candle_timeframe", e.to_string())
        })?;
        if config.reference_candle_nr == 0 {
            return Err(FilterConfigError::invalid_field(
                Self::NAME,
                "reference_candle_nr",
                "必须大于 0",
            ));
        }
        if config.positive_breakout_pct.is_none() && config.negative_breakout_pct.is_none() {
            return Err(FilterConfigError::invalid(
                Self::NAME,
                "`positive_breakout_pct` 和 `negative_breakout_pct` 至少需要配置一个",
            ));
        }

        Ok(Self {
            candle_timeframe: config.candle_timeframe,
            reference_candle_nr: config.reference_candle_nr,
            positive_breakout_pct: config.positive_breakout_pct,
            negative_breakout_pct: config.negative_breakout_pct,
            ctx: ctx.clone(),
        })
    }
}

#[async_trait]
impl Filter for VolatilityFilter {
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
        let prices = self
            .ctx
            .market_data
            .fetch_all_current_prices()
            .await
            .map_err(|e| FilterError::data_source(Self::NAME, e))?;
        let fetched = self
            .ctx
            .last_candles_for(&input, &self.candle_timeframe, self.reference_candle_nr)
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
            let Some(ticker) = prices.get(&symbol) else {
                warn!("{}: 缺少当前价格，跳过 {}", Self::NAME, symbol);
                continue;
            };
            let Some((positive, negative)) = breakout_pcts(&candles, ticker.price) else {
                debug!("{}: {} 没有可用K线", Self::NAME, symbol);
                continue;
            };

            if self.accepts(positive, negative) {
                result.insert(
                    symbol,
                    metadata([
                        ("positive_breakout_pct", json!(positive)),
                        ("negative_breakout_pct", json!(negative)),
                    ]),
                );
            }
        }
        Ok(result)
    }
}
