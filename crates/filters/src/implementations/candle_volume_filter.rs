//! K线成交额过滤
//!
//! 最近 `nr_candles` 根K线成交额（计价币）的中位数 >= `minimum_volume` 百万时保留

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use quant_universe_common::parse_timeframe_to_millis;
use quant_universe_indicators::median;

use crate::framework::{
    metadata, parse_filter_config, Filter, FilterConfigError, FilterContext, FilterError,
    FilterFactory, FilterResult,
};

const MILLION: f64 = 1_000_000.0;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CandleVolumeFilterConfig {
    candle_timeframe: String,
    nr_candles: usize,
    /// 单位：百万
    minimum_volume: f64,
}

pub struct CandleVolumeFilter {
    candle_timeframe: String,
    nr_candles: usize,
    minimum_quote_volume: f64,
    ctx: FilterContext,
}

impl FilterFactory for CandleVolumeFilter {
    const NAME: &'static str = "CandleVolumeFilter";

    fn from_config(config: &Value, ctx: &FilterContext) -> Result<Self, FilterConfigError> {
        let config: CandleVolumeFilterConfig = parse_filter_config(Self::NAME, config)?;
        parse_timeframe_to_millis(&config.candle_timeframe).map_err(|e| {
            FilterConfigError::invalid_field(Self::NAME, "candle_timeframe", e.to_string())
        })?;
        if config.nr_candles == 0 {
            return Err(FilterConfigError::invalid_field(
                Self::NAME,
                "nr_candles",
                "必须大于 0",
            ));
        }
        if !config.minimum_volume.is_finite() || config.minimum_volume < 0.0 {
            return Err(FilterConfigError::invalid_field(
                Self::NAME,
                "minimum_volume",
                "必须为非负数",
            ));
        }

        Ok(Self {
            candle_timeframe: config.candle_timeframe,
            nr_candles: config.nr_candles,
            minimum_quote_volume: config.minimum_volume * MILLION,
            ctx: ctx.clone(),
        })
    }
}

#[async_trait]
impl Filter for CandleVolumeFilter {
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
            .last_candles_for(&input, &self.candle_timeframe, self.nr_candles)
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
            let volumes: Vec<f64> = candles.iter().map(|c| c.quote_volume).collect();
            let Some(median_volume) = median(&volumes) else {
                debug!("{}: {} 没有可用K线", Self::NAME, symbol);
                continue;
            };

            if median_volume >= self.minimum_quote_volume {
                result.insert(
                    symbol,
                    metadata([("median_quote_volume", json!(median_volume))]),
                );
            } else {
                debug!(
                    "{}: {} 成交额中位数 {:.0} 低于 {:.0}",
                    Self::NAME,
                    symbol,
                    median_volume,
                    self.minimum_quote_volume
                );
            }
        }
        Ok(result)
    }
}
