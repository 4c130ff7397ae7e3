//! ATR% 排序
//!
//! 用最近 `lookback_period` 根K线计算 ATR(`atr_period`) / 收盘价，按降序输出，
//! 单个交易对计算失败只会将其排除

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

use quant_universe_common::parse_timeframe_to_millis;
use quant_universe_indicators::atr_percent;

use crate::framework::{
    metadata, parse_filter_config, Filter, FilterConfigError, FilterContext, FilterError,
    FilterFactory, FilterResult, RankingOptions, SortDirection,
};

fn default_lookback_period() -> usize {
    100
}

fn default_atr_period() -> usize {
    14
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct AtrFilterConfig {
    candle_timeframe: String,
    #[serde(default = "default_lookback_period")]
    lookback_period: usize,
    #[serde(default = "default_atr_period")]
    atr_period: usize,
    top: Option<usize>,
}

pub struct AtrFilter {
    candle_timeframe: String,
    lookback_period: usize,
    atr_period: usize,
    ranking: RankingOptions,
    ctx: FilterContext,
}

impl FilterFactory for AtrFilter {
    const NAME: &'static str = "ATRFilter";

    fn from_config(config: &Value, ctx: &FilterContext) -> Result<Self, FilterConfigError> {
        let config: AtrFilterConfig = parse_filter_config(Self::NAME, config)?;
        parse_timeframe_to_millis(&config.candle_timeframe).map_err(|e| {
            FilterConfigError::invalid_field(Self::NAME, "candle_timeframe", e.to_string())
        })?;
        if config.atr_period == 0 {
            return Err(FilterConfigError::invalid_field(
                Self::NAME,
                "atr_period",
                "必须大于 0",
            ));
        }
        if config.lookback_period <= config.atr_period {
            return Err(FilterConfigError::invalid(
                Self::NAME,
                format!(
                    "`lookback_period` ({}) 必须大于 `atr_period` ({})",
                    config.lookback_period, config.atr_period
                ),
            ));
        }

        let ranking = RankingOptions {
            sort: Some(SortDirection::Desc),
            top: config.top,
            ..Default::default()
        };
        ranking.validate(Self::NAME, "min", "max")?;

        Ok(Self {
            candle_timeframe: config.candle_timeframe,
            lookback_period: config.lookback_period,
            atr_period: config.atr_period,
            ranking,
            ctx: ctx.clone(),
        })
    }
}

#[async_trait]
impl Filter for AtrFilter {
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
            .last_candles_for(&input, &self.candle_timeframe, self.lookback_period)
            .await;

        let mut values = Vec::with_capacity(fetched.len());
        for (symbol, candles) in fetched {
            let candles = match candles {
                Ok(candles) => candles,
                Err(e) => {
                    warn!("{}: 获取K线失败 {}: {}", Self::NAME, symbol, e);
                    continue;
                }
            };
            match atr_percent(&candles, self.atr_period) {
                Ok(atr_pct) => values.push((symbol, atr_pct)),
                Err(e) => warn!("{}: 计算ATR失败 {}: {}", Self::NAME, symbol, e),
            }
        }

        let mut result = FilterResult::new();
        for (symbol, atr_pct) in self.ranking.rank(values) {
            result.insert(symbol, metadata([("atr_pct", json!(atr_pct))]));
        }
        Ok(result)
    }
}
