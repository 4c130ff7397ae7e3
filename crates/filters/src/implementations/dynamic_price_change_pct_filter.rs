//! 自定义区间涨跌幅排序
//!
//! 在 `[now - period, now]` 的K线上计算 (末根收盘 - 首根开盘) / 首根开盘 × 100，
//! 排序后为每个交易对附带整体均值和多空方向（下跌 -> 可做多，上涨 -> 可做空），
//! 配置了旁路存储时把元数据写入 `DynamicPriceChangePctFilter_filtered_symbol_<symbol>`

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use quant_universe_common::{parse_duration_to_millis, parse_timeframe_to_millis};
use quant_universe_domain::filtered_symbol_key;
use quant_universe_indicators::{mean, pct_change};

use crate::framework::{
    metadata, metadata_to_fields, parse_filter_config, Filter, FilterConfigError, FilterContext,
    FilterError, FilterFactory, FilterResult, RankingOptions, SortDirection,
};

fn default_publish() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DynamicPriceChangePctFilterConfig {
    candle_timeframe: String,
    /// 回看区间，如 "4h"
    period: String,
    sort: Option<SortDirection>,
    top: Option<usize>,
    min_price_change_pct: Option<f64>,
    max_price_change_pct: Option<f64>,
    #[serde(default)]
    absolute_price_change_pct: bool,
    #[serde(default = "default_publish")]
    publish: bool,
}

pub struct DynamicPriceChangePctFilter {
    candle_timeframe: String,
    period_ms: i64,
    ranking: RankingOptions,
    publish: bool,
    ctx: FilterContext,
}

impl DynamicPriceChangePctFilter {
    async fn publish(&self, result: &FilterResult) {
        let Some(store) = self.ctx.side_channel.as_ref().filter(|_| self.publish) else {
            return;
        };

        let writes: Vec<(String, Vec<(String, String)>)> = result
            .iter()
            .map(|(symbol, meta)| {
                (
                    filtered_symbol_key(Self::NAME, symbol),
                    metadata_to_fields(meta),
                )
            })
            .collect();
        stream::iter(writes)
            .map(|(key, fields)| {
                let store = store.clone();
                async move {
                    if let Err(e) = store.hset_fields(&key, &fields).await {
                        warn!("{}: 写入旁路存储失败 {}: {}", Self::NAME, key, e);
                    }
                }
            })
            .buffer_unordered(self.ctx.concurrency)
            .collect::<Vec<()>>()
            .await;
    }
}

impl FilterFactory for DynamicPriceChangePctFilter {
    const NAME: &'static str = "DynamicPriceChangePctFilter";

    fn from_config(config: &Value, ctx: &FilterContext) -> Result<Self, FilterConfigError> {
        let config: DynamicPriceChangePctFilterConfig = parse_filter_config(Self::NAME, config)?;
        parse_timeframe_to_millis(&config.candle_timeframe).map_err(|e| {
            FilterConfigError::invalid_field(Self::NAME, "candle_timeframe", e.to_string())
        })?;
        let period_ms = parse_duration_to_millis(&config.period)
            .map_err(|e| FilterConfigError::invalid_field(Self::NAME, "period", e.to_string()))?;
        if period_ms <= 0 {
            return Err(FilterConfigError::invalid_field(
                Self::NAME,
                "period",
                "必须大于 0",
            ));
        }

        let ranking = RankingOptions {
            sort: config.sort,
            top: config.top,
            min: config.min_price_change_pct,
            max: config.max_price_change_pct,
            absolute: config.absolute_price_change_pct,
        };
        ranking.validate(Self::NAME, "min_price_change_pct", "max_price_change_pct")?;

        Ok(Self {
            candle_timeframe: config.candle_timeframe,
            period_ms,
            ranking,
            publish: config.publish,
            ctx: ctx.clone(),
        })
    }
}

#[async_trait]
impl Filter for DynamicPriceChangePctFilter {
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
        let now = self.ctx.now_millis();
        let start = now.saturating_sub(self.period_ms);
        let fetched = self
            .ctx
            .candles_in_range_for(&input, &self.candle_timeframe, start, now)
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
            let (Some(first), Some(last)) = (candles.first(), candles.last()) else {
                debug!("{}: {} 区间内没有K线", Self::NAME, symbol);
                continue;
            };
            match pct_change(first.open, last.close) {
                Some(change) => values.push((symbol, change)),
                None => warn!(
                    "{}: {} 无法计算涨跌幅 (open={})",
                    Self::NAME,
                    symbol,
                    first.open
                ),
            }
        }

        let ranked = self.ranking.rank(values);
        let keys: Vec<f64> = ranked
            .iter()
            .map(|(_, change)| self.ranking.key(*change))
            .collect();
        let mean_change = mean(&keys).unwrap_or(0.0);

        let mut result = FilterResult::new();
        for (symbol, change) in ranked {
            result.insert(
                symbol,
                metadata([
                    ("price_change_pct", json!(change)),
                    ("mean_price_change_pct", json!(mean_change)),
                    ("long", json!(change < 0.0)),
                    ("short", json!(change > 0.0)),
                ]),
            );
        }

        self.publish(&result).await;
        Ok(result)
    }
}
