//! 最小开仓价值过滤
//!
//! 最小开仓价值 = max(固定最小名义价值, 当前价格 × 最小下单数量)，
//! 保留 `more_than < 值 < less_than` 的交易对（开区间）

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::framework::{
    metadata, parse_filter_config, Filter, FilterConfigError, FilterContext, FilterError,
    FilterFactory, FilterResult,
};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct MinNotionalFilterConfig {
    less_than: Option<f64>,
    more_than: Option<f64>,
}

pub struct MinNotionalFilter {
    less_than: Option<f64>,
    more_than: Option<f64>,
    ctx: FilterContext,
}

impl MinNotionalFilter {
    fn accepts(&self, min_notional: f64) -> bool {
        self.more_than.map_or(true, |bound| min_notional > bound)
            && self.less_than.map_or(true, |bound| min_notional < bound)
    }
}

impl FilterFactory for MinNotionalFilter {
    const NAME: &'static str = "MinNotionalFilter";

    fn from_config(config: &Value, ctx: &FilterContext) -> Result<Self, FilterConfigError> {
        let config: MinNotionalFilterConfig = parse_filter_config(Self::NAME, config)?;
        match (config.more_than, config.less_than) {
            (None, None) => {
                return Err(FilterConfigError::invalid(
                    Self::NAME,
                    "`less_than` 和 `more_than` 至少需要配置一个",
                ))
            }
            (Some(more), Some(less)) if more >= less => {
                return Err(FilterConfigError::invalid(
                    Self::NAME,
                    format!("`more_than` ({}) 必须小于 `less_than` ({})", more, less),
                ))
            }
            _ => {}
        }

        Ok(Self {
            less_than: config.less_than,
            more_than: config.more_than,
            ctx: ctx.clone(),
        })
    }
}

#[async_trait]
impl Filter for MinNotionalFilter {
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

        let mut result = FilterResult::new();
        for symbol in &input {
            let info = match self.ctx.exchange_state.get_symbol_information(symbol).await {
                Ok(info) => info,
                Err(e) => {
                    warn!("{}: 获取交易对信息失败 {}: {}", Self::NAME, symbol, e);
                    continue;
                }
            };
            let Some(ticker) = prices.get(symbol) else {
                warn!("{}: 缺少当前价格，跳过 {}", Self::NAME, symbol);
                continue;
            };

            let min_notional = info.effective_min_notional(ticker.price);
            if self.accepts(min_notional) {
                result.insert(
                    symbol.as_str(),
                    metadata([("min_notional", json!(min_notional))]),
                );
            } else {
                debug!(
                    "{}: {} 最小开仓价值 {} 不在区间内",
                    Self::NAME,
                    symbol,
                    min_notional
                );
            }
        }
        Ok(result)
    }
}
