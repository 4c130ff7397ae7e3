//! 资金费率排序

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::framework::{
    metadata, parse_filter_config, Filter, FilterConfigError, FilterContext, FilterError,
    FilterFactory, FilterResult, RankingOptions, SortDirection,
};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FundingRateFilterConfig {
    sort: Option<SortDirection>,
    top: Option<usize>,
    min_funding_rate: Option<f64>,
    max_funding_rate: Option<f64>,
    #[serde(default)]
    absolute_funding_rate: bool,
}

pub struct FundingRateFilter {
    ranking: RankingOptions,
    ctx: FilterContext,
}

impl FilterFactory for FundingRateFilter {
    const NAME: &'static str = "FundingRateFilter";

    fn from_config(config: &Value, ctx: &FilterContext) -> Result<Self, FilterConfigError> {
        let config: FundingRateFilterConfig = parse_filter_config(Self::NAME, config)?;
        let ranking = RankingOptions {
            sort: config.sort,
            top: config.top,
            min: config.min_funding_rate,
            max: config.max_funding_rate,
            absolute: config.absolute_funding_rate,
        };
        ranking.validate(Self::NAME, "min_funding_rate", "max_funding_rate")?;
        Ok(Self {
            ranking,
            ctx: ctx.clone(),
        })
    }
}

#[async_trait]
impl Filter for FundingRateFilter {
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
        let rates = self
            .ctx
            .market_data
            .fetch_funding_rates()
            .await
            .map_err(|e| FilterError::data_source(Self::NAME, e))?;

        let values: Vec<(String, f64)> = input
            .into_iter()
            .filter_map(|symbol| match rates.get(&symbol) {
                Some(rate) => Some((symbol, *rate)),
                None => {
                    debug!("{}: 缺少资金费率，跳过 {}", Self::NAME, symbol);
                    None
                }
            })
            .collect();

        let mut result = FilterResult::new();
        for (symbol, rate) in self.ranking.rank(values) {
            result.insert(symbol, metadata([("funding_rate", json!(rate))]));
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::implementations::test_support::*;

    fn data() -> quant_universe_core::market::SnapshotMarketData {
        snapshot_with_symbols(&["A", "B", "C"])
            .with_funding_rate("A", 0.01)
            .with_funding_rate("B", -0.02)
            .with_funding_rate("C", 0.05)
    }

    #[tokio::test]
    async fn test_sort_desc_top_two() {
        let filter = FundingRateFilter::from_config(
            &json!({"sort": "desc", "top": 2}),
            &context(data()),
        )
        .unwrap();
        let result = filter.select(&syms(&["A", "B", "C"]), false, &[]).await.unwrap();
        assert_eq!(result.symbols(), syms(&["C", "A"]));
        assert_eq!(result.get("C").unwrap().get("funding_rate"), Some(&json!(0.05)));
    }

    #[tokio::test]
    async fn test_absolute_with_bounds() {
        let filter = FundingRateFilter::from_config(
            &json!({"sort": "asc", "min_funding_rate": 0.015, "absolute_funding_rate": true}),
            &context(data()),
        )
        .unwrap();
        let result = filter.select(&[], true, &[]).await.unwrap();
        assert_eq!(result.symbols(), syms(&["B", "C"]));
        assert_eq!(result.get("B").unwrap().get("funding_rate"), Some(&json!(-0.02)));
    }

    #[tokio::test]
    async fn test_idempotent() {
        let filter =
            FundingRateFilter::from_config(&json!({"sort": "asc"}), &context(data())).unwrap();
        let input = syms(&["C", "B", "A", "MISSING"]);
        let first = filter.select(&input, false, &[]).await.unwrap();
        let second = filter.select(&input, false, &[]).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.symbols(), syms(&["B", "A", "C"]));
    }

    #[test]
    fn test_sort_or_top_required() {
        let ctx = context(data());
        assert!(FundingRateFilter::from_config(&json!({}), &ctx).is_err());
        assert!(FundingRateFilter::from_config(&json!({"sort": "sideways"}), &ctx).is_err());
        assert!(FundingRateFilter::from_config(&json!({"top": 3}), &ctx).is_ok());
    }
}
