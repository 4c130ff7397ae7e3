//! 24 小时涨跌幅排序

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
struct Last24hPriceChangePctFilterConfig {
    sort: Option<SortDirection>,
    top: Option<usize>,
    min_price_change_pct: Option<f64>,
    max_price_change_pct: Option<f64>,
    #[serde(default)]
    absolute_price_change_pct: bool,
}

pub struct Last24hPriceChangePctFilter {
    ranking: RankingOptions,
    ctx: FilterContext,
}

impl FilterFactory for Last24hPriceChangePctFilter {
    const NAME: &'static str = "Last24hPriceChangePctFilter";

    fn from_config(config: &Value, ctx: &FilterContext) -> Result<Self, FilterConfigError> {
        let config: Last24hPriceChangePctFilterConfig = parse_filter_config(Self::NAME, config)?;
        let ranking = RankingOptions {
            sort: config.sort,
            top: config.top,
            min: config.min_price_change_pct,
            max: config.max_price_change_pct,
            absolute: config.absolute_price_change_pct,
        };
        ranking.validate(Self::NAME, "min_price_change_pct", "max_price_change_pct")?;
        Ok(Self {
            ranking,
            ctx: ctx.clone(),
        })
    }
}

#[async_trait]
impl Filter for Last24hPriceChangePctFilter {
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
        let changes = self
            .ctx
            .market_data
            .fetch_last_24h_changes()
            .await
            .map_err(|e| FilterError::data_source(Self::NAME, e))?;

        let values: Vec<(String, f64)> = input
            .into_iter()
            .filter_map(|symbol| match changes.get(&symbol) {
                Some(change) => Some((symbol, change.price_change_pct)),
                None => {
                    debug!("{}: 缺少24h涨跌幅，跳过 {}", Self::NAME, symbol);
                    None
                }
            })
            .collect();

        let mut result = FilterResult::new();
        for (symbol, pct) in self.ranking.rank(values) {
            result.insert(symbol, metadata([("price_change_pct", json!(pct))]));
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::implementations::test_support::*;

    #[tokio::test]
    async fn test_top_movers_by_absolute_change() {
        let data = snapshot_with_symbols(&["A", "B", "C", "D"])
            .with_change_24h("A", 3.0)
            .with_change_24h("B", -12.0)
            .with_change_24h("C", 8.0)
            .with_change_24h("D", 0.5);
        let filter = Last24hPriceChangePctFilter::from_config(
            &json!({
                "sort": "desc",
                "top": 2,
                "min_price_change_pct": 1.0,
                "absolute_price_change_pct": true
            }),
            &context(data),
        )
        .unwrap();

        let result = filter.select(&[], true, &[]).await.unwrap();
        assert_eq!(result.symbols(), syms(&["B", "C"]));
        assert_eq!(
            result.get("B").unwrap().get("price_change_pct"),
            Some(&json!(-12.0))
        );
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        let ctx = context(snapshot_with_symbols(&[]));
        let err = Last24hPriceChangePctFilter::from_config(
            &json!({"sort": "asc", "min_price_change_pct": 5, "max_price_change_pct": 1}),
            &ctx,
        )
        .err()
        .unwrap();
        assert!(err.to_string().contains("min_price_change_pct"));
    }
}
