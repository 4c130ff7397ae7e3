//! 截取前 N 个交易对，保持输入顺序

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::framework::{
    carried_metadata, parse_filter_config, Filter, FilterConfigError, FilterContext, FilterError,
    FilterFactory, FilterResult,
};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SubListFilterConfig {
    size: usize,
}

pub struct SubListFilter {
    size: usize,
    ctx: FilterContext,
}

impl FilterFactory for SubListFilter {
    const NAME: &'static str = "SubListFilter";

    fn from_config(config: &Value, ctx: &FilterContext) -> Result<Self, FilterConfigError> {
        let config: SubListFilterConfig = parse_filter_config(Self::NAME, config)?;
        if config.size == 0 {
            return Err(FilterConfigError::invalid_field(Self::NAME, "size", "必须大于 0"));
        }
        Ok(Self {
            size: config.size,
            ctx: ctx.clone(),
        })
    }
}

#[async_trait]
impl Filter for SubListFilter {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn select(
        &self,
        starting_list: &[String],
        is_first: bool,
        previous_results: &[FilterResult],
    ) -> Result<FilterResult, FilterError> {
        let input = self
            .ctx
            .resolve_input(Self::NAME, starting_list, is_first)
            .await?;

        let mut result = FilterResult::new();
        for symbol in input.iter().take(self.size) {
            result.insert(symbol.as_str(), carried_metadata(previous_results, symbol));
        }
        Ok(result)
    }
}
