//! 交易对白名单 / 黑名单（正则，整串匹配）
//!
//! 有白名单时只保留匹配任一白名单的交易对，没有则全部通过；
//! 之后剔除匹配任一黑名单的交易对，黑名单优先

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::framework::{
    carried_metadata, parse_filter_config, Filter, FilterConfigError, FilterContext, FilterError,
    FilterFactory, FilterResult,
};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SymbolFilterConfig {
    #[serde(default)]
    whitelist: Vec<String>,
    #[serde(default)]
    blacklist: Vec<String>,
}

pub struct SymbolFilter {
    whitelist: Vec<Regex>,
    blacklist: Vec<Regex>,
    ctx: FilterContext,
}

fn compile(field: &str, patterns: &[String]) -> Result<Vec<Regex>, FilterConfigError> {
    patterns
        .iter()
        .map(|pattern| {
            Regex::new(&format!("^(?:{})$", pattern)).map_err(|e| {
                FilterConfigError::invalid_field(
                    SymbolFilter::NAME,
                    field,
                    format!("正则 `{}` 无效: {}", pattern, e),
                )
            })
        })
        .collect()
}

impl SymbolFilter {
    pub fn accepts(&self, symbol: &str) -> bool {
        let whitelisted =
            self.whitelist.is_empty() || self.whitelist.iter().any(|re| re.is_match(symbol));
        whitelisted && !self.blacklist.iter().any(|re| re.is_match(symbol))
    }
}

impl FilterFactory for SymbolFilter {
    const NAME: &'static str = "SymbolFilter";

    fn from_config(config: &Value, ctx: &FilterContext) -> Result<Self, FilterConfigError> {
        let config: SymbolFilterConfig = parse_filter_config(Self::NAME, config)?;
        Ok(Self {
            whitelist: compile("whitelist", &config.whitelist)?,
            blacklist: compile("blacklist", &config.blacklist)?,
            ctx: ctx.clone(),
        })
    }
}

#[async_trait]
impl Filter for SymbolFilter {
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
        for symbol in &input {
            if self.accepts(symbol) {
                result.insert(symbol.as_str(), carried_metadata(previous_results, symbol));
            } else {
                debug!("{}: 剔除 {}", Self::NAME, symbol);
            }
        }
        Ok(result)
    }
}
