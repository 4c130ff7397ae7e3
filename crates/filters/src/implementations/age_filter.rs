//! 上线时长过滤
//!
//! 上线时长 = 当前时间 - 上线时间，落在 [older_than, newer_than] 内的交易对保留（闭区间）

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use quant_universe_common::parse_duration_to_millis;

use crate::framework::{
    metadata, parse_filter_config, Filter, FilterConfigError, FilterContext, FilterError,
    FilterFactory, FilterResult,
};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct AgeFilterConfig {
    /// 最短上线时长，如 "7d"
    older_than: Option<String>,
    /// 最长上线时长
    newer_than: Option<String>,
}

pub struct AgeFilter {
    older_than_ms: Option<i64>,
    newer_than_ms: Option<i64>,
    ctx: FilterContext,
}

fn parse_bound(field: &str, raw: Option<&str>) -> Result<Option<i64>, FilterConfigError> {
    raw.map(|raw| {
        parse_duration_to_millis(raw)
            .map_err(|e| FilterConfigError::invalid_field(AgeFilter::NAME, field, e.to_string()))
    })
    .transpose()
}

impl AgeFilter {
    pub fn in_window(&self, age_ms: i64) -> bool {
        age_ms >= 0
            && self.older_than_ms.map_or(true, |min| age_ms >= min)
            && self.newer_than_ms.map_or(true, |max| age_ms <= max)
    }
}

impl FilterFactory for AgeFilter {
    const NAME: &'static str = "AgeFilter";

    fn from_config(config: &Value, ctx: &FilterContext) -> Result<Self, FilterConfigError> {
        let config: AgeFilterConfig = parse_filter_config(Self::NAME, config)?;
        let older_than_ms = parse_bound("older_than", config.older_than.as_deref())?;
        let newer_than_ms = parse_bound("newer_than", config.newer_than.as_deref())?;

        match (older_than_ms, newer_than_ms) {
            (None, None) => {
                return Err(FilterConfigError::invalid(
                    Self::NAME,
                    "`older_than` 和 `newer_than` 至少需要配置一个",
                ))
            }
            (Some(older), Some(newer)) if older >= newer => {
                return Err(FilterConfigError::invalid(
                    Self::NAME,
                    format!("`older_than` ({}ms) 必须小于 `newer_than` ({}ms)", older, newer),
                ))
            }
            _ => {}
        }

        Ok(Self {
            older_than_ms,
            newer_than_ms,
            ctx: ctx.clone(),
        })
    }
}

#[async_trait]
impl Filter for AgeFilter {
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
        let infos = self
            .ctx
            .exchange_state
            .get_all_symbol_informations_by_symbol()
            .await
            .map_err(|e| FilterError::data_source(Self::NAME, e))?;
        let now = self.ctx.now_millis();

        let mut result = FilterResult::new();
        for symbol in &input {
            let Some(info) = infos.get(symbol) else {
                warn!("{}: 缺少交易对信息，跳过 {}", Self::NAME, symbol);
                continue;
            };
            let age_ms = info.age_millis(now);
            if age_ms < 0 {
                warn!(
                    "{}: {} 上线时间晚于当前时间 (age={}ms)，跳过",
                    Self::NAME,
                    symbol,
                    age_ms
                );
                continue;
            }
            if self.in_window(age_ms) {
                result.insert(symbol.as_str(), metadata([("age_ms", json!(age_ms))]));
            } else {
                debug!("{}: {} 上线时长 {}ms 不在区间内", Self::NAME, symbol, age_ms);
            }
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::implementations::test_support::*;
    use quant_universe_common::DAY_MILLIS;

    fn filter(config: Value, data: quant_universe_core::market::SnapshotMarketData) -> AgeFilter {
        AgeFilter::from_config(&config, &context(data)).unwrap()
    }

    #[tokio::test]
    async fn test_window_is_inclusive() {
        let data = snapshot_with_symbols(&[])
            .with_symbol(info("AT_MIN", NOW - DAY_MILLIS))
            .with_symbol(info("AT_MAX", NOW - 7 * DAY_MILLIS))
            .with_symbol(info("TOO_NEW", NOW - DAY_MILLIS + 1))
            .with_symbol(info("TOO_OLD", NOW - 7 * DAY_MILLIS - 1))
            .with_symbol(info("FUTURE", NOW + 1));
        let filter = filter(json!({"older_than": "1d", "newer_than": "7d"}), data);

        let result = filter.select(&[], true, &[]).await.unwrap();
        assert_eq!(result.symbols(), syms(&["AT_MAX", "AT_MIN"]));
        assert_eq!(
            result.get("AT_MIN").unwrap().get("age_ms"),
            Some(&json!(DAY_MILLIS))
        );
    }

    #[tokio::test]
    async fn test_negative_age_excluded_without_bounds_overlap() {
        let data = snapshot_with_symbols(&[]).with_symbol(info("FUTURE", NOW + DAY_MILLIS));
        let filter = filter(json!({"newer_than": "30d"}), data);
        let result = filter.select(&syms(&["FUTURE"]), false, &[]).await.unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_extreme_onboard_dates() {
        let data = snapshot_with_symbols(&[])
            .with_symbol(info("ANCIENT", i64::MIN))
            .with_symbol(info("FAR_FUTURE", i64::MAX));
        let filter = filter(json!({"older_than": "1d"}), data);

        let result = filter.select(&[], true, &[]).await.unwrap();
        assert_eq!(result.symbols(), syms(&["ANCIENT"]));
        assert_eq!(
            result.get("ANCIENT").unwrap().get("age_ms"),
            Some(&json!(i64::MAX))
        );
    }

    #[tokio::test]
    async fn test_unknown_symbol_skipped() {
        let data = snapshot_with_symbols(&[]).with_symbol(info("OLD", 0));
        let filter = filter(json!({"older_than": "1d"}), data);
        let result = filter
            .select(&syms(&["MISSING", "OLD"]), false, &[])
            .await
            .unwrap();
        assert_eq!(result.symbols(), syms(&["OLD"]));
    }

    #[test]
    fn test_config_validation() {
        let ctx = context(snapshot_with_symbols(&[]));
        assert!(AgeFilter::from_config(&json!({}), &ctx).is_err());
        assert!(AgeFilter::from_config(&json!({"older_than": "7d", "newer_than": "1d"}), &ctx).is_err());
        assert!(AgeFilter::from_config(&json!({"older_than": "1d", "newer_than": "1d"}), &ctx).is_err());
        assert!(AgeFilter::from_config(&json!({"older_than": "soon"}), &ctx).is_err());
        assert!(AgeFilter::from_config(&json!({"older": "1d"}), &ctx).is_err());
    }
}
