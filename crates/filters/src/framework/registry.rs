//! 过滤器注册中心
//!
//! 启动时构建一次：过滤器名称 -> 构造函数，之后只读，显式传递给流水线

use std::collections::HashMap;

use serde_json::Value;
use tracing::{debug, warn};

use super::config::FilterConfig;
use super::error::FilterConfigError;
use super::filter_trait::{Filter, FilterContext, FilterFactory};
use crate::implementations::{
    AgeFilter, AtrFilter, CandleVolumeFilter, CsvSymbolFilter, DynamicPriceChangePctFilter,
    EmaReversalFilter, FundingRateFilter, Last24hPriceChangePctFilter, MinNotionalFilter,
    SubListFilter, SymbolFilter, TrendReversalFilter, VolatilityFilter,
};

/// 过滤器构造函数
pub type FilterConstructor =
    fn(&Value, &FilterContext) -> Result<Box<dyn Filter>, FilterConfigError>;

fn construct<F: FilterFactory>(
    config: &Value,
    ctx: &FilterContext,
) -> Result<Box<dyn Filter>, FilterConfigError> {
    Ok(Box::new(F::from_config(config, ctx)?))
}

#[derive(Default)]
pub struct FilterRegistry {
    /// 过滤器名称 -> 构造函数
    constructors: HashMap<&'static str, FilterConstructor>,
}

impl FilterRegistry {
    /// 空注册中心
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册全部内置过滤器
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register_factory::<AgeFilter>();
        registry.register_factory::<MinNotionalFilter>();
        registry.register_factory::<SubListFilter>();
        registry.register_factory::<SymbolFilter>();
        registry.register_factory::<CsvSymbolFilter>();
        registry.register_factory::<CandleVolumeFilter>();
        registry.register_factory::<FundingRateFilter>();
        registry.register_factory::<Last24hPriceChangePctFilter>();
        registry.register_factory::<DynamicPriceChangePctFilter>();
        registry.register_factory::<AtrFilter>();
        registry.register_factory::<VolatilityFilter>();
        registry.register_factory::<EmaReversalFilter>();
        registry.register_factory::<TrendReversalFilter>();
        debug!("内置过滤器已注册: {:?}", registry.names());
        registry
    }

    /// 注册过滤器
    ///
    /// # 示例
    /// ```rust,ignore
    /// registry.register_factory::<AgeFilter>();
    /// ```
    pub fn register_factory<F: FilterFactory>(&mut self) {
        self.register(F::NAME, construct::<F>);
    }

    /// 以名称注册构造函数，同名时覆盖
    pub fn register(&mut self, name: &'static str, constructor: FilterConstructor) {
        if self.constructors.insert(name, constructor).is_some() {
            warn!("过滤器已存在，将被覆盖: {}", name);
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    /// 已注册的过滤器名称（排序）
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.constructors.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// 按配置创建过滤器实例
    pub fn create(
        &self,
        config: &FilterConfig,
        ctx: &FilterContext,
    ) -> Result<Box<dyn Filter>, FilterConfigError> {
        let constructor = self
            .constructors
            .get(config.filter.as_str())
            .ok_or_else(|| FilterConfigError::UnknownFilter(config.filter.clone()))?;
        constructor(&config.config, ctx)
    }
}
