//! 过滤器接口定义
//!
//! 所有过滤器必须实现 Filter trait，以便由流水线统一编排

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde_json::Value;

use quant_universe_domain::{Candle, Clock, ExchangeState, MarketData, SideChannelStore, SystemClock};

use super::error::{FilterConfigError, FilterError};
use super::result::{FilterResult, Metadata};

/// 单个阶段内同时进行的K线请求上限
pub const DEFAULT_CANDLE_CONCURRENCY: usize = 10;

/// 过滤器接口
///
/// 实例在流水线构建时创建一次，之后每轮复用
#[async_trait]
pub trait Filter: Send + Sync {
    /// 过滤器名称（与配置中的 `filter` 一致）
    fn name(&self) -> &'static str;

    /// 执行一轮筛选
    ///
    /// # 参数
    /// * `starting_list` - 上一阶段输出的交易对（有序）
    /// * `is_first` - 是否为首个阶段；首阶段忽略 `starting_list`，从全部交易对开始
    /// * `previous_results` - 之前所有阶段的输出，按执行顺序
    ///
    /// # 返回
    /// * `Ok(FilterResult)` - 本阶段的输出，只包含输入中的交易对
    /// * `Err(FilterError)` - 整体数据源不可用；单个交易对的问题不会返回错误
    async fn select(
        &self,
        starting_list: &[String],
        is_first: bool,
        previous_results: &[FilterResult],
    ) -> Result<FilterResult, FilterError>;
}

/// 过滤器构造接口，注册中心通过它从配置创建实例
pub trait FilterFactory: Filter + Sized + 'static {
    const NAME: &'static str;

    /// 解析并校验配置，配置有误立即返回错误
    fn from_config(config: &Value, ctx: &FilterContext) -> Result<Self, FilterConfigError>;
}

/// 过滤器依赖的协作方，构造时注入
#[derive(Clone)]
pub struct FilterContext {
    pub exchange_state: Arc<dyn ExchangeState>,
    pub market_data: Arc<dyn MarketData>,
    pub clock: Arc<dyn Clock>,
    pub side_channel: Option<Arc<dyn SideChannelStore>>,
    /// 并发请求上限，至少为 1
    pub concurrency: usize,
}

impl FilterContext {
    pub fn new(exchange_state: Arc<dyn ExchangeState>, market_data: Arc<dyn MarketData>) -> Self {
        Self {
            exchange_state,
            market_data,
            clock: Arc::new(SystemClock),
            side_channel: None,
            concurrency: DEFAULT_CANDLE_CONCURRENCY,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_side_channel(mut self, store: Arc<dyn SideChannelStore>) -> Self {
        self.side_channel = Some(store);
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn now_millis(&self) -> i64 {
        self.clock.now_millis()
    }

    /// 全部已知交易对，按名称排序
    pub async fn universe(&self, filter: &str) -> Result<Vec<String>, FilterError> {
        let infos = self
            .exchange_state
            .get_all_symbol_informations_by_symbol()
            .await
            .map_err(|e| FilterError::data_source(filter, e))?;
        let mut symbols: Vec<String> = infos.into_keys().collect();
        symbols.sort();
        Ok(symbols)
    }

    /// 本阶段的实际输入：首阶段取全部交易对，否则取上一阶段输出
    pub async fn resolve_input(
        &self,
        filter: &str,
        starting_list: &[String],
        is_first: bool,
    ) -> Result<Vec<String>, FilterError> {
        if is_first {
            self.universe(filter).await
        } else {
            Ok(starting_list.to_vec())
        }
    }

    /// 限流并发获取多个交易对的最近K线，结果顺序与输入一致
    pub async fn last_candles_for(
        &self,
        symbols: &[String],
        timeframe: &str,
        amount: usize,
    ) -> Vec<(String, anyhow::Result<Vec<Candle>>)> {
        stream::iter(symbols.to_vec())
            .map(|symbol| {
                let market_data = self.market_data.clone();
                let timeframe = timeframe.to_string();
                async move {
                    let candles = market_data
                        .get_last_candles(&symbol, &timeframe, amount)
                        .await;
                    (symbol, candles)
                }
            })
            .buffered(self.concurrency)
            .collect()
            .await
    }

    /// 限流并发获取多个交易对在时间区间内的K线，结果顺序与输入一致
    pub async fn candles_in_range_for(
        &self,
        symbols: &[String],
        timeframe: &str,
        start: i64,
        end: i64,
    ) -> Vec<(String, anyhow::Result<Vec<Candle>>)> {
        stream::iter(symbols.to_vec())
            .map(|symbol| {
                let market_data = self.market_data.clone();
                let timeframe = timeframe.to_string();
                async move {
                    let candles = market_data
                        .get_candles_in_range(&symbol, &timeframe, start, end)
                        .await;
                    (symbol, candles)
                }
            })
            .buffered(self.concurrency)
            .collect()
            .await
    }
}

/// 上一阶段为该交易对附带的元数据，没有则为空
pub fn carried_metadata(previous_results: &[FilterResult], symbol: &str) -> Metadata {
    previous_results
        .last()
        .and_then(|result| result.get(symbol))
        .cloned()
        .unwrap_or_default()
}
