//! 交易所协作方接口
//!
//! 过滤器和后台任务只依赖这些接口，传输方式由实现方决定
//! 遵循依赖倒置原则：过滤层依赖接口，基础设施层实现接口

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;

use crate::entities::{Candle, ChangeStatistic, IncomeRecord, PriceTicker, SymbolInformation};

/// 交易所状态接口：已知交易对全集及其静态元数据
#[async_trait]
pub trait ExchangeState: Send + Sync {
    /// 获取全部交易对元数据，按交易对索引
    async fn get_all_symbol_informations_by_symbol(
        &self,
    ) -> Result<HashMap<String, SymbolInformation>>;

    /// 获取单个交易对元数据
    async fn get_symbol_information(&self, symbol: &str) -> Result<SymbolInformation>;
}

/// 行情数据接口
#[async_trait]
pub trait MarketData: Send + Sync {
    /// 获取全部交易对的最新价格
    async fn fetch_all_current_prices(&self) -> Result<HashMap<String, PriceTicker>>;

    /// 获取全部交易对的24小时涨跌幅
    async fn fetch_last_24h_changes(&self) -> Result<HashMap<String, ChangeStatistic>>;

    /// 获取全部交易对的资金费率
    async fn fetch_funding_rates(&self) -> Result<HashMap<String, f64>>;

    /// 获取最近 `amount` 根K线，从旧到新，长度可能小于 `amount`
    ///
    /// # Arguments
    /// * `symbol` - 交易对
    /// * `timeframe` - 时间周期（如"1m"、"1h"）
    /// * `amount` - 数量限制
    async fn get_last_candles(
        &self,
        symbol: &str,
        timeframe: &str,
        amount: usize,
    ) -> Result<Vec<Candle>>;

    /// 获取时间区间内的K线，从旧到新
    ///
    /// # Arguments
    /// * `start` - 开始时间戳（毫秒）
    /// * `end` - 结束时间戳（毫秒）
    async fn get_candles_in_range(
        &self,
        symbol: &str,
        timeframe: &str,
        start: i64,
        end: i64,
    ) -> Result<Vec<Candle>>;
}

/// 资金流水接口
#[async_trait]
pub trait IncomeSource: Send + Sync {
    /// 获取 `start_ms`（含）之后发生的资金流水
    async fn fetch_income_since(&self, start_ms: i64) -> Result<Vec<IncomeRecord>>;
}
