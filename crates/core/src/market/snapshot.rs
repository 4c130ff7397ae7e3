//! 行情快照
//!
//! 从 JSON 文件加载一份静态行情，实现全部协作方接口，
//! 便于在没有交易所客户端的情况下演练过滤流水线

use std::collections::HashMap;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use quant_universe_domain::{
    Candle, ChangeStatistic, ExchangeState, IncomeRecord, IncomeSource, MarketData, PriceTicker,
    SymbolInformation,
};

/// 快照文件结构
///
/// ```json
/// {
///   "symbols": [{"symbol": "BTCUSDT", "onboard_date": 0, "minimum_quantity": 0.001, "minimum_notional": 5}],
///   "prices": {"BTCUSDT": 60000},
///   "changes_24h": {"BTCUSDT": 1.5},
///   "funding_rates": {"BTCUSDT": 0.0001},
///   "candles": {"BTCUSDT": {"1h": [ ... ]}},
///   "incomes": []
/// }
/// ```
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotMarketData {
    pub symbols: Vec<SymbolInformation>,
    pub prices: HashMap<String, f64>,
    pub changes_24h: HashMap<String, f64>,
    pub funding_rates: HashMap<String, f64>,
    /// 交易对 -> 周期 -> K线（从旧到新）
    pub candles: HashMap<String, HashMap<String, Vec<Candle>>>,
    pub incomes: Vec<IncomeRecord>,
}

impl SnapshotMarketData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("读取行情快照失败: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("解析行情快照失败: {}", path.display()))
    }

    pub fn with_symbol(mut self, info: SymbolInformation) -> Self {
        self.symbols.retain(|s| s.symbol != info.symbol);
        self.symbols.push(info);
        self
    }

    pub fn with_price(mut self, symbol: &str, price: f64) -> Self {
        self.prices.insert(symbol.to_string(), price);
        self
    }

    pub fn with_change_24h(mut self, symbol: &str, price_change_pct: f64) -> Self {
        self.changes_24h.insert(symbol.to_string(), price_change_pct);
        self
    }

    pub fn with_funding_rate(mut self, symbol: &str, funding_rate: f64) -> Self {
        self.funding_rates.insert(symbol.to_string(), funding_rate);
        self
    }

    pub fn with_candles(mut self, symbol: &str, timeframe: &str, candles: Vec<Candle>) -> Self {
        self.candles
            .entry(symbol.to_string())
            .or_default()
            .insert(timeframe.to_string(), candles);
        self
    }

    pub fn with_income(mut self, income: IncomeRecord) -> Self {
        self.incomes.push(income);
        self
    }

    fn candles_for(&self, symbol: &str, timeframe: &str) -> Result<&Vec<Candle>> {
        self.candles
            .get(symbol)
            .and_then(|by_timeframe| by_timeframe.get(timeframe))
            .ok_or_else(|| anyhow!("K线数据不存在: {} {}", symbol, timeframe))
    }
}

#[async_trait]
impl ExchangeState for SnapshotMarketData {
    async fn get_all_symbol_informations_by_symbol(
        &self,
    ) -> Result<HashMap<String, SymbolInformation>> {
        Ok(self
            .symbols
            .iter()
            .map(|info| (info.symbol.clone(), info.clone()))
            .collect())
    }

    async fn get_symbol_information(&self, symbol: &str) -> Result<SymbolInformation> {
        self.symbols
            .iter()
            .find(|info| info.symbol == symbol)
            .cloned()
            .ok_or_else(|| anyhow!("交易对不存在: {}", symbol))
    }
}

#[async_trait]
impl MarketData for SnapshotMarketData {
    async fn fetch_all_current_prices(&self) -> Result<HashMap<String, PriceTicker>> {
        Ok(self
            .prices
            .iter()
            .map(|(symbol, price)| {
                (
                    symbol.clone(),
                    PriceTicker {
                        symbol: symbol.clone(),
                        price: *price,
                        timestamp: 0,
                    },
                )
            })
            .collect())
    }

    async fn fetch_last_24h_changes(&self) -> Result<HashMap<String, ChangeStatistic>> {
        Ok(self
            .changes_24h
            .iter()
            .map(|(symbol, pct)| {
                (
                    symbol.clone(),
                    ChangeStatistic {
                        symbol: symbol.clone(),
                        price_change_pct: *pct,
                    },
                )
            })
            .collect())
    }

    async fn fetch_funding_rates(&self) -> Result<HashMap<String, f64>> {
        Ok(self.funding_rates.clone())
    }

    async fn get_last_candles(
        &self,
        symbol: &str,
        timeframe: &str,
        amount: usize,
    ) -> Result<Vec<Candle>> {
        let candles = self.candles_for(symbol, timeframe)?;
        let skip = candles.len().saturating_sub(amount);
        Ok(candles[skip..].to_vec())
    }

    async fn get_candles_in_range(
        &self,
        symbol: &str,
        timeframe: &str,
        start: i64,
        end: i64,
    ) -> Result<Vec<Candle>> {
        let candles = self.candles_for(symbol, timeframe)?;
        Ok(candles
            .iter()
            .filter(|c| c.start_date >= start && c.start_date <= end)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl IncomeSource for SnapshotMarketData {
    async fn fetch_income_since(&self, start_ms: i64) -> Result<Vec<IncomeRecord>> {
        let mut incomes: Vec<IncomeRecord> = self
            .incomes
            .iter()
            .filter(|income| income.timestamp >= start_ms)
            .cloned()
            .collect();
        incomes.sort_by_key(|income| income.timestamp);
        Ok(incomes)
    }
}
