use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{info, warn};

use quant_universe_domain::{income_key, Clock, ExchangeState, SideChannelStore};

use super::income_job::parse_income_member;
use crate::scheduler::PeriodicJob;

/// 状态快照
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusReport {
    /// 已知交易对数量
    pub universe_size: usize,
    /// 保留期内有流水的交易对 -> 收益合计
    pub income_by_symbol: BTreeMap<String, f64>,
    pub total_income: f64,
}

/// 状态报告任务：定时输出交易对数量和保留期内的收益
pub struct StatusReportJob {
    exchange_state: Arc<dyn ExchangeState>,
    store: Arc<dyn SideChannelStore>,
    clock: Arc<dyn Clock>,
    window: Duration,
}

impl StatusReportJob {
    pub fn new(
        exchange_state: Arc<dyn ExchangeState>,
        store: Arc<dyn SideChannelStore>,
        clock: Arc<dyn Clock>,
        window: Duration,
    ) -> Self {
        Self {
            exchange_state,
            store,
            clock,
            window,
        }
    }

    pub async fn collect(&self) -> Result<StatusReport> {
        let infos = self
            .exchange_state
            .get_all_symbol_informations_by_symbol()
            .await
            .context("获取交易对信息失败")?;
        let now = self.clock.now_millis();
        let window_ms = i64::try_from(self.window.as_millis()).unwrap_or(i64::MAX);
        let since = now.saturating_sub(window_ms);

        let mut symbols: Vec<&String> = infos.keys().collect();
        symbols.sort();

        let mut report = StatusReport {
            universe_size: infos.len(),
            ..Default::default()
        };
        for symbol in symbols {
            let entries = self
                .store
                .zrange_by_score(&income_key(symbol), since as f64, now as f64)
                .await
                .with_context(|| format!("读取资金流水失败: {}", symbol))?;
            if entries.is_empty() {
                continue;
            }
            let mut total = 0.0;
            for (member, _) in &entries {
                match parse_income_member(member) {
                    Some(amount) => total += amount,
                    None => warn!("无法解析资金流水 {}: {}", symbol, member),
                }
            }
            report.income_by_symbol.insert(symbol.clone(), total);
            report.total_income += total;
        }
        Ok(report)
    }
}

#[async_trait]
impl PeriodicJob for StatusReportJob {
    fn name(&self) -> &str {
        "StatusReport"
    }

    async fn run_once(&self) -> Result<()> {
        let report = self.collect().await?;
        for (symbol, income) in &report.income_by_symbol {
            info!("📊 {} 收益: {:.4}", symbol, income);
        }
        info!(
            "📊 状态报告: 交易对 {} 个, 有收益 {} 个, 总收益 {:.4} (近 {:?})",
            report.universe_size,
            report.income_by_symbol.len(),
            report.total_income,
            self.window
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quant_universe_core::cache::InMemorySideChannelStore;
    use quant_universe_core::market::SnapshotMarketData;
    use quant_universe_domain::{FixedClock, SymbolInformation};

    const NOW: i64 = 1_700_000_000_000;
    const HOUR: i64 = 3_600_000;

    fn info(symbol: &str) -> SymbolInformation {
        SymbolInformation {
            symbol: symbol.to_string(),
            onboard_date: 0,
            minimum_quantity: 1.0,
            minimum_notional: 5.0,
        }
    }

    #[tokio::test]
    async fn test_collect_sums_within_window() {
        let exchange = SnapshotMarketData::new()
            .with_symbol(info("BTCUSDT"))
            .with_symbol(info("ETHUSDT"))
            .with_symbol(info("SOLUSDT"));
        let store = Arc::new(InMemorySideChannelStore::new());
        store
            .zadd("income_BTCUSDT", "1:5", (NOW - HOUR) as f64)
            .await
            .unwrap();
        store
            .zadd("income_BTCUSDT", "2:-1.5", (NOW - 2 * HOUR) as f64)
            .await
            .unwrap();
        // 超出窗口
        store
            .zadd("income_ETHUSDT", "3:9", (NOW - 48 * HOUR) as f64)
            .await
            .unwrap();

        let job = StatusReportJob::new(
            Arc::new(exchange),
            store,
            Arc::new(FixedClock::new(NOW)),
            Duration::from_secs(24 * 3600),
        );
        let report = job.collect().await.unwrap();

        assert_eq!(report.universe_size, 3);
        assert_eq!(report.income_by_symbol.len(), 1);
        assert_eq!(report.income_by_symbol.get("BTCUSDT"), Some(&3.5));
        assert_eq!(report.total_income, 3.5);
        job.run_once().await.unwrap();
    }
}
