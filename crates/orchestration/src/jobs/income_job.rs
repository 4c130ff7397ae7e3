use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info};

use quant_universe_common::millis_to_string;
use quant_universe_domain::{income_key, Clock, IncomeSource, SideChannelStore};

use crate::scheduler::PeriodicJob;

/// 有序集合成员：`<tran_id>:<amount>`，金额相同的流水也不会互相覆盖
pub fn income_member(tran_id: &str, amount: f64) -> String {
    format!("{}:{}", tran_id, amount)
}

/// 从有序集合成员中取出金额
pub fn parse_income_member(member: &str) -> Option<f64> {
    member
        .rsplit_once(':')
        .and_then(|(_, amount)| amount.parse::<f64>().ok())
}

#[derive(Default)]
struct IncomeState {
    /// 下一次拉取的起始时间
    watermark: Option<i64>,
    /// 出现过流水的交易对，用于清理过期数据
    symbols: BTreeSet<String>,
}

/// 资金流水汇总任务
///
/// 定时拉取新流水写入 `income_<symbol>`（score = 发生时间），并清理超过保留期的记录
pub struct IncomeAggregationJob {
    income_source: Arc<dyn IncomeSource>,
    store: Arc<dyn SideChannelStore>,
    clock: Arc<dyn Clock>,
    expiry: Duration,
    state: Mutex<IncomeState>,
}

impl IncomeAggregationJob {
    pub fn new(
        income_source: Arc<dyn IncomeSource>,
        store: Arc<dyn SideChannelStore>,
        clock: Arc<dyn Clock>,
        expiry: Duration,
    ) -> Self {
        Self {
            income_source,
            store,
            clock,
            expiry,
            state: Mutex::new(IncomeState::default()),
        }
    }

    fn expiry_millis(&self) -> i64 {
        i64::try_from(self.expiry.as_millis()).unwrap_or(i64::MAX)
    }

    pub async fn tracked_symbols(&self) -> Vec<String> {
        self.state.lock().await.symbols.iter().cloned().collect()
    }
}

#[async_trait]
impl PeriodicJob for IncomeAggregationJob {
    fn name(&self) -> &str {
        "IncomeAggregation"
    }

    async fn run_once(&self) -> Result<()> {
        let now = self.clock.now_millis();
        let cutoff = now.saturating_sub(self.expiry_millis());
        let mut state = self.state.lock().await;

        // 首次运行从保留期起点开始拉取
        let since = state.watermark.unwrap_or(cutoff);
        let incomes = self
            .income_source
            .fetch_income_since(since)
            .await
            .context("拉取资金流水失败")?;

        let mut latest = since;
        for income in &incomes {
            let key = income_key(&income.symbol);
            self.store
                .zadd(
                    &key,
                    &income_member(&income.tran_id, income.amount),
                    income.timestamp as f64,
                )
                .await
                .with_context(|| format!("写入资金流水失败: {}", key))?;
            state.symbols.insert(income.symbol.clone());
            latest = latest.max(income.timestamp + 1);
        }
        state.watermark = Some(latest);

        let mut purged = 0;
        for symbol in &state.symbols {
            purged += self
                .store
                .zrem_range_by_score(&income_key(symbol), 0.0, (cutoff - 1) as f64)
                .await
                .with_context(|| format!("清理过期资金流水失败: {}", symbol))?;
        }

        if incomes.is_empty() {
            debug!("没有新的资金流水, 清理过期 {} 条", purged);
        } else {
            info!(
                "写入资金流水 {} 条, 清理过期 {} 条, 下次起点 {}",
                incomes.len(),
                purged,
                millis_to_string(latest)
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quant_universe_core::cache::InMemorySideChannelStore;
    use quant_universe_core::market::SnapshotMarketData;
    use quant_universe_domain::{FixedClock, IncomeRecord};

    const HOUR: i64 = 3_600_000;
    const NOW: i64 = 1_700_000_000_000;

    fn income(tran_id: &str, symbol: &str, amount: f64, timestamp: i64) -> IncomeRecord {
        IncomeRecord {
            tran_id: tran_id.to_string(),
            symbol: symbol.to_string(),
            income_type: "REALIZED_PNL".to_string(),
            amount,
            timestamp,
        }
    }

    #[test]
    fn test_member_round_trip() {
        assert_eq!(income_member("42", -1.5), "42:-1.5");
        assert_eq!(parse_income_member("42:-1.5"), Some(-1.5));
        assert_eq!(parse_income_member("a:b:2"), Some(2.0));
        assert_eq!(parse_income_member("broken"), None);
    }

    #[tokio::test]
    async fn test_aggregates_and_purges() {
        let source = SnapshotMarketData::new()
            .with_income(income("1", "BTCUSDT", 5.0, NOW - 2 * HOUR))
            .with_income(income("2", "BTCUSDT", 5.0, NOW - HOUR))
            .with_income(income("3", "ETHUSDT", -2.0, NOW - HOUR))
            // 保留期之外，不会被拉取
            .with_income(income("0", "BTCUSDT", 100.0, NOW - 30 * HOUR));
        let store = Arc::new(InMemorySideChannelStore::new());
        let clock = Arc::new(FixedClock::new(NOW));
        let job = IncomeAggregationJob::new(
            Arc::new(source),
            store.clone(),
            clock.clone(),
            Duration::from_secs(24 * 3600),
        );

        job.run_once().await.unwrap();
        let btc = store
            .zrange_by_score("income_BTCUSDT", 0.0, f64::MAX)
            .await
            .unwrap();
        // 金额相同的两条流水都保留
        assert_eq!(
            btc,
            vec![
                ("1:5".to_string(), (NOW - 2 * HOUR) as f64),
                ("2:5".to_string(), (NOW - HOUR) as f64),
            ]
        );
        assert_eq!(job.tracked_symbols().await, vec!["BTCUSDT", "ETHUSDT"]);

        // 再次运行不会重复写入；时间推进后最早的一条过期
        clock.advance(22 * HOUR + 1);
        job.run_once().await.unwrap();
        let btc = store
            .zrange_by_score("income_BTCUSDT", 0.0, f64::MAX)
            .await
            .unwrap();
        assert_eq!(btc, vec![("2:5".to_string(), (NOW - HOUR) as f64)]);
    }
}
