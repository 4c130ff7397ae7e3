use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::info;

use quant_universe_filters::{FilterPipeline, FilterResult};

use crate::scheduler::PeriodicJob;

/// 筛选周期任务：每轮执行一次完整流水线，保留最近一次结果供策略层读取
pub struct SelectionCycleJob {
    pipeline: Arc<FilterPipeline>,
    latest: RwLock<Option<FilterResult>>,
}

impl SelectionCycleJob {
    pub fn new(pipeline: Arc<FilterPipeline>) -> Self {
        Self {
            pipeline,
            latest: RwLock::new(None),
        }
    }

    /// 最近一次成功筛选的结果
    pub async fn latest(&self) -> Option<FilterResult> {
        self.latest.read().await.clone()
    }
}

#[async_trait]
impl PeriodicJob for SelectionCycleJob {
    fn name(&self) -> &str {
        "SelectionCycle"
    }

    async fn run_once(&self) -> Result<()> {
        let outcome = self
            .pipeline
            .run_cycle()
            .await
            .context("本轮筛选失败")?;
        info!("✅ 本轮选中交易对: {:?}", outcome.final_result.symbols());
        *self.latest.write().await = Some(outcome.final_result);
        Ok(())
    }
}
