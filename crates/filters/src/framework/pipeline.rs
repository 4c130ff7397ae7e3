//! 过滤流水线
//!
//! 按配置顺序实例化过滤器，每轮把交易对列表依次传过各阶段：
//! 阶段 i 的输入是阶段 i-1 输出的交易对，之前全部阶段的输出一并传入

use std::collections::HashSet;
use std::time::Instant;

use tracing::{error, info, instrument, warn};

use super::config::PipelineConfig;
use super::error::{FilterConfigError, FilterError};
use super::filter_trait::{Filter, FilterContext};
use super::registry::FilterRegistry;
use super::result::FilterResult;

struct FilterStage {
    filter: Box<dyn Filter>,
    /// 配置中显式标记为首阶段
    first: bool,
}

/// 一轮筛选的结果
#[derive(Debug, Clone, Default)]
pub struct PipelineOutcome {
    /// 最后一个阶段的输出，交给策略层
    pub final_result: FilterResult,
    /// 每个阶段的输出，按执行顺序
    pub history: Vec<FilterResult>,
}

pub struct FilterPipeline {
    stages: Vec<FilterStage>,
}

impl FilterPipeline {
    /// 构建流水线，任一阶段配置有误立即失败
    pub fn build(
        config: &PipelineConfig,
        registry: &FilterRegistry,
        ctx: &FilterContext,
    ) -> Result<Self, FilterConfigError> {
        if config.stages.is_empty() {
            return Err(FilterConfigError::Pipeline(
                "至少需要配置一个过滤器".to_string(),
            ));
        }

        let mut stages = Vec::with_capacity(config.stages.len());
        for stage_config in &config.stages {
            let filter = registry.create(stage_config, ctx)?;
            stages.push(FilterStage {
                filter,
                first: stage_config.first,
            });
        }

        let pipeline = Self { stages };
        info!("过滤流水线构建完成: {}", pipeline.stage_names().join(" -> "));
        Ok(pipeline)
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.filter.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// 执行一轮完整筛选
    ///
    /// 整体数据源失败时中止本轮并返回错误，单个交易对的问题由各过滤器自行处理
    #[instrument(skip(self), name = "FilterCycle")]
    pub async fn run_cycle(&self) -> Result<PipelineOutcome, FilterError> {
        let cycle_start = Instant::now();
        let mut history: Vec<FilterResult> = Vec::with_capacity(self.stages.len());
        let mut current: Vec<String> = Vec::new();

        for (index, stage) in self.stages.iter().enumerate() {
            let name = stage.filter.name();
            let is_first = index == 0 || stage.first;
            let started = Instant::now();

            let mut result = stage
                .filter
                .select(&current, is_first, &history)
                .await
                .map_err(|e| {
                    error!("过滤阶段 {} 执行失败: {}", name, e);
                    e
                })?;

            // 非首阶段只能保留或剔除输入中的交易对
            if !is_first {
                let allowed: HashSet<&str> = current.iter().map(String::as_str).collect();
                let injected: Vec<String> = result
                    .symbols()
                    .into_iter()
                    .filter(|symbol| !allowed.contains(symbol.as_str()))
                    .collect();
                if !injected.is_empty() {
                    warn!(
                        "过滤阶段 {} 返回了输入之外的交易对，已丢弃: {:?}",
                        name, injected
                    );
                    result.retain(|symbol| allowed.contains(symbol));
                }
            }

            info!(
                "过滤阶段 [{}] {}: 输入 {} -> 输出 {}, 耗时 {:?}",
                index,
                name,
                if is_first {
                    "全部".to_string()
                } else {
                    current.len().to_string()
                },
                result.len(),
                started.elapsed()
            );

            current = result.symbols();
            history.push(result);
        }

        let final_result = history.last().cloned().unwrap_or_default();
        info!(
            "本轮筛选完成: {} 个交易对, 耗时 {:?}",
            final_result.len(),
            cycle_start.elapsed()
        );
        Ok(PipelineOutcome {
            final_result,
            history,
        })
    }
}
