//! # Quant Universe
//!
//! 交易对筛选服务主程序：加载过滤流水线与行情快照，周期性执行筛选，
//! 同时运行资金流水汇总和状态报告两个后台任务

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use dotenv::dotenv;
use tracing::{error, info};

use quant_universe_core::cache::{InMemorySideChannelStore, RedisSideChannelStore};
use quant_universe_core::config::AppConfig;
use quant_universe_core::logger::setup_logging;
use quant_universe_core::market::SnapshotMarketData;
use quant_universe_domain::{Clock, SideChannelStore, SystemClock};
use quant_universe_filters::{
    FilterContext, FilterPipeline, FilterRegistry, PipelineConfig, PipelineOutcome,
};
use quant_universe_orchestration::{
    BackgroundTask, IncomeAggregationJob, SelectionCycleJob, StatusReportJob,
};

const DEFAULT_SNAPSHOT_PATH: &str = "config/snapshot.json";

/// 命令行参数，未指定的项使用环境变量配置
#[derive(Debug, Clone, Parser)]
#[command(name = "quant-universe", version, about = "交易对筛选服务")]
pub struct Cli {
    /// 过滤流水线配置文件（覆盖 PIPELINE_CONFIG_PATH）
    #[arg(long)]
    pub pipeline: Option<PathBuf>,

    /// 行情快照文件
    #[arg(long, default_value = DEFAULT_SNAPSHOT_PATH)]
    pub snapshot: PathBuf,

    /// 只执行一轮筛选，输出结果后退出
    #[arg(long)]
    pub once: bool,

    /// Redis 地址（覆盖 REDIS_HOST）
    #[arg(long)]
    pub redis: Option<String>,

    /// 筛选周期（秒）
    #[arg(long)]
    pub interval_secs: Option<u64>,
}

impl Cli {
    /// 命令行参数覆盖环境变量配置
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(path) = &self.pipeline {
            config.pipeline_config_path = path.display().to_string();
        }
        if let Some(url) = &self.redis {
            config.redis_url = Some(url.clone());
        }
        if let Some(secs) = self.interval_secs {
            config.cycle_interval = Duration::from_secs(secs.max(1));
        }
    }
}

/// 应用初始化：加载 `.env`、设置日志、读取配置
pub async fn app_init() -> Result<AppConfig> {
    dotenv().ok();
    setup_logging()?;
    let config = AppConfig::from_env();
    info!("应用初始化完成, 环境: {}", config.app_env);
    Ok(config)
}

/// 运行期依赖
pub struct Services {
    pub pipeline: Arc<FilterPipeline>,
    pub market: Arc<SnapshotMarketData>,
    pub store: Arc<dyn SideChannelStore>,
    pub clock: Arc<dyn Clock>,
}

/// 创建旁路存储：配置了 Redis 就连 Redis，否则使用进程内存储
pub async fn build_store(config: &AppConfig) -> Result<Arc<dyn SideChannelStore>> {
    match &config.redis_url {
        Some(url) => {
            let store = RedisSideChannelStore::connect(url)
                .await
                .with_context(|| format!("连接 Redis 失败: {}", url))?;
            Ok(Arc::new(store))
        }
        None => {
            info!("未配置 Redis, 旁路数据只保存在内存中");
            Ok(Arc::new(InMemorySideChannelStore::new()))
        }
    }
}

/// 组装流水线：任何一个阶段配置有误都直接失败
pub fn build_services(
    config: &AppConfig,
    market: SnapshotMarketData,
    store: Arc<dyn SideChannelStore>,
    clock: Arc<dyn Clock>,
) -> Result<Services> {
    let market = Arc::new(market);
    let context = FilterContext::new(market.clone(), market.clone())
        .with_clock(clock.clone())
        .with_side_channel(store.clone())
        .with_concurrency(config.candle_fetch_concurrency);

    let pipeline_config = PipelineConfig::from_file(&config.pipeline_config_path)?;
    let registry = FilterRegistry::with_builtin();
    let pipeline = FilterPipeline::build(&pipeline_config, &registry, &context)?;

    Ok(Services {
        pipeline: Arc::new(pipeline),
        market,
        store,
        clock,
    })
}

/// 执行一轮筛选
pub async fn run_once(services: &Services) -> Result<PipelineOutcome> {
    let outcome = services.pipeline.run_cycle().await?;
    Ok(outcome)
}

/// 主流程
pub async fn run(cli: Cli, mut config: AppConfig) -> Result<()> {
    cli.apply(&mut config);
    config.validate()?;
    info!(
        "启动筛选服务, 流水线: {}, 快照: {}",
        config.pipeline_config_path,
        cli.snapshot.display()
    );

    let market = SnapshotMarketData::from_file(&cli.snapshot)?;
    let store = build_store(&config).await?;
    let services = build_services(&config, market, store, Arc::new(SystemClock))?;

    if cli.once {
        let outcome = run_once(&services).await?;
        println!("{}", serde_json::to_string_pretty(&outcome.final_result)?);
        return Ok(());
    }

    let mut tasks = vec![
        BackgroundTask::new(
            Arc::new(SelectionCycleJob::new(services.pipeline.clone())),
            config.cycle_interval,
        ),
        BackgroundTask::new(
            Arc::new(IncomeAggregationJob::new(
                services.market.clone(),
                services.store.clone(),
                services.clock.clone(),
                config.income_expiry,
            )),
            config.income_job_interval,
        ),
        BackgroundTask::new(
            Arc::new(StatusReportJob::new(
                services.market.clone(),
                services.store.clone(),
                services.clock.clone(),
                config.income_expiry,
            )),
            config.status_job_interval,
        ),
    ];
    for task in tasks.iter_mut() {
        task.start()?;
    }

    // 等待关闭信号
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("监听关闭信号失败: {}", e);
    }
    info!("收到关闭信号, 停止后台任务");

    for task in tasks.iter_mut() {
        task.stop().await;
        info!("后台任务 {} 状态: {}", task.name(), task.state());
    }
    info!("筛选服务已退出");
    Ok(())
}
