//! 应用配置
//!
//! 全部从环境变量读取（`.env` 由入口加载），命令行参数可再覆盖

use std::time::Duration;

use super::environment::{env_opt, env_or_default, env_u64};
use crate::error::{AppError, AppResult};

const DEFAULT_PIPELINE_CONFIG_PATH: &str = "config/pipeline.json";
const DEFAULT_CYCLE_INTERVAL_SECS: u64 = 60;
const DEFAULT_INCOME_JOB_INTERVAL_SECS: u64 = 300;
const DEFAULT_INCOME_EXPIRY_HOURS: u64 = 24 * 7;
const DEFAULT_STATUS_JOB_INTERVAL_SECS: u64 = 600;
const DEFAULT_CANDLE_FETCH_CONCURRENCY: u64 = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// 运行环境：local / prod
    pub app_env: String,
    pub log_level: String,
    /// 过滤流水线配置文件（JSON 数组）
    pub pipeline_config_path: String,
    /// Redis 地址，未设置时不发布旁路数据
    pub redis_url: Option<String>,
    pub cycle_interval: Duration,
    pub income_job_interval: Duration,
    /// 资金流水保留时长
    pub income_expiry: Duration,
    pub status_job_interval: Duration,
    /// 单个过滤阶段内同时进行的行情请求上限
    pub candle_fetch_concurrency: usize,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            app_env: env_or_default("APP_ENV", "local"),
            log_level: env_or_default("LOG_LEVEL", "info"),
            pipeline_config_path: env_or_default(
                "PIPELINE_CONFIG_PATH",
                DEFAULT_PIPELINE_CONFIG_PATH,
            ),
            redis_url: env_opt("REDIS_HOST"),
            cycle_interval: Duration::from_secs(env_u64(
                "CYCLE_INTERVAL_SECS",
                DEFAULT_CYCLE_INTERVAL_SECS,
            )),
            income_job_interval: Duration::from_secs(env_u64(
                "INCOME_JOB_INTERVAL_SECS",
                DEFAULT_INCOME_JOB_INTERVAL_SECS,
            )),
            income_expiry: Duration::from_secs(
                env_u64("INCOME_EXPIRY_HOURS", DEFAULT_INCOME_EXPIRY_HOURS) * 3600,
            ),
            status_job_interval: Duration::from_secs(env_u64(
                "STATUS_JOB_INTERVAL_SECS",
                DEFAULT_STATUS_JOB_INTERVAL_SECS,
            )),
            candle_fetch_concurrency: env_u64(
                "CANDLE_FETCH_CONCURRENCY",
                DEFAULT_CANDLE_FETCH_CONCURRENCY,
            ) as usize,
        }
    }

    /// 启动前校验：路径不能为空，各任务间隔必须大于 0
    pub fn validate(&self) -> AppResult<()> {
        if self.pipeline_config_path.trim().is_empty() {
            return Err(AppError::ConfigError(
                "PIPELINE_CONFIG_PATH 不能为空".to_string(),
            ));
        }
        let intervals = [
            ("CYCLE_INTERVAL_SECS", self.cycle_interval),
            ("INCOME_JOB_INTERVAL_SECS", self.income_job_interval),
            ("STATUS_JOB_INTERVAL_SECS", self.status_job_interval),
            ("INCOME_EXPIRY_HOURS", self.income_expiry),
        ];
        for (key, value) in intervals {
            if value.is_zero() {
                return Err(AppError::ConfigError(format!("{} 必须大于 0", key)));
            }
        }
        if self.candle_fetch_concurrency == 0 {
            return Err(AppError::ConfigError(
                "CANDLE_FETCH_CONCURRENCY 必须大于 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn is_local(&self) -> bool {
        self.app_env.eq_ignore_ascii_case("local")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app_env: "local".to_string(),
            log_level: "info".to_string(),
            pipeline_config_path: DEFAULT_PIPELINE_CONFIG_PATH.to_string(),
            redis_url: None,
            cycle_interval: Duration::from_secs(DEFAULT_CYCLE_INTERVAL_SECS),
            income_job_interval: Duration::from_secs(DEFAULT_INCOME_JOB_INTERVAL_SECS),
            income_expiry: Duration::from_secs(DEFAULT_INCOME_EXPIRY_HOURS * 3600),
            status_job_interval: Duration::from_secs(DEFAULT_STATUS_JOB_INTERVAL_SECS),
            candle_fetch_concurrency: DEFAULT_CANDLE_FETCH_CONCURRENCY as usize,
        }
    }
}
