//! 流水线配置
//!
//! 有序 JSON 数组，每项 `{"filter": "<名称>", "config": {...}, "first": false}`

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::FilterConfigError;

/// 单个阶段的配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterConfig {
    /// 过滤器名称
    pub filter: String,
    /// 过滤器自身的配置项
    #[serde(default)]
    pub config: Value,
    /// 强制作为首阶段（从全部交易对重新开始）
    #[serde(default)]
    pub first: bool,
}

impl FilterConfig {
    pub fn new(filter: impl Into<String>, config: Value) -> Self {
        Self {
            filter: filter.into(),
            config,
            first: false,
        }
    }

    pub fn first(mut self) -> Self {
        self.first = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PipelineConfig {
    pub stages: Vec<FilterConfig>,
}

impl PipelineConfig {
    pub fn new(stages: Vec<FilterConfig>) -> Result<Self, FilterConfigError> {
        let config = Self { stages };
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, FilterConfigError> {
        let config: Self = serde_json::from_str(raw)
            .map_err(|e| FilterConfigError::Pipeline(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, FilterConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| FilterConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    fn validate(&self) -> Result<(), FilterConfigError> {
        if self.stages.is_empty() {
            return Err(FilterConfigError::Pipeline(
                "至少需要配置一个过滤器".to_string(),
            ));
        }
        Ok(())
    }
}

/// 将阶段配置解析为过滤器的配置结构，`null` 视为空对象
pub fn parse_filter_config<T: DeserializeOwned>(
    filter: &str,
    config: &Value,
) -> Result<T, FilterConfigError> {
    let value = match config {
        Value::Null => Value::Object(Default::default()),
        other => other.clone(),
    };
    serde_json::from_value(value).map_err(|e| FilterConfigError::invalid(filter, e.to_string()))
}
